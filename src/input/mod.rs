pub mod bridge;
pub mod events;

// Re-export the essential types
pub use bridge::{bind, EventBridge, EventHandler, EventHandlers, Subscription};
pub use events::{
    bounds_class_events, CameraEventDetail, EnvelopeShape, EventBinding, EventDetail,
    EventEnvelope, EventKind, PointerEventDetail, EVENT_TABLE,
};
