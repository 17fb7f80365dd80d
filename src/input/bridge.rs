//! Event bridge: engine listeners → tracker updates → caller handlers

use crate::{
    diagnostics::Diagnostics,
    engine::{ListenerId, MapHandle, NativeEvent, NativeListener, WeakMapHandle},
    input::events::{EventEnvelope, EventKind},
    prelude::HashMap,
    sync::tracker::CameraTracker,
};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

/// Caller-supplied callback for one event kind
pub type EventHandler = Rc<dyn Fn(&EventEnvelope)>;

/// Handler props, keyed by event kind
#[derive(Clone, Default)]
pub struct EventHandlers {
    handlers: HashMap<EventKind, EventHandler>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration
    pub fn on<F>(mut self, kind: EventKind, handler: F) -> Self
    where
        F: Fn(&EventEnvelope) + 'static,
    {
        self.handlers.insert(kind, Rc::new(handler));
        self
    }

    pub fn insert(&mut self, kind: EventKind, handler: EventHandler) {
        self.handlers.insert(kind, handler);
    }

    pub fn remove(&mut self, kind: EventKind) -> Option<EventHandler> {
        self.handlers.remove(&kind)
    }

    pub fn get(&self, kind: EventKind) -> Option<&EventHandler> {
        self.handlers.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// Engine listeners attached for one binding. Detaches on `unbind` or drop.
///
/// Once unbound, the listener ignores events the engine had already queued
/// for it, e.g. later listeners of a dispatch that tore the instance down.
pub struct Subscription {
    instance: WeakMapHandle,
    listeners: Vec<ListenerId>,
    active: Rc<Cell<bool>>,
}

impl Subscription {
    /// Attaches `listener` to every native event in `events`
    pub fn attach(instance: &MapHandle, events: &[&str], listener: NativeListener) -> Self {
        let active = Rc::new(Cell::new(true));
        let live = active.clone();
        let listener: NativeListener = Rc::new(move |native: Rc<NativeEvent>| {
            if live.get() {
                listener(native);
            }
        });

        let listeners = events
            .iter()
            .map(|event| instance.instance().add_listener(event, listener.clone()))
            .collect();

        Self {
            instance: instance.downgrade(),
            listeners,
            active,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Fully detaches every listener; returns how many were removed
    pub fn unbind(&mut self) -> usize {
        self.active.set(false);
        let listeners = std::mem::take(&mut self.listeners);
        if let Some(instance) = self.instance.upgrade() {
            for listener in &listeners {
                instance.instance().remove_listener(*listener);
            }
        }
        listeners.len()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unbind();
    }
}

type HandlerSlot = Rc<RefCell<Option<EventHandler>>>;

fn bind_slot(
    instance: &MapHandle,
    kind: EventKind,
    tracker: Option<&CameraTracker>,
    diagnostics: &Diagnostics,
    slot: HandlerSlot,
) -> Subscription {
    let source = instance.downgrade();
    let tracker = tracker.cloned();
    let diagnostics = diagnostics.clone();

    let listener: NativeListener = Rc::new(move |native: Rc<NativeEvent>| {
        let Some(source) = source.upgrade() else {
            return;
        };

        let envelope = EventEnvelope::from_native(kind, source, native, &diagnostics);

        if let (Some(tracker), Some(camera)) = (&tracker, envelope.camera()) {
            if let Some(update) = camera.update_for(kind) {
                tracker.observe(update);
            }
        }

        // Release the slot before calling out; handlers may re-render.
        let handler = slot.borrow().clone();
        if let Some(handler) = handler {
            handler(&envelope);
        }
    });

    Subscription::attach(instance, kind.native_names(instance.kind()), listener)
}

/// Binds `handler` to `kind` on `instance`.
///
/// Camera kinds update `tracker` before the handler runs. The returned
/// subscription detaches every engine listener it created.
pub fn bind(
    instance: &MapHandle,
    kind: EventKind,
    tracker: Option<&CameraTracker>,
    diagnostics: &Diagnostics,
    handler: EventHandler,
) -> Subscription {
    bind_slot(
        instance,
        kind,
        tracker,
        diagnostics,
        Rc::new(RefCell::new(Some(handler))),
    )
}

struct Binding {
    subscription: Subscription,
    slot: HandlerSlot,
}

/// All listeners attached to one live instance
pub struct EventBridge {
    instance: MapHandle,
    tracker: CameraTracker,
    diagnostics: Diagnostics,
    bindings: HashMap<EventKind, Binding>,
    guards: Vec<Subscription>,
}

impl EventBridge {
    /// Attaches tracking listeners for every camera kind of the instance's variant
    pub fn attach(instance: &MapHandle, tracker: &CameraTracker, diagnostics: &Diagnostics) -> Self {
        let mut bridge = Self {
            instance: instance.clone(),
            tracker: tracker.clone(),
            diagnostics: diagnostics.clone(),
            bindings: HashMap::default(),
            guards: Vec::new(),
        };

        for kind in EventKind::camera_kinds(instance.kind()) {
            bridge.bind_kind(kind, None);
        }

        log::debug!(
            "event bridge attached to {} ({} tracking bindings)",
            instance.id(),
            bridge.bindings.len()
        );
        bridge
    }

    fn bind_kind(&mut self, kind: EventKind, handler: Option<EventHandler>) {
        let slot = Rc::new(RefCell::new(handler));
        let tracker = kind.is_camera().then_some(&self.tracker);
        let subscription = bind_slot(&self.instance, kind, tracker, &self.diagnostics, slot.clone());
        self.bindings.insert(kind, Binding { subscription, slot });
    }

    /// Installs, swaps or removes the handler for one kind.
    ///
    /// Swapping keeps the engine listener; removing detaches it unless the
    /// kind is a camera kind, which stays bound for tracking.
    pub fn set_handler(&mut self, kind: EventKind, handler: Option<EventHandler>) {
        let map_kind = self.instance.kind();
        if !kind.is_supported(map_kind) {
            if handler.is_some() {
                self.diagnostics.warn_once(format!(
                    "{} handler ignored: the event is not available on {:?} maps",
                    kind, map_kind
                ));
            }
            return;
        }

        let bound = self.bindings.contains_key(&kind);
        match handler {
            Some(handler) if bound => {
                if let Some(binding) = self.bindings.get(&kind) {
                    *binding.slot.borrow_mut() = Some(handler);
                }
            }
            Some(handler) => self.bind_kind(kind, Some(handler)),
            None if !bound => {}
            None if kind.is_camera() => {
                if let Some(binding) = self.bindings.get(&kind) {
                    *binding.slot.borrow_mut() = None;
                }
            }
            None => {
                if let Some(mut binding) = self.bindings.remove(&kind) {
                    binding.subscription.unbind();
                }
            }
        }
    }

    /// Reconciles every kind against the current handler props
    pub fn sync_handlers(&mut self, handlers: &EventHandlers) {
        for kind in EventKind::all() {
            self.set_handler(kind, handlers.get(kind).cloned());
        }
    }

    pub fn has_handler(&self, kind: EventKind) -> bool {
        self.bindings
            .get(&kind)
            .map(|binding| binding.slot.borrow().is_some())
            .unwrap_or(false)
    }

    pub fn is_bound(&self, kind: EventKind) -> bool {
        self.bindings
            .get(&kind)
            .map(|binding| binding.subscription.is_active())
            .unwrap_or(false)
    }

    /// Attaches an internal listener owned by the bridge (e.g. camera guards)
    pub fn add_guard(&mut self, events: &[&str], listener: NativeListener) {
        self.guards
            .push(Subscription::attach(&self.instance, events, listener));
    }

    pub fn has_guards(&self) -> bool {
        !self.guards.is_empty()
    }

    pub fn clear_guards(&mut self) -> usize {
        self.guards.drain(..).map(|mut guard| guard.unbind()).sum()
    }

    /// Detaches every listener this bridge created; returns how many
    pub fn unbind_all(&mut self) -> usize {
        let bound: usize = self
            .bindings
            .drain()
            .map(|(_, mut binding)| binding.subscription.unbind())
            .sum();
        let guarded = self.clear_guards();
        log::debug!(
            "event bridge detached {} listeners from {}",
            bound + guarded,
            self.instance.id()
        );
        bound + guarded
    }

    pub fn instance(&self) -> &MapHandle {
        &self.instance
    }

    pub fn tracker(&self) -> &CameraTracker {
        &self.tracker
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        if !self.bindings.is_empty() || !self.guards.is_empty() {
            self.unbind_all();
        }
    }
}
