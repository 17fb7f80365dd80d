pub mod manager;
pub mod pool;
pub mod provider;
pub mod registry;

pub use manager::{Acquisition, InstanceLifecycle, LiveInstance};
pub use pool::InstancePool;
pub use provider::{lookup_map, MapProvider};
pub use registry::InstanceRegistry;
