//! Mutable, non-camera options.
//!
//! Identity fields never reach this path (they live in `IdentityFields`) and
//! camera axes are not part of `MapOptions`, so this synchronizer and the
//! camera synchronizer never write overlapping state.

use crate::{core::config::MapOptions, engine::MapHandle, Result};

#[derive(Debug, Default)]
pub struct OptionSynchronizer {
    applied: Option<MapOptions>,
}

impl OptionSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records options already applied at construction
    pub fn prime(&mut self, options: MapOptions) {
        self.applied = Some(options);
    }

    pub fn reset(&mut self) {
        self.applied = None;
    }

    /// Writes `options` in one batch when they differ structurally from the
    /// last successful write. Returns whether a write happened.
    pub fn sync(&mut self, instance: &MapHandle, options: &MapOptions) -> Result<bool> {
        if self.applied.as_ref() == Some(options) {
            return Ok(false);
        }

        log::debug!("applying map options to {}", instance.id());
        instance.instance().set_options(options)?;
        self.applied = Some(options.clone());
        Ok(true)
    }
}

#[cfg(all(test, feature = "headless"))]
mod tests {
    use super::*;
    use crate::{
        core::config::GestureHandling,
        engine::{
            headless::{EngineCall, HeadlessEngine},
            ConstructionOptions, MapEngine, MapKind, MountPoint,
        },
    };

    #[test]
    fn test_writes_only_on_structural_change() {
        let engine = HeadlessEngine::new();
        let handle = MapHandle::wrap(
            engine
                .create_map(&MountPoint::new("root"), MapKind::Flat, &ConstructionOptions::default())
                .unwrap(),
        );
        let mut sync = OptionSynchronizer::new();
        sync.prime(MapOptions::default());

        assert!(!sync.sync(&handle, &MapOptions::default()).unwrap());

        let greedy = MapOptions {
            gesture_handling: Some(GestureHandling::Greedy),
            ..Default::default()
        };
        assert!(sync.sync(&handle, &greedy).unwrap());
        assert!(!sync.sync(&handle, &greedy.clone()).unwrap());

        let writes = engine
            .journal()
            .into_iter()
            .filter(|call| matches!(call, EngineCall::SetOptions { .. }))
            .count();
        assert_eq!(writes, 1);
    }
}
