use crate::{core::config::IdentityFields, engine::MapHandle, prelude::HashMap};

/// Torn-down instances kept alive for reuse, keyed by identity minus mount point
#[derive(Debug, Default)]
pub struct InstancePool {
    parked: HashMap<IdentityFields, Vec<MapHandle>>,
}

impl InstancePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn park(&mut self, fields: IdentityFields, instance: MapHandle) {
        log::debug!("parking {} for reuse", instance.id());
        self.parked.entry(fields).or_default().push(instance);
    }

    /// Takes the most recently parked instance with matching fields
    pub fn take(&mut self, fields: &IdentityFields) -> Option<MapHandle> {
        let bucket = self.parked.get_mut(fields)?;
        let instance = bucket.pop();
        if bucket.is_empty() {
            self.parked.remove(fields);
        }
        instance
    }

    pub fn len(&self) -> usize {
        self.parked.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.parked.is_empty()
    }

    pub fn drain(&mut self) -> Vec<MapHandle> {
        self.parked.drain().flat_map(|(_, bucket)| bucket).collect()
    }
}
