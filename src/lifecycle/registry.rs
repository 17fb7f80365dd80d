use crate::{diagnostics::Diagnostics, engine::MapHandle, prelude::HashMap};

/// Named instances discoverable within one provider scope.
///
/// Only the lifecycle manager that constructed an instance adds or removes
/// it; everybody else reads.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: HashMap<String, MapHandle>,
    diagnostics: Diagnostics,
}

impl InstanceRegistry {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            instances: HashMap::default(),
            diagnostics,
        }
    }

    /// Registers `instance` under `id`; the latest registration wins.
    ///
    /// Returns the instance previously registered under `id`, if any.
    pub fn add_instance(&mut self, instance: MapHandle, id: &str) -> Option<MapHandle> {
        if let Some(existing) = self.instances.get(id) {
            if !existing.same_instance(&instance) {
                self.diagnostics.warn_once(format!(
                    "a map with id '{}' is already registered; lookups by this id now return the most recent one",
                    id
                ));
            }
        }

        log::debug!("registered {} as '{}'", instance.id(), id);
        self.instances.insert(id.to_string(), instance)
    }

    /// Removes `id` only while it still points at `instance`
    pub fn remove_instance(&mut self, id: &str, instance: &MapHandle) -> bool {
        match self.instances.get(id) {
            Some(current) if current.same_instance(instance) => {
                self.instances.remove(id);
                log::debug!("deregistered {} from '{}'", instance.id(), id);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<MapHandle> {
        self.instances.get(id).cloned()
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.instances.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }
}
