//! Provider scope: the one place that owns the registry, the pool and the
//! availability gate for a tree of maps.

use crate::{
    core::config::IdentityFields,
    diagnostics::{log_error_once, Diagnostics},
    engine::{EngineGate, EngineLoader, LoadStatus, LoaderParams, MapEngine, MapHandle},
    lifecycle::{pool::InstancePool, registry::InstanceRegistry},
    Error, Result,
};
use std::{cell::RefCell, fmt, rc::Rc};

struct ProviderInner {
    engine: Rc<dyn MapEngine>,
    gate: EngineGate,
    diagnostics: Diagnostics,
    registry: RefCell<InstanceRegistry>,
    pool: RefCell<InstancePool>,
}

#[derive(Clone)]
pub struct MapProvider {
    inner: Rc<ProviderInner>,
}

impl MapProvider {
    pub fn new(engine: Rc<dyn MapEngine>) -> Self {
        let diagnostics = Diagnostics::new();
        Self {
            inner: Rc::new(ProviderInner {
                engine,
                gate: EngineGate::new(),
                registry: RefCell::new(InstanceRegistry::new(diagnostics.clone())),
                diagnostics,
                pool: RefCell::new(InstancePool::new()),
            }),
        }
    }

    pub fn engine(&self) -> &dyn MapEngine {
        self.inner.engine.as_ref()
    }

    pub fn gate(&self) -> &EngineGate {
        &self.inner.gate
    }

    pub fn status(&self) -> LoadStatus {
        self.inner.gate.status()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.inner.diagnostics
    }

    /// Instance registered under `id`
    pub fn map(&self, id: &str) -> Option<MapHandle> {
        self.inner.registry.borrow().get(id)
    }

    pub fn map_ids(&self) -> Vec<String> {
        self.inner.registry.borrow().ids()
    }

    /// Runs one load attempt. A no-op when an attempt with the same params
    /// is already in flight or has succeeded.
    pub async fn load(&self, loader: &dyn EngineLoader, params: LoaderParams) -> Result<LoadStatus> {
        let Some(token) = self.inner.gate.begin_attempt(&params) else {
            return Ok(self.status());
        };

        log::info!("loading map engine ({} libraries)", params.libraries.len());
        let outcome = loader.load(&params).await;
        self.inner.gate.finish(token, outcome)
    }

    /// Imports a feature library after the engine has loaded
    pub async fn load_library(&self, loader: &dyn EngineLoader, name: &str) -> Result<()> {
        if !self.inner.gate.is_loaded() {
            return Err(Error::Load(format!(
                "cannot import library '{}' while the engine is {}",
                name,
                self.status()
            )));
        }
        if self.inner.gate.is_library_loaded(name) {
            return Ok(());
        }

        loader.import_library(name).await?;
        self.inner.gate.mark_library_loaded(name);
        log::debug!("library '{}' loaded", name);
        Ok(())
    }

    pub fn is_library_loaded(&self, name: &str) -> bool {
        self.inner.gate.is_library_loaded(name)
    }

    /// Destroys every parked instance; returns how many
    pub fn clear_pool(&self) -> usize {
        let parked = self.inner.pool.borrow_mut().drain();
        for instance in &parked {
            instance.instance().destroy();
        }
        if !parked.is_empty() {
            log::debug!("destroyed {} pooled instances", parked.len());
        }
        parked.len()
    }

    pub fn pooled_count(&self) -> usize {
        self.inner.pool.borrow().len()
    }

    pub(crate) fn register(&self, id: &str, instance: &MapHandle) {
        self.inner
            .registry
            .borrow_mut()
            .add_instance(instance.clone(), id);
    }

    pub(crate) fn deregister(&self, id: &str, instance: &MapHandle) -> bool {
        self.inner.registry.borrow_mut().remove_instance(id, instance)
    }

    pub(crate) fn park(&self, fields: IdentityFields, instance: MapHandle) {
        self.inner.pool.borrow_mut().park(fields, instance);
    }

    pub(crate) fn unpark(&self, fields: &IdentityFields) -> Option<MapHandle> {
        self.inner.pool.borrow_mut().take(fields)
    }
}

impl fmt::Debug for MapProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapProvider")
            .field("gate", &self.inner.gate)
            .field("maps", &self.map_ids())
            .field("pooled", &self.pooled_count())
            .finish()
    }
}

/// Reader entry point for code that may run outside any provider scope.
///
/// Without a provider this is a programming error: it is logged once per
/// id and `None` is returned.
pub fn lookup_map(provider: Option<&MapProvider>, id: &str) -> Option<MapHandle> {
    match provider {
        Some(provider) => provider.map(id),
        None => {
            log_error_once(&format!(
                "map '{}' was looked up outside of a MapProvider; wrap the tree in a provider scope",
                id
            ));
            None
        }
    }
}
