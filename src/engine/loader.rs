//! Engine availability gate and the asynchronous loader contract.

use crate::{prelude::HashSet, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, fmt, rc::Rc};

/// Readiness of the external map engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed,
    AuthFailure,
}

impl LoadStatus {
    pub fn is_loaded(self) -> bool {
        self == LoadStatus::Loaded
    }

    /// Failed and AuthFailure end an attempt; only a new attempt leaves them
    pub fn is_failure(self) -> bool {
        matches!(self, LoadStatus::Failed | LoadStatus::AuthFailure)
    }

    fn can_become(self, to: LoadStatus) -> bool {
        matches!(
            (self, to),
            (LoadStatus::NotLoaded, LoadStatus::Loading)
                | (LoadStatus::Loading, LoadStatus::Loaded)
                | (LoadStatus::Loading, LoadStatus::Failed)
                | (LoadStatus::Loading, LoadStatus::AuthFailure)
                | (LoadStatus::Loaded, LoadStatus::AuthFailure)
        )
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadStatus::NotLoaded => "NOT_LOADED",
            LoadStatus::Loading => "LOADING",
            LoadStatus::Loaded => "LOADED",
            LoadStatus::Failed => "FAILED",
            LoadStatus::AuthFailure => "AUTH_FAILURE",
        };
        f.write_str(name)
    }
}

/// Parameters of one load attempt
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderParams {
    pub api_key: String,
    pub version: Option<String>,
    /// Feature libraries that must be usable once the load reports success
    pub libraries: Vec<String>,
    pub language: Option<String>,
    pub region: Option<String>,
    pub channel: Option<String>,
    pub solution_channel: Option<String>,
    pub auth_referrer_policy: Option<String>,
}

impl LoaderParams {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_library(mut self, name: impl Into<String>) -> Self {
        self.libraries.push(name.into());
        self
    }
}

/// Why a load attempt did not produce a usable engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadFailure {
    #[error("map engine failed to load: {0}")]
    Failed(String),

    #[error("map engine rejected the credentials")]
    Auth,
}

impl LoadFailure {
    pub fn status(&self) -> LoadStatus {
        match self {
            LoadFailure::Failed(_) => LoadStatus::Failed,
            LoadFailure::Auth => LoadStatus::AuthFailure,
        }
    }
}

impl From<LoadFailure> for Error {
    fn from(failure: LoadFailure) -> Self {
        Error::Load(failure.to_string())
    }
}

/// Asynchronous script / library loader supplied by the host
#[async_trait(?Send)]
pub trait EngineLoader {
    /// Resolves once the engine constructor and every requested library
    /// are synchronously usable
    async fn load(&self, params: &LoaderParams) -> std::result::Result<(), LoadFailure>;

    async fn import_library(&self, name: &str) -> std::result::Result<(), LoadFailure>;
}

/// Callback invoked on every status change
pub type StatusListener = Rc<dyn Fn(LoadStatus)>;

/// Ticket for one load attempt; results from superseded tickets are dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptToken(u64);

#[derive(Default)]
struct GateState {
    status: LoadStatus,
    params: Option<LoaderParams>,
    attempt: u64,
    libraries: HashSet<String>,
    listeners: Vec<StatusListener>,
}

/// Shared readiness signal consulted before any instance is constructed
#[derive(Clone, Default)]
pub struct EngineGate {
    state: Rc<RefCell<GateState>>,
}

impl EngineGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> LoadStatus {
        self.state.borrow().status
    }

    pub fn is_loaded(&self) -> bool {
        self.status().is_loaded()
    }

    pub fn attempt(&self) -> u64 {
        self.state.borrow().attempt
    }

    pub fn subscribe(&self, listener: StatusListener) {
        self.state.borrow_mut().listeners.push(listener);
    }

    /// Starts a load attempt.
    ///
    /// Returns `None` when an attempt with the same params is already in
    /// flight or has succeeded. New params, or a failed previous attempt,
    /// reset the gate to `Loading`.
    pub fn begin_attempt(&self, params: &LoaderParams) -> Option<AttemptToken> {
        let token = {
            let mut state = self.state.borrow_mut();
            let same_params = state.params.as_ref() == Some(params);
            if same_params && matches!(state.status, LoadStatus::Loading | LoadStatus::Loaded) {
                return None;
            }

            state.attempt += 1;
            state.params = Some(params.clone());
            if !same_params {
                state.libraries.clear();
            }
            AttemptToken(state.attempt)
        };

        log::debug!("engine load attempt {} started", token.0);
        self.set_status(LoadStatus::Loading);
        Some(token)
    }

    /// Records the outcome of the attempt identified by `token`
    pub fn finish(
        &self,
        token: AttemptToken,
        outcome: std::result::Result<(), LoadFailure>,
    ) -> Result<LoadStatus> {
        if token.0 != self.attempt() {
            log::debug!("ignoring result of superseded load attempt {}", token.0);
            return Ok(self.status());
        }

        let to = match &outcome {
            Ok(()) => LoadStatus::Loaded,
            Err(failure) => {
                log::warn!("{}", failure);
                failure.status()
            }
        };
        self.transition(to)?;

        if outcome.is_ok() {
            let libraries = self
                .state
                .borrow()
                .params
                .as_ref()
                .map(|params| params.libraries.clone())
                .unwrap_or_default();
            for library in libraries {
                self.mark_library_loaded(&library);
            }
        }

        Ok(to)
    }

    /// Credentials rejected after the engine reported `Loaded`
    pub fn report_auth_failure(&self) -> Result<()> {
        self.transition(LoadStatus::AuthFailure)
    }

    /// Applies one legal transition and notifies subscribers
    pub fn transition(&self, to: LoadStatus) -> Result<()> {
        let from = self.status();
        if !from.can_become(to) {
            return Err(Error::InvalidTransition { from, to });
        }
        self.set_status(to);
        Ok(())
    }

    pub fn mark_library_loaded(&self, name: &str) {
        self.state.borrow_mut().libraries.insert(name.to_string());
    }

    pub fn is_library_loaded(&self, name: &str) -> bool {
        self.state.borrow().libraries.contains(name)
    }

    fn set_status(&self, status: LoadStatus) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            state.status = status;
            state.listeners.clone()
        };
        for listener in listeners {
            listener(status);
        }
    }
}

impl fmt::Debug for EngineGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EngineGate")
            .field("status", &state.status)
            .field("attempt", &state.attempt)
            .field("libraries", &state.libraries)
            .finish()
    }
}
