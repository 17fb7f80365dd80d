//! Deduplicating diagnostic sink
//!
//! Configuration misuse and engine inconsistencies are reported once per
//! distinct message so repeated render passes do not flood the log.

use crate::prelude::HashSet;
use once_cell::sync::Lazy;
use std::{cell::RefCell, rc::Rc, sync::Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

#[derive(Default)]
struct DiagnosticLog {
    seen: HashSet<String>,
    emitted: Vec<Diagnostic>,
}

/// Per-scope sink shared by the registry, the lifecycle manager and the event bridge
#[derive(Clone, Default)]
pub struct Diagnostics {
    log: Rc<RefCell<DiagnosticLog>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `message` as a warning unless it was already reported.
    /// Returns whether it was emitted.
    pub fn warn_once(&self, message: impl Into<String>) -> bool {
        self.emit(Severity::Warning, message.into())
    }

    pub fn error_once(&self, message: impl Into<String>) -> bool {
        self.emit(Severity::Error, message.into())
    }

    fn emit(&self, severity: Severity, message: String) -> bool {
        let mut log = self.log.borrow_mut();
        if !log.seen.insert(message.clone()) {
            return false;
        }

        match severity {
            Severity::Warning => log::warn!("{}", message),
            Severity::Error => log::error!("{}", message),
        }
        log.emitted.push(Diagnostic { severity, message });
        true
    }

    /// Every diagnostic emitted so far, oldest first
    pub fn emitted(&self) -> Vec<Diagnostic> {
        self.log.borrow().emitted.clone()
    }

    pub fn count(&self) -> usize {
        self.log.borrow().emitted.len()
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("emitted", &self.count())
            .finish()
    }
}

static REPORTED_ERRORS: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::default()));

/// Process-wide variant for misuse detected where no scope exists.
/// Returns whether the message was logged.
pub fn log_error_once(message: &str) -> bool {
    let mut reported = match REPORTED_ERRORS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if reported.insert(message.to_string()) {
        log::error!("{}", message);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_deduplicates_by_message() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.warn_once("duplicate id \"a\""));
        assert!(!diagnostics.warn_once("duplicate id \"a\""));
        assert!(diagnostics.warn_once("duplicate id \"b\""));
        assert_eq!(diagnostics.count(), 2);
    }

    #[test]
    fn test_clones_share_the_same_log() {
        let diagnostics = Diagnostics::new();
        let other = diagnostics.clone();
        diagnostics.error_once("boom");
        assert!(!other.error_once("boom"));
        assert_eq!(other.emitted()[0].severity, Severity::Error);
    }

    #[test]
    fn test_log_error_once_is_process_wide() {
        let message = "diagnostics test: process-wide message";
        assert!(log_error_once(message));
        assert!(!log_error_once(message));
    }
}
