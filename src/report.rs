//! Critical failure reporting
//!
//! Admission failures are handed to an `ErrorReporter` along with the
//! original request, so the host can offer a retry by resubmitting it.
//! `report` must not block: implementations queue or log and return.

use std::sync::Mutex;

use crate::recording::SaveRecordingRequest;

#[derive(Debug, Clone)]
pub struct CriticalFailure {
    /// Short description of the operation that failed
    pub context: &'static str,
    pub message: String,
    /// Resubmit this request to retry
    pub retry: Option<SaveRecordingRequest>,
}

pub trait ErrorReporter: Send + Sync {
    fn report(&self, failure: CriticalFailure);
}

/// Default reporter: writes the failure to the log
#[derive(Debug, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, failure: CriticalFailure) {
        log::error!(
            "{}: {}{}",
            failure.context,
            failure.message,
            if failure.retry.is_some() { " (retryable)" } else { "" }
        );
    }
}

/// Keeps every report in memory, for hosts that drain failures into their own UI
#[derive(Debug, Default)]
pub struct CollectingReporter {
    failures: Mutex<Vec<CriticalFailure>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all failures reported so far
    pub fn drain(&self) -> Vec<CriticalFailure> {
        match self.failures.lock() {
            Ok(mut failures) => std::mem::take(&mut *failures),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, failure: CriticalFailure) {
        match self.failures.lock() {
            Ok(mut failures) => failures.push(failure),
            Err(poisoned) => poisoned.into_inner().push(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_reporter_drains() {
        let reporter = CollectingReporter::new();
        reporter.report(CriticalFailure {
            context: "save recording",
            message: "disk full".to_string(),
            retry: None,
        });
        let failures = reporter.drain();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "disk full");
        assert!(reporter.drain().is_empty());
    }
}
