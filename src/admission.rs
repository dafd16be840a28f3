//! Admission gates for candidate recordings
//!
//! Gates run in order and the first failure wins:
//! 1. auto-save must be enabled
//! 2. accuracy must reach the configured minimum

use std::collections::BTreeSet;

use crate::constants::{HIGH_ACCURACY_TAG, HIGH_ACCURACY_THRESHOLD};
use crate::recording::Quality;
use crate::settings::ArchiveSettings;

/// Why a candidate recording was not kept
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    AutoSaveDisabled,
    BelowMinimumAccuracy { accuracy: f64, minimum: u8 },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::AutoSaveDisabled => write!(f, "auto-save is disabled"),
            RejectReason::BelowMinimumAccuracy { accuracy, minimum } => {
                write!(f, "accuracy {:.1} is below the minimum of {}", accuracy, minimum)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionDecision {
    Admit {
        tags: BTreeSet<String>,
        quality: Quality,
    },
    Reject(RejectReason),
}

/// Decide whether a recording scored at `accuracy` is retained
pub fn evaluate(
    settings: &ArchiveSettings,
    accuracy: f64,
    requested_quality: Option<Quality>,
) -> AdmissionDecision {
    if !settings.auto_save_enabled {
        return AdmissionDecision::Reject(RejectReason::AutoSaveDisabled);
    }

    if accuracy < f64::from(settings.minimum_accuracy) {
        return AdmissionDecision::Reject(RejectReason::BelowMinimumAccuracy {
            accuracy,
            minimum: settings.minimum_accuracy,
        });
    }

    AdmissionDecision::Admit {
        tags: tags_for(accuracy),
        quality: requested_quality.unwrap_or_default(),
    }
}

/// Tags derived from the score at admission time
pub fn tags_for(accuracy: f64) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    if accuracy >= HIGH_ACCURACY_THRESHOLD {
        tags.insert(HIGH_ACCURACY_TAG.to_string());
    }
    tags
}
