/*!
 * Progress events and run summary.
 */

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Counts for a locale that finished
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocaleStats {
    /// Documents (page plus components) traversed
    pub documents: usize,
    /// Translation units extracted
    pub fields: usize,
    /// Payloads accepted by the store
    pub nodes_updated: usize,
    /// Payloads accepted only after corrective re-wrapping
    pub corrected: usize,
    /// Units skipped because their translation batch failed
    pub untranslated: usize,
}

/// A locale that finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleReport {
    /// Locale tag
    pub locale: String,
    /// Counts
    #[serde(flatten)]
    pub stats: LocaleStats,
}

/// A locale that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleFailure {
    /// Locale tag
    pub locale: String,
    /// Error text
    pub error: String,
}

/// Outcome of one locale's pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleOutcome {
    /// Pipeline finished
    Completed(LocaleReport),
    /// Pipeline failed at some stage
    Failed(LocaleFailure),
}

impl LocaleOutcome {
    /// Tag of the locale the outcome belongs to
    pub fn locale(&self) -> &str {
        match self {
            Self::Completed(report) => &report.locale,
            Self::Failed(failure) => &failure.locale,
        }
    }
}

/// Structured partial-success summary of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Run identifier
    pub run_id: String,
    /// Payloads accepted by the store across completed locales
    pub total_nodes: usize,
    /// Locales that finished, in input order
    pub completed: Vec<LocaleReport>,
    /// Locales that failed, in input order
    pub failed: Vec<LocaleFailure>,
    /// Outbound calls issued during the run
    pub total_calls: usize,
}

impl SyncSummary {
    /// Build a summary from per-locale outcomes
    pub fn from_outcomes(run_id: String, outcomes: Vec<LocaleOutcome>, total_calls: usize) -> Self {
        let mut summary = Self {
            run_id,
            total_calls,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                LocaleOutcome::Completed(report) => {
                    summary.total_nodes += report.stats.nodes_updated;
                    summary.completed.push(report);
                }
                LocaleOutcome::Failed(failure) => summary.failed.push(failure),
            }
        }
        summary
    }

    /// Whether every locale finished
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Event emitted while a run progresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A locale's pipeline started
    LocaleStart {
        /// Locale tag
        locale: String,
    },
    /// Free-form progress message
    Progress {
        /// Locale tag, absent for run-level messages
        #[serde(skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
        /// Message
        message: String,
    },
    /// A locale finished
    LocaleComplete(LocaleReport),
    /// A locale failed
    LocaleError(LocaleFailure),
    /// The run finished
    Complete(SyncSummary),
}

/// Destination for events; a missing or closed receiver silently drops them
#[derive(Debug, Clone, Default)]
pub struct EventSink(Option<UnboundedSender<SyncEvent>>);

impl EventSink {
    /// Sink forwarding to a channel
    pub fn new(sender: UnboundedSender<SyncEvent>) -> Self {
        Self(Some(sender))
    }

    /// Sink discarding every event
    pub fn none() -> Self {
        Self(None)
    }

    /// Emit an event
    pub fn emit(&self, event: SyncEvent) {
        if let Some(sender) = &self.0 {
            let _ = sender.send(event);
        }
    }

    /// Emit a progress message for a locale
    pub fn progress(&self, locale: &str, message: impl Into<String>) {
        self.emit(SyncEvent::Progress {
            locale: Some(locale.to_string()),
            message: message.into(),
        });
    }
}
