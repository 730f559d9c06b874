/*!
 * Locale synchronization.
 *
 * - `context`: run-scoped call counter and translation cache
 * - `updater`: structural write-back with one corrective retry
 * - `orchestrator`: per-locale pipeline and locale grouping
 * - `events`: progress events and the run summary
 */

pub use self::context::RunContext;
pub use self::events::{EventSink, LocaleOutcome, SyncEvent, SyncSummary};
pub use self::orchestrator::{LocaleOrchestrator, SyncOptions};
pub use self::updater::{StructuralUpdater, UpdateReport};

pub mod context;
pub mod events;
pub mod orchestrator;
pub mod updater;
