/*!
 * Per-locale sync pipeline.
 *
 * For every target locale the orchestrator walks the content tree, extracts translation
 * units, translates them in batches and writes the results back. Locales run in sequential
 * groups; the locales of one group run concurrently. A locale's failure is recorded in the
 * summary and never cancels its siblings.
 */

use futures::future::join_all;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;

use crate::content::extractor::NodeExtractor;
use crate::content::model::{DocumentRef, Locale, OriginKey, PropertyUpdate, TranslationUnit, UpdatePayload};
use crate::content::store::ContentStore;
use crate::content::walker::ContentTreeWalker;
use crate::errors::{StoreError, SyncError, TranslationError};
use crate::translation::{BatchOutcome, TranslationBatcher, TranslationService};

use super::context::RunContext;
use super::events::{EventSink, LocaleFailure, LocaleOutcome, LocaleReport, LocaleStats, SyncEvent, SyncSummary};
use super::updater::StructuralUpdater;

/// Tuning of a sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Locales processed concurrently within one group
    pub locale_concurrency: usize,
    /// Content branch to read from
    pub branch: Option<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            locale_concurrency: 3,
            branch: None,
        }
    }
}

/// Writes grouped by target, in order of first appearance
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct UpdatePlan {
    pub documents: Vec<(DocumentRef, Vec<UpdatePayload>)>,
    pub component_properties: Vec<(String, Vec<PropertyUpdate>)>,
    pub untranslated: usize,
}

impl UpdatePlan {
    /// Route translated units to their write targets.
    ///
    /// Units whose batch fell back to the source text are left out so existing localized
    /// content is not overwritten with the primary language.
    pub fn build(units: &[TranslationUnit], outcome: &BatchOutcome) -> Self {
        let mut plan = Self::default();
        let mut document_index: BTreeMap<DocumentRef, usize> = BTreeMap::new();
        let mut component_index: BTreeMap<String, usize> = BTreeMap::new();

        for (unit, translated) in units.iter().zip(&outcome.translations) {
            if outcome.is_fallback(&unit.source_text) {
                plan.untranslated += 1;
                continue;
            }
            let text = unit.reassemble(translated);

            match &unit.origin {
                OriginKey::Node { document, node_id } => {
                    plan.document_payloads(&mut document_index, document).push(UpdatePayload::Text {
                        node_id: node_id.clone(),
                        text,
                    });
                }
                OriginKey::InstanceProperty { document, node_id, property_id } => {
                    let payloads = plan.document_payloads(&mut document_index, document);
                    let update = PropertyUpdate {
                        property_id: property_id.clone(),
                        text,
                    };
                    let existing = payloads.iter_mut().find_map(|p| match p {
                        UpdatePayload::ComponentInstance { node_id: id, property_overrides } if id.as_str() == node_id.as_str() => {
                            Some(property_overrides)
                        }
                        _ => None,
                    });
                    match existing {
                        Some(overrides) => overrides.push(update),
                        None => payloads.push(UpdatePayload::ComponentInstance {
                            node_id: node_id.clone(),
                            property_overrides: vec![update],
                        }),
                    }
                }
                OriginKey::ComponentProperty { component_id, property_id } => {
                    let index = *component_index.entry(component_id.clone()).or_insert_with(|| {
                        plan.component_properties.push((component_id.clone(), Vec::new()));
                        plan.component_properties.len() - 1
                    });
                    plan.component_properties[index].1.push(PropertyUpdate {
                        property_id: property_id.clone(),
                        text,
                    });
                }
            }
        }

        plan
    }

    fn document_payloads(&mut self, index: &mut BTreeMap<DocumentRef, usize>, document: &DocumentRef) -> &mut Vec<UpdatePayload> {
        let position = *index.entry(document.clone()).or_insert_with(|| {
            self.documents.push((document.clone(), Vec::new()));
            self.documents.len() - 1
        });
        &mut self.documents[position].1
    }
}

/// Drives the walk / translate / update pipeline across locales
pub struct LocaleOrchestrator<'a> {
    store: &'a dyn ContentStore,
    translation: &'a TranslationService,
    options: SyncOptions,
    events: EventSink,
}

impl<'a> LocaleOrchestrator<'a> {
    /// Create an orchestrator over the given collaborators
    pub fn new(store: &'a dyn ContentStore, translation: &'a TranslationService, options: SyncOptions) -> Self {
        Self {
            store,
            translation,
            options,
            events: EventSink::none(),
        }
    }

    /// Send progress events to `events`
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Sync `root` from `source` into every locale of `targets` within a fresh run
    pub async fn run(&self, root: &DocumentRef, source: &Locale, targets: &[Locale]) -> SyncSummary {
        let ctx = RunContext::new();
        self.run_with_context(&ctx, root, source, targets).await
    }

    /// Sync `root` into `targets`, counting calls against `ctx`
    pub async fn run_with_context(&self, ctx: &RunContext, root: &DocumentRef, source: &Locale, targets: &[Locale]) -> SyncSummary {
        info!("Run {}: syncing {} from {} into {} locales", ctx.run_id, root, source.tag, targets.len());

        let group_size = self.options.locale_concurrency.max(1);
        let mut outcomes = Vec::with_capacity(targets.len());
        for group in targets.chunks(group_size) {
            let results = join_all(group.iter().map(|locale| self.run_locale(ctx, root, source, locale))).await;
            let finished: Vec<&str> = results.iter().map(LocaleOutcome::locale).collect();
            debug!("Run {}: locale group finished ({})", ctx.run_id, finished.join(", "));
            outcomes.extend(results);
        }

        let summary = SyncSummary::from_outcomes(ctx.run_id.to_string(), outcomes, ctx.calls.get());
        let (hits, misses, hit_rate) = ctx.cache.stats();
        debug!("Run {}: translation cache {} hits, {} misses ({:.1}%)", ctx.run_id, hits, misses, hit_rate * 100.0);
        info!("Run {}: {} locales completed, {} failed, {} nodes updated, {} calls",
              ctx.run_id, summary.completed.len(), summary.failed.len(), summary.total_nodes, summary.total_calls);
        self.events.emit(SyncEvent::Complete(summary.clone()));
        summary
    }

    async fn run_locale(&self, ctx: &RunContext, root: &DocumentRef, source: &Locale, locale: &Locale) -> LocaleOutcome {
        self.events.emit(SyncEvent::LocaleStart {
            locale: locale.tag.clone(),
        });

        match self.sync_locale(ctx, root, source, locale).await {
            Ok(stats) => {
                info!("{}: {} nodes updated ({} corrected, {} untranslated)",
                      locale.tag, stats.nodes_updated, stats.corrected, stats.untranslated);
                let report = LocaleReport {
                    locale: locale.tag.clone(),
                    stats,
                };
                self.events.emit(SyncEvent::LocaleComplete(report.clone()));
                LocaleOutcome::Completed(report)
            }
            Err(e) => {
                error!("{}: {}", locale.tag, e);
                let failure = LocaleFailure {
                    locale: locale.tag.clone(),
                    error: e.to_string(),
                };
                self.events.emit(SyncEvent::LocaleError(failure.clone()));
                LocaleOutcome::Failed(failure)
            }
        }
    }

    async fn sync_locale(&self, ctx: &RunContext, root: &DocumentRef, source: &Locale, locale: &Locale) -> Result<LocaleStats, SyncError> {
        let write_locale = locale
            .cms_locale_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SyncError::NotATarget(locale.tag.clone()))?;

        let store = ctx.counted(self.store);
        let tree = ContentTreeWalker::new(&store, self.options.branch.as_deref()).walk(root).await?;
        let units = NodeExtractor.extract_tree(&tree);
        self.events.progress(
            &locale.tag,
            format!("Found {} translatable fields in {} documents", units.len(), tree.documents.len()),
        );

        let translator = self.translation.for_locale(&source.tag, &locale.tag, ctx);
        let batcher = TranslationBatcher::new(self.translation.options.batch_size);
        let sources: Vec<String> = units.iter().map(|u| u.source_text.clone()).collect();
        let outcome = batcher
            .translate_batch(&sources, &translator, |done, total| {
                self.events.progress(&locale.tag, format!("Translated batch {}/{}", done, total));
            })
            .await;

        if outcome.all_failed() {
            return Err(TranslationError::AllBatchesFailed(outcome.unique_count).into());
        }

        let plan = UpdatePlan::build(&units, &outcome);
        if plan.untranslated > 0 {
            warn!("{}: {} fields kept untranslated after batch failures", locale.tag, plan.untranslated);
        }

        let updater = StructuralUpdater::new(&store);
        let mut stats = LocaleStats {
            documents: tree.documents.len(),
            fields: units.len(),
            untranslated: plan.untranslated,
            ..Default::default()
        };
        let mut rejected = Vec::new();

        for (document, payloads) in &plan.documents {
            match updater.update_document(document, write_locale, payloads).await {
                Ok(report) => {
                    stats.nodes_updated += report.submitted;
                    stats.corrected += report.corrected;
                }
                Err(e @ StoreError::Structural { .. }) => rejected.push(e),
                Err(e) => return Err(e.into()),
            }
        }
        for (component_id, properties) in &plan.component_properties {
            match updater.update_component_properties(component_id, write_locale, properties).await {
                Ok(report) => {
                    stats.nodes_updated += report.submitted;
                    stats.corrected += report.corrected;
                }
                Err(e @ StoreError::Structural { .. }) => rejected.push(e),
                Err(e) => return Err(e.into()),
            }
        }

        match merge_structural(rejected) {
            Some(e) => Err(e.into()),
            None => Ok(stats),
        }
    }
}

/// Fold the structural rejections of several targets into one error
fn merge_structural(mut errors: Vec<StoreError>) -> Option<StoreError> {
    if errors.len() <= 1 {
        return errors.pop();
    }
    let mut targets = Vec::new();
    let mut all_failures = Vec::new();
    for e in errors {
        if let StoreError::Structural { target, failures } = e {
            targets.push(target);
            all_failures.extend(failures);
        }
    }
    Some(StoreError::Structural {
        target: targets.join("; "),
        failures: all_failures,
    })
}
