/*!
 * Batch translation processing.
 *
 * This module translates an ordered list of strings in deduplicated, fixed-size batches
 * and maps the results back onto the original positions. A failing batch does not abort
 * the run: its strings keep their source text and are reported as fallbacks.
 */

use futures::future::join_all;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use super::core::LocaleTranslator;

/// Result of a batched translation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// One entry per input, in input order
    pub translations: Vec<String>,

    /// Distinct strings submitted
    pub unique_count: usize,

    /// Distinct strings whose batch failed and which kept their source text
    pub fallback_sources: HashSet<String>,
}

impl BatchOutcome {
    /// Whether every distinct string fell back to its source
    pub fn all_failed(&self) -> bool {
        self.unique_count > 0 && self.fallback_sources.len() == self.unique_count
    }

    /// Whether the given source kept its original text because its batch failed
    pub fn is_fallback(&self, source: &str) -> bool {
        self.fallback_sources.contains(source)
    }
}

/// Batch translator for processing strings in deduplicated batches
pub struct TranslationBatcher {
    /// Distinct strings per batch
    batch_size: usize,
}

impl TranslationBatcher {
    /// Create a batcher; a zero batch size is treated as one
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Distinct strings per batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Translate `sources`, returning one translation per input in input order.
    ///
    /// Duplicates are translated once and share the result. `progress_callback` is invoked
    /// with `(completed_batches, total_batches)` after each batch.
    pub async fn translate_batch(
        &self,
        sources: &[String],
        translator: &LocaleTranslator<'_>,
        progress_callback: impl Fn(usize, usize),
    ) -> BatchOutcome {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = sources
            .iter()
            .map(String::as_str)
            .filter(|s| seen.insert(*s))
            .collect();

        let total_batches = unique.len().div_ceil(self.batch_size);
        let mut translations: HashMap<&str, String> = HashMap::with_capacity(unique.len());
        let mut fallback_sources = HashSet::new();

        for (batch_index, batch) in unique.chunks(self.batch_size).enumerate() {
            let start_time = Instant::now();
            let results = join_all(batch.iter().map(|source| translator.translate(source))).await;

            match results.into_iter().collect::<Result<Vec<_>, _>>() {
                Ok(translated) => {
                    debug!("Batch {} of {} ({}) completed in {:?}",
                           batch_index + 1, total_batches, translator.target_language(), start_time.elapsed());
                    translations.extend(batch.iter().copied().zip(translated));
                }
                Err(e) => {
                    warn!("Batch {} of {} ({}) failed, keeping source text: {}",
                          batch_index + 1, total_batches, translator.target_language(), e);
                    for &source in batch {
                        translations.insert(source, source.to_string());
                        fallback_sources.insert(source.to_string());
                    }
                }
            }

            progress_callback(batch_index + 1, total_batches);
        }

        BatchOutcome {
            translations: sources
                .iter()
                .map(|s| translations.get(s.as_str()).cloned().unwrap_or_else(|| s.clone()))
                .collect(),
            unique_count: unique.len(),
            fallback_sources,
        }
    }
}
