/*!
 * Translation of extracted content.
 *
 * - `core`: translation service bound to a backend, and its per-locale view
 * - `html`: tag-preserving tokenization and translation of markup
 * - `batch`: deduplicated batch translation with per-batch fallback
 * - `cache`: in-run translation cache
 */

pub use self::batch::{BatchOutcome, TranslationBatcher};
pub use self::core::{LocaleTranslator, TranslationOptions, TranslationService};
pub use self::html::HtmlPreservingTranslator;

pub mod batch;
pub mod cache;
pub mod core;
pub mod html;
