/*!
 * # locsync - localization sync for a remote CMS
 *
 * A Rust library that translates the primary-language content of a page or component,
 * including every component it transitively references, into the site's secondary locales.
 *
 * ## Features
 *
 * - Discover content across component references without revisiting components
 * - Translate markup without disturbing tags or invisible characters
 * - Deduplicated, batched translation with per-batch fallback
 * - One corrective retry for structural validation errors reported by the store
 * - Concurrent locale groups with per-locale failure isolation
 * - Translation backends:
 *   - Ollama (local LLM)
 *   - Anthropic API
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `http_client`: Outbound HTTP with rate-limit aware retries
 * - `content`: Content model, store trait, REST and in-memory stores, traversal and extraction
 * - `translation`: Translation services:
 *   - `translation::core`: Translation service and its per-locale view
 *   - `translation::html`: Tag-preserving markup translation
 *   - `translation::batch`: Batch processing of translations
 *   - `translation::cache`: In-run translation cache
 * - `sync`: Run context, structural updates, locale orchestration and events
 * - `language_utils`: Locale tag and ISO language code utilities
 * - `providers`: Client implementations for the translation backends:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::mock`: Deterministic backend for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod content;
pub mod errors;
pub mod http_client;
pub mod language_utils;
pub mod providers;
pub mod sync;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use content::{ContentStore, DocumentRef, Locale, LocaleSet, MemoryStore, RestContentStore};
pub use errors::{AppError, ProviderError, StoreError, SyncError, TranslationError};
pub use language_utils::{display_language, get_language_name, language_codes_match, locale_matches};
pub use sync::{LocaleOrchestrator, RunContext, SyncEvent, SyncOptions, SyncSummary};
pub use translation::TranslationService;
