/*!
 * Common test utilities for the locsync test suite
 */

use std::sync::Arc;

use locsync::content::model::{ContentNode, DocumentRef, Locale, LocaleSet};
use locsync::content::MemoryStore;
use locsync::providers::mock::MockBackend;
use locsync::translation::{TranslationOptions, TranslationService};

pub mod http_server;

/// Route `log` output through the test harness; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build a locale; `cms` absent means content-level localization is disabled
pub fn locale(tag: &str, cms: Option<&str>) -> Locale {
    Locale {
        id: format!("locale-{}", tag),
        tag: tag.to_string(),
        display_name: tag.to_uppercase(),
        cms_locale_id: cms.map(str::to_string),
    }
}

/// Target locale with a content-level id of `cms-<tag>`
pub fn target(tag: &str) -> Locale {
    locale(tag, Some(&format!("cms-{}", tag)))
}

/// English primary with the given targets
pub fn locale_set(targets: &[&str]) -> LocaleSet {
    LocaleSet {
        primary: locale("en", Some("cms-en")),
        secondary: targets.iter().map(|t| target(t)).collect(),
    }
}

pub fn page(id: &str) -> DocumentRef {
    DocumentRef::Page(id.to_string())
}

pub fn component(id: &str) -> DocumentRef {
    DocumentRef::Component(id.to_string())
}

/// A page with one plain text node and one markup node
pub fn hello_world_store() -> MemoryStore {
    MemoryStore::new().with_document(
        page("home"),
        vec![
            ContentNode::text("t1", "Hello"),
            ContentNode::html("t2", "<strong>World</strong>"),
        ],
    )
}

/// Translation service over a mock backend
pub fn service(backend: Arc<MockBackend>) -> TranslationService {
    TranslationService::new(backend, TranslationOptions::default())
}
