/*!
 * End-to-end locale sync over the in-memory store and the mock backend
 */

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use locsync::content::memory::RecordedWrite;
use locsync::content::model::{ContentNode, PropertyOverride, UpdatePayload};
use locsync::content::{ContentStore, MemoryStore};
use locsync::errors::StoreError;
use locsync::providers::mock::MockBackend;
use locsync::sync::events::EventSink;
use locsync::sync::{LocaleOrchestrator, RunContext, SyncEvent, SyncOptions};

use crate::common::{component, hello_world_store, init_test_logging, locale, locale_set, page, service, target};

/// Text payloads written for one content-level locale id, keyed by node
fn written_texts(store: &MemoryStore, locale_id: &str) -> Vec<(String, String)> {
    store
        .writes()
        .into_iter()
        .filter_map(|write| match write {
            RecordedWrite::Document { locale_id: l, updates, .. } if l == locale_id => Some(updates),
            _ => None,
        })
        .flatten()
        .filter_map(|update| match update {
            UpdatePayload::Text { node_id, text } => Some((node_id, text)),
            UpdatePayload::ComponentInstance { .. } => None,
        })
        .collect()
}

fn event_label(event: &SyncEvent) -> Option<String> {
    match event {
        SyncEvent::LocaleStart { locale } => Some(format!("start:{}", locale)),
        SyncEvent::LocaleComplete(report) => Some(format!("done:{}", report.locale)),
        SyncEvent::LocaleError(failure) => Some(format!("error:{}", failure.locale)),
        SyncEvent::Complete(_) => Some("complete".to_string()),
        SyncEvent::Progress { .. } => None,
    }
}

#[tokio::test]
async fn test_run_withTwoLocales_shouldWriteEachLocaleSeparately() {
    init_test_logging();
    let store = hello_world_store();
    let backend = Arc::new(MockBackend::working());
    let service = service(backend.clone());

    let summary = LocaleOrchestrator::new(&store, &service, SyncOptions::default())
        .run(&page("home"), &locale("en", None), &[target("fr"), target("de")])
        .await;

    assert!(summary.is_complete_success());
    assert_eq!(summary.completed.len(), 2);
    assert_eq!(summary.total_nodes, 4);

    let french = written_texts(&store, "cms-fr");
    assert_eq!(
        french,
        vec![
            ("t1".to_string(), "[fr] Hello".to_string()),
            ("t2".to_string(), "<strong>[fr] World</strong>".to_string()),
        ]
    );
    let german = written_texts(&store, "cms-de");
    assert!(german.contains(&("t2".to_string(), "<strong>[de] World</strong>".to_string())));
    assert_eq!(backend.call_count(), 4);
}

#[tokio::test]
async fn test_run_withOneFailingLocale_shouldIsolateFailure() {
    init_test_logging();
    let store = hello_world_store();
    let service = service(Arc::new(MockBackend::failing_for("de")));

    let summary = LocaleOrchestrator::new(&store, &service, SyncOptions::default())
        .run(&page("home"), &locale("en", None), &[target("fr"), target("de"), target("es")])
        .await;

    assert!(!summary.is_complete_success());
    let completed: Vec<&str> = summary.completed.iter().map(|r| r.locale.as_str()).collect();
    assert_eq!(completed, vec!["fr", "es"]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].locale, "de");
    assert!(summary.failed[0].error.contains("failed to translate"));
    assert_eq!(summary.total_nodes, 4);
    assert!(written_texts(&store, "cms-de").is_empty());
}

#[tokio::test]
async fn test_run_withWrongWrapper_shouldCorrectOnceAndSucceed() {
    init_test_logging();
    let store = hello_world_store().with_required_tag("t1", "p");
    let service = service(Arc::new(MockBackend::working()));

    let summary = LocaleOrchestrator::new(&store, &service, SyncOptions::default())
        .run(&page("home"), &locale("en", None), &[target("fr")])
        .await;

    assert!(summary.is_complete_success());
    let report = &summary.completed[0];
    assert_eq!(report.stats.nodes_updated, 2);
    assert_eq!(report.stats.corrected, 1);

    let french = written_texts(&store, "cms-fr");
    assert!(french.contains(&("t1".to_string(), "<p>[fr] Hello</p>".to_string())));
    assert_eq!(store.writes().len(), 2);
}

#[tokio::test]
async fn test_run_withSingleTextNode_shouldCountEveryOutboundCall() {
    let store = MemoryStore::new().with_document(page("home"), vec![ContentNode::text("t1", "Hello")]);
    let service = service(Arc::new(MockBackend::working()));
    let ctx = RunContext::new();

    let summary = LocaleOrchestrator::new(&store, &service, SyncOptions::default())
        .run_with_context(&ctx, &page("home"), &locale("en", None), &[target("fr")])
        .await;

    // fetch + translate + update
    assert_eq!(ctx.calls.get(), 3);
    assert_eq!(summary.total_calls, 3);
    assert_eq!(summary.run_id, ctx.run_id.to_string());
}

#[tokio::test]
async fn test_run_withSharedText_shouldTranslateEachStringOncePerLocale() {
    let store = MemoryStore::new()
        .with_document(
            page("home"),
            vec![
                ContentNode::text("t1", "Buy now"),
                ContentNode::text("t2", "  Buy now  "),
                ContentNode::instance("i1", "card", Vec::new()),
            ],
        )
        .with_document(component("card"), vec![ContentNode::html("c1", "<b>Buy now</b>")])
        .with_component_properties(
            "card",
            vec![PropertyOverride {
                property_id: "cta".to_string(),
                text: Some("Buy now".to_string()),
                html: None,
            }],
        );
    let backend = Arc::new(MockBackend::working().with_delay(Duration::from_millis(20)));
    let service = service(backend.clone());

    let summary = LocaleOrchestrator::new(&store, &service, SyncOptions::default())
        .run(&page("home"), &locale("en", None), &[target("fr")])
        .await;

    assert!(summary.is_complete_success());
    assert_eq!(backend.call_count(), 1);
    assert_eq!(backend.calls()[0].text, "Buy now");
    let french = written_texts(&store, "cms-fr");
    assert!(french.contains(&("t2".to_string(), "  [fr] Buy now  ".to_string())));
    assert!(french.contains(&("c1".to_string(), "<b>[fr] Buy now</b>".to_string())));
}

#[tokio::test]
async fn test_run_withEventSink_shouldEmitLifecycleInOrder() {
    let store = hello_world_store();
    let service = service(Arc::new(MockBackend::failing_for("de")));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    {
        let orchestrator = LocaleOrchestrator::new(&store, &service, SyncOptions::default())
            .with_events(EventSink::new(sender));
        orchestrator
            .run(&page("home"), &locale("en", None), &[target("fr"), target("de")])
            .await;
    }

    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    let labels: Vec<String> = events.iter().filter_map(event_label).collect();

    let position = |label: &str| labels.iter().position(|l| l == label).unwrap();
    assert!(position("start:fr") < position("done:fr"));
    assert!(position("start:de") < position("error:de"));
    assert_eq!(labels.last().map(String::as_str), Some("complete"));
    assert!(events.iter().any(|e| matches!(
        e,
        SyncEvent::Progress { locale: Some(l), message } if l == "fr" && message.starts_with("Found 2 translatable fields")
    )));
}

#[tokio::test]
async fn test_run_withConcurrencyOne_shouldRunLocalesSequentially() {
    let store = hello_world_store();
    let service = service(Arc::new(MockBackend::working().with_delay(Duration::from_millis(20))));
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let options = SyncOptions {
        locale_concurrency: 1,
        ..SyncOptions::default()
    };

    {
        let orchestrator = LocaleOrchestrator::new(&store, &service, options).with_events(EventSink::new(sender));
        orchestrator
            .run(&page("home"), &locale("en", None), &[target("fr"), target("de")])
            .await;
    }

    let mut labels = Vec::new();
    while let Some(event) = receiver.recv().await {
        labels.extend(event_label(&event));
    }
    assert_eq!(labels, vec!["start:fr", "done:fr", "start:de", "done:de", "complete"]);
}

#[tokio::test]
async fn test_run_withConcurrentGroup_shouldStartLocalesTogether() {
    let store = hello_world_store();
    let service = service(Arc::new(MockBackend::working().with_delay(Duration::from_millis(20))));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    {
        let orchestrator = LocaleOrchestrator::new(&store, &service, SyncOptions::default())
            .with_events(EventSink::new(sender));
        orchestrator
            .run(&page("home"), &locale("en", None), &[target("fr"), target("de")])
            .await;
    }

    let mut labels = Vec::new();
    while let Some(event) = receiver.recv().await {
        labels.extend(event_label(&event));
    }
    assert_eq!(&labels[..2], &["start:fr", "start:de"]);
}

#[tokio::test]
async fn test_run_withMissingRoot_shouldFailEveryLocale() {
    let store = MemoryStore::new();
    let service = service(Arc::new(MockBackend::working()));

    let summary = LocaleOrchestrator::new(&store, &service, SyncOptions::default())
        .run(&page("nowhere"), &locale("en", None), &[target("fr"), target("de")])
        .await;

    assert_eq!(summary.failed.len(), 2);
    assert!(summary.failed.iter().all(|f| f.error.contains("not found")));
    assert_eq!(summary.total_nodes, 0);
}

#[tokio::test]
async fn test_run_withSiteLocales_shouldSyncOnlyContentLevelTargets() {
    init_test_logging();
    let mut locales = locale_set(&["fr", "de"]);
    locales.secondary.push(locale("it", None));
    let store = hello_world_store().with_locales("site-1", locales);
    let service = service(Arc::new(MockBackend::working()));

    let site = store.get_locales("site-1").await.unwrap();
    let targets = site.targets();
    let tags: Vec<&str> = targets.iter().map(|l| l.tag.as_str()).collect();
    assert_eq!(tags, vec!["fr", "de"]);

    let summary = LocaleOrchestrator::new(&store, &service, SyncOptions::default())
        .run(&page("home"), &site.primary, &targets)
        .await;

    assert!(summary.is_complete_success());
    assert_eq!(summary.completed.len(), 2);
    assert!(written_texts(&store, "cms-fr").contains(&("t1".to_string(), "[fr] Hello".to_string())));
    assert_eq!(store.writes().len(), 2);
}

#[tokio::test]
async fn test_getLocales_withUnknownSite_shouldReportNotFound() {
    let store = MemoryStore::new().with_locales("site-1", locale_set(&["fr"]));

    let result = store.get_locales("site-2").await;

    match result {
        Err(StoreError::NotFound(what)) => assert_eq!(what, "site site-2"),
        other => panic!("expected not found, got {:?}", other),
    }
}
