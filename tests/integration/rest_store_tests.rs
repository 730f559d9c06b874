/*!
 * REST content store against a scripted HTTP server
 */

use std::sync::Arc;
use std::time::Duration;

use locsync::content::model::{ContentNode, PropertyUpdate, UpdatePayload};
use locsync::content::{ContentStore, RestContentStore};
use locsync::errors::{ProviderError, StoreError};
use locsync::http_client::{RetryPolicy, RetryingHttpClient};
use locsync::providers::mock::MockBackend;
use locsync::sync::{LocaleOrchestrator, SyncOptions};

use crate::common::http_server::{CannedResponse, ScriptedServer};
use crate::common::{locale, page, service, target};

fn rest_store(server: &ScriptedServer) -> RestContentStore {
    let client = RetryingHttpClient::new(
        Duration::from_secs(5),
        RetryPolicy {
            max_retries: 2,
            backoff_base_ms: 10,
            max_backoff_ms: 50,
        },
    );
    RestContentStore::new(client, &format!("{}/api/v1", server.url), "tok").unwrap()
}

#[tokio::test]
async fn test_getLocales_withSite_shouldSendBearerAndConvert() {
    let server = ScriptedServer::start(vec![CannedResponse::json(
        200,
        r#"{
            "primary": {"id": "l-en", "tag": "en", "displayName": "English"},
            "secondary": [
                {"id": "l-fr", "tag": "fr", "displayName": "French", "cmsLocaleId": "c-fr"},
                {"id": "l-de", "tag": "de"}
            ]
        }"#,
    )])
    .await;
    let store = rest_store(&server);

    let locales = store.get_locales("site-1").await.unwrap();

    assert_eq!(locales.primary.display_name, "English");
    assert_eq!(locales.secondary.len(), 2);
    assert_eq!(locales.secondary[1].display_name, "de");
    let targets = locales.targets();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].cms_locale_id.as_deref(), Some("c-fr"));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].request_line.starts_with("GET /api/v1/sites/site-1/locales "));
    assert!(requests[0].headers.contains("authorization: bearer tok"));
}

#[tokio::test]
async fn test_getDocumentNodes_withBranch_shouldQueryAndSkipUnknownNodes() {
    let server = ScriptedServer::start(vec![CannedResponse::json(
        200,
        r#"{"nodes": [
            {"id": "t1", "type": "text", "text": {"text": "Hello"}},
            {"id": "img", "type": "image"},
            {"id": "i1", "type": "component-instance", "componentId": "card",
             "propertyOverrides": [{"propertyId": "title", "text": {"html": "<p>Title</p>"}}]}
        ]}"#,
    )])
    .await;
    let store = rest_store(&server);

    let nodes = store.get_document_nodes(&page("home"), None, Some("draft")).await.unwrap();

    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0], ContentNode::text("t1", "Hello"));
    assert_eq!(nodes[1].component_id(), Some("card"));
    let request_line = &server.requests()[0].request_line;
    assert!(request_line.starts_with("GET /api/v1/pages/home/dom?branch=draft "));
}

#[tokio::test]
async fn test_updateDocument_withFieldErrors_shouldPostCamelCaseAndMapErrors() {
    let server = ScriptedServer::start(vec![CannedResponse::json(
        200,
        r#"{"errors": [{"nodeId": "t1", "error": "Expected p"}]}"#,
    )])
    .await;
    let store = rest_store(&server);
    let updates = vec![
        UpdatePayload::Text {
            node_id: "t1".to_string(),
            text: "Bonjour".to_string(),
        },
        UpdatePayload::ComponentInstance {
            node_id: "i1".to_string(),
            property_overrides: vec![PropertyUpdate {
                property_id: "title".to_string(),
                text: "Titre".to_string(),
            }],
        },
    ];

    let response = store.update_document(&page("home"), "c-fr", &updates).await.unwrap();

    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].node_id, "t1");
    assert_eq!(response.errors[0].error, "Expected p");

    let request = &server.requests()[0];
    assert!(request.request_line.starts_with("POST /api/v1/pages/home/dom?localeId=c-fr "));
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"nodes": [
            {"nodeId": "t1", "text": "Bonjour"},
            {"nodeId": "i1", "propertyOverrides": [{"propertyId": "title", "text": "Titre"}]}
        ]})
    );
}

#[tokio::test]
async fn test_setComponentProperties_shouldPostProperties() {
    let server = ScriptedServer::start(vec![CannedResponse::json(200, r#"{"errors": []}"#)]).await;
    let store = rest_store(&server);
    let properties = vec![PropertyUpdate {
        property_id: "cta".to_string(),
        text: "Acheter".to_string(),
    }];

    let response = store.set_component_properties("card", "c-fr", &properties).await.unwrap();

    assert!(response.is_ok());
    let request = &server.requests()[0];
    assert!(request.request_line.starts_with("POST /api/v1/components/card/properties?localeId=c-fr "));
    assert!(request.body.contains(r#""propertyId":"cta""#));
}

#[tokio::test]
async fn test_getDocumentNodes_withNotFound_shouldMapToStoreNotFound() {
    let server = ScriptedServer::start(vec![CannedResponse::json(404, r#"{"error": "no such page"}"#)]).await;
    let store = rest_store(&server);

    let result = store.get_document_nodes(&page("missing"), None, None).await;

    match result {
        Err(StoreError::NotFound(what)) => assert!(what.contains("missing")),
        other => panic!("expected not found, got {:?}", other),
    }
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_getLocales_withForbidden_shouldSurfaceAuthError() {
    let server = ScriptedServer::start(vec![CannedResponse::json(403, "{}")]).await;
    let store = rest_store(&server);

    let result = store.get_locales("site-1").await;

    assert!(matches!(result, Err(StoreError::Http(ProviderError::AuthenticationError(_)))));
}

/// Full pipeline over HTTP: one fetch, one backend call, one write
#[tokio::test]
async fn test_orchestrator_withRestStore_shouldWriteTranslatedNodes() {
    let server = ScriptedServer::start(vec![
        CannedResponse::json(200, r#"{"nodes": [{"id": "t1", "type": "text", "text": {"text": "Hello"}}]}"#),
        CannedResponse::json(200, r#"{"errors": []}"#),
    ])
    .await;
    let store = rest_store(&server);
    let backend = Arc::new(MockBackend::working());
    let service = service(backend.clone());

    let summary = LocaleOrchestrator::new(&store, &service, SyncOptions::default())
        .run(&page("home"), &locale("en", None), &[target("fr")])
        .await;

    assert!(summary.is_complete_success());
    assert_eq!(summary.total_nodes, 1);
    assert_eq!(summary.total_calls, 3);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].request_line.starts_with("POST /api/v1/pages/home/dom?localeId=cms-fr "));
    assert!(requests[1].body.contains("[fr] Hello"));
}
