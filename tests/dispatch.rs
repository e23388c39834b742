//! End-to-end tests over real TCP connections.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use modelmap::filter::FilterSet;
use modelmap::provider::EchoProvider;
use modelmap::{Outcome, Payload, Provider, ProviderFault, Registry, Reply, RequestContext};
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

fn echo_registry() -> Registry {
    let registry = Registry::new();
    registry.register(EchoProvider).unwrap();
    registry
}

#[tokio::test]
async fn test_read_with_implicit_filters() {
    let server = common::start_server(&echo_registry()).await;

    let res = common::client()
        .get(server.url("/echos/10/color"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "id": {"Key": "id", "CompareType": 1, "Value": "10"},
            "property": {"Key": "property", "CompareType": 1, "Value": "color"}
        })
    );
}

#[tokio::test]
async fn test_explicit_filters_are_form_decoded() {
    let server = common::start_server(&echo_registry()).await;

    let res = common::client()
        .get(server.url("/echos/?filter=age%2Cge%2C30%3Bname%2Ceq%2Cbob+smith"))
        .send()
        .await
        .unwrap();

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["age"], json!({"Key": "age", "CompareType": 4, "Value": "30"}));
    assert_eq!(body["name"]["Value"], "bob smith");
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let server = common::start_server(&echo_registry()).await;
    let client = common::client();

    let first = client.get(server.url("/echos/7")).send().await.unwrap().text().await.unwrap();
    let second = client.get(server.url("/echos/7")).send().await.unwrap().text().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_create_update_delete() {
    let server = common::start_server(&echo_registry()).await;
    let client = common::client();

    let created: Value = client
        .post(server.url("/echos/"))
        .body(r#"{"name":"n","description":"d"}"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created, json!({"name": "n", "description": "d"}));

    let updated: Value = client
        .put(server.url("/echos/3"))
        .body(r#"{"name":"m"}"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["info"], json!({"name": "m", "description": ""}));
    assert_eq!(updated["filter"]["id"]["Value"], "3");

    let deleted: Value = client
        .delete(server.url("/echos/3"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted["id"]["Value"], "3");
}

/// Counts how many times any operation reaches it.
#[derive(Default)]
struct Counting {
    calls: AtomicUsize,
}

struct CountingProvider(Arc<Counting>);

impl Provider for CountingProvider {
    fn name(&self) -> &str {
        "Counter"
    }

    fn create(&self, _ctx: &mut RequestContext, _input: &Payload) -> Outcome {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Reply::message("created"))
    }

    fn read(&self, ctx: &mut RequestContext, _filters: &FilterSet) -> Outcome {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        let visits = ctx.session().get::<u64>("visits").unwrap_or(0) + 1;
        ctx.session_mut()
            .insert("visits", visits)
            .map_err(|e| ProviderFault::with_source("session write failed", e))?;
        Ok(Reply::from(json!({ "visits": visits })))
    }

    fn update(&self, _ctx: &mut RequestContext, _filters: &FilterSet, _input: &Payload) -> Outcome {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Reply::message("updated"))
    }

    fn delete(&self, _ctx: &mut RequestContext, _filters: &FilterSet) -> Outcome {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Reply::message("deleted"))
    }
}

#[tokio::test]
async fn test_bad_filter_skips_provider() {
    let counting = Arc::new(Counting::default());
    let registry = Registry::new();
    registry.register(CountingProvider(counting.clone())).unwrap();
    let server = common::start_server(&registry).await;

    let res = common::client()
        .put(server.url("/counters/?filter=bad"))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(SET_COOKIE).is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!("Expecting exactly 3 operands for filter rule"));
    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_operator() {
    let server = common::start_server(&echo_registry()).await;

    let body: Value = common::client()
        .get(server.url("/echos/?filter=age,like,3"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!("Expecting one of eq, ne, gt, ge, lt, le"));
}

#[tokio::test]
async fn test_session_round_trip() {
    let registry = Registry::new();
    registry
        .register(CountingProvider(Arc::new(Counting::default())))
        .unwrap();
    let server = common::start_server(&registry).await;
    let client = common::client();

    let first = client.get(server.url("/counters/")).send().await.unwrap();
    let cookie = first.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("modelmap_session="));
    assert!(cookie.contains("HttpOnly"));
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["visits"], 1);

    let pair = cookie.split(';').next().unwrap().to_string();
    let second: Value = client
        .get(server.url("/counters/"))
        .header(COOKIE, pair)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["visits"], 2);

    // A forged cookie is ignored, not rejected.
    let forged: Value = client
        .get(server.url("/counters/"))
        .header(COOKIE, "modelmap_session=forged.0.sig")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(forged["visits"], 1);
}

#[tokio::test]
async fn test_unknown_resource_and_redirect() {
    let server = common::start_server(&echo_registry()).await;
    let client = common::client();

    let missing = client.get(server.url("/nothings/")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let bare = client.get(server.url("/echos?filter=a,eq,b")).send().await.unwrap();
    assert_eq!(bare.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(bare.headers()["location"], "/echos/?filter=a,eq,b");
}

#[tokio::test]
async fn test_unsupported_method_is_fatal() {
    let server = common::start_server(&echo_registry()).await;

    let res = common::client()
        .patch(server.url("/echos/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let server = common::start_server(&echo_registry()).await;

    let res = common::client()
        .get(server.url("/echos/"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");

    let generated = common::client().get(server.url("/echos/")).send().await.unwrap();
    assert!(generated.headers().contains_key("x-request-id"));
}
