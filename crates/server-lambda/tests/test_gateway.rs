use serde_json::{Map, Value, json};

use gateway_resolver::context::RequestContext;
use gateway_resolver::execution::{ResolverError, ResolverMap, ResolverResult};

mod common;

use common::{TestProvider, lambda_event, test_query, test_router, test_router_with};

const HELLO_QUERY: &str = r#"{"query":"{ hello }"}"#;

fn ok_response(body: Value) -> Value {
    json!({
        "isBase64Encoded": false,
        "statusCode": 200,
        "headers": { "content-type": "application/json" },
        "body": serde_json::to_string(&body).unwrap(),
    })
}

#[tokio::test]
async fn get_returns_informational_text() {
    let provider = TestProvider::new();
    let router = test_router(provider.clone()).await;

    test_query(
        lambda_event("GET", json!({}), None, false),
        router,
        json!({
            "isBase64Encoded": false,
            "statusCode": 200,
            "headers": { "content-type": "text/plain" },
            "body": "Arbor GraphQL gateway. Send GraphQL operations as POST requests with a JSON body.",
        }),
    )
    .await;

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn unsupported_methods_get_405_with_allow_header() {
    for method in ["DELETE", "PUT", "PATCH", "HEAD"] {
        let router = test_router(TestProvider::new()).await;

        test_query(
            lambda_event(method, json!({}), None, false),
            router,
            json!({
                "isBase64Encoded": false,
                "statusCode": 405,
                "headers": { "allow": "POST, GET" },
                "body": "",
            }),
        )
        .await;
    }
}

#[tokio::test]
async fn queryless_posts_get_400_without_identity_lookup() {
    let bad_bodies: Vec<Option<&str>> = vec![
        None,
        Some(""),
        Some("{ not json"),
        Some("{}"),
        Some(r#"{"query":""}"#),
        Some(r#"{"query":"   "}"#),
        Some(r#"{"variables":{}}"#),
    ];

    for body in bad_bodies {
        let provider = TestProvider::new();
        let router = test_router(provider.clone()).await;

        test_query(
            lambda_event(
                "POST",
                json!({ "Authorization": "Bearer valid-token" }),
                body,
                false,
            ),
            router,
            json!({
                "isBase64Encoded": false,
                "statusCode": 400,
                "headers": { "content-type": "text/plain" },
                "body": "Invalid query payload",
            }),
        )
        .await;

        assert_eq!(provider.call_count(), 0, "body {body:?} cost a provider call");
    }
}

#[tokio::test]
async fn undecodable_base64_body_gets_400() {
    let router = test_router(TestProvider::new()).await;

    test_query(
        lambda_event("POST", json!({}), Some("!!! not base64 !!!"), true),
        router,
        json!({
            "isBase64Encoded": false,
            "statusCode": 400,
            "headers": { "content-type": "text/plain" },
            "body": "Invalid query payload",
        }),
    )
    .await;
}

#[tokio::test]
async fn hello_anonymous() {
    let provider = TestProvider::new();
    let router = test_router(provider.clone()).await;

    test_query(
        lambda_event("POST", json!({}), Some(HELLO_QUERY), false),
        router,
        ok_response(json!({ "data": { "hello": "Hello world!" } })),
    )
    .await;

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn hello_authenticated() {
    let provider = TestProvider::new();
    let router = test_router(provider.clone()).await;

    test_query(
        lambda_event(
            "POST",
            json!({ "Authorization": "Bearer valid-token" }),
            Some(HELLO_QUERY),
            false,
        ),
        router,
        ok_response(json!({ "data": { "hello": "Hello user@example.com!" } })),
    )
    .await;

    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn unknown_credential_is_anonymous() {
    let router = test_router(TestProvider::new()).await;

    test_query(
        lambda_event(
            "POST",
            json!({ "Authorization": "Bearer some-other-token" }),
            Some(HELLO_QUERY),
            false,
        ),
        router,
        ok_response(json!({ "data": { "hello": "Hello world!" } })),
    )
    .await;
}

#[tokio::test]
async fn identity_provider_outage_fails_open() {
    let provider = TestProvider::failing();
    let router = test_router(provider.clone()).await;

    test_query(
        lambda_event(
            "POST",
            json!({ "Authorization": "Bearer valid-token" }),
            Some(HELLO_QUERY),
            false,
        ),
        router,
        ok_response(json!({ "data": { "hello": "Hello world!" } })),
    )
    .await;

    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn base64_encoded_body_executes() {
    use base64::Engine as _;

    let router = test_router(TestProvider::new()).await;
    let encoded = base64::engine::general_purpose::STANDARD.encode(HELLO_QUERY);

    test_query(
        lambda_event("POST", json!({}), Some(&encoded), true),
        router,
        ok_response(json!({ "data": { "hello": "Hello world!" } })),
    )
    .await;
}

#[tokio::test]
async fn current_user_reflects_the_session() {
    let router = test_router(TestProvider::new()).await;

    test_query(
        lambda_event(
            "POST",
            json!({ "Authorization": "Bearer valid-token" }),
            Some(r#"{"query":"{ currentUser { id email } }"}"#),
            false,
        ),
        router,
        ok_response(json!({ "data": { "currentUser": {
            "id": "user-1",
            "email": "user@example.com"
        }}})),
    )
    .await;
}

#[tokio::test]
async fn current_user_is_null_for_anonymous_callers() {
    let router = test_router(TestProvider::new()).await;

    test_query(
        lambda_event(
            "POST",
            json!({}),
            Some(r#"{"query":"{ currentUser { id email } }"}"#),
            false,
        ),
        router,
        ok_response(json!({ "data": { "currentUser": null } })),
    )
    .await;
}

#[tokio::test]
async fn mutations_execute() {
    let router = test_router(TestProvider::new()).await;

    test_query(
        lambda_event(
            "POST",
            json!({}),
            Some(r#"{"query":"mutation { noop }"}"#),
            false,
        ),
        router,
        ok_response(json!({ "data": { "noop": "This mutation does nothing yet." } })),
    )
    .await;
}

fn boom<'a>(
    _parent: &'a Value,
    _args: &'a Map<String, Value>,
    _context: &'a RequestContext,
) -> ResolverResult<'a> {
    Box::pin(async move {
        Err(ResolverError::Fault(
            "identity anon key SECRET_MARKER rejected".to_string(),
        ))
    })
}

#[tokio::test]
async fn resolver_faults_get_500_with_minimized_message() {
    let dir = tempfile::tempdir().unwrap();

    let mut resolvers = ResolverMap::new();
    resolvers.register("Query", "boom", boom);

    let router = test_router_with(
        dir.path(),
        "type Query { boom: String }",
        resolvers,
        TestProvider::new(),
    )
    .await;

    test_query(
        lambda_event("POST", json!({}), Some(r#"{"query":"{ boom }"}"#), false),
        router,
        json!({
            "isBase64Encoded": false,
            "statusCode": 500,
            "headers": { "content-type": "application/json" },
            "body": r#"{"errors":[{"message":"Internal server error"}]}"#,
        }),
    )
    .await;
}
