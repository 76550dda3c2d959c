use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use arbor_env::MapEnvironment;
use gateway_resolver::context::{
    ContextBuilder, IdentityProvider, IdentityProviderError, Session, User,
};
use gateway_resolver::execution::{OperationExecutor, ResolverMap};
use gateway_resolver::schema::SchemaLoader;
use gateway_router::GraphQLRouter;
use server_lambda::resolve;

/// Counting identity-provider double: resolves `Bearer valid-token` to a
/// known user, anything else to no session; `failing` simulates a provider
/// outage.
pub struct TestProvider {
    pub failing: bool,
    pub calls: AtomicUsize,
}

impl TestProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            failing: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            failing: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for TestProvider {
    async fn resolve_session(
        &self,
        credential: &str,
    ) -> Result<Option<Session>, IdentityProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing {
            return Err(IdentityProviderError::UnexpectedResponse(
                "status 503".to_string(),
            ));
        }

        Ok((credential == "valid-token").then(|| Session {
            user: User {
                id: "user-1".to_string(),
                email: Some("user@example.com".to_string()),
            },
            expires_at: None,
        }))
    }
}

/// A router over the crate's own `schema.graphql` and resolver map, with the
/// identity provider replaced by the test double.
pub async fn test_router(provider: Arc<TestProvider>) -> GraphQLRouter {
    let schema_path = concat!(env!("CARGO_MANIFEST_DIR"), "/schema.graphql");
    let loader = SchemaLoader::new(schema_path, "unused-fallback.graphql");
    let schema = loader.load().await.unwrap();

    let executor = OperationExecutor::new(
        schema,
        server_lambda::resolvers::resolvers(),
        &MapEnvironment::new(),
    )
    .unwrap();

    GraphQLRouter::new(executor, ContextBuilder::new(Some(provider)))
}

/// A router over an arbitrary SDL and resolver map (for failure-injection
/// tests the shipped schema cannot express).
pub async fn test_router_with(
    schema_dir: &std::path::Path,
    sdl: &str,
    resolvers: ResolverMap,
    provider: Arc<TestProvider>,
) -> GraphQLRouter {
    let schema_path = schema_dir.join("schema.graphql");
    std::fs::write(&schema_path, sdl).unwrap();

    let loader = SchemaLoader::new(schema_path, schema_dir.join("unused-fallback.graphql"));
    let schema = loader.load().await.unwrap();

    let executor = OperationExecutor::new(schema, resolvers, &MapEnvironment::new()).unwrap();

    GraphQLRouter::new(executor, ContextBuilder::new(Some(provider)))
}

/// An API-Gateway-shaped invocation event.
pub fn lambda_event(
    method: &str,
    headers: Value,
    body: Option<&str>,
    is_base64_encoded: bool,
) -> Value {
    json!({
        "httpMethod": method,
        "path": "/graphql",
        "headers": headers,
        "multiValueHeaders": {},
        "requestContext": { "identity": { "sourceIp": "1.2.3.4" } },
        "body": body,
        "isBase64Encoded": is_base64_encoded,
    })
}

pub async fn test_query(json_input: Value, router: GraphQLRouter, expected: Value) {
    let context = lambda_runtime::Context::default();
    let event = lambda_runtime::LambdaEvent::new(json_input, context);

    let result = resolve(event, Arc::new(router)).await.unwrap();

    println!(
        "!! expected: {}",
        serde_json::to_string_pretty(&expected).unwrap()
    );
    println!(
        "!! actual: {}",
        serde_json::to_string_pretty(&result).unwrap()
    );

    assert_eq!(expected, result)
}
