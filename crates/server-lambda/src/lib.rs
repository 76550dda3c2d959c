// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod request;
pub mod resolvers;

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Map, Value, json};
use tracing::error;

use arbor_env::Environment;
use common::http::{ResponseBody, ResponsePayload};
use common::router::Router;
use gateway_resolver::context::ContextBuilder;
use gateway_resolver::execution::OperationExecutor;
use gateway_resolver::schema::SchemaLoader;
use gateway_router::GraphQLRouter;
use request::LambdaRequestPayload;

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("{0}")]
    Schema(#[from] gateway_resolver::schema::SchemaLoadError),

    #[error("{0}")]
    Env(#[from] arbor_env::EnvError),
}

/// Build the router: load the schema (once), construct the executor and the
/// context builder. A schema that cannot be loaded is a fatal
/// misconfiguration.
pub async fn init_router(env: &dyn Environment) -> Result<GraphQLRouter, InitError> {
    let loader = SchemaLoader::from_env(env);
    let schema = loader.load().await?;

    let executor = OperationExecutor::new(schema, resolvers::resolvers(), env)?;

    Ok(GraphQLRouter::new(executor, ContextBuilder::from_env(env)))
}

/// Initialize the router or refuse to start: no request can be served
/// without a schema.
pub async fn init_router_or_exit(env: &dyn Environment) -> GraphQLRouter {
    match init_router(env).await {
        Ok(router) => router,
        Err(err) => {
            error!("Failed to initialize gateway: {err}");
            std::process::exit(1);
        }
    }
}

/// Handle one Lambda invocation: adapt the event to the router and the
/// router's response back to the integration shape.
pub async fn resolve(
    event: LambdaEvent<Value>,
    router: Arc<GraphQLRouter>,
) -> Result<Value, Error> {
    let mut request = LambdaRequestPayload::new(&event);

    let response = router.route(&mut request).await;

    Ok(match response {
        Some(response) => to_lambda_response(response),
        None => to_lambda_response(ResponsePayload {
            body: ResponseBody::None,
            headers: common::http::Headers::new(),
            status_code: http::StatusCode::NOT_FOUND,
        }),
    })
}

fn to_lambda_response(response: ResponsePayload) -> Value {
    // lambda marks the integration response as base64 when the body is not a
    // string, so the body is always passed as a string
    let body = match response.body {
        ResponseBody::Bytes(bytes) => String::from_utf8(bytes).unwrap_or_default(),
        ResponseBody::None => String::new(),
    };

    let headers: Map<String, Value> = response
        .headers
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    json!({
        "isBase64Encoded": false,
        "statusCode": response.status_code.as_u16(),
        "headers": headers,
        "body": body,
    })
}
