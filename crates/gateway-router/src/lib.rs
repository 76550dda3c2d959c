// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The gateway boundary: turns a transport-level request into a GraphQL
//! operation execution and back, producing a well-formed response on every
//! code path.

use async_trait::async_trait;
use http::{Method, StatusCode};
use serde_json::json;
use tracing::{error, info, instrument};

use common::http::{Headers, RequestPayload, ResponseBody, ResponsePayload};
use common::router::Router;
use gateway_resolver::context::ContextBuilder;
use gateway_resolver::execution::{OperationExecutor, OperationsPayload};

const ALLOWED_METHODS: &str = "POST, GET";

pub struct GraphQLRouter {
    executor: OperationExecutor,
    context_builder: ContextBuilder,
}

impl GraphQLRouter {
    pub fn new(executor: OperationExecutor, context_builder: ContextBuilder) -> Self {
        Self {
            executor,
            context_builder,
        }
    }

    fn info_response(&self) -> ResponsePayload {
        text_response(
            StatusCode::OK,
            "Arbor GraphQL gateway. Send GraphQL operations as POST requests with a JSON body.",
        )
    }

    fn method_not_allowed(&self) -> ResponsePayload {
        let mut headers = Headers::new();
        headers.insert("allow".into(), ALLOWED_METHODS.into());

        ResponsePayload {
            body: ResponseBody::None,
            headers,
            status_code: StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    async fn handle_post(&self, request: &mut (dyn RequestPayload + Send)) -> ResponsePayload {
        // Body validation happens before context building so that malformed
        // requests never cost an identity-provider call.
        let body = request.take_body();

        let operations_payload = match OperationsPayload::from_json(body) {
            Ok(payload) => payload,
            Err(_) => return text_response(StatusCode::BAD_REQUEST, "Invalid query payload"),
        };

        if operations_payload.non_empty_query().is_none() {
            return text_response(StatusCode::BAD_REQUEST, "Invalid query payload");
        }

        let request_context = self.context_builder.build(request.get_head()).await;

        match self.executor.execute(operations_payload, &request_context).await {
            Ok(response) => {
                let mut headers = Headers::new();
                headers.insert("content-type".into(), "application/json".into());

                // Serialization of the response shape cannot fail
                let body = serde_json::to_vec(&response).unwrap_or_default();

                ResponsePayload {
                    body: ResponseBody::Bytes(body),
                    headers,
                    status_code: StatusCode::OK,
                }
            }
            Err(err) => {
                // Full detail stays server-side; the client sees a minimized
                // message.
                error!("Error while executing operation: {err}");

                let mut headers = Headers::new();
                headers.insert("content-type".into(), "application/json".into());

                let body = json!({
                    "errors": [{ "message": err.user_error_message() }]
                });

                ResponsePayload {
                    body: ResponseBody::Bytes(body.to_string().into_bytes()),
                    headers,
                    status_code: StatusCode::INTERNAL_SERVER_ERROR,
                }
            }
        }
    }
}

#[async_trait]
impl Router for GraphQLRouter {
    #[instrument(name = "GraphQLRouter::route", skip_all)]
    async fn route(&self, request: &mut (dyn RequestPayload + Send)) -> Option<ResponsePayload> {
        let method = {
            let head = request.get_head();
            match head.get_ip() {
                Some(ip) => info!("{} {} from {ip}", head.get_method(), head.get_path()),
                None => info!("{} {}", head.get_method(), head.get_path()),
            }
            head.get_method().clone()
        };

        let response = match method {
            Method::GET => self.info_response(),
            Method::POST => self.handle_post(request).await,
            _ => self.method_not_allowed(),
        };

        Some(response)
    }
}

fn text_response(status_code: StatusCode, message: &str) -> ResponsePayload {
    let mut headers = Headers::new();
    headers.insert("content-type".into(), "text/plain".into());

    ResponsePayload {
        body: ResponseBody::Bytes(message.as_bytes().to_vec()),
        headers,
        status_code,
    }
}
