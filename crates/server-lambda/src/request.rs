// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use lambda_runtime::LambdaEvent;
use serde_json::Value;

use common::http::{RequestHead, RequestPayload};

// as lambda_runtime::LambdaEvent and common::http::RequestHead are in
// different crates from this one, we must wrap the request with our own
// struct
pub struct LambdaRequest<'a> {
    event: &'a LambdaEvent<Value>,
    method: http::Method,
    path: String,
}

impl<'a> LambdaRequest<'a> {
    pub fn new(event: &'a LambdaEvent<Value>) -> LambdaRequest<'a> {
        // An event without a recognizable method is answered by the method
        // policy (405), not executed.
        let method = event.payload["httpMethod"]
            .as_str()
            .and_then(|method| method.parse::<http::Method>().ok())
            .unwrap_or_else(|| http::Method::from_bytes(b"UNKNOWN").unwrap_or(http::Method::GET));

        let path = event.payload["path"].as_str().unwrap_or("/").to_string();

        LambdaRequest {
            event,
            method,
            path,
        }
    }
}

impl RequestHead for LambdaRequest<'_> {
    fn get_headers(&self, key: &str) -> Vec<String> {
        // handle "headers" field
        let mut headers: Vec<String> = self.event.payload["headers"]
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| {
                        if k.eq_ignore_ascii_case(key) {
                            v.as_str().map(str::to_string)
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        // handle "multiValueHeaders" field
        // https://aws.amazon.com/blogs/compute/support-for-multi-value-parameters-in-amazon-api-gateway/
        if let Some(header_map) = self.event.payload["multiValueHeaders"].as_object() {
            for (header, value) in header_map {
                if header.eq_ignore_ascii_case(key) {
                    if let Some(array) = value.as_array() {
                        for value in array.iter() {
                            if let Some(value) = value.as_str() {
                                headers.push(value.to_string())
                            }
                        }
                    }
                }
            }
        }

        headers
    }

    fn get_ip(&self) -> Option<std::net::IpAddr> {
        self.event
            .payload
            .get("requestContext")
            .and_then(|context| context.get("identity"))
            .and_then(|identity| identity.get("sourceIp"))
            .and_then(|source_ip| source_ip.as_str())
            .and_then(|source_ip| source_ip.parse::<std::net::IpAddr>().ok())
    }

    fn get_path(&self) -> &str {
        &self.path
    }

    fn get_method(&self) -> &http::Method {
        &self.method
    }
}

pub struct LambdaRequestPayload<'a> {
    head: LambdaRequest<'a>,
    body: Value,
}

impl<'a> LambdaRequestPayload<'a> {
    pub fn new(event: &'a LambdaEvent<Value>) -> LambdaRequestPayload<'a> {
        LambdaRequestPayload {
            body: parse_body(&event.payload),
            head: LambdaRequest::new(event),
        }
    }
}

impl RequestPayload for LambdaRequestPayload<'_> {
    fn get_head(&self) -> &(dyn RequestHead + Send + Sync) {
        &self.head
    }

    fn take_body(&mut self) -> Value {
        self.body.take()
    }
}

/// Decode the transported body to the JSON it carries.
///
/// Bodies may arrive base64-encoded (`isBase64Encoded`); decoding happens
/// before JSON parsing, and decode or parse failure is equivalent to an
/// absent body.
fn parse_body(payload: &Value) -> Value {
    let Some(raw) = payload["body"].as_str() else {
        return Value::Null;
    };

    let bytes = if payload["isBase64Encoded"].as_bool().unwrap_or(false) {
        match BASE64.decode(raw) {
            Ok(bytes) => bytes,
            Err(_) => return Value::Null,
        }
    } else {
        raw.as_bytes().to_vec()
    };

    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
