// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::Serialize;
use serde_json::Value;

use super::error::ValidationError;

#[derive(Debug, Serialize, PartialEq)]
pub struct ErrorLocation {
    pub line: usize,
    pub column: usize,
}

/// A GraphQL-formatted error entry.
#[derive(Debug, Serialize)]
pub struct GraphQLError {
    pub message: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ErrorLocation>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
}

impl GraphQLError {
    pub fn new(message: String) -> Self {
        Self {
            message,
            locations: vec![],
            path: vec![],
        }
    }
}

/// The single synchronous result of an operation: data (possibly partial) and
/// the field-level errors collected along the way. Serializes to the standard
/// `{data?, errors?}` response shape.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl QueryResponse {
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: vec![],
        }
    }

    pub fn from_validation(error: ValidationError) -> Self {
        let mut locations = vec![ErrorLocation {
            line: error.position1().line,
            column: error.position1().column,
        }];
        if let Some(pos) = error.position2() {
            locations.push(ErrorLocation {
                line: pos.line,
                column: pos.column,
            });
        }

        Self {
            data: None,
            errors: vec![GraphQLError {
                message: error.to_string(),
                locations,
                path: vec![],
            }],
        }
    }

    pub fn to_json(&self) -> Value {
        // Serialization of this shape cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
