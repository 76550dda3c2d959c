// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::Pos;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{0}")]
    QueryParsingFailed(String, Pos, Option<Pos>),

    #[error("Variable '{0}' not found")]
    VariableNotFound(String, Pos),

    #[error("Variable '{0}' could not be deserialized: {2}")]
    MalformedVariable(String, Pos, serde_json::Error),

    #[error("Fragment definition '{0}' not found")]
    FragmentDefinitionNotFound(String, Pos),

    #[error("Field '{0}' is not valid for type '{1}'")]
    InvalidField(String, String, Pos),

    #[error("Field '{0}' is of a scalar type, which should not specify fields")]
    ScalarWithField(String, Pos),

    #[error("Field '{0}' of object type '{1}' must have a selection of subfields")]
    ObjectWithoutField(String, String, Pos),

    #[error("No operation found")]
    NoOperationFound,

    #[error("Must provide operation name if query contains multiple operations")]
    MultipleOperationsNoOperationName,

    #[error("operationName '{0}' doesn't match any operation")]
    MultipleOperationsUnmatchedOperationName(String),

    #[error("Schema does not support {0} operations")]
    OperationTypeNotSupported(String),

    #[error("Introspection is not enabled")]
    IntrospectionDisabled(Pos),

    #[error("Selection set exceeds the maximum depth of {0}")]
    SelectionSetTooDeep(usize),
}

impl ValidationError {
    pub fn position1(&self) -> Pos {
        match self {
            ValidationError::QueryParsingFailed(_, pos, _) => *pos,
            ValidationError::VariableNotFound(_, pos) => *pos,
            ValidationError::MalformedVariable(_, pos, _) => *pos,
            ValidationError::FragmentDefinitionNotFound(_, pos) => *pos,
            ValidationError::InvalidField(_, _, pos) => *pos,
            ValidationError::ScalarWithField(_, pos) => *pos,
            ValidationError::ObjectWithoutField(_, _, pos) => *pos,
            ValidationError::NoOperationFound => Pos::default(),
            ValidationError::MultipleOperationsNoOperationName => Pos::default(),
            ValidationError::MultipleOperationsUnmatchedOperationName(_) => Pos::default(),
            ValidationError::OperationTypeNotSupported(_) => Pos::default(),
            ValidationError::IntrospectionDisabled(pos) => *pos,
            ValidationError::SelectionSetTooDeep(_) => Pos::default(),
        }
    }

    pub fn position2(&self) -> Option<Pos> {
        match self {
            ValidationError::QueryParsingFailed(_, _, pos) => *pos,
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No resolver registered for '{typ}.{field}'")]
    NoResolverFound { typ: String, field: String },

    #[error("Error while resolving '{path}': {message}")]
    ResolverFault { path: String, message: String },

    #[error("Subscription operations are not supported")]
    SubscriptionsNotSupported,
}

impl ExecutionError {
    // Message that should be emitted when the error is returned to the user.
    // This should hide any internal details of the error.
    pub fn user_error_message(&self) -> String {
        self.explicit_message()
            .unwrap_or_else(|| "Internal server error".to_string())
    }

    fn explicit_message(&self) -> Option<String> {
        match self {
            ExecutionError::SubscriptionsNotSupported => Some(self.to_string()),
            _ => None,
        }
    }
}
