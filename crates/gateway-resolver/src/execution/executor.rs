// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use async_graphql_parser::types::{OperationType, Selection};
use async_recursion::async_recursion;
use serde_json::{Map, Value, json};
use tracing::{error, instrument, warn};

use arbor_env::{EnvError, Environment};
use common::env_const::ARBOR_MAX_SELECTION_DEPTH;
use common::introspection::{IntrospectionMode, introspection_mode};

use crate::context::RequestContext;
use crate::schema::Schema;

use super::error::{ExecutionError, ValidationError};
use super::operation_payload::OperationsPayload;
use super::resolver_map::{ResolverError, ResolverMap};
use super::response::{ErrorLocation, GraphQLError, QueryResponse};
use super::validation::{FieldCollector, ValidatedField, parse_query, select_operation};

const DEFAULT_QUERY_DEPTH: usize = 5;

// Hard-coded to accommodate the nesting of tooling-issued introspection
// queries.
const INTROSPECTION_QUERY_DEPTH: usize = 15;

/// Executes a validated operation against the resolver map.
///
/// The schema and resolver map are process-wide and read-only; the request
/// context is threaded by reference into every resolver invocation so that
/// resolvers can make their own authorization decisions.
pub struct OperationExecutor {
    schema: Arc<Schema>,
    resolvers: ResolverMap,
    introspection: IntrospectionMode,
    normal_query_depth_limit: usize,
}

impl OperationExecutor {
    pub fn new(
        schema: Arc<Schema>,
        resolvers: ResolverMap,
        env: &dyn Environment,
    ) -> Result<Self, EnvError> {
        let normal_query_depth_limit = match env.get(ARBOR_MAX_SELECTION_DEPTH) {
            Some(value) => match value.parse::<usize>() {
                Ok(depth) => depth,
                Err(_) => {
                    return Err(EnvError::InvalidEnum {
                        env_key: ARBOR_MAX_SELECTION_DEPTH,
                        env_value: value,
                        message: "Must be set to a positive integer".to_string(),
                    });
                }
            },
            None => DEFAULT_QUERY_DEPTH,
        };

        Ok(Self {
            schema,
            resolvers,
            introspection: introspection_mode(env)?,
            normal_query_depth_limit,
        })
    }

    /// Execute one operation to its single synchronous result.
    ///
    /// `Ok` carries the response even when it reports GraphQL-level errors
    /// (parse/validation failures, field-level resolver errors); `Err` is
    /// reserved for faults that abort the operation and must surface as a
    /// server error.
    #[instrument(name = "OperationExecutor::execute", skip_all)]
    pub async fn execute(
        &self,
        payload: OperationsPayload,
        request_context: &RequestContext,
    ) -> Result<QueryResponse, ExecutionError> {
        match self.try_execute(payload, request_context).await {
            Ok(response) => Ok(response),
            Err(Problem::Validation(err)) => Ok(QueryResponse::from_validation(err)),
            Err(Problem::Fault(err)) => Err(err),
        }
    }

    async fn try_execute(
        &self,
        payload: OperationsPayload,
        request_context: &RequestContext,
    ) -> Result<QueryResponse, Problem> {
        let query = payload
            .non_empty_query()
            .ok_or(Problem::Validation(ValidationError::NoOperationFound))?;

        let document = parse_query(query)?;

        let operation = select_operation(document.operations, payload.operation_name.clone())?;

        let root_type = match operation.node.ty {
            OperationType::Query => self.schema.index.query_type(),
            OperationType::Mutation => self.schema.index.mutation_type().ok_or_else(|| {
                Problem::Validation(ValidationError::OperationTypeNotSupported(
                    "mutation".to_string(),
                ))
            })?,
            OperationType::Subscription => {
                // The single-result contract of this executor cannot carry an
                // incremental response.
                warn!("Rejecting subscription operation");
                return Err(Problem::Fault(ExecutionError::SubscriptionsNotSupported));
            }
        };

        let selection_set = &operation.node.selection_set.node;

        let is_introspection = selection_set.items.iter().any(|selection| {
            matches!(
                &selection.node,
                Selection::Field(field)
                    if field.node.name.node.as_str() == "__schema"
                        || field.node.name.node.as_str() == "__type"
            )
        });

        let variables = payload.variables.unwrap_or_default();

        let collector = FieldCollector {
            index: &self.schema.index,
            fragments: &document.fragments,
            variables: &variables,
            introspection_enabled: self.introspection == IntrospectionMode::Enabled,
            depth_limit: if is_introspection {
                INTROSPECTION_QUERY_DEPTH
            } else {
                self.normal_query_depth_limit
            },
        };

        let fields = collector.collect(Some(root_type), selection_set, 1)?;

        let mut data = Map::new();
        let mut errors = vec![];

        // Fields resolve sequentially; a mutation's side effects are thus
        // observed in document order.
        for field in &fields {
            let value = self
                .resolve_field(
                    Some(root_type),
                    field,
                    &Value::Null,
                    request_context,
                    &mut errors,
                    &[],
                )
                .await
                .map_err(Problem::Fault)?;
            data.insert(field.output_name(), value);
        }

        Ok(QueryResponse {
            data: Some(Value::Object(data)),
            errors,
        })
    }

    #[async_recursion]
    async fn resolve_field(
        &self,
        parent_type: Option<&str>,
        field: &ValidatedField,
        parent_value: &Value,
        request_context: &RequestContext,
        errors: &mut Vec<GraphQLError>,
        path: &[Value],
    ) -> Result<Value, ExecutionError> {
        let mut field_path = path.to_vec();
        field_path.push(Value::String(field.output_name()));

        if field.name == "__typename" {
            return Ok(parent_type.map(|typ| json!(typ)).unwrap_or(Value::Null));
        }

        // Introspection meta fields are only meaningful at the root, where
        // the parent value is null.
        if parent_value.is_null() && field.name == "__schema" {
            let raw = self.schema.index.introspect_schema();
            return self
                .project(None, &field.subfields, raw, request_context, errors, &field_path)
                .await;
        }
        if parent_value.is_null() && field.name == "__type" {
            let raw = match field.arguments.get("name").and_then(Value::as_str) {
                Some(name) => self.schema.index.introspect_type(name),
                None => {
                    errors.push(GraphQLError {
                        message: "Field '__type' requires argument 'name'".to_string(),
                        locations: vec![location(field)],
                        path: field_path,
                    });
                    return Ok(Value::Null);
                }
            };
            return self
                .project(None, &field.subfields, raw, request_context, errors, &field_path)
                .await;
        }

        let resolved = match parent_type.and_then(|typ| self.resolvers.get(typ, &field.name)) {
            Some(resolver) => {
                match resolver(parent_value, &field.arguments, request_context).await {
                    Ok(value) => value,
                    Err(ResolverError::Invalid(message)) => {
                        errors.push(GraphQLError {
                            message,
                            locations: vec![location(field)],
                            path: field_path,
                        });
                        return Ok(Value::Null);
                    }
                    Err(ResolverError::Fault(message)) => {
                        return Err(ExecutionError::ResolverFault {
                            path: path_display(&field_path),
                            message,
                        });
                    }
                }
            }
            None => {
                if parent_value.is_null() {
                    // A root field with neither resolver nor parent value is
                    // a server misconfiguration, not a client error.
                    return Err(ExecutionError::NoResolverFound {
                        typ: parent_type.unwrap_or_default().to_string(),
                        field: field.name.clone(),
                    });
                }

                // Default resolver: property lookup on the parent value.
                parent_value
                    .get(&field.name)
                    .cloned()
                    .unwrap_or(Value::Null)
            }
        };

        if field.subfields.is_empty() {
            return Ok(resolved);
        }

        let field_type = parent_type
            .and_then(|typ| self.schema.index.field_type(typ, &field.name))
            .filter(|typ| self.schema.index.is_object_type(typ));

        self.project(
            field_type,
            &field.subfields,
            resolved,
            request_context,
            errors,
            &field_path,
        )
        .await
    }

    /// Apply a subselection to a resolved value: lists element-wise, objects
    /// field-by-field (registered resolvers first, property lookup
    /// otherwise).
    #[async_recursion]
    async fn project(
        &self,
        type_name: Option<&str>,
        subfields: &[ValidatedField],
        value: Value,
        request_context: &RequestContext,
        errors: &mut Vec<GraphQLError>,
        path: &[Value],
    ) -> Result<Value, ExecutionError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Array(items) => {
                let mut projected = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let mut item_path = path.to_vec();
                    item_path.push(json!(index));
                    projected.push(
                        self.project(
                            type_name,
                            subfields,
                            item,
                            request_context,
                            errors,
                            &item_path,
                        )
                        .await?,
                    );
                }
                Ok(Value::Array(projected))
            }
            Value::Object(_) => {
                let mut object = Map::new();
                for subfield in subfields {
                    let resolved = self
                        .resolve_field(
                            type_name,
                            subfield,
                            &value,
                            request_context,
                            errors,
                            path,
                        )
                        .await?;
                    object.insert(subfield.output_name(), resolved);
                }
                Ok(Value::Object(object))
            }
            // A scalar under a subselection: validation rejected the
            // selections the schema knows about, so this is a resolver
            // returning a shape the schema does not promise. Pass it through.
            other => {
                error!(
                    "Value at '{}' is not an object; returning it unprojected",
                    path_display(path)
                );
                Ok(other)
            }
        }
    }
}

fn location(field: &ValidatedField) -> ErrorLocation {
    ErrorLocation {
        line: field.pos.line,
        column: field.pos.column,
    }
}

fn path_display(path: &[Value]) -> String {
    path.iter()
        .map(|segment| match segment {
            Value::String(name) => name.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

enum Problem {
    Validation(ValidationError),
    Fault(ExecutionError),
}

impl From<ValidationError> for Problem {
    fn from(err: ValidationError) -> Self {
        Problem::Validation(err)
    }
}
