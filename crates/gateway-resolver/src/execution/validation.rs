// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_graphql_parser::{
    Pos, Positioned,
    types::{
        DocumentOperations, Field, FragmentDefinition, OperationDefinition, Selection,
        SelectionSet,
    },
};
use async_graphql_value::{ConstValue, Name};
use serde_json::{Map, Value};

use crate::schema::SchemaIndex;

use super::error::ValidationError;

/// A field of the operation after validation: alias resolved, fragments
/// flattened, variables substituted into arguments.
#[derive(Debug)]
pub struct ValidatedField {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Map<String, Value>,
    pub subfields: Vec<ValidatedField>,
    pub pos: Pos,
}

impl ValidatedField {
    pub fn output_name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| self.name.clone())
    }
}

/// Parse a query per `system_resolver::parse_query` conventions: the parser's
/// error is folded into a [`ValidationError`] carrying up to two positions.
pub fn parse_query(query: &str) -> Result<async_graphql_parser::types::ExecutableDocument, ValidationError> {
    async_graphql_parser::parse_query(query).map_err(|error| {
        let (message, pos1, pos2) = match error {
            async_graphql_parser::Error::Syntax {
                message,
                start,
                end,
            } => {
                // Error::Syntax's message is formatted with newlines, escape them properly
                let message = message.escape_debug();
                (format!("Syntax error: {message}"), start, end)
            }
            async_graphql_parser::Error::MultipleRoots { root, schema, pos } => {
                (format!("Multiple roots of {root} type"), schema, Some(pos))
            }
            async_graphql_parser::Error::MissingQueryRoot { pos } => {
                ("Missing query root".to_string(), pos, None)
            }
            async_graphql_parser::Error::MultipleOperations {
                anonymous,
                operation,
            } => (
                "Multiple operations".to_string(),
                anonymous,
                Some(operation),
            ),
            async_graphql_parser::Error::OperationDuplicated {
                operation: _,
                first,
                second,
            } => ("Operation duplicated".to_string(), first, Some(second)),
            async_graphql_parser::Error::FragmentDuplicated {
                fragment,
                first,
                second,
            } => (
                format!("Fragment {fragment} duplicated"),
                first,
                Some(second),
            ),
            async_graphql_parser::Error::MissingOperation => {
                ("Missing operation".to_string(), Pos::default(), None)
            }
            _ => ("Unknown error".to_string(), Pos::default(), None),
        };

        ValidationError::QueryParsingFailed(message, pos1, pos2)
    })
}

/// Select the operation to execute.
///
/// Per the GraphQL over-HTTP convention, `operationName` is required only
/// when the document truly holds several operations.
pub fn select_operation(
    operations: DocumentOperations,
    operation_name: Option<String>,
) -> Result<Positioned<OperationDefinition>, ValidationError> {
    match operations {
        DocumentOperations::Single(operation) => Ok(operation),
        DocumentOperations::Multiple(mut operations) => {
            if operations.is_empty() {
                Err(ValidationError::NoOperationFound)
            } else {
                match operation_name {
                    None if operations.len() == 1 => {
                        // This unwrap is okay because we already checked that there is exactly one operation.
                        let (_, operation) = operations.into_iter().next().unwrap();
                        Ok(operation)
                    }
                    None => Err(ValidationError::MultipleOperationsNoOperationName),
                    Some(operation_name) => operations
                        .remove(&Name::new(&operation_name))
                        .ok_or(ValidationError::MultipleOperationsUnmatchedOperationName(
                            operation_name,
                        )),
                }
            }
        }
    }
}

/// Flattens an operation's selection sets into [`ValidatedField`] trees,
/// checking them against the schema index along the way.
pub struct FieldCollector<'a> {
    pub index: &'a SchemaIndex,
    pub fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    pub variables: &'a Map<String, Value>,
    pub introspection_enabled: bool,
    pub depth_limit: usize,
}

impl FieldCollector<'_> {
    /// `type_name` is `None` under introspection meta fields, whose shape the
    /// index does not describe; such subtrees are projected unchecked.
    pub fn collect(
        &self,
        type_name: Option<&str>,
        selection_set: &SelectionSet,
        depth: usize,
    ) -> Result<Vec<ValidatedField>, ValidationError> {
        if depth > self.depth_limit {
            return Err(ValidationError::SelectionSetTooDeep(self.depth_limit));
        }

        let mut fields = vec![];

        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    fields.push(self.collect_field(type_name, field, depth)?)
                }
                Selection::FragmentSpread(spread) => {
                    let fragment_name = &spread.node.fragment_name.node;
                    let fragment = self.fragments.get(fragment_name).ok_or_else(|| {
                        ValidationError::FragmentDefinitionNotFound(
                            fragment_name.to_string(),
                            spread.pos,
                        )
                    })?;

                    let condition = &fragment.node.type_condition.node.on.node;
                    if type_condition_matches(type_name, Some(condition)) {
                        fields.extend(self.collect(
                            type_name,
                            &fragment.node.selection_set.node,
                            depth,
                        )?);
                    }
                }
                Selection::InlineFragment(inline) => {
                    let condition = inline
                        .node
                        .type_condition
                        .as_ref()
                        .map(|type_condition| &type_condition.node.on.node);
                    if type_condition_matches(type_name, condition) {
                        fields.extend(self.collect(
                            type_name,
                            &inline.node.selection_set.node,
                            depth,
                        )?);
                    }
                }
            }
        }

        Ok(fields)
    }

    fn collect_field(
        &self,
        type_name: Option<&str>,
        field: &Positioned<Field>,
        depth: usize,
    ) -> Result<ValidatedField, ValidationError> {
        let name = field.node.name.node.as_str();
        let alias = field.node.alias.as_ref().map(|alias| alias.node.to_string());
        let pos = field.pos;

        if name == "__typename" {
            return Ok(ValidatedField {
                alias,
                name: name.to_string(),
                arguments: Map::new(),
                subfields: vec![],
                pos,
            });
        }

        if name == "__schema" || name == "__type" {
            if !self.introspection_enabled {
                return Err(ValidationError::IntrospectionDisabled(pos));
            }

            let subfields = self.collect(None, &field.node.selection_set.node, depth + 1)?;
            return Ok(ValidatedField {
                alias,
                name: name.to_string(),
                arguments: self.arguments(field)?,
                subfields,
                pos,
            });
        }

        let field_type = match type_name {
            Some(parent) => match self.index.field_type(parent, name) {
                Some(field_type) => Some(field_type),
                None => {
                    return Err(ValidationError::InvalidField(
                        name.to_string(),
                        parent.to_string(),
                        pos,
                    ));
                }
            },
            None => None,
        };

        let has_subselection = !field.node.selection_set.node.items.is_empty();

        if let Some(field_type) = field_type {
            if self.index.is_object_type(field_type) && !has_subselection {
                return Err(ValidationError::ObjectWithoutField(
                    name.to_string(),
                    field_type.to_string(),
                    pos,
                ));
            }
            if !self.index.is_object_type(field_type) && has_subselection {
                return Err(ValidationError::ScalarWithField(name.to_string(), pos));
            }
        }

        let subfields = if has_subselection {
            let subfield_type = field_type.filter(|typ| self.index.is_object_type(typ));
            self.collect(subfield_type, &field.node.selection_set.node, depth + 1)?
        } else {
            vec![]
        };

        Ok(ValidatedField {
            alias,
            name: name.to_string(),
            arguments: self.arguments(field)?,
            subfields,
            pos,
        })
    }

    fn arguments(&self, field: &Positioned<Field>) -> Result<Map<String, Value>, ValidationError> {
        let mut arguments = Map::new();

        for (argument_name, argument_value) in &field.node.arguments {
            let const_value =
                argument_value
                    .node
                    .clone()
                    .into_const_with(|variable_name| {
                        let resolved =
                            self.variables.get(variable_name.as_str()).ok_or_else(|| {
                                ValidationError::VariableNotFound(
                                    variable_name.to_string(),
                                    argument_value.pos,
                                )
                            })?;

                        ConstValue::from_json(resolved.clone()).map_err(|err| {
                            ValidationError::MalformedVariable(
                                variable_name.to_string(),
                                argument_value.pos,
                                err,
                            )
                        })
                    })?;

            let json = const_value.into_json().map_err(|err| {
                ValidationError::MalformedVariable(
                    argument_name.node.to_string(),
                    argument_name.pos,
                    err,
                )
            })?;

            arguments.insert(argument_name.node.to_string(), json);
        }

        Ok(arguments)
    }
}

fn type_condition_matches(type_name: Option<&str>, condition: Option<&Name>) -> bool {
    match (type_name, condition) {
        (_, None) => true,
        (Some(type_name), Some(condition)) => condition.as_str() == type_name,
        // Unchecked subtree: apply the fragment rather than silently dropping
        // its selections
        (None, Some(_)) => true,
    }
}
