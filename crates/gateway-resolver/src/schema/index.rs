// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_graphql_parser::types::{
    BaseType, ServiceDocument, Type, TypeKind, TypeSystemDefinition,
};
use serde_json::{Value, json};

use super::SchemaLoadError;

/// Field layout of the schema's object types, derived once from the SDL.
///
/// Maps each object type to its fields and each field to the named type it
/// produces (lists and non-null wrappers unwrapped). Scalar and enum types
/// are represented by absence.
#[derive(Debug)]
pub struct SchemaIndex {
    objects: HashMap<String, Vec<(String, String)>>,
    query_type: String,
    mutation_type: Option<String>,
}

impl SchemaIndex {
    pub fn build(document: &ServiceDocument) -> Result<Self, SchemaLoadError> {
        let mut objects = HashMap::new();
        let mut query_root = None;
        let mut mutation_root = None;

        for definition in &document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema_definition) => {
                    query_root = schema_definition
                        .node
                        .query
                        .as_ref()
                        .map(|name| name.node.to_string());
                    mutation_root = schema_definition
                        .node
                        .mutation
                        .as_ref()
                        .map(|name| name.node.to_string());
                }
                TypeSystemDefinition::Type(type_definition) => {
                    if let TypeKind::Object(object) = &type_definition.node.kind {
                        let fields = object
                            .fields
                            .iter()
                            .map(|field| {
                                (
                                    field.node.name.node.to_string(),
                                    base_type_name(&field.node.ty.node),
                                )
                            })
                            .collect();
                        objects.insert(type_definition.node.name.node.to_string(), fields);
                    }
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        let query_type = query_root.unwrap_or_else(|| "Query".to_string());
        if !objects.contains_key(&query_type) {
            return Err(SchemaLoadError::MissingQueryType);
        }

        let mutation_type = mutation_root
            .or_else(|| objects.contains_key("Mutation").then(|| "Mutation".to_string()));

        Ok(Self {
            objects,
            query_type,
            mutation_type,
        })
    }

    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    pub fn is_object_type(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// The named type produced by `type_name.field_name`, if declared.
    pub fn field_type(&self, type_name: &str, field_name: &str) -> Option<&str> {
        self.objects.get(type_name).and_then(|fields| {
            fields
                .iter()
                .find(|(name, _)| name == field_name)
                .map(|(_, typ)| typ.as_str())
        })
    }

    /// Minimal `__schema` answer: root operation types and object type names.
    pub fn introspect_schema(&self) -> Value {
        let mut type_names: Vec<&String> = self.objects.keys().collect();
        type_names.sort();

        json!({
            "queryType": { "name": self.query_type },
            "mutationType": self.mutation_type.as_ref().map(|name| json!({ "name": name })),
            "types": type_names
                .into_iter()
                .map(|name| self.introspect_type(name))
                .collect::<Vec<_>>(),
        })
    }

    /// Minimal `__type` answer: kind, name, and field names. `null` for
    /// types the index does not know.
    pub fn introspect_type(&self, name: &str) -> Value {
        match self.objects.get(name) {
            Some(fields) => json!({
                "kind": "OBJECT",
                "name": name,
                "fields": fields
                    .iter()
                    .map(|(field_name, _)| json!({ "name": field_name }))
                    .collect::<Vec<_>>(),
            }),
            None => Value::Null,
        }
    }
}

fn base_type_name(ty: &Type) -> String {
    match &ty.base {
        BaseType::Named(name) => name.to_string(),
        BaseType::List(inner) => base_type_name(inner),
    }
}
