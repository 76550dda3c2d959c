// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::context::RequestContext;

/// Error returned by a resolver invocation.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// A field-level error: reported in the response's `errors` list while
    /// the rest of the operation continues. The message is shown to clients.
    #[error("{0}")]
    Invalid(String),

    /// An internal fault: aborts the operation. The message is logged
    /// server-side and never shown to clients.
    #[error("{0}")]
    Fault(String),
}

pub type ResolverResult<'a> = BoxFuture<'a, Result<Value, ResolverError>>;

/// A resolver computes the value of one schema field given the parent value,
/// the field arguments, and the per-request context.
pub type ResolverFn = Box<
    dyn for<'a> Fn(&'a Value, &'a Map<String, Value>, &'a RequestContext) -> ResolverResult<'a>
        + Send
        + Sync,
>;

/// The schema's business-logic surface: `(type name, field name)` to the
/// function resolving that field.
#[derive(Default)]
pub struct ResolverMap {
    resolvers: HashMap<String, HashMap<String, ResolverFn>>,
}

impl ResolverMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, type_name: &str, field_name: &str, resolver: F)
    where
        F: for<'a> Fn(&'a Value, &'a Map<String, Value>, &'a RequestContext) -> ResolverResult<'a>
            + Send
            + Sync
            + 'static,
    {
        self.resolvers
            .entry(type_name.to_string())
            .or_default()
            .insert(field_name.to_string(), Box::new(resolver));
    }

    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&ResolverFn> {
        self.resolvers
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
    }
}
