// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The schema's resolver map. Each resolver receives the parent value, the
//! field arguments, and the per-request context.

use serde_json::{Map, Value, json};

use gateway_resolver::context::RequestContext;
use gateway_resolver::execution::{ResolverMap, ResolverResult};

pub fn resolvers() -> ResolverMap {
    let mut resolvers = ResolverMap::new();
    resolvers.register("Query", "hello", hello);
    resolvers.register("Query", "currentUser", current_user);
    resolvers.register("Mutation", "noop", noop);
    resolvers
}

/// Greets the caller by email when authenticated, generically otherwise.
fn hello<'a>(
    _parent: &'a Value,
    _args: &'a Map<String, Value>,
    context: &'a RequestContext,
) -> ResolverResult<'a> {
    Box::pin(async move {
        let name = context
            .current_user()
            .and_then(|user| user.email.as_deref())
            .unwrap_or("world");
        Ok(json!(format!("Hello {name}!")))
    })
}

fn current_user<'a>(
    _parent: &'a Value,
    _args: &'a Map<String, Value>,
    context: &'a RequestContext,
) -> ResolverResult<'a> {
    Box::pin(async move {
        Ok(match context.current_user() {
            Some(user) => json!({ "id": user.id, "email": user.email }),
            None => Value::Null,
        })
    })
}

fn noop<'a>(
    _parent: &'a Value,
    _args: &'a Map<String, Value>,
    _context: &'a RequestContext,
) -> ResolverResult<'a> {
    Box::pin(async move { Ok(json!("This mutation does nothing yet.")) })
}
