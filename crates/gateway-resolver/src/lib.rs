// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

pub mod context;
pub mod execution;
pub mod schema;

pub use context::{ContextBuilder, RequestContext};
pub use execution::{
    ExecutionError, OperationExecutor, OperationsPayload, QueryResponse, ResolverError,
    ResolverMap, ResolverResult,
};
pub use schema::{Schema, SchemaLoadError, SchemaLoader};
