// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod error;
mod executor;
mod operation_payload;
mod resolver_map;
mod response;
mod validation;

pub use error::{ExecutionError, ValidationError};
pub use executor::OperationExecutor;
pub use operation_payload::OperationsPayload;
pub use resolver_map::{ResolverError, ResolverFn, ResolverMap, ResolverResult};
pub use response::{ErrorLocation, GraphQLError, QueryResponse};
