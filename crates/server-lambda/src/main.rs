// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;

use arbor_env::SystemEnvironment;
use server_lambda::{init_router_or_exit, resolve};

/// Run the gateway as an on-demand function: one logical request per
/// invocation, with the schema and router initialized once per process.
#[tokio::main]
async fn main() -> Result<(), Error> {
    common::logging_tracing::init();

    let env = SystemEnvironment;
    let router = Arc::new(init_router_or_exit(&env).await);

    let module = lambda_runtime::service_fn(|event: LambdaEvent<Value>| {
        let router = router.clone();
        async move { resolve(event, router).await }
    });

    lambda_runtime::run(module).await?;

    Ok(())
}
