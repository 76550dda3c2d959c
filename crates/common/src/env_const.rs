// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use arbor_env::Environment;

pub const ARBOR_INTROSPECTION: &str = "ARBOR_INTROSPECTION";

pub const ARBOR_IDENTITY_URL: &str = "ARBOR_IDENTITY_URL";
pub const ARBOR_IDENTITY_ANON_KEY: &str = "ARBOR_IDENTITY_ANON_KEY";

pub const ARBOR_SCHEMA_PATH: &str = "ARBOR_SCHEMA_PATH";

pub const ARBOR_MAX_SELECTION_DEPTH: &str = "ARBOR_MAX_SELECTION_DEPTH";

pub const ARBOR_LOG: &str = "ARBOR_LOG";

/// Primary location of the schema file: next to the deployed bundle unless
/// overridden.
pub fn get_schema_path(env: &dyn Environment) -> String {
    env.get(ARBOR_SCHEMA_PATH)
        .unwrap_or_else(|| "schema.graphql".to_string())
}

/// The source-tree location of the schema, tried when the primary path is
/// unreadable (useful when running from the repository root during
/// development).
pub fn get_schema_fallback_path(_env: &dyn Environment) -> String {
    "crates/server-lambda/schema.graphql".to_string()
}
