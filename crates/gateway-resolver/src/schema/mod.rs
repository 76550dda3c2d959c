// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod index;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use arbor_env::Environment;
use common::env_const::{get_schema_fallback_path, get_schema_path};

pub use index::SchemaIndex;

/// The process-wide GraphQL schema: the type-definition text plus the index
/// derived from it. Write-once, then shared read-only across requests.
#[derive(Debug)]
pub struct Schema {
    pub sdl: String,
    pub index: SchemaIndex,
}

impl Schema {
    pub fn parse(sdl: String) -> Result<Self, SchemaLoadError> {
        let document = async_graphql_parser::parse_schema(&sdl)?;
        let index = SchemaIndex::build(&document)?;
        Ok(Self { sdl, index })
    }
}

#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("Could not load GraphQL schema file (tried '{primary}' and '{fallback}')")]
    AllPathsFailed { primary: String, fallback: String },

    #[error("Invalid GraphQL schema: {0}")]
    Parse(#[from] async_graphql_parser::Error),

    #[error("Schema does not define a query root type")]
    MissingQueryType,
}

/// Loads and caches the schema.
///
/// The schema is read at most once per process; a failed load is a fatal
/// misconfiguration (no request can be served without a schema), so callers
/// are expected to refuse to initialize rather than retry per-request.
pub struct SchemaLoader {
    primary: PathBuf,
    fallback: PathBuf,
    cell: OnceCell<Arc<Schema>>,
}

impl SchemaLoader {
    pub fn new(primary: impl Into<PathBuf>, fallback: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
            cell: OnceCell::new(),
        }
    }

    pub fn from_env(env: &dyn Environment) -> Self {
        Self::new(get_schema_path(env), get_schema_fallback_path(env))
    }

    /// Load the schema, reusing the cached value on every call after the
    /// first successful one.
    pub async fn load(&self) -> Result<Arc<Schema>, SchemaLoadError> {
        self.cell
            .get_or_try_init(|| async {
                let sdl = self.read_sdl()?;
                let schema = Schema::parse(sdl)?;
                Ok(Arc::new(schema))
            })
            .await
            .cloned()
    }

    fn read_sdl(&self) -> Result<String, SchemaLoadError> {
        match std::fs::read_to_string(&self.primary) {
            Ok(sdl) => {
                info!("Loaded GraphQL schema from {}", self.primary.display());
                Ok(sdl)
            }
            Err(primary_err) => {
                warn!(
                    "Could not read schema at {}: {primary_err}; trying {}",
                    self.primary.display(),
                    self.fallback.display()
                );
                match std::fs::read_to_string(&self.fallback) {
                    Ok(sdl) => {
                        info!("Loaded GraphQL schema from {}", self.fallback.display());
                        Ok(sdl)
                    }
                    Err(_) => Err(SchemaLoadError::AllPathsFailed {
                        primary: path_string(&self.primary),
                        fallback: path_string(&self.fallback),
                    }),
                }
            }
        }
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SDL: &str = "type Query { hello: String }";

    fn write_schema(dir: &Path, name: &str, sdl: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(sdl.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn loads_from_primary_path() {
        let dir = tempfile::tempdir().unwrap();
        let primary = write_schema(dir.path(), "schema.graphql", SDL);
        let loader = SchemaLoader::new(primary, dir.path().join("missing.graphql"));

        let schema = loader.load().await.unwrap();
        assert_eq!(schema.index.query_type(), "Query");
    }

    #[tokio::test]
    async fn falls_back_when_primary_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = write_schema(dir.path(), "fallback.graphql", SDL);
        let loader = SchemaLoader::new(dir.path().join("missing.graphql"), fallback);

        let schema = loader.load().await.unwrap();
        assert_eq!(schema.index.query_type(), "Query");
    }

    #[tokio::test]
    async fn fails_when_both_paths_are_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let loader = SchemaLoader::new(
            dir.path().join("missing.graphql"),
            dir.path().join("also-missing.graphql"),
        );

        assert!(matches!(
            loader.load().await,
            Err(SchemaLoadError::AllPathsFailed { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_sdl_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let primary = write_schema(dir.path(), "schema.graphql", "type Query {");
        let loader = SchemaLoader::new(primary, dir.path().join("missing.graphql"));

        assert!(matches!(
            loader.load().await,
            Err(SchemaLoadError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn second_load_reuses_the_cached_schema() {
        let dir = tempfile::tempdir().unwrap();
        let primary = write_schema(dir.path(), "schema.graphql", SDL);
        let loader = SchemaLoader::new(primary.clone(), dir.path().join("missing.graphql"));

        let first = loader.load().await.unwrap();

        // A re-read would fail; the cached value must be returned instead.
        std::fs::remove_file(&primary).unwrap();

        let second = loader.load().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
