// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use arbor_env::Environment;

use crate::{EnvError, env_const::ARBOR_INTROSPECTION};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntrospectionMode {
    Enabled,  // Introspection queries are allowed (typically dev mode)
    Disabled, // Introspection queries are not allowed (typically in production)
}

/// Resolved once at process start; never consulted per-request.
pub fn introspection_mode(env: &dyn Environment) -> Result<IntrospectionMode, EnvError> {
    match env.get(ARBOR_INTROSPECTION) {
        Some(e) => match e.to_lowercase().as_str() {
            "true" | "enabled" | "1" => Ok(IntrospectionMode::Enabled),
            "false" | "disabled" => Ok(IntrospectionMode::Disabled),
            _ => Err(EnvError::InvalidEnum {
                env_key: ARBOR_INTROSPECTION,
                env_value: e,
                message: "Must be set to either true, enabled, 1, false, or disabled".to_string(),
            }),
        },

        None => Ok(IntrospectionMode::Disabled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_env::MapEnvironment;

    #[test]
    fn defaults_to_disabled() {
        let env = MapEnvironment::new();
        assert_eq!(
            introspection_mode(&env).unwrap(),
            IntrospectionMode::Disabled
        );
    }

    #[test]
    fn parses_spellings() {
        for (value, expected) in [
            ("true", IntrospectionMode::Enabled),
            ("Enabled", IntrospectionMode::Enabled),
            ("1", IntrospectionMode::Enabled),
            ("false", IntrospectionMode::Disabled),
            ("disabled", IntrospectionMode::Disabled),
        ] {
            let env = MapEnvironment::from([(ARBOR_INTROSPECTION, value)]);
            assert_eq!(introspection_mode(&env).unwrap(), expected);
        }

        let env = MapEnvironment::from([(ARBOR_INTROSPECTION, "sometimes")]);
        assert!(introspection_mode(&env).is_err());
    }
}
