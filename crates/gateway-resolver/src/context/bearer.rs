// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use common::http::RequestHead;

const AUTHORIZATION_HEADER: &str = "Authorization";
const TOKEN_PREFIX: &str = "Bearer ";

/// Extract the bearer credential from the `Authorization` header.
///
/// Total: an absent header, a non-bearer scheme, or an empty token all yield
/// `None`. An absent credential indicates an anonymous caller and there may
/// be operations allowed for such callers.
pub fn extract_bearer_token(request_head: &(dyn RequestHead + Send + Sync)) -> Option<String> {
    request_head
        .get_header(AUTHORIZATION_HEADER)
        .and_then(|header| header.strip_prefix(TOKEN_PREFIX).map(str::to_string))
        .filter(|token| !token.is_empty())
}
