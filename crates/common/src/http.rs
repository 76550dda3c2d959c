// Copyright Arbor, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use http::StatusCode;
use serde_json::Value;

use std::collections::HashMap;

/// A request whose body can be consumed exactly once.
pub trait RequestPayload {
    fn get_head(&self) -> &(dyn RequestHead + Send + Sync);
    fn take_body(&mut self) -> Value;
}

#[derive(Debug, Clone)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self { inner: vec![] }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner
            .iter()
            .find(|(k, _)| k == &key.to_lowercase())
            .map(|(_, v)| v.clone())
    }

    pub fn insert(&mut self, key: String, value: String) {
        self.inner.push((key.to_lowercase(), value));
    }
}

impl Default for Headers {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

pub struct ResponsePayload {
    pub body: ResponseBody,
    pub headers: Headers,
    pub status_code: StatusCode,
}

pub enum ResponseBody {
    Bytes(Vec<u8>),
    None,
}

/// Represents a HTTP request from which information can be extracted
pub trait RequestHead {
    // return all header values that have the following key
    fn get_headers(&self, key: &str) -> Vec<String>;

    // return the first header
    fn get_header(&self, key: &str) -> Option<String> {
        self.get_headers(&key.to_lowercase()).first().cloned()
    }

    // return the IP address used to make the request
    fn get_ip(&self) -> Option<std::net::IpAddr>;

    fn get_path(&self) -> &str;

    fn get_method(&self) -> &http::Method;
}

/// An in-memory request head, suitable for tests and internal invocations.
pub struct MemoryRequestHead {
    headers: HashMap<String, Vec<String>>,
    method: http::Method,
    path: String,
}

impl MemoryRequestHead {
    pub fn new(headers: HashMap<String, Vec<String>>, method: http::Method, path: String) -> Self {
        Self {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            method,
            path,
        }
    }

    pub fn add_header(&mut self, key: &str, value: &str) {
        self.headers
            .entry(key.to_ascii_lowercase())
            .or_default()
            .push(value.to_string());
    }
}

impl RequestHead for MemoryRequestHead {
    fn get_headers(&self, key: &str) -> Vec<String> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    fn get_ip(&self) -> Option<std::net::IpAddr> {
        Some(std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)))
    }

    fn get_path(&self) -> &str {
        &self.path
    }

    fn get_method(&self) -> &http::Method {
        &self.method
    }
}

pub struct MemoryRequestPayload {
    body: Value,
    head: MemoryRequestHead,
}

impl MemoryRequestPayload {
    pub fn new(body: Value, head: MemoryRequestHead) -> Self {
        Self { body, head }
    }
}

impl RequestPayload for MemoryRequestPayload {
    fn get_head(&self) -> &(dyn RequestHead + Send + Sync) {
        &self.head
    }

    fn take_body(&mut self) -> Value {
        self.body.take()
    }
}
