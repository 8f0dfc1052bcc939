// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! GraphQL indexer transport

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::errors::IndexerError;

/// One entry of a GraphQL `errors` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    /// Human-readable message
    pub message: String,
    /// Backend-specific details; `extensions.code` classifies the error
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphQlError {
    /// Create an error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: None,
        }
    }

    /// Create an error carrying an `extensions.code`
    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: Some(serde_json::json!({ "code": code.into() })),
        }
    }

    /// The machine-readable error code, if the backend supplied one
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|extensions| extensions.get("code"))
            .and_then(Value::as_str)
    }
}

/// Sends a query document to one indexer endpoint
///
/// Implementations return the response's `data` object. They must not retry;
/// retry is applied one level up, per chain.
#[async_trait]
pub trait IndexerTransport: Send + Sync {
    /// Execute `document` with `variables` against `endpoint`
    async fn execute(
        &self,
        endpoint: &Url,
        document: &str,
        variables: &Map<String, Value>,
    ) -> Result<Value, IndexerError>;
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

/// [`IndexerTransport`] over HTTP POST with a JSON body
#[derive(Debug, Clone, Default)]
pub struct HttpIndexerTransport {
    client: reqwest::Client,
}

impl HttpIndexerTransport {
    /// Create a transport with reqwest's default client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport whose requests time out after `timeout`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. TLS backend
    /// initialization failed).
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Use an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IndexerTransport for HttpIndexerTransport {
    async fn execute(
        &self,
        endpoint: &Url,
        document: &str,
        variables: &Map<String, Value>,
    ) -> Result<Value, IndexerError> {
        debug!(endpoint = %endpoint, "Sending indexer query");

        let response = self
            .client
            .post(endpoint.clone())
            .json(&GraphQlRequest {
                query: document,
                variables,
            })
            .send()
            .await
            .map_err(IndexerError::http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexerError::Status {
                status: status.as_u16(),
            });
        }

        let body: GraphQlResponse = response.json().await.map_err(IndexerError::decode)?;

        if !body.errors.is_empty() {
            return Err(IndexerError::backend(body.errors));
        }

        match body.data {
            Some(Value::Null) | None => Err(IndexerError::MissingData),
            Some(data) => Ok(data),
        }
    }
}
