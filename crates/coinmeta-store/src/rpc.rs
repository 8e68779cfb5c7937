//! JSON-over-HTTPS client for a full node's RPC port.
//!
//! Every endpoint is a `POST {base}/{name}` with a JSON body. Responses carry
//! `"success": bool` and, on failure, an `"error"` string.

use std::collections::HashMap;

use async_trait::async_trait;
use coinmeta_types::Identifier;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::coin::{CoinRecord, CoinSpend};
use crate::config::RpcConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::RecordStore;

const RECORDS_BY_PUZZLE_HASH: &str = "get_coin_records_by_puzzle_hash";
const PUZZLE_AND_SOLUTION: &str = "get_puzzle_and_solution";
const RECORD_BY_NAME: &str = "get_coin_record_by_name";
const RECORDS_BY_PARENT_IDS: &str = "get_coin_records_by_parent_ids";

/// Record store backed by a full node's RPC API.
#[derive(Debug, Clone)]
pub struct RpcRecordStore {
    base_url: String,
    http: reqwest::Client,
}

impl RpcRecordStore {
    /// Create a client for `base_url`. Trailing slashes are stripped.
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let raw = base_url.into();
        Self {
            base_url: raw.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Build the HTTP client from `config`: timeout, TLS verification, and
    /// the optional client certificate.
    pub fn from_config(config: &RpcConfig) -> StoreResult<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        match (&config.cert_path, &config.key_path) {
            (Some(cert), Some(key)) => {
                let mut pem = std::fs::read(cert)?;
                pem.push(b'\n');
                pem.extend(std::fs::read(key)?);
                let identity = reqwest::Identity::from_pem(&pem)
                    .map_err(|e| StoreError::Config(format!("client certificate: {e}")))?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(StoreError::Config(
                    "cert_path and key_path must be set together".into(),
                ))
            }
        }

        let http = builder
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(Self::new(config.url.clone(), http))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `endpoint` and return the response object once
    /// `success` has been checked.
    async fn call(&self, endpoint: &str, body: Value) -> StoreResult<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(url = %url, "RPC request");
        let resp = self.http.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(StoreError::Rpc {
                endpoint: endpoint.to_string(),
                message: format!("HTTP {status}: {}", text.trim()),
            });
        }

        let value: Value = resp.json().await.map_err(|e| StoreError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if value.get("success").and_then(Value::as_bool) != Some(true) {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request failed without an error message")
                .to_string();
            return Err(StoreError::Rpc {
                endpoint: endpoint.to_string(),
                message,
            });
        }
        Ok(value)
    }

    fn field<T: DeserializeOwned>(endpoint: &str, value: &mut Value, key: &str) -> StoreResult<T> {
        let raw = value.get_mut(key).map(Value::take).ok_or_else(|| {
            StoreError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: format!("missing field `{key}`"),
            }
        })?;
        serde_json::from_value(raw).map_err(|e| StoreError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    fn index_records(records: Vec<CoinRecord>) -> HashMap<Identifier, CoinRecord> {
        records.into_iter().map(|r| (r.name(), r)).collect()
    }
}

/// Whether an RPC error message means "there is nothing here".
fn is_absent(err: &StoreError) -> bool {
    match err {
        StoreError::Rpc { message, .. } => {
            let lower = message.to_ascii_lowercase();
            lower.contains("not found") || lower.contains("not spent")
        }
        _ => false,
    }
}

#[async_trait]
impl RecordStore for RpcRecordStore {
    async fn records_by_identifier(
        &self,
        puzzle_hash: &Identifier,
        include_spent: bool,
    ) -> StoreResult<HashMap<Identifier, CoinRecord>> {
        let body = json!({
            "puzzle_hash": puzzle_hash.to_prefixed_hex(),
            "include_spent_coins": include_spent,
        });
        let mut resp = self.call(RECORDS_BY_PUZZLE_HASH, body).await?;
        let records: Vec<CoinRecord> = Self::field(RECORDS_BY_PUZZLE_HASH, &mut resp, "coin_records")?;
        debug!(puzzle_hash = %puzzle_hash.short_hex(), count = records.len(), "listed records");
        Ok(Self::index_records(records))
    }

    async fn spend_payload(
        &self,
        coin_id: &Identifier,
        height: u32,
    ) -> StoreResult<Option<CoinSpend>> {
        let body = json!({
            "coin_id": coin_id.to_prefixed_hex(),
            "height": height,
        });
        match self.call(PUZZLE_AND_SOLUTION, body).await {
            Ok(mut resp) => Self::field(PUZZLE_AND_SOLUTION, &mut resp, "coin_solution").map(Some),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn record_by_name(&self, coin_id: &Identifier) -> StoreResult<Option<CoinRecord>> {
        let body = json!({ "name": coin_id.to_prefixed_hex() });
        match self.call(RECORD_BY_NAME, body).await {
            Ok(mut resp) => Self::field(RECORD_BY_NAME, &mut resp, "coin_record").map(Some),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn records_by_parent(
        &self,
        parent_id: &Identifier,
        include_spent: bool,
    ) -> StoreResult<HashMap<Identifier, CoinRecord>> {
        let body = json!({
            "parent_ids": [parent_id.to_prefixed_hex()],
            "include_spent_coins": include_spent,
        });
        let mut resp = self.call(RECORDS_BY_PARENT_IDS, body).await?;
        let records: Vec<CoinRecord> = Self::field(RECORDS_BY_PARENT_IDS, &mut resp, "coin_records")?;
        Ok(Self::index_records(records))
    }
}
