//! HashiCorp Vault KV v2 backend.
//!
//! A thin blocking HTTP client over the parts of the Vault API the import and
//! export flows need.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::Backend;
use crate::core::path::{self, normalize_path};
use crate::core::tree::{FlatSecretSet, SecretLeaf};
use crate::error::{BackendError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a Vault server's KV v2 engines.
pub struct VaultClient {
    address: String,
    token: Zeroizing<String>,
    namespace: Option<String>,
    http: Client,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: ListData,
}

#[derive(Debug, Deserialize)]
struct ListData {
    #[serde(default)]
    keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    data: ReadData,
}

#[derive(Debug, Deserialize)]
struct ReadData {
    data: Option<SecretLeaf>,
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    data: Metadata,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    current_version: u64,
    #[serde(default)]
    versions: BTreeMap<String, VersionMetadata>,
}

#[derive(Debug, Deserialize)]
struct VersionMetadata {
    #[serde(default)]
    deletion_time: String,
    #[serde(default)]
    destroyed: bool,
}

impl Metadata {
    /// Why the current version cannot be read, if it cannot.
    fn unavailable_reason(&self) -> Option<String> {
        let version = self.versions.get(&self.current_version.to_string())?;
        if version.destroyed {
            Some(format!("version {} destroyed", self.current_version))
        } else if !version.deletion_time.is_empty() {
            Some(format!(
                "version {} deleted at {}",
                self.current_version, version.deletion_time
            ))
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

impl VaultClient {
    /// Create a client for the server at `address`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(address: &str, token: Zeroizing<String>, namespace: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(BackendError::from)?;

        Ok(Self {
            address: address.trim_end_matches('/').to_string(),
            token,
            namespace: namespace.filter(|ns| !ns.trim().is_empty()),
            http,
        })
    }

    fn url(&self, api_path: &str) -> String {
        format!("{}/v1/{}", self.address, normalize_path(api_path))
    }

    fn request(&self, method: reqwest::Method, api_path: &str) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, self.url(api_path))
            .header("X-Vault-Token", self.token.as_str());
        if let Some(namespace) = &self.namespace {
            request = request.header("X-Vault-Namespace", namespace);
        }
        request
    }

    /// Send a request; `None` means the server answered 404.
    fn send(&self, request: RequestBuilder, api_path: &str) -> std::result::Result<Option<Value>, BackendError> {
        debug!(path = api_path, "vault request");
        let response = request.send()?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text()?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                path: api_path.to_string(),
                message: error_message(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Some(Value::Null));
        }

        Ok(Some(serde_json::from_str(&body)?))
    }

    fn get(&self, api_path: &str) -> std::result::Result<Option<Value>, BackendError> {
        self.send(self.request(reqwest::Method::GET, api_path), api_path)
    }

    fn list(&self, engine: &str, path: &str) -> std::result::Result<Option<Vec<String>>, BackendError> {
        let api_path = metadata_path(engine, path);
        let request = self
            .request(reqwest::Method::GET, &api_path)
            .query(&[("list", "true")]);

        match self.send(request, &api_path)? {
            Some(body) => {
                let listed: ListResponse = serde_json::from_value(body)?;
                Ok(Some(listed.data.keys))
            }
            None => Ok(None),
        }
    }

    fn read_leaf(&self, engine: &str, path: &str) -> std::result::Result<Option<SecretLeaf>, BackendError> {
        match self.get(&data_path(engine, path))? {
            Some(body) => {
                let read: ReadResponse = serde_json::from_value(body)?;
                Ok(read.data.data)
            }
            None => Ok(None),
        }
    }

    fn read_metadata(&self, engine: &str, path: &str) -> std::result::Result<Option<Metadata>, BackendError> {
        match self.get(&metadata_path(engine, path))? {
            Some(body) => {
                let metadata: MetadataResponse = serde_json::from_value(body)?;
                Ok(Some(metadata.data))
            }
            None => Ok(None),
        }
    }

    fn read_secret(
        &self,
        engine: &str,
        path: &str,
        include_metadata: bool,
        out: &mut FlatSecretSet,
    ) -> std::result::Result<(), BackendError> {
        if include_metadata {
            match self.read_metadata(engine, path)? {
                None => return Ok(()),
                Some(metadata) => {
                    if let Some(reason) = metadata.unavailable_reason() {
                        warn!(engine, path, %reason, "skipping secret");
                        return Ok(());
                    }
                }
            }
        }

        if let Some(leaf) = self.read_leaf(engine, path)? {
            out.insert(path::join([engine, path]), leaf);
        }
        Ok(())
    }

    fn collect(
        &self,
        engine: &str,
        path: &str,
        include_metadata: bool,
        out: &mut FlatSecretSet,
    ) -> std::result::Result<(), BackendError> {
        let Some(keys) = self.list(engine, path)? else {
            // Not a directory: the path may name a single secret.
            if !normalize_path(path).is_empty() {
                self.read_secret(engine, path, include_metadata, out)?;
            }
            return Ok(());
        };

        for key in keys {
            let child = path::join([path, key.as_str()]);
            if key.ends_with('/') {
                self.collect(engine, &child, include_metadata, out)?;
            } else {
                self.read_secret(engine, &child, include_metadata, out)?;
            }
        }
        Ok(())
    }
}

impl Backend for VaultClient {
    fn enable_engine(&self, path: &str) -> Result<()> {
        let engine = normalize_path(path);
        let mounts = self.get("sys/mounts")?.unwrap_or(Value::Null);

        if has_mount(&mounts, &engine) {
            return Err(BackendError::EngineExists(engine).into());
        }

        let api_path = format!("sys/mounts/{}", engine);
        let request = self
            .request(reqwest::Method::POST, &api_path)
            .json(&json!({ "type": "kv", "options": { "version": "2" } }));
        self.send(request, &api_path)?;

        debug!(engine = %engine, "enabled KV v2 engine");
        Ok(())
    }

    fn write_leaf(&self, engine_path: &str, path: &str, leaf: &SecretLeaf) -> Result<()> {
        let api_path = data_path(engine_path, path);
        let request = self
            .request(reqwest::Method::POST, &api_path)
            .json(&json!({ "data": leaf }));

        if self.send(request, &api_path)?.is_none() {
            return Err(BackendError::EngineNotFound(normalize_path(engine_path)).into());
        }
        Ok(())
    }

    fn read_tree_recursive(
        &self,
        engine_path: &str,
        sub_path: &str,
        include_metadata: bool,
    ) -> Result<FlatSecretSet> {
        let mut out = FlatSecretSet::new();
        self.collect(
            &normalize_path(engine_path),
            &normalize_path(sub_path),
            include_metadata,
            &mut out,
        )?;
        debug!(count = out.len(), "read secrets");
        Ok(out)
    }
}

fn data_path(engine: &str, path: &str) -> String {
    path::join([engine, "data", path])
}

fn metadata_path(engine: &str, path: &str) -> String {
    path::join([engine, "metadata", path])
}

/// Whether a `sys/mounts` response lists `engine`.
///
/// Newer servers nest the table under `data`; older ones return it at the
/// top level.
fn has_mount(mounts: &Value, engine: &str) -> bool {
    let key = format!("{}/", engine);
    mounts
        .get("data")
        .and_then(|data| data.get(&key))
        .or_else(|| mounts.get(&key))
        .is_some()
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ if body.trim().is_empty() => "no response body".to_string(),
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_paths() {
        assert_eq!(data_path("secret", "app/db"), "secret/data/app/db");
        assert_eq!(metadata_path("kv/prod", ""), "kv/prod/metadata");
        assert_eq!(metadata_path("kv/prod/", "/app/"), "kv/prod/metadata/app");
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = VaultClient::new(
            "http://127.0.0.1:8200/",
            Zeroizing::new("token".to_string()),
            Some("  ".to_string()),
        )
        .unwrap();

        assert_eq!(client.url("secret/data/app"), "http://127.0.0.1:8200/v1/secret/data/app");
        assert!(client.namespace.is_none());
    }

    #[test]
    fn test_debug_hides_token() {
        let client = VaultClient::new(
            "http://127.0.0.1:8200",
            Zeroizing::new("hvs.supersecret".to_string()),
            None,
        )
        .unwrap();

        assert!(!format!("{:?}", client).contains("hvs.supersecret"));
    }

    #[test]
    fn test_has_mount() {
        let nested = json!({ "data": { "secret/": { "type": "kv" } } });
        let flat = json!({ "kv/prod/": { "type": "kv" } });

        assert!(has_mount(&nested, "secret"));
        assert!(!has_mount(&nested, "other"));
        assert!(has_mount(&flat, "kv/prod"));
        assert!(!has_mount(&Value::Null, "secret"));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"errors":["permission denied"]}"#),
            "permission denied"
        );
        assert_eq!(error_message(""), "no response body");
        assert_eq!(error_message("bad gateway"), "bad gateway");
    }

    #[test]
    fn test_parse_list_and_read() {
        let listed: ListResponse =
            serde_json::from_value(json!({ "data": { "keys": ["db", "sub/"] } })).unwrap();
        assert_eq!(listed.data.keys, vec!["db", "sub/"]);

        let read: ReadResponse = serde_json::from_value(json!({
            "data": { "data": { "user": "alice" }, "metadata": { "version": 2 } }
        }))
        .unwrap();
        assert_eq!(read.data.data.unwrap()["user"], json!("alice"));

        let deleted: ReadResponse =
            serde_json::from_value(json!({ "data": { "data": null, "metadata": {} } })).unwrap();
        assert!(deleted.data.data.is_none());
    }

    #[test]
    fn test_metadata_unavailable_reason() {
        let live: MetadataResponse = serde_json::from_value(json!({
            "data": {
                "current_version": 2,
                "versions": {
                    "1": { "deletion_time": "2024-01-01T00:00:00Z", "destroyed": false },
                    "2": { "deletion_time": "", "destroyed": false }
                }
            }
        }))
        .unwrap();
        assert!(live.data.unavailable_reason().is_none());

        let destroyed: MetadataResponse = serde_json::from_value(json!({
            "data": { "current_version": 1, "versions": { "1": { "deletion_time": "", "destroyed": true } } }
        }))
        .unwrap();
        assert_eq!(destroyed.data.unavailable_reason().unwrap(), "version 1 destroyed");
    }
}
