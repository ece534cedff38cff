//! GitHub contents API store.
//!
//! Files are written with `PUT /repos/{repo}/contents/{path}` carrying the
//! base64 content; deletes first look up the file's blob `sha`.

use base64::prelude::*;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use validator_core::config::RemoteConfig;
use validator_core::{Error, Result};

use crate::client::build_client;
use crate::store::ArtifactStore;

const GITHUB_JSON: &str = "application/vnd.github+json";

/// One entry of a contents API response.
#[derive(Debug, Clone, Deserialize)]
struct ContentEntry {
    path: String,
    sha: String,
}

/// Artifact store backed by a GitHub repository.
pub struct GitHubStore {
    client: Client,
    api_base: String,
    repo: String,
    token: String,
    branch: String,
    results_prefix: String,
}

impl GitHubStore {
    /// Create a store; fails without a repository and token.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let (repo, token) = config.require_credentials()?;
        Ok(Self {
            client: build_client(config)?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
            branch: config.branch.clone(),
            results_prefix: config.results_prefix.clone(),
        })
    }

    /// Store configured from `GITHUB_REPO` / `GITHUB_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::new(&RemoteConfig::from_env())
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token).header(ACCEPT, GITHUB_JSON)
    }

    pub fn put_request(&self, path: &str, content: &[u8]) -> RequestBuilder {
        let body = json!({
            "message": format!("Upload {}", path),
            "content": BASE64_STANDARD.encode(content),
            "branch": self.branch,
        });
        self.authorized(self.client.put(self.contents_url(path))).json(&body)
    }

    pub fn lookup_request(&self, path: &str) -> RequestBuilder {
        let url = format!("{}?ref={}", self.contents_url(path), self.branch);
        self.authorized(self.client.get(url))
    }

    pub fn delete_request(&self, path: &str, sha: &str) -> RequestBuilder {
        let body = json!({
            "message": format!("Delete {}", path),
            "sha": sha,
            "branch": self.branch,
        });
        self.authorized(self.client.delete(self.contents_url(path))).json(&body)
    }

    /// Send and return the body of a 200/201 response.
    fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().map_err(|e| Error::upload(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| Error::upload(e.to_string()))?;
        check_status(status, body)
    }
}

impl ArtifactStore for GitHubStore {
    fn results_prefix(&self) -> &str {
        &self.results_prefix
    }

    fn put_file(&self, remote_path: &str, content: &[u8]) -> Result<()> {
        debug!(path = remote_path, bytes = content.len(), "uploading file");
        self.send(self.put_request(remote_path, content))?;
        Ok(())
    }

    fn delete(&self, remote_path: &str) -> Result<()> {
        let body = self.send(self.lookup_request(remote_path))?;
        let sha = parse_sha(remote_path, &body)?;
        self.send(self.delete_request(remote_path, &sha))?;
        info!(path = remote_path, "deleted remote file");
        Ok(())
    }

    fn list(&self, remote_dir: &str) -> Result<Vec<String>> {
        let body = self.send(self.lookup_request(remote_dir))?;
        parse_listing(remote_dir, &body)
    }
}

/// Pass 200/201 bodies through; anything else fails with the body verbatim.
fn check_status(status: u16, body: String) -> Result<String> {
    match status {
        200 | 201 => Ok(body),
        _ => Err(Error::upload(body)),
    }
}

fn parse_sha(path: &str, body: &str) -> Result<String> {
    serde_json::from_str::<ContentEntry>(body)
        .map(|entry| entry.sha)
        .map_err(|_| Error::upload(format!("{} is not a file", path)))
}

fn parse_listing(path: &str, body: &str) -> Result<Vec<String>> {
    serde_json::from_str::<Vec<ContentEntry>>(body)
        .map(|entries| entries.into_iter().map(|e| e.path).collect())
        .map_err(|_| Error::upload(format!("{} is not a directory", path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> GitHubStore {
        let config = RemoteConfig {
            api_base: "https://api.example.test/".to_string(),
            repo: "acme/results".to_string(),
            token: Some("secret".to_string()),
            ..RemoteConfig::default()
        };
        GitHubStore::new(&config).unwrap()
    }

    fn json_body(request: &reqwest::blocking::Request) -> serde_json::Value {
        let bytes = request.body().and_then(|b| b.as_bytes()).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_requires_credentials() {
        let err = GitHubStore::new(&RemoteConfig::default()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_put_request() {
        let store = make_store();
        let request = store
            .put_request("validation_results/validation_1/summary.xlsx", b"hello")
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::PUT);
        assert_eq!(
            request.url().as_str(),
            "https://api.example.test/repos/acme/results/contents/validation_results/validation_1/summary.xlsx"
        );
        assert_eq!(request.headers()["authorization"], "Bearer secret");
        assert_eq!(request.headers()["accept"], GITHUB_JSON);

        let body = json_body(&request);
        assert_eq!(body["message"], "Upload validation_results/validation_1/summary.xlsx");
        assert_eq!(body["content"], "aGVsbG8=");
        assert_eq!(body["branch"], "main");
    }

    #[test]
    fn test_lookup_and_delete_requests() {
        let store = make_store();

        let lookup = store.lookup_request("a/b.json").build().unwrap();
        assert_eq!(lookup.method(), reqwest::Method::GET);
        assert_eq!(
            lookup.url().as_str(),
            "https://api.example.test/repos/acme/results/contents/a/b.json?ref=main"
        );

        let delete = store.delete_request("a/b.json", "abc123").build().unwrap();
        assert_eq!(delete.method(), reqwest::Method::DELETE);
        let body = json_body(&delete);
        assert_eq!(body["sha"], "abc123");
        assert_eq!(body["message"], "Delete a/b.json");
    }

    #[test]
    fn test_check_status() {
        assert_eq!(check_status(201, "ok".into()).unwrap(), "ok");
        let err = check_status(422, r#"{"message":"Invalid request"}"#.into()).unwrap_err();
        assert_eq!(err.to_string(), r#"Upload error: {"message":"Invalid request"}"#);
    }

    #[test]
    fn test_parse_responses() {
        let file = r#"{"name": "b.json", "path": "a/b.json", "sha": "abc123", "type": "file"}"#;
        assert_eq!(parse_sha("a/b.json", file).unwrap(), "abc123");

        let dir = r#"[
            {"name": "valid", "path": "a/valid", "sha": "1", "type": "dir"},
            {"name": "summary.xlsx", "path": "a/summary.xlsx", "sha": "2", "type": "file"}
        ]"#;
        assert_eq!(parse_listing("a", dir).unwrap(), vec!["a/valid", "a/summary.xlsx"]);

        assert!(parse_sha("a", dir).is_err());
        assert!(parse_listing("a/b.json", file).is_err());
    }
}
