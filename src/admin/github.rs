//! Client for the GitHub contents API, used as a versioned store of JSON files.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{GuideError, Result};
use crate::storage::{keys, KeyValueStore};
use crate::util::encode_uri_component;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "main";

const USER_AGENT: &str = "Heartopia-Admin";
const ACCEPT: &str = "application/vnd.github.v3+json";

/// Personal token plus the repository it is used against.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl Credentials {
    /// Trims every field. Token, owner and repo are required; the branch defaults to `main`.
    pub fn new(token: &str, owner: &str, repo: &str, branch: &str) -> Result<Self> {
        let (token, owner, repo, branch) = (token.trim(), owner.trim(), repo.trim(), branch.trim());
        if token.is_empty() || owner.is_empty() || repo.is_empty() {
            return Err(GuideError::Validation(
                "Por favor completa todos los campos".into(),
            ));
        }
        Ok(Self {
            token: token.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: if branch.is_empty() { DEFAULT_BRANCH } else { branch }.to_string(),
        })
    }

    /// Credentials saved by a previous login, if all required parts are there.
    pub fn load<S: KeyValueStore>(store: &S) -> Option<Self> {
        let token = store.get(keys::TOKEN)?;
        let owner = store.get(keys::OWNER)?;
        let repo = store.get(keys::REPO)?;
        let branch = store.get(keys::BRANCH).unwrap_or_default();
        Self::new(&token, &owner, &repo, &branch).ok()
    }

    pub fn save<S: KeyValueStore>(&self, store: &mut S) -> Result<()> {
        store.set(keys::TOKEN, self.token.clone())?;
        store.set(keys::OWNER, self.owner.clone())?;
        store.set(keys::REPO, self.repo.clone())?;
        store.set(keys::BRANCH, self.branch.clone())
    }

    pub fn clear<S: KeyValueStore>(store: &mut S) -> Result<()> {
        for key in keys::CREDENTIALS {
            store.remove(key)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .finish()
    }
}

/// Opaque revision id of a remote file (the blob sha).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionMarker(pub String);

impl fmt::Display for VersionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded file body and the revision it was read at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub text: String,
    pub version: VersionMarker,
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Deserialize)]
struct HostErrorBody {
    message: Option<String>,
}

/// Base64 as sent by the contents API; embedded line breaks are ignored.
pub fn decode_transport(content: &str) -> Result<String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn encode_transport(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

pub struct ContentHost {
    http: reqwest::Client,
    api_base: String,
    credentials: Credentials,
}

impl ContentHost {
    pub fn new(api_base: &str, credentials: Credentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base,
            encode_uri_component(&self.credentials.owner),
            encode_uri_component(&self.credentials.repo)
        )
    }

    fn contents_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(encode_uri_component)
            .collect();
        format!("{}/contents/{}", self.repo_url(), encoded.join("/"))
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", format!("token {}", self.credentials.token))
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
    }

    /// Turns a non-success response into a rejection carrying the host's message.
    async fn rejection(response: reqwest::Response) -> GuideError {
        let status = response.status().as_u16();
        let message = response
            .json::<HostErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| "Error desconocido de GitHub".into());
        GuideError::HostRejection { status, message }
    }

    /// Probes the repository to check that the token can see it.
    pub async fn verify(&self) -> Result<()> {
        let response = self
            .request(reqwest::Method::GET, &self.repo_url())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        Ok(())
    }

    /// Reads a file from the configured branch.
    pub async fn get_file(&self, path: &str) -> Result<RemoteFile> {
        let response = self
            .request(reqwest::Method::GET, &self.contents_url(path))
            .query(&[("ref", self.credentials.branch.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let body: ContentsResponse = response.json().await?;
        Ok(RemoteFile {
            path: path.to_string(),
            text: decode_transport(&body.content)?,
            version: VersionMarker(body.sha),
        })
    }

    /// Writes `text` as a new revision of `path`, provided the remote is still at `version`.
    ///
    /// A stale `version` comes back as [`GuideError::Conflict`]; nothing is retried.
    pub async fn put_file(
        &self,
        path: &str,
        text: &str,
        version: &VersionMarker,
        message: &str,
    ) -> Result<VersionMarker> {
        let payload = PutRequest {
            message,
            content: encode_transport(text),
            sha: &version.0,
            branch: &self.credentials.branch,
        };
        let response = self
            .request(reqwest::Method::PUT, &self.contents_url(path))
            .json(&payload)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => {
                let body: PutResponse = response.json().await?;
                Ok(VersionMarker(body.content.sha))
            }
            reqwest::StatusCode::CONFLICT => Err(GuideError::Conflict {
                path: path.to_string(),
            }),
            _ => Err(Self::rejection(response).await),
        }
    }
}
