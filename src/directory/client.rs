//! HTTP client for the group-directory (Grouper) REST API.

use crate::config::DirectoryConfig;
use crate::directory::types::{
    interpret_write, AddMemberRequest, GroupSaveRequest, StemSaveRequest, WriteKind, WsResponse,
};
use crate::error::SyncError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use tracing::info;
use url::Url;

/// Reusable basic-auth credentials for directory calls.
#[derive(Debug, Clone)]
pub struct DirectoryAuth {
    username: String,
    password: String,
}

/// Constructs reusable credentials for subsequent directory calls.
pub fn authenticate(username: &str, password: &str) -> DirectoryAuth {
    DirectoryAuth {
        username: username.to_string(),
        password: password.to_string(),
    }
}

/// Client for creating folders/groups and replacing group membership.
pub struct DirectoryClient {
    client: Client,
    config: DirectoryConfig,
}

impl DirectoryClient {
    /// Creates a new directory client.
    pub fn new(config: DirectoryConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a folder (stem), or no-ops if it already exists.
    pub async fn create_folder(
        &self,
        auth: &DirectoryAuth,
        stem: &str,
        name: &str,
    ) -> Result<(), SyncError> {
        info!(stem = %stem, "Creating folder");
        let url = self.endpoint(&format!("stems/{stem}"))?;
        let response = self
            .send(auth, Method::Post, url, &StemSaveRequest::new(stem, name))
            .await?;
        interpret_write(WriteKind::StemSave, &response)
    }

    /// Creates a group, or no-ops if it already exists.
    pub async fn create_group(
        &self,
        auth: &DirectoryAuth,
        group: &str,
        name: &str,
    ) -> Result<(), SyncError> {
        info!(group = %group, "Creating group");
        let url = self.endpoint(&format!("groups/{group}"))?;
        let response = self
            .send(auth, Method::Post, url, &GroupSaveRequest::new(group, name))
            .await?;
        interpret_write(WriteKind::GroupSave, &response)
    }

    /// Replaces the group's entire membership with the given subject
    /// ids.
    pub async fn replace_members<I, S>(
        &self,
        auth: &DirectoryAuth,
        group: &str,
        subject_ids: I,
    ) -> Result<(), SyncError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = AddMemberRequest::replace_all(subject_ids);
        info!(
            group = %group,
            members = request.request.subject_lookups.len(),
            "Replacing group members"
        );
        let url = self.endpoint(&format!("groups/{group}/members"))?;
        let response = self.send(auth, Method::Put, url, &request).await?;
        interpret_write(WriteKind::MemberReplace, &response)
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        Ok(Url::parse(&format!("{}/{}", self.config.base_url, path))?)
    }

    async fn send<B: Serialize>(
        &self,
        auth: &DirectoryAuth,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<WsResponse, SyncError> {
        let builder = match method {
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
        };
        let payload = serde_json::to_string(body).map_err(|e| SyncError::Decode {
            message: e.to_string(),
        })?;
        let response = builder
            .basic_auth(&auth.username, Some(&auth.password))
            .header(CONTENT_TYPE, "text/x-json")
            .body(payload)
            .send()
            .await?;
        response.json().await.map_err(|e| SyncError::Decode {
            message: format!("directory response: {e}"),
        })
    }
}

enum Method {
    Post,
    Put,
}
