//! services/annotator/src/adapters/http.rs
//!
//! This module contains the REST adapter for the project backend. It implements
//! the `ProjectBackend` port from the core crate over `reqwest`.
//!
//! Every request carries the bearer token from the `TokenStore`. A missing token
//! fails before anything is sent; a 401/403 purges the stored token.

use crate::adapters::dto::{DocumentRecord, ErrorBody, ProjectRecord};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thematic_core::domain::{Document, DocumentId, ProjectId, ProjectSnapshot, StagedFile};
use thematic_core::ports::{PortError, PortResult, ProjectBackend, TokenStore};
use tracing::{debug, error, info, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ProjectBackend` port against the REST API.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl HttpBackend {
    /// Creates a new `HttpBackend`. `base_url` includes the API prefix,
    /// e.g. `http://localhost:8000/api/v1`.
    pub fn new(client: Client, base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            tokens,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Sends an authenticated request and classifies non-2xx responses.
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> PortResult<Response> {
        let Some(token) = self.tokens.load() else {
            warn!("No auth token found for request to: {}", endpoint);
            return Err(PortError::Unauthorized);
        };

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                error!("API request error: {}: {}", endpoint, e);
                PortError::Unexpected(e.to_string())
            })?;

        let status = response.status();
        debug!("{} -> {}", endpoint, status);
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(
                "Authentication error for endpoint {}: {}. Discarding stored token.",
                endpoint,
                status.as_u16()
            );
            if let Err(e) = self.tokens.clear() {
                error!("Failed to discard stored token: {}", e);
            }
            return Err(PortError::Unauthorized);
        }

        let message = error_message(status, response).await;
        if status == StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(message));
        }
        Err(PortError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> PortResult<T> {
        let response = self.send(endpoint, self.client.get(self.url(endpoint))).await?;
        decode(endpoint, response).await
    }
}

/// The body's `detail`, or `Error {status}: {reason}`.
async fn error_message(status: StatusCode, response: Response) -> String {
    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message());
    detail.unwrap_or_else(|| {
        format!(
            "Error {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        )
    })
}

async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> PortResult<T> {
    response.json::<T>().await.map_err(|e| {
        error!("Malformed response body from {}: {}", endpoint, e);
        PortError::Unexpected(format!("malformed response from {}: {}", endpoint, e))
    })
}

fn file_part(file: &StagedFile) -> Part {
    Part::stream(file.content.clone()).file_name(file.file_name.clone())
}

//=========================================================================================
// `ProjectBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProjectBackend for HttpBackend {
    async fn get_project(&self, project_id: ProjectId) -> PortResult<ProjectSnapshot> {
        info!("Fetching full project data for project {}", project_id);
        let record: ProjectRecord = self.get_json(&format!("/projects/{}", project_id)).await?;
        Ok(record.to_domain())
    }

    async fn upload_document(
        &self,
        project_id: ProjectId,
        file: &StagedFile,
    ) -> PortResult<Document> {
        info!(
            "Uploading document: {} ({} bytes) to project {}",
            file.file_name,
            file.size(),
            project_id
        );
        let mut form = Form::new()
            .part("file", file_part(file))
            .text("project_id", project_id.to_string());
        if let Some(name) = file.display_name.as_ref().filter(|n| !n.is_empty()) {
            form = form.text("name", name.clone());
        }
        if let Some(description) = file.description.as_ref().filter(|d| !d.is_empty()) {
            form = form.text("description", description.clone());
        }

        let endpoint = "/documents/";
        let request = self.client.post(self.url(endpoint)).multipart(form);
        let response = self.send(endpoint, request).await?;
        let record: DocumentRecord = decode(endpoint, response).await?;
        Ok(record.to_domain())
    }

    async fn bulk_upload_documents(
        &self,
        project_id: ProjectId,
        files: &[StagedFile],
    ) -> PortResult<Vec<Document>> {
        info!("Bulk uploading {} files to project {}", files.len(), project_id);
        let form = files
            .iter()
            .fold(Form::new(), |form, file| form.part("files", file_part(file)))
            .text("project_id", project_id.to_string());

        let endpoint = "/documents/bulk-upload";
        let request = self.client.post(self.url(endpoint)).multipart(form);
        let response = self.send(endpoint, request).await?;
        let records: Vec<DocumentRecord> = decode(endpoint, response).await?;
        Ok(records.into_iter().map(DocumentRecord::to_domain).collect())
    }

    async fn list_project_documents(&self, project_id: ProjectId) -> PortResult<Vec<Document>> {
        let records: Vec<DocumentRecord> = self
            .get_json(&format!("/documents/project/{}", project_id))
            .await?;
        Ok(records.into_iter().map(DocumentRecord::to_domain).collect())
    }

    async fn get_document(&self, document_id: DocumentId) -> PortResult<Document> {
        let record: DocumentRecord = self.get_json(&format!("/documents/{}", document_id)).await?;
        Ok(record.to_domain())
    }

    async fn delete_document(&self, document_id: DocumentId) -> PortResult<()> {
        let endpoint = format!("/documents/{}", document_id);
        // 204 No Content; any body is ignored.
        self.send(&endpoint, self.client.delete(self.url(&endpoint)))
            .await?;
        Ok(())
    }
}
