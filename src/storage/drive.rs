//! Upload proxy to the document store
//!
//! Members upload deck files and task attachments through the API rather
//! than straight to the provider, so the bearer token never reaches the
//! browser. Uploads stream the raw body through in one request and hand
//! back the provider's file ID plus share links.

use bytes::Bytes;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::types::WilbeError;

/// Result of a successful upload, shaped for the response body
#[derive(Debug, Clone, serde::Serialize)]
pub struct UploadedFile {
    pub file_name: String,
    pub file_id: String,
    pub view_link: String,
    pub download_link: String,
}

#[derive(Deserialize)]
struct ProviderFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "webViewLink")]
    web_view_link: Option<String>,
    #[serde(default, rename = "webContentLink")]
    web_content_link: Option<String>,
}

/// Client for the document-storage upload API
#[derive(Clone)]
pub struct DriveClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    folder_id: Option<String>,
}

impl DriveClient {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        folder_id: Option<String>,
    ) -> Result<Self, WilbeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| WilbeError::Storage(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url,
            api_key,
            folder_id,
        })
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Upload one file and return the provider's identifiers and links
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<UploadedFile, WilbeError> {
        let Some(api_key) = &self.api_key else {
            return Err(WilbeError::Storage(
                "Document storage is not configured".into(),
            ));
        };

        let mut request = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .query(&[("uploadType", "media"), ("fields", "id,name,webViewLink,webContentLink")])
            .header("content-type", content_type)
            .header("x-upload-name", file_name)
            .body(data);

        if let Some(folder) = &self.folder_id {
            request = request.query(&[("parents", folder.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WilbeError::Storage(format!("Upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WilbeError::Storage(format!(
                "Storage provider returned {}: {}",
                status, body
            )));
        }

        let file: ProviderFile = response
            .json()
            .await
            .map_err(|e| WilbeError::Storage(format!("Invalid upload response: {}", e)))?;

        info!(file_id = %file.id, name = %file_name, "File uploaded");

        // The share links only work once the file is world-readable.
        // Like the notification sends, a failure here is logged and
        // tolerated rather than failing the upload that already landed.
        if let Err(e) = self.share_publicly(api_key, &file.id).await {
            warn!(file_id = %file.id, "Failed to set public-read permission: {}", e);
        }

        Ok(UploadedFile {
            file_name: file.name.unwrap_or_else(|| file_name.to_string()),
            view_link: file
                .web_view_link
                .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", file.id)),
            download_link: file
                .web_content_link
                .unwrap_or_else(|| format!("https://drive.google.com/uc?id={}", file.id)),
            file_id: file.id,
        })
    }

    /// Grant world-readable access to an uploaded file
    async fn share_publicly(&self, api_key: &str, file_id: &str) -> Result<(), WilbeError> {
        let response = self
            .client
            .post(permissions_url(&self.api_url, file_id))
            .bearer_auth(api_key)
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| WilbeError::Storage(format!("Permission request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WilbeError::Storage(format!(
                "Storage provider returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}

/// Permissions endpoint for a stored file. The upload endpoint lives
/// under the provider's /upload/ path prefix; the metadata API (which
/// owns permissions) uses the same path without it.
fn permissions_url(api_url: &str, file_id: &str) -> String {
    let base = api_url.replacen("/upload/", "/", 1);
    format!("{}/{}/permissions", base.trim_end_matches('/'), file_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions_url_leaves_upload_prefix_behind() {
        assert_eq!(
            permissions_url(
                "https://www.googleapis.com/upload/drive/v3/files",
                "abc123"
            ),
            "https://www.googleapis.com/drive/v3/files/abc123/permissions"
        );
    }

    #[test]
    fn test_permissions_url_without_upload_prefix() {
        assert_eq!(
            permissions_url("https://storage.example/v1/files/", "f-1"),
            "https://storage.example/v1/files/f-1/permissions"
        );
    }
}
