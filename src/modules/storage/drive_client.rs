//! Google Drive v3 REST client.
//!
//! Authenticates as a service account: a short-lived RS256 assertion is
//! exchanged at the token endpoint for an access token, which is cached
//! behind an RwLock and refreshed shortly before expiry.
//!
//! Every operation is a single attempt; failures propagate to the caller.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Body, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::io::ReaderStream;

use crate::core::config::DriveConfig;
use crate::core::error::AppError;

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
const FILE_FIELDS: &str = "id,name,mimeType,webContentLink,webViewLink,size";

/// Drive file metadata as returned by the files API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub web_content_link: Option<String>,
    #[serde(default)]
    pub web_view_link: Option<String>,
    /// Drive reports sizes as decimal strings
    #[serde(default)]
    pub size: Option<String>,
}

impl DriveFile {
    /// Preferred externally shareable link
    pub fn download_link(&self) -> Option<&str> {
        self.web_content_link
            .as_deref()
            .or(self.web_view_link.as_deref())
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

/// Shape of the media-upload response when only the id is requested
#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct TokenCache {
    token: TokenResponse,
    fetched_at: Instant,
}

pub struct DriveClient {
    config: DriveConfig,
    signing_key: EncodingKey,
    client: Client,
    cache: RwLock<Option<TokenCache>>,
    /// Refresh the access token this long before it expires
    refresh_margin: Duration,
}

impl DriveClient {
    pub fn new(config: DriveConfig) -> Result<Self, AppError> {
        let signing_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())
            .map_err(|e| AppError::Internal(format!("Invalid Google Drive private key: {}", e)))?;

        Ok(Self {
            config,
            signing_key,
            client: Client::new(),
            cache: RwLock::new(None),
            refresh_margin: Duration::from_secs(60),
        })
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.config.api_base_url, file_id)
    }

    /// Get a valid access token, exchanging a fresh assertion if necessary
    async fn access_token(&self) -> Result<String, AppError> {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                let elapsed = cached.fetched_at.elapsed();
                let expires_in = Duration::from_secs(cached.token.expires_in);

                if elapsed + self.refresh_margin < expires_in {
                    tracing::debug!(
                        "Using cached Drive access token (expires in {} seconds)",
                        (expires_in - elapsed).as_secs()
                    );
                    return Ok(cached.token.access_token.clone());
                }
            }
        }

        self.fetch_token().await
    }

    async fn fetch_token(&self) -> Result<String, AppError> {
        let now = Utc::now().timestamp() as u64;
        let claims = AssertionClaims {
            iss: &self.config.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.config.token_uri,
            iat: now,
            exp: now + 3600,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.config.private_key_id.clone());

        let assertion = encode(&header, &claims, &self.signing_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign Drive assertion: {}", e)))?;

        tracing::debug!("Fetching new Drive access token from {}", self.config.token_uri);

        let response = self
            .client
            .post(&self.config.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Drive token request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "Drive token request failed: HTTP {} - {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to parse Drive token response: {}", e))
        })?;

        tracing::info!(
            "Fetched new Drive access token, expires in {} seconds",
            token.expires_in
        );

        let mut cache = self.cache.write().await;
        *cache = Some(TokenCache {
            token: token.clone(),
            fetched_at: Instant::now(),
        });

        Ok(token.access_token)
    }

    /// Upload a local file to the configured parent folder.
    ///
    /// Streams the bytes, names the file and attaches it to the folder, then
    /// grants anyone/reader permission and re-fetches metadata so the
    /// returned record carries the public content links.
    pub async fn upload(
        &self,
        path: &Path,
        display_name: &str,
        mime_type: &str,
    ) -> Result<DriveFile, AppError> {
        let token = self.access_token().await?;

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to open staged file: {}", e)))?;
        let stream = ReaderStream::new(file);

        let response = self
            .client
            .post(format!(
                "{}/files?uploadType=media&fields=id",
                self.config.upload_base_url
            ))
            .bearer_auth(&token)
            .header("Content-Type", mime_type)
            .body(Body::wrap_stream(stream))
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Drive upload failed: {}", e)))?;

        let created: CreatedFile = Self::parse_response(response, "upload").await?;

        // Name the file and move it into the configured parent folder
        let response = self
            .client
            .patch(format!(
                "{}?addParents={}&fields={}",
                self.file_url(&created.id),
                self.config.folder_id,
                FILE_FIELDS
            ))
            .bearer_auth(&token)
            .json(&json!({ "name": display_name }))
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Drive metadata update failed: {}", e))
            })?;

        let named: DriveFile = Self::parse_response(response, "metadata update").await?;

        tracing::info!("File uploaded to Google Drive: id={}, name={}", named.id, named.name);

        // Make the file publicly readable for download links
        let response = self
            .client
            .post(format!("{}/permissions", self.file_url(&named.id)))
            .bearer_auth(&token)
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Drive permission grant failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "Drive permission grant failed: HTTP {} - {}",
                status, body
            )));
        }

        // Re-fetch so webContentLink reflects the granted permission
        self.metadata(&named.id).await
    }

    /// Fetch metadata for a file id
    pub async fn metadata(&self, file_id: &str) -> Result<DriveFile, AppError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(format!("{}?fields={}", self.file_url(file_id), FILE_FIELDS))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Drive metadata fetch failed: {}", e))
            })?;

        Self::parse_response(response, "metadata fetch").await
    }

    /// Open a byte stream for a file.
    ///
    /// Metadata is resolved first so the caller can set transfer headers
    /// before any bytes flow. A failure mid-stream is not recoverable; the
    /// transfer is simply cut short.
    pub async fn download(&self, file_id: &str) -> Result<(DriveFile, reqwest::Response), AppError> {
        let meta = self.metadata(file_id).await?;

        let token = self.access_token().await?;
        let response = self
            .client
            .get(format!("{}?alt=media", self.file_url(file_id)))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Drive download failed: {}", e))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("File not found on Google Drive".to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "Drive download failed: HTTP {} - {}",
                status, body
            )));
        }

        Ok((meta, response))
    }

    /// Delete a file. Callers treat failures as non-fatal.
    pub async fn delete(&self, file_id: &str) -> Result<(), AppError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .delete(self.file_url(file_id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Drive delete failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("File not found on Google Drive".to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "Drive delete failed: HTTP {} - {}",
                status, body
            )));
        }

        tracing::debug!("Deleted file from Google Drive: {}", file_id);
        Ok(())
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        op: &str,
    ) -> Result<T, AppError> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("File not found on Google Drive".to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "Drive {} failed: HTTP {} - {}",
                op, status, body
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to parse Drive {} response: {}", op, e))
        })
    }
}
