//! HTTP boundary of the crop service.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{ImageRecord, Orientation},
    protocol::{
        AllCropsResponse, CropDataResponse, IdentifierRequest, ReplyStatus, SyncResponse,
        UploadAllResponse, UploadSingleRequest,
    },
};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Endpoints of the crop service consumed by the workflow controller.
///
/// Implementations return the backend's reply envelopes as-is; deciding what a
/// `success: false` reply means is left to the caller.
#[async_trait]
pub trait CropBackend: Send + Sync {
    async fn sync(&self) -> Result<SyncResponse, ClientError>;
    async fn list_images(&self) -> Result<Vec<ImageRecord>, ClientError>;
    /// Any non-2xx status is an error: 404 means no crop is saved, anything
    /// else is a failed lookup.
    async fn fetch_crop(
        &self,
        identifier: &str,
        orientation: Orientation,
    ) -> Result<CropDataResponse, ClientError>;
    async fn delete_crop(
        &self,
        identifier: &str,
        orientation: Orientation,
    ) -> Result<ReplyStatus, ClientError>;
    async fn all_crops(&self) -> Result<AllCropsResponse, ClientError>;
    async fn upload_all(&self) -> Result<UploadAllResponse, ClientError>;
    async fn upload_single(
        &self,
        identifier: &str,
        orientation: Orientation,
    ) -> Result<ReplyStatus, ClientError>;
    async fn complete(&self, identifier: &str) -> Result<ReplyStatus, ClientError>;
    async fn reset(&self, identifier: &str) -> Result<ReplyStatus, ClientError>;
    async fn delete_original(&self, identifier: &str) -> Result<ReplyStatus, ClientError>;

    /// Location of the source image.
    fn image_url(&self, identifier: &str) -> String;
    /// Location of a rendered crop.
    fn crop_output_url(&self, identifier: &str, orientation: Orientation) -> String;
}

pub struct HttpBackend {
    http: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(server_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(server_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins percent-encoded path segments onto the server url.
    fn endpoint<S: AsRef<str>>(&self, segments: &[S]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment.as_ref());
            }
        }
        url
    }

    fn crop_endpoint(&self, identifier: &str, orientation: Orientation) -> Url {
        self.endpoint(&["crop-data", identifier, orientation.as_str()])
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> ClientError {
    ClientError::Status {
        status: status.as_u16(),
        body: String::from_utf8_lossy(body)
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect(),
    }
}

/// Decodes a JSON body regardless of status, since the service reports
/// rejections as `{success: false}` on error statuses too.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;
    match serde_json::from_slice::<T>(&body) {
        Ok(value) => Ok(value),
        Err(err) if status.is_success() => Err(ClientError::Decode(err)),
        Err(_) => Err(status_error(status, &body)),
    }
}

/// Decodes only 2xx bodies. Used where an all-default envelope decoded from
/// an error status would read as a valid answer.
async fn read_success_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return read_json(response).await;
    }
    let body = response.bytes().await?;
    Err(status_error(status, &body))
}

#[async_trait]
impl CropBackend for HttpBackend {
    async fn sync(&self) -> Result<SyncResponse, ClientError> {
        let url = self.endpoint(&["sync"]);
        debug!(%url, "POST sync");
        let response = self.http.post(url).send().await?;
        read_json(response).await
    }

    async fn list_images(&self) -> Result<Vec<ImageRecord>, ClientError> {
        let url = self.endpoint(&["images"]);
        debug!(%url, "GET images");
        let response = self.http.get(url).send().await?;
        read_json(response).await
    }

    async fn fetch_crop(
        &self,
        identifier: &str,
        orientation: Orientation,
    ) -> Result<CropDataResponse, ClientError> {
        let url = self.crop_endpoint(identifier, orientation);
        debug!(%url, "GET crop data");
        let response = self.http.get(url).send().await?;
        read_success_json(response).await
    }

    async fn delete_crop(
        &self,
        identifier: &str,
        orientation: Orientation,
    ) -> Result<ReplyStatus, ClientError> {
        let url = self.crop_endpoint(identifier, orientation);
        debug!(%url, "DELETE crop data");
        let response = self.http.delete(url).send().await?;
        read_json(response).await
    }

    async fn all_crops(&self) -> Result<AllCropsResponse, ClientError> {
        let url = self.endpoint(&["crop-data", "all"]);
        debug!(%url, "GET all crop data");
        let response = self.http.get(url).send().await?;
        read_json(response).await
    }

    async fn upload_all(&self) -> Result<UploadAllResponse, ClientError> {
        let url = self.endpoint(&["upload-all"]);
        debug!(%url, "POST upload-all");
        let response = self.http.post(url).send().await?;
        read_json(response).await
    }

    async fn upload_single(
        &self,
        identifier: &str,
        orientation: Orientation,
    ) -> Result<ReplyStatus, ClientError> {
        let response = self
            .http
            .post(self.endpoint(&["upload-single"]))
            .json(&UploadSingleRequest {
                identifier: identifier.to_string(),
                orientation,
            })
            .send()
            .await?;
        read_json(response).await
    }

    async fn complete(&self, identifier: &str) -> Result<ReplyStatus, ClientError> {
        let response = self
            .http
            .post(self.endpoint(&["complete"]))
            .json(&IdentifierRequest {
                identifier: identifier.to_string(),
            })
            .send()
            .await?;
        read_json(response).await
    }

    async fn reset(&self, identifier: &str) -> Result<ReplyStatus, ClientError> {
        let response = self
            .http
            .post(self.endpoint(&["reset"]))
            .json(&IdentifierRequest {
                identifier: identifier.to_string(),
            })
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_original(&self, identifier: &str) -> Result<ReplyStatus, ClientError> {
        let response = self
            .http
            .delete(self.endpoint(&["delete-original"]))
            .json(&IdentifierRequest {
                identifier: identifier.to_string(),
            })
            .send()
            .await?;
        read_json(response).await
    }

    fn image_url(&self, identifier: &str) -> String {
        self.endpoint(&["image", identifier]).to_string()
    }

    fn crop_output_url(&self, identifier: &str, orientation: Orientation) -> String {
        let file = format!("{identifier}_{orientation}.jpg");
        self.endpoint(&["output", orientation.as_str(), file.as_str()])
            .to_string()
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
