//! Request and response bodies of the crop service HTTP API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{CropRect, ImageRecord, Orientation},
    error::ApiError,
};

/// `{success, error, message}` carried by every mutating endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyStatus {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReplyStatus {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            message: None,
        }
    }

    pub fn into_result(self) -> Result<Self, ApiError> {
        if self.success {
            Ok(self)
        } else {
            Err(ApiError::from_reply(self.error, self.message))
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncResponse {
    #[serde(flatten)]
    pub status: ReplyStatus,
    /// Files newly pulled from the input album; only counted.
    #[serde(default)]
    pub files: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRecord>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CropDataResponse {
    #[serde(flatten)]
    pub status: ReplyStatus,
    #[serde(default)]
    pub crop: Option<CropRect>,
}

impl CropDataResponse {
    /// Whether the backend holds a non-empty crop for this orientation.
    pub fn has_crop(&self) -> bool {
        self.status.success && self.crop.as_ref().is_some_and(CropRect::has_area)
    }
}

/// Saved crop entries of one image as reported by `/crop-data/all`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropPresence {
    #[serde(default)]
    pub portrait: Option<Value>,
    #[serde(default)]
    pub landscape: Option<Value>,
}

impl CropPresence {
    pub fn has(&self, orientation: Orientation) -> bool {
        let entry = match orientation {
            Orientation::Portrait => &self.portrait,
            Orientation::Landscape => &self.landscape,
        };
        entry.as_ref().is_some_and(is_present)
    }

    pub fn any(&self) -> bool {
        self.has(Orientation::Portrait) || self.has(Orientation::Landscape)
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllCropsResponse {
    #[serde(default)]
    pub crops: HashMap<String, CropPresence>,
}

impl AllCropsResponse {
    pub fn presence(&self, identifier: &str) -> Option<&CropPresence> {
        self.crops.get(identifier)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadAllResponse {
    #[serde(flatten)]
    pub status: ReplyStatus,
    #[serde(default)]
    pub uploaded_assets: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierRequest {
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSingleRequest {
    pub identifier: String,
    pub orientation: Orientation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_response_without_images_keeps_none() {
        let body: SyncResponse =
            serde_json::from_str(r#"{"success":true,"files":["a.jpg","b.jpg"]}"#).expect("json");
        assert!(body.status.success);
        assert_eq!(body.files.len(), 2);
        assert!(body.images.is_none());
    }

    #[test]
    fn crop_response_requires_positive_width() {
        let saved: CropDataResponse = serde_json::from_str(
            r#"{"success":true,"crop":{"x":0,"y":0,"width":120.5,"height":300}}"#,
        )
        .expect("json");
        assert!(saved.has_crop());

        let empty: CropDataResponse = serde_json::from_str(
            r#"{"success":true,"crop":{"x":0,"y":0,"width":0,"height":0}}"#,
        )
        .expect("json");
        assert!(!empty.has_crop());

        let missing: CropDataResponse =
            serde_json::from_str(r#"{"success":false,"error":"no crop"}"#).expect("json");
        assert!(!missing.has_crop());
    }

    #[test]
    fn crop_presence_treats_null_and_false_as_absent() {
        let all: AllCropsResponse = serde_json::from_str(
            r#"{"crops":{
                "a1":{"portrait":{"x":1,"y":2,"width":3,"height":4},"landscape":null},
                "b.jpg":{"portrait":false,"landscape":true},
                "c.jpg":{}
            }}"#,
        )
        .expect("json");

        let a1 = all.presence("a1").expect("a1");
        assert!(a1.has(Orientation::Portrait));
        assert!(!a1.has(Orientation::Landscape));

        let b = all.presence("b.jpg").expect("b");
        assert!(!b.has(Orientation::Portrait));
        assert!(b.has(Orientation::Landscape));

        assert!(!all.presence("c.jpg").expect("c").any());
        assert!(all.presence("zzz").is_none());
    }

    #[test]
    fn failed_reply_carries_server_text() {
        let err = ReplyStatus::failed("asset locked")
            .into_result()
            .expect_err("should fail");
        assert_eq!(err.message, "asset locked");
    }

    #[test]
    fn upload_single_request_uses_lowercase_orientation() {
        let body = serde_json::to_value(UploadSingleRequest {
            identifier: "a1".into(),
            orientation: Orientation::Landscape,
        })
        .expect("json");
        assert_eq!(
            body,
            serde_json::json!({"identifier": "a1", "orientation": "landscape"})
        );
    }
}
