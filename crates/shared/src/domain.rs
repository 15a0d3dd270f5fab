use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two crop variants produced per source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub const ALL: [Orientation; 2] = [Orientation::Portrait, Orientation::Landscape];

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }

    /// Crop stage the editor opens on when re-cropping this orientation.
    pub fn stage(self) -> u8 {
        match self {
            Orientation::Portrait => 1,
            Orientation::Landscape => 2,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(format!(
                "invalid orientation '{other}': expected 'portrait' or 'landscape'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    #[default]
    Unprocessed,
    Portrait,
    Landscape,
    Both,
    Completed,
}

impl ImageStatus {
    /// Four-way status from which orientations have a saved crop.
    pub fn from_presence(has_portrait: bool, has_landscape: bool) -> Self {
        match (has_portrait, has_landscape) {
            (true, true) => ImageStatus::Both,
            (true, false) => ImageStatus::Portrait,
            (false, true) => ImageStatus::Landscape,
            (false, false) => ImageStatus::Unprocessed,
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, ImageStatus::Both | ImageStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageStatus::Unprocessed => "unprocessed",
            ImageStatus::Portrait => "portrait",
            ImageStatus::Landscape => "landscape",
            ImageStatus::Both => "both",
            ImageStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn has_area(&self) -> bool {
        self.width > 0.0
    }
}

/// An entry of the synced image list.
///
/// Records are keyed by [`ImageRecord::identifier`]: the remote asset id when
/// the image came from the photo service, otherwise the local filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub status: ImageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageRecord {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            asset_id: None,
            filename: filename.into(),
            original_filename: None,
            status: ImageStatus::Unprocessed,
            width: None,
            height: None,
        }
    }

    pub fn with_asset_id(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_id = Some(asset_id.into());
        self
    }

    pub fn with_status(mut self, status: ImageStatus) -> Self {
        self.status = status;
        self
    }

    pub fn identifier(&self) -> &str {
        self.asset_id.as_deref().unwrap_or(&self.filename)
    }

    pub fn display_name(&self) -> &str {
        self.original_filename.as_deref().unwrap_or(&self.filename)
    }

    pub fn is(&self, identifier: &str) -> bool {
        self.identifier() == identifier
    }
}

/// Shortens long filenames for list and table cells, keeping the extension.
pub fn truncate_filename(name: &str, max_chars: usize) -> String {
    let len = name.chars().count();
    if len <= max_chars || max_chars < 4 {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    };
    let ext_len = ext.chars().count();
    if ext_len + 4 > max_chars {
        let head: String = name.chars().take(max_chars - 3).collect();
        return format!("{head}...");
    }

    let keep = max_chars - ext_len - 3;
    let head: String = stem.chars().take(keep).collect();
    format!("{head}...{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_prefers_asset_id() {
        let record = ImageRecord::new("f.jpg").with_asset_id("a1");
        assert_eq!(record.identifier(), "a1");
        assert!(record.is("a1"));
        assert!(!record.is("f.jpg"));

        let local = ImageRecord::new("f.jpg");
        assert_eq!(local.identifier(), "f.jpg");
    }

    #[test]
    fn status_truth_table() {
        assert_eq!(ImageStatus::from_presence(true, true), ImageStatus::Both);
        assert_eq!(ImageStatus::from_presence(true, false), ImageStatus::Portrait);
        assert_eq!(ImageStatus::from_presence(false, true), ImageStatus::Landscape);
        assert_eq!(
            ImageStatus::from_presence(false, false),
            ImageStatus::Unprocessed
        );
    }

    #[test]
    fn record_decodes_with_missing_optional_fields() {
        let record: ImageRecord =
            serde_json::from_str(r#"{"filename":"beach.jpg","status":"landscape"}"#)
                .expect("decode");
        assert_eq!(record.asset_id, None);
        assert_eq!(record.status, ImageStatus::Landscape);
        assert_eq!(record.display_name(), "beach.jpg");

        let bare: ImageRecord = serde_json::from_str(r#"{"filename":"x.png"}"#).expect("decode");
        assert_eq!(bare.status, ImageStatus::Unprocessed);
    }

    #[test]
    fn orientation_parses_only_known_names() {
        assert_eq!("portrait".parse::<Orientation>(), Ok(Orientation::Portrait));
        assert_eq!(
            "landscape".parse::<Orientation>(),
            Ok(Orientation::Landscape)
        );
        assert!("Portrait".parse::<Orientation>().is_err());
    }

    #[test]
    fn truncates_long_names_but_keeps_extension() {
        assert_eq!(truncate_filename("short.jpg", 25), "short.jpg");
        assert_eq!(
            truncate_filename("a_very_long_holiday_photo_name.jpeg", 20),
            "a_very_long_....jpeg"
        );
        assert_eq!(
            truncate_filename("a_very_long_holiday_photo_name.jpeg", 20)
                .chars()
                .count(),
            20
        );
    }
}
