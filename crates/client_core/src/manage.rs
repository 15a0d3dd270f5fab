//! Rows of the manage table: processed images with their crops.

use shared::{
    domain::{truncate_filename, ImageRecord, Orientation},
    protocol::AllCropsResponse,
};

use crate::backend::CropBackend;

const NAME_CELL_CHARS: usize = 25;

/// Output size of each crop orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSizes {
    pub portrait: (u32, u32),
    pub landscape: (u32, u32),
}

impl Default for OutputSizes {
    fn default() -> Self {
        Self {
            portrait: (1080, 1920),
            landscape: (1920, 1080),
        }
    }
}

impl OutputSizes {
    pub fn get(&self, orientation: Orientation) -> (u32, u32) {
        match orientation {
            Orientation::Portrait => self.portrait,
            Orientation::Landscape => self.landscape,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropCell {
    pub preview_url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageRow {
    pub identifier: String,
    pub display_name: String,
    pub short_name: String,
    /// `"w × h"`, with `?` for unknown sides.
    pub dimensions: String,
    pub preview_url: String,
    pub portrait: Option<CropCell>,
    pub landscape: Option<CropCell>,
}

impl ManageRow {
    pub fn crop(&self, orientation: Orientation) -> Option<&CropCell> {
        match orientation {
            Orientation::Portrait => self.portrait.as_ref(),
            Orientation::Landscape => self.landscape.as_ref(),
        }
    }
}

fn side(value: Option<u32>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

/// Keeps images with at least one saved crop, in list order.
pub fn build_rows(
    images: &[ImageRecord],
    crops: &AllCropsResponse,
    backend: &dyn CropBackend,
    sizes: OutputSizes,
) -> Vec<ManageRow> {
    images
        .iter()
        .filter_map(|image| {
            let identifier = image.identifier();
            let presence = crops.presence(identifier).filter(|p| p.any())?;
            let cell = |orientation: Orientation| {
                presence.has(orientation).then(|| {
                    let (width, height) = sizes.get(orientation);
                    CropCell {
                        preview_url: backend.crop_output_url(identifier, orientation),
                        width,
                        height,
                    }
                })
            };

            Some(ManageRow {
                identifier: identifier.to_string(),
                display_name: image.display_name().to_string(),
                short_name: truncate_filename(image.display_name(), NAME_CELL_CHARS),
                dimensions: format!("{} × {}", side(image.width), side(image.height)),
                preview_url: backend.image_url(identifier),
                portrait: cell(Orientation::Portrait),
                landscape: cell(Orientation::Landscape),
            })
        })
        .collect()
}
