use std::path::{Path, PathBuf};

use image::{imageops, ImageReader, RgbaImage};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("failed to open image {path}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error(
        "crop {rect:?} lies outside atlas {path} ({atlas_width}x{atlas_height})"
    )]
    CropOutOfBounds {
        path: PathBuf,
        rect: PixelRect,
        atlas_width: u32,
        atlas_height: u32,
    },
}

/// Rectangle in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.w > 0
            && self.h > 0
            && self.x.checked_add(self.w).is_some_and(|right| right <= width)
            && self.y.checked_add(self.h).is_some_and(|bottom| bottom <= height)
    }
}

/// Index of an atlas registered with one [`SpriteCache`](super::SpriteCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteSource {
    AtlasCrop { atlas: AtlasId, rect: PixelRect },
    StandaloneFile { path: PathBuf },
}

/// Decodes image files into RGBA buffers.
///
/// The cache is generic over this so tests can count decodes and serve images
/// from memory.
pub trait ImageLoader {
    fn load(&mut self, path: &Path) -> Result<RgbaImage, ResourceError>;
}

#[derive(Debug, Clone, Default)]
pub struct FsImageLoader {
    root: Option<PathBuf>,
}

impl FsImageLoader {
    /// Relative sprite paths resolve against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&mut self, path: &Path) -> Result<RgbaImage, ResourceError> {
        let resolved = self.resolve(path);
        let reader = ImageReader::open(&resolved).map_err(|error| ResourceError::Open {
            path: resolved.clone(),
            reason: error.to_string(),
        })?;
        let decoded = reader.decode().map_err(|error| ResourceError::Decode {
            path: resolved.clone(),
            reason: error.to_string(),
        })?;
        Ok(decoded.to_rgba8())
    }
}

/// One big image holding many packed sprites.
///
/// The decoded image lives here only while crops are being cut from it.
#[derive(Debug)]
pub struct AtlasFile {
    pub path: PathBuf,
    pub(crate) big_image: Option<RgbaImage>,
    /// Held crops cut after the load pass.
    pub(crate) live_crops: u32,
}

impl AtlasFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            big_image: None,
            live_crops: 0,
        }
    }

    pub fn is_resident(&self) -> bool {
        self.big_image.is_some()
    }
}

pub(crate) fn crop_from_atlas(
    atlas_path: &Path,
    big_image: &RgbaImage,
    rect: PixelRect,
) -> Result<RgbaImage, ResourceError> {
    if !rect.fits_within(big_image.width(), big_image.height()) {
        return Err(ResourceError::CropOutOfBounds {
            path: atlas_path.to_path_buf(),
            rect,
            atlas_width: big_image.width(),
            atlas_height: big_image.height(),
        });
    }
    Ok(imageops::crop_imm(big_image, rect.x, rect.y, rect.w, rect.h).to_image())
}

/// Grid section of an atlas, cells addressed by row and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AtlasGrid {
    #[serde(default)]
    pub x_top_left: u32,
    #[serde(default)]
    pub y_top_left: u32,
    pub dx: u32,
    pub dy: u32,
    #[serde(default)]
    pub pixel_border_x: u32,
    #[serde(default)]
    pub pixel_border_y: u32,
}

impl AtlasGrid {
    pub fn cell_rect(&self, row: u32, column: u32) -> PixelRect {
        PixelRect {
            x: self.x_top_left + (self.dx + self.pixel_border_x) * column,
            y: self.y_top_left + (self.dy + self.pixel_border_y) * row,
            w: self.dx,
            h: self.dy,
        }
    }
}
