//! Parameter types for image operations.
//!
//! These structs describe *what* to write, not *how* to write it. They are the
//! interface between the pipelines (which decide what files to create) and
//! the [`backend`](super::backend) (which does the encoding). Keeping them
//! separate lets tests swap in a mock backend without touching pipeline logic.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`OutputFormat`] — Container written for cube faces and stitched panoramas.
//! - [`Encoding`] — Format + quality pair carried by the pipeline options.
//! - [`SaveParams`] — Output path and encoding for one write.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Output container.
///
/// TIFF is the default: lossless, 16-bit capable, and what downstream tile
/// and video tools expect for intermediate cube faces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Tiff,
    Png,
    Jpeg,
}

impl OutputFormat {
    /// File extension written for this format (without the dot).
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Tiff => "tif",
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            OutputFormat::Tiff => image::ImageFormat::Tiff,
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// How output files are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Encoding {
    pub format: OutputFormat,
    pub quality: Quality,
}

/// Parameters for writing one raster to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveParams {
    pub output: PathBuf,
    pub encoding: Encoding,
}
