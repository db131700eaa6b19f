//! Cube-face → equirectangular stitcher.
//!
//! The inverse of [`project`](crate::project): for every destination pixel
//!
//! ```text
//! equirect (x, y) → (lon, lat) → Direction → (face, u, v) → bilinear sample
//! ```
//!
//! Sampling never crosses faces; coordinates on a face border clamp to that
//! face's edge pixels.
//!
//! The canvas defaults to `round(S × π)` by half that (see
//! [`default_equirect_size`]) and is written next to the faces as
//! `{prefix}{suffix}.{ext}`. Faces of mixed bit depth are all promoted to
//! 16-bit before stitching.

use crate::config::PanoConfig;
use crate::faces::FaceSet;
use crate::geometry::{
    Face, direction_from_equirect, face_and_uv_from_direction, lonlat_from_equirect_pixel,
};
use crate::imaging::{
    BackendError, Channel, Dimensions, EdgeMode, Encoding, EquirectSize, ImageBackend, Plane,
    Raster, Rgb16Image, SaveParams, default_equirect_size, sample_bilinear,
};
use image::{ImageBuffer, Pixel, Rgb, RgbImage};
use rayon::prelude::*;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StitchError {
    #[error("cannot load {face} face {}: {source}", path.display())]
    Load {
        face: Face,
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("{}: decoded face is {found}, expected {expected}×{expected}", path.display())]
    FaceChanged {
        path: PathBuf,
        found: Dimensions,
        expected: u32,
    },
    #[error(transparent)]
    Save(#[from] BackendError),
}

/// Settings for one stitch run.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereOptions {
    /// Explicit canvas; `None` derives it from the face size.
    pub size: Option<EquirectSize>,
    pub size_multiple: u32,
    /// Appended to the set prefix to form the output file stem.
    pub suffix: String,
    pub encoding: Encoding,
}

impl SphereOptions {
    pub fn from_config(config: &PanoConfig) -> Self {
        Self {
            size: None,
            size_multiple: config.sizing.multiple,
            suffix: config.output.equirect_suffix.clone(),
            encoding: config.output.encoding(),
        }
    }
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self::from_config(&PanoConfig::default())
    }
}

/// What a successful stitch produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereOutput {
    pub prefix: String,
    pub face_size: u32,
    pub size: EquirectSize,
    pub output: PathBuf,
}

/// The six faces of a set at one common bit depth, in [`Face::ALL`] order.
pub enum FaceRasters {
    Rgb8([RgbImage; 6]),
    Rgb16([Rgb16Image; 6]),
}

impl FaceRasters {
    /// Bring six decoded faces to one depth: 16-bit if any face is.
    pub fn from_rasters(rasters: [Raster; 6]) -> Self {
        if rasters.iter().any(Raster::is_high_depth) {
            FaceRasters::Rgb16(rasters.map(Raster::into_rgb16))
        } else {
            FaceRasters::Rgb8(rasters.map(Raster::into_rgb8))
        }
    }

    pub fn stitch(&self, size: EquirectSize) -> Raster {
        match self {
            FaceRasters::Rgb8(faces) => Raster::Rgb8(stitch_equirect(faces, size)),
            FaceRasters::Rgb16(faces) => Raster::Rgb16(stitch_equirect(faces, size)),
        }
    }
}

/// Resample six equal square faces onto an equirect canvas.
pub fn stitch_equirect<T: Channel>(faces: &[Plane<T>; 6], size: EquirectSize) -> Plane<T>
where
    Rgb<T>: Pixel<Subpixel = T>,
{
    let EquirectSize { width, height } = size;
    let face_size = faces[0].width();
    let mut out: Plane<T> = ImageBuffer::new(width, height);
    out.par_chunks_mut(width as usize * 3)
        .enumerate()
        .for_each(|(row, pixels)| {
            let y = row as f64 + 0.5;
            for (col, px) in pixels.chunks_exact_mut(3).enumerate() {
                let (lon, lat) = lonlat_from_equirect_pixel(col as f64 + 0.5, y, width, height);
                let dir = direction_from_equirect(lon, lat);
                let (face, u, v) = face_and_uv_from_direction(dir, face_size);
                px.copy_from_slice(&sample_bilinear(
                    &faces[face.index()],
                    u - 0.5,
                    v - 0.5,
                    EdgeMode::Clamp,
                ));
            }
        });
    out
}

/// Output path for a set: `{directory}/{prefix}{suffix}.{ext}`.
pub fn sphere_output_path(set: &FaceSet, options: &SphereOptions) -> PathBuf {
    set.directory.join(format!(
        "{}{}.{}",
        set.prefix,
        options.suffix,
        options.encoding.format.extension()
    ))
}

/// Stitch a validated face set into one equirectangular file.
pub fn to_sphere(
    backend: &impl ImageBackend,
    set: &FaceSet,
    options: &SphereOptions,
) -> Result<SphereOutput, StitchError> {
    let size = options
        .size
        .unwrap_or_else(|| default_equirect_size(set.size, options.size_multiple));

    let load = |face: Face| {
        let path = set.path(face);
        let raster = backend.load(path).map_err(|source| StitchError::Load {
            face,
            path: path.to_path_buf(),
            source,
        })?;
        let (width, height) = raster.dimensions();
        if width != set.size || height != set.size {
            return Err(StitchError::FaceChanged {
                path: path.to_path_buf(),
                found: Dimensions { width, height },
                expected: set.size,
            });
        }
        Ok(raster)
    };
    let [front, back, left, right, up, down] = Face::ALL.map(load);
    let faces = FaceRasters::from_rasters([front?, back?, left?, right?, up?, down?]);

    let stitched = faces.stitch(size);
    drop(faces);

    let output = sphere_output_path(set, options);
    backend.save(
        &stitched,
        &SaveParams {
            output: output.clone(),
            encoding: options.encoding,
        },
    )?;

    Ok(SphereOutput {
        prefix: set.prefix.clone(),
        face_size: set.size,
        size,
        output,
    })
}
