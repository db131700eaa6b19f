//! Shared test utilities for the panocube test suite.
//!
//! Synthetic panoramas whose colours are a known function of direction, so
//! projection tests can assert *where* a pixel came from, plus fixture
//! helpers for face-set discovery.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let equirect = face_colored_equirect(512, 256);
//! let tmp = tempfile::TempDir::new().unwrap();
//! let paths = touch_face_set(tmp.path(), "pano", FaceNaming::Letter, "tif");
//! ```

use crate::faces::FaceNaming;
use crate::geometry::{
    Direction, Face, direction_from_equirect, face_plane_from_direction,
    lonlat_from_equirect_pixel,
};
use image::{ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};

// =========================================================================
// Synthetic panoramas
// =========================================================================

/// One distinct colour per face, indexed by [`Face::index`].
pub const FACE_COLORS: [Rgb<u8>; 6] = [
    Rgb([255, 0, 0]),
    Rgb([0, 255, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 255, 0]),
    Rgb([0, 255, 255]),
    Rgb([255, 0, 255]),
];

/// Direction through the centre of an equirect pixel.
pub fn equirect_pixel_direction(x: u32, y: u32, width: u32, height: u32) -> Direction {
    let (lon, lat) = lonlat_from_equirect_pixel(x as f64 + 0.5, y as f64 + 0.5, width, height);
    direction_from_equirect(lon, lat)
}

/// Equirect where each pixel has the colour of the face its direction hits.
pub fn face_colored_equirect(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let (face, _, _) = face_plane_from_direction(equirect_pixel_direction(x, y, width, height));
        FACE_COLORS[face.index()]
    })
}

/// Smooth colour for a direction: each channel is one axis mapped to `0..=255`.
pub fn direction_color(dir: Direction) -> Rgb<u8> {
    let c = |v: f64| ((v + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8;
    Rgb([c(dir.x), c(dir.y), c(dir.z)])
}

/// Equirect coloured by [`direction_color`]; continuous across every seam.
pub fn direction_colored_equirect(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        direction_color(equirect_pixel_direction(x, y, width, height))
    })
}

// =========================================================================
// Face-set fixtures
// =========================================================================

/// Create six empty face files and return their paths in [`Face::ALL`] order.
pub fn touch_face_set(dir: &Path, prefix: &str, naming: FaceNaming, ext: &str) -> [PathBuf; 6] {
    Face::ALL.map(|face| {
        let path = dir.join(naming.file_name(prefix, face, ext));
        std::fs::write(&path, b"").unwrap();
        path
    })
}

// =========================================================================
// Encoded fixtures
// =========================================================================

/// Write `img` as a JPEG carrying an EXIF Orientation tag (1..=8).
///
/// The APP1 segment is spliced in right after SOI: a big-endian TIFF header
/// and one IFD entry (tag 0x0112, SHORT).
pub fn write_jpeg_with_orientation(path: &Path, img: &RgbImage, orientation: u16) {
    let mut jpeg = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    let mut exif = b"Exif\0\0MM\0\x2a\0\0\0\x08".to_vec();
    exif.extend_from_slice(&[0x00, 0x01]);
    exif.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    exif.extend_from_slice(&orientation.to_be_bytes());
    exif.extend_from_slice(&[0x00, 0x00]);
    exif.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((exif.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&exif);
    out.extend_from_slice(&jpeg[2..]);
    std::fs::write(path, out).unwrap();
}
