//! Pure calculation functions for panorama dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! The projector and the stitcher derive their default output sizes from each
//! other's inverse so that a round trip at default sizes lands back on
//! (almost) the same resolution:
//!
//! ```text
//! face     = round(width / π)       6144 → 1956
//! width    = round(face × π)        1024 → 3217
//! height   = round(width / 2)       3217 → 1609
//! ```
//!
//! Both derived values are rounded to a configurable multiple. The default of
//! `1` matches the reference krpano tool; `16` matches older shell pipelines.

use std::f64::consts::PI;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SizeError {
    #[error("invalid size '{0}': expected a positive integer")]
    NotANumber(String),
    #[error("invalid size '{0}': sizes must be greater than zero")]
    Zero(String),
    #[error("invalid face size '{0}': cube faces must be square")]
    NotSquare(String),
    #[error("invalid equirectangular size '{input}': height must be {expected} (half the width)")]
    NotTwoToOne { input: String, expected: u32 },
}

/// Width and height of an equirectangular canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquirectSize {
    pub width: u32,
    pub height: u32,
}

impl EquirectSize {
    /// A canvas of the given width with the matching 2:1 height.
    pub fn from_width(width: u32) -> Self {
        Self {
            width,
            height: equirect_height(width),
        }
    }
}

impl std::fmt::Display for EquirectSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Round `value` to the nearest positive multiple of `multiple`.
///
/// A `multiple` of 0 is treated as 1. The result is never below `multiple`.
pub fn round_to_multiple(value: f64, multiple: u32) -> u32 {
    let m = multiple.max(1) as f64;
    ((value / m).round() * m).max(m) as u32
}

/// Height of a 2:1 canvas, ties rounded away from zero.
pub fn equirect_height(width: u32) -> u32 {
    (width as f64 / 2.0).round() as u32
}

/// Whether `width × height` is a 2:1 canvas, allowing one pixel of rounding.
pub fn is_equirectangular(width: u32, height: u32) -> bool {
    height > 0 && (width as i64 - 2 * height as i64).abs() <= 1
}

/// Default cube face edge for an equirectangular source of `width` pixels.
///
/// # Examples
/// ```
/// # use panocube::imaging::default_face_size;
/// assert_eq!(default_face_size(6144, 1), 1956);
/// ```
pub fn default_face_size(width: u32, multiple: u32) -> u32 {
    round_to_multiple(width as f64 / PI, multiple)
}

/// Default equirectangular canvas for cube faces of `face_size` pixels.
///
/// # Examples
/// ```
/// # use panocube::imaging::default_equirect_size;
/// let size = default_equirect_size(1024, 1);
/// assert_eq!((size.width, size.height), (3217, 1609));
/// ```
pub fn default_equirect_size(face_size: u32, multiple: u32) -> EquirectSize {
    EquirectSize::from_width(round_to_multiple(face_size as f64 * PI, multiple))
}

fn parse_positive(input: &str, whole: &str) -> Result<u32, SizeError> {
    let value: u32 = input
        .trim()
        .parse()
        .map_err(|_| SizeError::NotANumber(whole.to_string()))?;
    if value == 0 {
        return Err(SizeError::Zero(whole.to_string()));
    }
    Ok(value)
}

/// Parse an explicit cube face size: `N` or `NxN`.
pub fn parse_face_size(input: &str) -> Result<u32, SizeError> {
    match input.split_once(['x', 'X']) {
        Some((w, h)) => {
            let w = parse_positive(w, input)?;
            let h = parse_positive(h, input)?;
            if w != h {
                return Err(SizeError::NotSquare(input.to_string()));
            }
            Ok(w)
        }
        None => parse_positive(input, input),
    }
}

/// Parse an explicit equirectangular size: `W` or `WxH`.
///
/// When a height is given it must equal `round(W / 2)`.
pub fn parse_equirect_size(input: &str) -> Result<EquirectSize, SizeError> {
    match input.split_once(['x', 'X']) {
        Some((w, h)) => {
            let width = parse_positive(w, input)?;
            let height = parse_positive(h, input)?;
            let expected = equirect_height(width);
            if height != expected {
                return Err(SizeError::NotTwoToOne {
                    input: input.to_string(),
                    expected,
                });
            }
            Ok(EquirectSize { width, height })
        }
        None => {
            let width = parse_positive(input, input)?;
            if equirect_height(width) == 0 {
                return Err(SizeError::Zero(input.to_string()));
            }
            Ok(EquirectSize::from_width(width))
        }
    }
}
