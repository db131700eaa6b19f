//! # panocube
//!
//! Converts 360° panoramas between the two layouts panorama tools trade in:
//! a single 2:1 equirectangular image, and six square cube faces.
//!
//! # Architecture: One Geometry, Two Directions
//!
//! Both conversions are built on the same pure coordinate functions in
//! [`geometry`], with a unit direction on the sphere as the intermediate:
//!
//! ```text
//! to-cube    equirect  →  6 faces     (for each face pixel: where on the sphere?)
//! to-sphere  6 faces   →  equirect    (for each equirect pixel: which face, where?)
//! ```
//!
//! Each destination pixel pulls a bilinear sample from the source, so every
//! output pixel is written exactly once and rows can be filled in parallel
//! without locks.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Axis convention, `Face`, `Direction`, equirect and face coordinate maps |
//! | [`imaging`] | Rasters, bilinear sampler, size derivation, `ImageBackend` and the `image`-crate backend |
//! | [`faces`] | Face naming schemes, sibling discovery, set validation and grouping |
//! | [`project`] | Equirectangular → cube faces |
//! | [`stitch`] | Cube faces → equirectangular |
//! | [`process`] | Batch drivers, progress events and the success/failure tally |
//! | [`config`] | `panocube.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## krpano Axes
//!
//! Front is `+Z`, right is `+X`, up is `+Y`, and the face tags are
//! `f b l r u d`. This matches the krpano tooling most cube-face producers
//! and consumers already follow, so faces written here drop straight into
//! existing tile pipelines.
//!
//! ## Pixel Centres
//!
//! Continuous coordinates put pixel `i` at `[i, i + 1)`. Sampling at
//! pixel centres makes the equirect horizontal axis exactly periodic, so the
//! `±π` seam needs no special case beyond wrapping column indices.
//!
//! ## Validate Before Decoding
//!
//! Aspect ratio and face-set checks read only image headers. A bad input in
//! a batch of 20k-pixel panoramas fails in milliseconds instead of after a
//! full decode.
//!
//! ## Atomic Writes
//!
//! Every file is encoded into a temp file beside its target and renamed into
//! place. A crash or a full disk never leaves a truncated face behind, and a
//! failed projection removes the faces it already wrote.

pub mod config;
pub mod faces;
pub mod geometry;
pub mod imaging;
pub mod output;
pub mod process;
pub mod project;
pub mod stitch;

#[cfg(test)]
pub(crate) mod test_helpers;
