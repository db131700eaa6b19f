//! Image I/O and raster primitives, pure Rust with no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageDecoder::dimensions` + EXIF orientation |
//! | **Decode** | `image::ImageReader` + EXIF orientation |
//! | **Encode** | TIFF / PNG (8 or 16 bit), JPEG (8 bit), written atomically |
//! | **Resample** | bilinear, wrap or clamp per axis |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for size math (unit testable)
//! - **Parameters**: Data structures describing writes
//! - **Raster**: In-memory RGB buffers and the bilinear sampler
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod raster;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    EquirectSize, SizeError, default_equirect_size, default_face_size, equirect_height,
    is_equirectangular, parse_equirect_size, parse_face_size, round_to_multiple,
};
pub use params::{Encoding, OutputFormat, Quality, SaveParams};
pub use raster::{Channel, EdgeMode, Plane, Raster, Rgb16Image, sample_bilinear};
pub use rust_backend::{RustBackend, supported_input_extensions};
