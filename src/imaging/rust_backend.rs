//! Pure Rust I/O backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageDecoder::dimensions` + `orientation` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader`, no allocation limits |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Encode TIFF / PNG | `ImageBuffer::write_to` (8 or 16 bit) |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` (8 bit) |
//! | Atomic write | `tempfile::NamedTempFile` in the target directory, then `persist` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{OutputFormat, SaveParams};
use super::raster::Raster;
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Lower-case image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn encode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Encode {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Decode an image and rotate/flip it upright according to its EXIF orientation.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let mut reader = ImageReader::open(path)?.with_guessed_format()?;
    // Panoramas routinely exceed the default 512 MiB allocation cap.
    reader.no_limits();
    let mut decoder = reader.into_decoder().map_err(|e| decode_error(path, e))?;
    let orientation = decoder.orientation().map_err(|e| decode_error(path, e))?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(path, e))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Displayed size once `orientation` is applied; quarter turns swap the axes.
fn oriented_dimensions(width: u32, height: u32, orientation: Orientation) -> Dimensions {
    match orientation {
        Orientation::Rotate90
        | Orientation::Rotate270
        | Orientation::Rotate90FlipH
        | Orientation::Rotate270FlipH => Dimensions {
            width: height,
            height: width,
        },
        _ => Dimensions { width, height },
    }
}

/// Encode `raster` into `writer` in the requested format.
fn encode<W: Write + std::io::Seek>(
    raster: &Raster,
    params: &SaveParams,
    writer: &mut W,
) -> Result<(), BackendError> {
    let path = &params.output;
    let format = params.encoding.format;
    match (format, raster) {
        (OutputFormat::Jpeg, _) => {
            let rgb8 = match raster {
                Raster::Rgb8(buf) => std::borrow::Cow::Borrowed(buf),
                Raster::Rgb16(_) => std::borrow::Cow::Owned(raster.clone().into_rgb8()),
            };
            let encoder =
                JpegEncoder::new_with_quality(writer, params.encoding.quality.value() as u8);
            rgb8.write_with_encoder(encoder)
                .map_err(|e| encode_error(path, e))
        }
        (_, Raster::Rgb8(buf)) => buf
            .write_to(writer, format.image_format())
            .map_err(|e| encode_error(path, e)),
        (_, Raster::Rgb16(buf)) => buf
            .write_to(writer, format.image_format())
            .map_err(|e| encode_error(path, e)),
    }
}

/// Write via a temp file in the destination directory, renamed into place on success.
///
/// On any error the temp file is dropped (and deleted), so a partial file
/// never appears at the target path.
fn save_atomic(raster: &Raster, params: &SaveParams) -> Result<(), BackendError> {
    let dir = match params.output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".panocube-")
        .suffix(".part")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        encode(raster, params, &mut writer)?;
        writer.flush()?;
    }
    tmp.persist(&params.output).map_err(|e| BackendError::Io(e.error))?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        if !path.is_file() {
            return Err(BackendError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let mut decoder = reader.into_decoder().map_err(|e| decode_error(path, e))?;
        let (width, height) = decoder.dimensions();
        let orientation = decoder.orientation().map_err(|e| decode_error(path, e))?;
        Ok(oriented_dimensions(width, height, orientation))
    }

    fn load(&self, path: &Path) -> Result<Raster, BackendError> {
        load_image(path).map(Raster::from_dynamic)
    }

    fn save(&self, raster: &Raster, params: &SaveParams) -> Result<(), BackendError> {
        save_atomic(raster, params)
    }
}
