//! Image I/O backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipelines need:
//! identify (header-only dimensions), load (full decode to a [`Raster`]), and
//! save (encode a raster to disk).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and built on the
//! `image` crate. Tests use a recording mock so pipeline logic can be checked
//! without touching real files.

use super::params::SaveParams;
use super::raster::Raster;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("cannot encode {path}: {message}")]
    Encode { path: PathBuf, message: String },
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn is_square(self) -> bool {
        self.width == self.height
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

/// Trait for image I/O backends.
///
/// `Sync` so a single backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Read image dimensions without decoding pixel data.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode an image into an RGB raster with pixel `(0, 0)` at the visual
    /// top-left corner.
    fn load(&self, path: &Path) -> Result<Raster, BackendError>;

    /// Encode a raster. Either the complete file appears at `params.output`
    /// or nothing does.
    fn save(&self, raster: &Raster, params: &SaveParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock backend that serves canned rasters and records operations.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub rasters: Mutex<HashMap<PathBuf, Raster>>,
        pub dimensions: Mutex<HashMap<PathBuf, Dimensions>>,
        /// Saves to these paths fail with an encode error.
        pub failing_saves: Mutex<Vec<PathBuf>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(PathBuf),
        Load(PathBuf),
        Save {
            output: PathBuf,
            width: u32,
            height: u32,
            high_depth: bool,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a raster; identify reports its dimensions.
        pub fn with_raster(self, path: impl Into<PathBuf>, raster: Raster) -> Self {
            let path = path.into();
            let (width, height) = raster.dimensions();
            self.dimensions
                .lock()
                .unwrap()
                .insert(path.clone(), Dimensions { width, height });
            self.rasters.lock().unwrap().insert(path, raster);
            self
        }

        /// Register header dimensions only (load will fail).
        pub fn with_dimensions(self, path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
            self.dimensions
                .lock()
                .unwrap()
                .insert(path.into(), Dimensions { width, height });
            self
        }

        pub fn failing_save(self, path: impl Into<PathBuf>) -> Self {
            self.failing_saves.lock().unwrap().push(path.into());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn saved_paths(&self) -> Vec<PathBuf> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Save { output, .. } => Some(output),
                    _ => None,
                })
                .collect()
        }
    }

    fn not_found(path: &Path) -> BackendError {
        BackendError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no mock image for {}", path.display()),
        ))
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_path_buf()));
            self.dimensions
                .lock()
                .unwrap()
                .get(path)
                .copied()
                .ok_or_else(|| not_found(path))
        }

        fn load(&self, path: &Path) -> Result<Raster, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Load(path.to_path_buf()));
            self.rasters
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| not_found(path))
        }

        fn save(&self, raster: &Raster, params: &SaveParams) -> Result<(), BackendError> {
            if self.failing_saves.lock().unwrap().contains(&params.output) {
                return Err(BackendError::Encode {
                    path: params.output.clone(),
                    message: "mock failure".into(),
                });
            }
            let (width, height) = raster.dimensions();
            self.operations.lock().unwrap().push(RecordedOp::Save {
                output: params.output.clone(),
                width,
                height,
                high_depth: raster.is_high_depth(),
            });
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::new().with_dimensions("/pano/a_f.tif", 64, 64);

        let dims = backend.identify(Path::new("/pano/a_f.tif")).unwrap();
        assert_eq!(dims, Dimensions { width: 64, height: 64 });

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify("/pano/a_f.tif".into())]);
    }

    #[test]
    fn mock_identify_unknown_path_errors() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.identify(Path::new("/missing.tif")),
            Err(BackendError::Io(_))
        ));
    }

    #[test]
    fn mock_records_save() {
        let backend = MockBackend::new();
        let raster = Raster::Rgb8(image::RgbImage::new(8, 4));
        backend
            .save(
                &raster,
                &SaveParams {
                    output: "/out.tif".into(),
                    encoding: Default::default(),
                },
            )
            .unwrap();

        assert_eq!(backend.saved_paths(), vec![PathBuf::from("/out.tif")]);
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Save {
                width: 8,
                height: 4,
                high_depth: false,
                ..
            }
        ));
    }

    #[test]
    fn dimensions_display_and_square() {
        let d = Dimensions {
            width: 10,
            height: 12,
        };
        assert_eq!(d.to_string(), "10×12");
        assert!(!d.is_square());
    }
}
