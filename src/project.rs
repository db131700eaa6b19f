//! Equirectangular → cube-face projector.
//!
//! For every destination pixel of every face the projector walks the chain
//!
//! ```text
//! (face, u, v) → Direction → (lon, lat) → equirect (x, y) → bilinear sample
//! ```
//!
//! with the horizontal equirect axis treated as cyclic, so the longitude seam
//! at `±π` never shows up as a discontinuity.
//!
//! ## Output
//!
//! Six files next to the input, named after the input's stem and the chosen
//! [`FaceNaming`] scheme:
//!
//! ```text
//! pano.tif  →  pano_f.tif  pano_b.tif  pano_l.tif  pano_r.tif  pano_u.tif  pano_d.tif
//! ```
//!
//! The face edge defaults to `round(W / π)` (see
//! [`default_face_size`]). Either all six faces are written or none are: if
//! one save fails, the faces already written for that input are removed.
//!
//! ## Parallelism
//!
//! The six faces are projected in parallel, and rows within each face are
//! split across the rayon pool. Every worker reads the shared source raster
//! and writes only its own rows.

use crate::config::PanoConfig;
use crate::faces::FaceNaming;
use crate::geometry::{
    Face, direction_from_face_uv, equirect_from_direction, equirect_pixel_from_lonlat,
};
use crate::imaging::{
    BackendError, Channel, Dimensions, EdgeMode, Encoding, ImageBackend, Plane, Raster,
    SaveParams, default_face_size, is_equirectangular, sample_bilinear,
};
use image::{ImageBuffer, Pixel, Rgb};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error(
        "{}: not an equirectangular panorama ({width}×{height}, width must be twice the height)",
        path.display()
    )]
    NotEquirectangular {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    #[error("{}: decoded as {found}, header said {expected}", path.display())]
    SourceChanged {
        path: PathBuf,
        found: Dimensions,
        expected: Dimensions,
    },
    #[error("{}: file name has no usable stem", path.display())]
    NoStem { path: PathBuf },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Settings for one projection run.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeOptions {
    /// Explicit face edge; `None` derives it from the source width.
    pub face_size: Option<u32>,
    pub size_multiple: u32,
    pub naming: FaceNaming,
    pub encoding: Encoding,
}

impl CubeOptions {
    pub fn from_config(config: &PanoConfig) -> Self {
        Self {
            face_size: None,
            size_multiple: config.sizing.multiple,
            naming: config.output.naming,
            encoding: config.output.encoding(),
        }
    }
}

impl Default for CubeOptions {
    fn default() -> Self {
        Self::from_config(&PanoConfig::default())
    }
}

/// What a successful projection produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeOutput {
    pub source: PathBuf,
    pub source_dimensions: Dimensions,
    pub face_size: u32,
    /// In [`Face::ALL`] order.
    pub faces: Vec<(Face, PathBuf)>,
}

/// Project one face of `source` at `size × size`.
pub fn project_face<T: Channel>(source: &Plane<T>, face: Face, size: u32) -> Plane<T>
where
    Rgb<T>: Pixel<Subpixel = T>,
{
    let (width, height) = source.dimensions();
    let mut out: Plane<T> = ImageBuffer::new(size, size);
    out.par_chunks_mut(size as usize * 3)
        .enumerate()
        .for_each(|(row, pixels)| {
            let v = row as f64 + 0.5;
            for (col, px) in pixels.chunks_exact_mut(3).enumerate() {
                let dir = direction_from_face_uv(face, col as f64 + 0.5, v, size);
                let (lon, lat) = equirect_from_direction(dir);
                let (x, y) = equirect_pixel_from_lonlat(lon, lat, width, height);
                px.copy_from_slice(&sample_bilinear(source, x - 0.5, y - 0.5, EdgeMode::Wrap));
            }
        });
    out
}

/// Project all six faces, keeping the source bit depth.
pub fn project_cube(source: &Raster, size: u32) -> Vec<(Face, Raster)> {
    Face::ALL
        .par_iter()
        .map(|&face| {
            let projected = match source {
                Raster::Rgb8(src) => Raster::Rgb8(project_face(src, face, size)),
                Raster::Rgb16(src) => Raster::Rgb16(project_face(src, face, size)),
            };
            (face, projected)
        })
        .collect()
}

/// Path of `face` for an equirect `input`: same directory, input stem as prefix.
pub fn face_output_path(
    input: &Path,
    face: Face,
    naming: FaceNaming,
    encoding: &Encoding,
) -> Result<PathBuf, ProjectError> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProjectError::NoStem {
            path: input.to_path_buf(),
        })?;
    let dir = input.parent().unwrap_or(Path::new(""));
    Ok(dir.join(naming.file_name(stem, face, encoding.format.extension())))
}

/// Convert one equirectangular file into six cube-face files.
///
/// The 2:1 check runs on the upright header size before any pixel is
/// decoded; the decoded raster must then match it.
pub fn to_cube(
    backend: &impl ImageBackend,
    input: &Path,
    options: &CubeOptions,
) -> Result<CubeOutput, ProjectError> {
    let dims = backend.identify(input)?;
    if !is_equirectangular(dims.width, dims.height) {
        return Err(ProjectError::NotEquirectangular {
            path: input.to_path_buf(),
            width: dims.width,
            height: dims.height,
        });
    }
    let face_size = options
        .face_size
        .unwrap_or_else(|| default_face_size(dims.width, options.size_multiple));

    let outputs = Face::ALL
        .iter()
        .map(|&face| face_output_path(input, face, options.naming, &options.encoding))
        .collect::<Result<Vec<_>, _>>()?;

    let source = backend.load(input)?;
    let (width, height) = source.dimensions();
    if (width, height) != (dims.width, dims.height) {
        return Err(ProjectError::SourceChanged {
            path: input.to_path_buf(),
            found: Dimensions { width, height },
            expected: dims,
        });
    }
    let faces = project_cube(&source, face_size);
    drop(source);

    let results: Vec<(Face, PathBuf, Result<(), BackendError>)> = faces
        .par_iter()
        .zip(outputs.par_iter())
        .map(|((face, raster), output)| {
            let params = SaveParams {
                output: output.clone(),
                encoding: options.encoding,
            };
            (*face, output.clone(), backend.save(raster, &params))
        })
        .collect();

    let mut written = Vec::with_capacity(6);
    let mut failure = None;
    for (face, path, result) in results {
        match result {
            Ok(()) => written.push((face, path)),
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
    }
    if let Some(err) = failure {
        for (_, path) in &written {
            std::fs::remove_file(path).ok();
        }
        return Err(err.into());
    }

    Ok(CubeOutput {
        source: input.to_path_buf(),
        source_dimensions: dims,
        face_size,
        faces: written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{OutputFormat, RustBackend};
    use crate::test_helpers::{
        FACE_COLORS, direction_colored_equirect, face_colored_equirect, write_jpeg_with_orientation,
    };
    use image::{Rgb, RgbImage};

    #[test]
    fn uniform_source_gives_uniform_faces() {
        let src = RgbImage::from_pixel(64, 32, Rgb([10, 120, 250]));
        for face in Face::ALL {
            let out = project_face(&src, face, 12);
            assert_eq!(out.dimensions(), (12, 12));
            assert!(out.pixels().all(|p| *p == Rgb([10, 120, 250])), "{face}");
        }
    }

    #[test]
    fn each_face_sees_its_own_region() {
        let src = face_colored_equirect(512, 256);
        for (face, raster) in project_cube(&Raster::Rgb8(src), 16) {
            let img = raster.into_rgb8();
            assert_eq!(
                img.get_pixel(8, 8),
                &FACE_COLORS[face.index()],
                "centre of {face}"
            );
        }
    }

    #[test]
    fn faces_are_upright() {
        // Direction-coloured source: green encodes +Y, so rows near the top
        // of each side face must be greener than rows near the bottom.
        let src = direction_colored_equirect(256, 128);
        for face in [Face::Front, Face::Back, Face::Left, Face::Right] {
            let img = project_face(&src, face, 16);
            let top = img.get_pixel(8, 1)[1];
            let bottom = img.get_pixel(8, 14)[1];
            assert!(top > bottom, "{face}: top {top} bottom {bottom}");
        }
    }

    #[test]
    fn sixteen_bit_source_stays_sixteen_bit() {
        let src = Raster::Rgb16(ImageBuffer::from_pixel(40, 20, Rgb([1000u16, 2000, 3000])));
        for (_, face) in project_cube(&src, 4) {
            assert!(face.is_high_depth());
        }
    }

    #[test]
    fn to_cube_writes_six_named_faces() {
        let input = PathBuf::from("/pano/IMG_1650.tif");
        let backend = MockBackend::new()
            .with_raster(&input, Raster::Rgb8(RgbImage::new(628, 314)));

        let out = to_cube(&backend, &input, &CubeOptions::default()).unwrap();
        assert_eq!(out.face_size, 200);
        assert_eq!(out.faces.len(), 6);

        let saved = backend.saved_paths();
        for tag in ["f", "b", "l", "r", "u", "d"] {
            let expected = PathBuf::from(format!("/pano/IMG_1650_{tag}.tif"));
            assert!(saved.contains(&expected), "missing {}", expected.display());
        }
        for op in backend.get_operations() {
            if let RecordedOp::Save { width, height, .. } = op {
                assert_eq!((width, height), (200, 200));
            }
        }
    }

    #[test]
    fn to_cube_honours_overrides() {
        let input = PathBuf::from("/pano/room.jpg");
        let backend =
            MockBackend::new().with_raster(&input, Raster::Rgb8(RgbImage::new(100, 50)));
        let options = CubeOptions {
            face_size: Some(24),
            naming: FaceNaming::Word,
            encoding: Encoding {
                format: OutputFormat::Png,
                ..Default::default()
            },
            ..Default::default()
        };

        let out = to_cube(&backend, &input, &options).unwrap();
        assert_eq!(out.face_size, 24);
        assert_eq!(out.faces[0].1, PathBuf::from("/pano/room_Front.png"));
        assert_eq!(out.faces[5].1, PathBuf::from("/pano/room_Down.png"));
    }

    #[test]
    fn to_cube_rejects_wrong_aspect_before_decoding() {
        let input = PathBuf::from("/pano/square.tif");
        let backend = MockBackend::new().with_dimensions(&input, 1000, 1000);

        let err = to_cube(&backend, &input, &CubeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::NotEquirectangular {
                width: 1000,
                height: 1000,
                ..
            }
        ));
        assert!(
            !backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Load(_)))
        );
    }

    #[test]
    fn to_cube_accepts_odd_width_rounding() {
        let input = PathBuf::from("/pano/odd.tif");
        let backend = MockBackend::new().with_raster(&input, Raster::Rgb8(RgbImage::new(101, 51)));
        assert!(to_cube(&backend, &input, &CubeOptions::default()).is_ok());
    }

    #[test]
    fn failed_face_removes_the_others() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("pano.png");
        RgbImage::from_pixel(64, 32, Rgb([1, 2, 3]))
            .save(&input)
            .unwrap();
        // A directory where the up face should go makes that rename fail.
        std::fs::create_dir(tmp.path().join("pano_u.tif")).unwrap();

        let result = to_cube(&RustBackend::new(), &input, &CubeOptions::default());
        assert!(matches!(result, Err(ProjectError::Backend(_))));
        for tag in ["f", "b", "l", "r", "d"] {
            assert!(
                !tmp.path().join(format!("pano_{tag}.tif")).exists(),
                "pano_{tag}.tif left behind"
            );
        }
    }

    #[test]
    fn failed_save_cleans_up_through_the_backend_seam() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("pano.tif");
        let down = tmp.path().join("pano_d.tif");
        let backend = MockBackend::new()
            .with_raster(&input, Raster::Rgb8(RgbImage::new(64, 32)))
            .failing_save(&down);
        // Stand-ins for the faces the mock reports as written.
        for tag in ["f", "b", "l", "r", "u"] {
            std::fs::write(tmp.path().join(format!("pano_{tag}.tif")), b"face").unwrap();
        }

        let err = to_cube(&backend, &input, &CubeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Backend(BackendError::Encode { ref path, .. }) if path == &down
        ));
        assert_eq!(backend.saved_paths().len(), 5);
        for tag in ["f", "b", "l", "r", "u"] {
            assert!(
                !tmp.path().join(format!("pano_{tag}.tif")).exists(),
                "pano_{tag}.tif left behind"
            );
        }
    }

    #[test]
    fn decoded_size_must_match_header() {
        let input = PathBuf::from("/pano/liar.tif");
        let backend = MockBackend::new()
            .with_raster(&input, Raster::Rgb8(RgbImage::new(32, 64)))
            .with_dimensions(&input, 64, 32);

        let err = to_cube(&backend, &input, &CubeOptions::default()).unwrap_err();
        match err {
            ProjectError::SourceChanged { found, expected, .. } => {
                assert_eq!((found.width, found.height), (32, 64));
                assert_eq!((expected.width, expected.height), (64, 32));
            }
            other => panic!("expected SourceChanged, got {other:?}"),
        }
        assert!(backend.saved_paths().is_empty());
    }

    #[test]
    fn rotated_portrait_jpeg_is_not_a_panorama() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("portrait.jpg");
        // Stored 2:1, but EXIF orientation 6 makes it display as 1:2.
        write_jpeg_with_orientation(&input, &RgbImage::from_pixel(64, 32, Rgb([5, 5, 5])), 6);

        let err = to_cube(&RustBackend::new(), &input, &CubeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::NotEquirectangular {
                width: 32,
                height: 64,
                ..
            }
        ));
        assert!(!tmp.path().join("portrait_f.tif").exists());
    }

    #[test]
    fn rotated_panorama_jpeg_is_projected_upright() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("pano.jpg");
        // Stored 1:2, displays as a 64×32 panorama once rotated.
        write_jpeg_with_orientation(&input, &RgbImage::from_pixel(32, 64, Rgb([90, 90, 90])), 6);

        let out = to_cube(&RustBackend::new(), &input, &CubeOptions::default()).unwrap();
        assert_eq!(
            out.source_dimensions,
            Dimensions {
                width: 64,
                height: 32
            }
        );
        assert_eq!(out.face_size, 20);
        assert!(tmp.path().join("pano_f.tif").is_file());
    }

    #[test]
    fn face_output_path_uses_input_directory() {
        let path = face_output_path(
            Path::new("shots/pano.final.tif"),
            Face::Left,
            FaceNaming::JoinedWord,
            &Encoding::default(),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("shots/pano.finalLeft.tif"));
    }
}
