//! Face-set discovery and validation.
//!
//! A cube panorama on disk is six sibling files sharing a prefix and
//! differing only in an end-anchored face tag:
//!
//! | Scheme | Example (front) | Tags |
//! |---|---|---|
//! | `letter` | `pano_f.tif` | `_f _b _l _r _u _d` |
//! | `word` | `pano_Front.tif` | `_Front _Back _Left _Right _Up _Down` |
//! | `joined-word` | `panoFront.tif` | `Front Back Left Right Up Down` |
//!
//! Tags are case-sensitive and must sit directly before the extension, so a
//! prefix that itself contains a tag (`Frontyard_f.tif`) parses correctly.
//! Given any one face file, the other five are looked up in the same
//! directory with the same scheme. The input's extension is tried first, then
//! every supported extension, so mixed TIFF/JPEG sets are accepted.
//!
//! Validation reads only image headers: every face must exist, be square,
//! and match the size of the front face. It runs before any pixel work so a
//! bad set fails fast. [`decode_faces`] goes further and decodes every face,
//! which is what `panocube check` reports on.

use crate::geometry::Face;
use crate::imaging::{BackendError, Dimensions, ImageBackend, supported_input_extensions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaceSetError {
    #[error(
        "{}: file name does not end with a face tag (_f/_b/_l/_r/_u/_d, _Front.._Down or Front..Down)",
        path.display()
    )]
    UnrecognizedName { path: PathBuf },
    #[error("panorama '{prefix}': missing {face} face '{tag}' (expected {})", expected.display())]
    MissingFace {
        prefix: String,
        face: Face,
        tag: String,
        expected: PathBuf,
    },
    #[error("{}: cannot read face image: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("{}: face is not square ({found})", path.display())]
    NotSquare { path: PathBuf, found: Dimensions },
    #[error(
        "{}: face size {found} does not match {} ({expected})",
        path.display(),
        reference.display()
    )]
    SizeMismatch {
        path: PathBuf,
        found: Dimensions,
        reference: PathBuf,
        expected: Dimensions,
    },
}

/// File naming scheme for the six face tags.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum FaceNaming {
    /// `{prefix}_f`
    #[default]
    Letter,
    /// `{prefix}_Front`
    Word,
    /// `{prefix}Front`
    JoinedWord,
}

impl FaceNaming {
    /// Order in which file names are matched. Word forms go first so that
    /// `pano_Front` yields prefix `pano` rather than `pano_`.
    pub const DISCOVERY_ORDER: [FaceNaming; 3] =
        [FaceNaming::Word, FaceNaming::JoinedWord, FaceNaming::Letter];

    /// The bare tag identifying `face`.
    pub fn tag(self, face: Face) -> &'static str {
        match self {
            FaceNaming::Letter => match face {
                Face::Front => "f",
                Face::Back => "b",
                Face::Left => "l",
                Face::Right => "r",
                Face::Up => "u",
                Face::Down => "d",
            },
            FaceNaming::Word | FaceNaming::JoinedWord => match face {
                Face::Front => "Front",
                Face::Back => "Back",
                Face::Left => "Left",
                Face::Right => "Right",
                Face::Up => "Up",
                Face::Down => "Down",
            },
        }
    }

    /// Everything appended to the prefix, separator included.
    pub fn suffix(self, face: Face) -> String {
        match self {
            FaceNaming::Letter | FaceNaming::Word => format!("_{}", self.tag(face)),
            FaceNaming::JoinedWord => self.tag(face).to_string(),
        }
    }

    /// File name (without directory) of `face` for a panorama `prefix`.
    pub fn file_name(self, prefix: &str, face: Face, extension: &str) -> String {
        format!("{prefix}{}.{extension}", self.suffix(face))
    }
}

/// A face file name split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceName {
    pub prefix: String,
    pub face: Face,
    pub naming: FaceNaming,
    /// Extension as written, without the dot. May be empty.
    pub extension: String,
}

/// Parse a face file name, or `None` if it carries no face tag.
///
/// - `"pano_f.tif"` → prefix `pano`, front, letter
/// - `"pano_Back.jpg"` → prefix `pano`, back, word
/// - `"panoUp.tiff"` → prefix `pano`, up, joined-word
/// - `"Frontyard_d.tif"` → prefix `Frontyard`, down, letter
/// - `"pano.tif"`, `"_f.tif"` → `None`
pub fn parse_face_name(path: &Path) -> Option<FaceName> {
    let stem = path.file_stem()?.to_str()?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();

    for naming in FaceNaming::DISCOVERY_ORDER {
        for face in Face::ALL {
            let suffix = naming.suffix(face);
            if let Some(prefix) = stem.strip_suffix(suffix.as_str())
                && !prefix.is_empty()
            {
                return Some(FaceName {
                    prefix: prefix.to_string(),
                    face,
                    naming,
                    extension,
                });
            }
        }
    }
    None
}

/// Six validated sibling face files.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSet {
    pub directory: PathBuf,
    pub prefix: String,
    pub naming: FaceNaming,
    /// Indexed by [`Face::index`].
    pub paths: [PathBuf; 6],
    /// Common edge length of all six faces.
    pub size: u32,
}

impl FaceSet {
    pub fn path(&self, face: Face) -> &Path {
        &self.paths[face.index()]
    }
}

/// Absolute directory containing `path`.
fn face_directory(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Extensions tried for sibling faces: the input's own first, then all
/// supported ones in lower and upper case.
fn candidate_extensions(preferred: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let all = supported_input_extensions()
        .iter()
        .flat_map(|ext| [ext.to_string(), ext.to_ascii_uppercase()]);
    for ext in std::iter::once(preferred.to_string()).chain(all) {
        if !ext.is_empty() && seen.insert(ext.clone()) {
            out.push(ext);
        }
    }
    out
}

/// Find all six face files for a parsed name in `directory`.
pub fn locate_faces(name: &FaceName, directory: &Path) -> Result<[PathBuf; 6], FaceSetError> {
    let extensions = candidate_extensions(&name.extension);
    let locate = |face: Face| {
        let stem = format!("{}{}", name.prefix, name.naming.suffix(face));
        extensions
            .iter()
            .map(|ext| directory.join(format!("{stem}.{ext}")))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| FaceSetError::MissingFace {
                prefix: name.prefix.clone(),
                face,
                tag: name.naming.tag(face).to_string(),
                expected: directory.join(name.naming.file_name(
                    &name.prefix,
                    face,
                    &name.extension,
                )),
            })
    };
    let [front, back, left, right, up, down] = Face::ALL.map(locate);
    Ok([front?, back?, left?, right?, up?, down?])
}

/// Check from headers that all six faces are readable, square, and share one
/// size.
///
/// Returns the common edge length.
pub fn validate_faces(
    backend: &impl ImageBackend,
    paths: &[PathBuf; 6],
) -> Result<u32, FaceSetError> {
    let mut reference: Option<(&PathBuf, Dimensions)> = None;
    for path in paths {
        let found = backend
            .identify(path)
            .map_err(|source| FaceSetError::Unreadable {
                path: path.clone(),
                source,
            })?;
        if !found.is_square() {
            return Err(FaceSetError::NotSquare {
                path: path.clone(),
                found,
            });
        }
        match reference {
            None => reference = Some((path, found)),
            Some((ref_path, expected)) if expected != found => {
                return Err(FaceSetError::SizeMismatch {
                    path: path.clone(),
                    found,
                    reference: ref_path.clone(),
                    expected,
                });
            }
            Some(_) => {}
        }
    }
    Ok(reference.map(|(_, d)| d.width).unwrap_or(0))
}

/// Decode every face of `set` in [`Face::ALL`] order, failing on the first
/// one whose pixel data cannot be read.
pub fn decode_faces(backend: &impl ImageBackend, set: &FaceSet) -> Result<(), FaceSetError> {
    for path in &set.paths {
        backend
            .load(path)
            .map_err(|source| FaceSetError::Unreadable {
                path: path.clone(),
                source,
            })?;
    }
    Ok(())
}

/// Discover and validate the face set that `path` belongs to.
pub fn discover_face_set(
    backend: &impl ImageBackend,
    path: &Path,
) -> Result<FaceSet, FaceSetError> {
    let name = parse_face_name(path).ok_or_else(|| FaceSetError::UnrecognizedName {
        path: path.to_path_buf(),
    })?;
    let directory = face_directory(path);
    let paths = locate_faces(&name, &directory)?;
    let size = validate_faces(backend, &paths)?;
    Ok(FaceSet {
        directory,
        prefix: name.prefix,
        naming: name.naming,
        paths,
        size,
    })
}

/// Collapse a list of face files into one representative path per set.
///
/// Files from the same panorama (same directory, prefix and scheme) are
/// de-duplicated, keeping first-seen order. Names without a face tag are
/// returned as errors in place.
pub fn group_face_paths(paths: &[PathBuf]) -> Vec<Result<PathBuf, FaceSetError>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for path in paths {
        match parse_face_name(path) {
            Some(name) => {
                if seen.insert((face_directory(path), name.prefix, name.naming)) {
                    out.push(Ok(path.clone()));
                }
            }
            None => out.push(Err(FaceSetError::UnrecognizedName { path: path.clone() })),
        }
    }
    out
}
