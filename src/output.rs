//! CLI output formatting.
//!
//! Every function here is pure: it turns a [`ProcessEvent`] or a [`Tally`]
//! into display lines and leaves printing to the caller, so the exact output
//! is unit tested.
//!
//! # Output Format
//!
//! Each item gets a header line with its position in the batch, followed by
//! indented context lines.
//!
//! ## to-cube
//!
//! ```text
//! 001/002 IMG_1650.tif
//!     Source: 6144×3072 → faces 1956×1956
//!     front: IMG_1650_f.tif
//!     back: IMG_1650_b.tif
//!     ...
//! 002/002 broken.tif
//!     Error: broken.tif: not an equirectangular panorama (4000×3000, ...)
//!
//! 1 converted, 1 failed
//! ```
//!
//! ## to-sphere
//!
//! ```text
//! 001/001 IMG_1650_f.tif
//!     IMG_1650: 6 faces 1956×1956 → 6145x3073
//!     Output: IMG_1650.tif
//! ```
//!
//! ## check
//!
//! ```text
//! 001/001 IMG_1650_f.tif
//!     IMG_1650: 6 faces 1956×1956 (letter naming)
//! ```

use crate::faces::FaceNaming;
use crate::process::{ProcessEvent, Tally};
use std::path::Path;

/// File name for display, falling back to the whole path.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn naming_label(naming: FaceNaming) -> &'static str {
    match naming {
        FaceNaming::Letter => "letter",
        FaceNaming::Word => "word",
        FaceNaming::JoinedWord => "joined-word",
    }
}

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { index, total, item } => {
            let width = total.to_string().len().max(3);
            vec![format!(
                "{:0width$}/{:0width$} {}",
                index,
                total,
                display_name(item)
            )]
        }
        ProcessEvent::CubeWritten {
            source,
            face_size,
            faces,
        } => {
            let mut lines = vec![format!(
                "    Source: {} \u{2192} faces {}\u{d7}{}",
                source, face_size, face_size
            )];
            for (face, path) in faces {
                lines.push(format!("    {}: {}", face, display_name(path)));
            }
            lines
        }
        ProcessEvent::SphereWritten {
            prefix,
            face_size,
            size,
            output,
        } => vec![
            format!(
                "    {}: 6 faces {}\u{d7}{} \u{2192} {}",
                prefix, face_size, face_size, size
            ),
            format!("    Output: {}", display_name(output)),
        ],
        ProcessEvent::FaceSetChecked {
            prefix,
            naming,
            face_size,
            ..
        } => vec![format!(
            "    {}: 6 faces {}\u{d7}{} ({} naming)",
            prefix,
            face_size,
            face_size,
            naming_label(*naming)
        )],
        ProcessEvent::Failed { error, .. } => vec![format!("    Error: {}", error)],
    }
}

/// Final line of a batch, e.g. `3 converted, 1 failed`.
pub fn format_summary(tally: &Tally, verb: &str) -> String {
    if tally.failed == 0 {
        format!("{} {}", tally.succeeded, verb)
    } else {
        format!("{} {}, {} failed", tally.succeeded, verb, tally.failed)
    }
}
