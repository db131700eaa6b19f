//! Batch drivers for the command-line tool.
//!
//! Each command takes a list of inputs and runs them one after another. An
//! item that fails (bad aspect ratio, missing face, unreadable file, full
//! disk, ...) is reported and counted, and the batch moves on to the next
//! one. The returned [`Tally`] decides the exit code.
//!
//! Items run sequentially because a single panorama already saturates the
//! rayon pool (faces and rows in parallel) and holding several large rasters
//! at once would multiply peak memory.
//!
//! ## Progress Events
//!
//! When a sender is supplied, every item produces a [`ProcessEvent::Started`]
//! followed by either a result event or [`ProcessEvent::Failed`]. The CLI
//! formats them on a printer thread via
//! [`output::format_process_event`](crate::output::format_process_event).

use crate::faces::{
    FaceNaming, FaceSet, FaceSetError, decode_faces, discover_face_set, group_face_paths,
};
use crate::geometry::Face;
use crate::imaging::{Dimensions, EquirectSize, ImageBackend};
use crate::project::{CubeOptions, to_cube};
use crate::stitch::{SphereOptions, to_sphere};
use std::path::PathBuf;
use std::sync::mpsc::Sender;

/// Progress events emitted during a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    /// An item is about to be processed. `index` is 1-based.
    Started {
        index: usize,
        total: usize,
        item: PathBuf,
    },
    /// Six cube faces were written for an equirect input.
    CubeWritten {
        source: Dimensions,
        face_size: u32,
        faces: Vec<(Face, PathBuf)>,
    },
    /// A face set was stitched into one equirect file.
    SphereWritten {
        prefix: String,
        face_size: u32,
        size: EquirectSize,
        output: PathBuf,
    },
    /// A face set passed discovery and validation.
    FaceSetChecked {
        prefix: String,
        naming: FaceNaming,
        face_size: u32,
        faces: [PathBuf; 6],
    },
    /// The item failed; the batch continues.
    Failed { item: PathBuf, error: String },
}

impl ProcessEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, ProcessEvent::Failed { .. })
    }
}

/// Outcome counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: usize,
}

impl Tally {
    /// True when every item succeeded and there was at least one.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.succeeded > 0
    }

    fn record<T, E>(&mut self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.succeeded += 1,
            Err(_) => self.failed += 1,
        }
    }
}

struct Reporter {
    events: Option<Sender<ProcessEvent>>,
}

impl Reporter {
    fn send(&self, event: ProcessEvent) {
        if let Some(tx) = &self.events {
            // A closed receiver only means nobody is listening.
            tx.send(event).ok();
        }
    }

    fn failed(&self, item: PathBuf, error: &dyn std::error::Error) {
        self.send(ProcessEvent::Failed {
            item,
            error: error.to_string(),
        });
    }
}

/// Project every equirect input to six cube faces.
pub fn run_to_cube(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    options: &CubeOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Tally {
    let reporter = Reporter { events };
    let mut tally = Tally::default();
    for (i, input) in inputs.iter().enumerate() {
        reporter.send(ProcessEvent::Started {
            index: i + 1,
            total: inputs.len(),
            item: input.clone(),
        });
        let result = to_cube(backend, input, options);
        tally.record(&result);
        match result {
            Ok(out) => reporter.send(ProcessEvent::CubeWritten {
                source: out.source_dimensions,
                face_size: out.face_size,
                faces: out.faces,
            }),
            Err(e) => reporter.failed(input.clone(), &e),
        }
    }
    tally
}

/// Group face files into sets and stitch each set.
///
/// Several files from the same set count as one item.
pub fn run_to_sphere(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    options: &SphereOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Tally {
    let reporter = Reporter { events };
    run_face_sets(backend, inputs, &reporter, |set| {
        let out = to_sphere(backend, set, options)?;
        Ok(ProcessEvent::SphereWritten {
            prefix: out.prefix,
            face_size: out.face_size,
            size: out.size,
            output: out.output,
        })
    })
}

/// Discover, validate and decode face sets without writing anything.
pub fn run_check(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    events: Option<Sender<ProcessEvent>>,
) -> Tally {
    let reporter = Reporter { events };
    run_face_sets(backend, inputs, &reporter, |set| {
        decode_faces(backend, set)?;
        Ok(ProcessEvent::FaceSetChecked {
            prefix: set.prefix.clone(),
            naming: set.naming,
            face_size: set.size,
            faces: set.paths.clone(),
        })
    })
}

fn run_face_sets<F>(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    reporter: &Reporter,
    mut handle: F,
) -> Tally
where
    F: FnMut(&FaceSet) -> Result<ProcessEvent, Box<dyn std::error::Error>>,
{
    let groups = group_face_paths(inputs);
    let total = groups.len();
    let mut tally = Tally::default();
    for (i, group) in groups.into_iter().enumerate() {
        let item = match &group {
            Ok(path) | Err(FaceSetError::UnrecognizedName { path }) => path.clone(),
            Err(_) => PathBuf::new(),
        };
        reporter.send(ProcessEvent::Started {
            index: i + 1,
            total,
            item: item.clone(),
        });
        let result: Result<ProcessEvent, Box<dyn std::error::Error>> = group
            .map_err(Into::into)
            .and_then(|path| Ok(discover_face_set(backend, &path)?))
            .and_then(|set| handle(&set));
        tally.record(&result);
        match result {
            Ok(event) => reporter.send(event),
            Err(e) => reporter.failed(item, e.as_ref()),
        }
    }
    tally
}
