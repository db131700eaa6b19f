use clap::{Parser, Subcommand};
use panocube::faces::FaceNaming;
use panocube::imaging::{
    EquirectSize, OutputFormat, RustBackend, parse_equirect_size, parse_face_size,
};
use panocube::process::{self, ProcessEvent, Tally};
use panocube::project::CubeOptions;
use panocube::stitch::SphereOptions;
use panocube::{config, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

/// Output flags shared by both conversions.
#[derive(clap::Args, Clone)]
struct EncodeArgs {
    /// Output container (default: output.format from config)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// JPEG quality 1-100 (default: output.quality from config)
    #[arg(long)]
    quality: Option<u32>,
}

#[derive(Parser)]
#[command(name = "panocube")]
#[command(about = "Convert 360° panoramas between equirectangular and cube faces")]
#[command(long_about = "\
Convert 360° panoramas between equirectangular and cube faces

Axes follow krpano: front is +Z, right is +X, up is +Y. Faces are written
next to their source and named after it:

  pano.tif  ->  pano_f.tif pano_b.tif pano_l.tif pano_r.tif pano_u.tif pano_d.tif

Stitching recognises three tag schemes, always at the end of the file name:

  letter       pano_f.tif      _f _b _l _r _u _d
  word         pano_Front.tif  _Front _Back _Left _Right _Up _Down
  joined-word  panoFront.tif   Front Back Left Right Up Down

Default sizes (before rounding to sizing.multiple):
  face     = round(width / pi)       6144x3072  ->  1956x1956
  width    = round(face * pi)        1024x1024  ->  3217x1609

Each input is processed independently. Failures are reported on stderr and
the exit code is non-zero if any input failed.

Run 'panocube gen-config' to generate a documented panocube.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./panocube.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads (default: processing.max_processes, else all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Project equirectangular panoramas to six cube faces each
    ToCube {
        /// Equirectangular images (2:1)
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Face edge as N or NxN (default: round(width / pi))
        #[arg(long, value_parser = parse_face_size)]
        face_size: Option<u32>,

        /// Face tag scheme for the written files
        #[arg(long, value_enum)]
        naming: Option<FaceNaming>,

        #[command(flatten)]
        encode: EncodeArgs,
    },
    /// Stitch cube face sets back into equirectangular panoramas
    ToSphere {
        /// One face of each set, or several complete sets
        #[arg(required = true)]
        faces: Vec<PathBuf>,

        /// Output size as W or WxH with H = W/2 (default: round(face * pi))
        #[arg(long, value_parser = parse_equirect_size)]
        size: Option<EquirectSize>,

        /// Appended to the set prefix to name the output file
        #[arg(long)]
        suffix: Option<String>,

        #[command(flatten)]
        encode: EncodeArgs,
    },
    /// Validate cube face sets without converting them
    Check {
        /// One face of each set, or several complete sets
        #[arg(required = true)]
        faces: Vec<PathBuf>,
    },
    /// Print a stock panocube.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the selected command. `Ok(false)` means at least one item failed.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let Cli {
        config: config_path,
        threads,
        command,
    } = cli;
    let config_path = config_path.as_deref();
    let backend = RustBackend::new();
    let (tally, verb) = match command {
        Command::ToCube {
            images,
            face_size,
            naming,
            encode,
        } => {
            let mut config = load_config(config_path, threads)?;
            apply_encode_args(&mut config, &encode);
            config.validate()?;
            init_thread_pool(&config.processing);

            let mut options = CubeOptions::from_config(&config);
            options.face_size = face_size;
            if let Some(naming) = naming {
                options.naming = naming;
            }
            let (tx, printer) = spawn_printer();
            let tally = process::run_to_cube(&backend, &images, &options, Some(tx));
            printer.join().ok();
            (tally, "converted")
        }
        Command::ToSphere {
            faces,
            size,
            suffix,
            encode,
        } => {
            let mut config = load_config(config_path, threads)?;
            apply_encode_args(&mut config, &encode);
            if let Some(suffix) = suffix {
                config.output.equirect_suffix = suffix;
            }
            config.validate()?;
            init_thread_pool(&config.processing);

            let mut options = SphereOptions::from_config(&config);
            options.size = size;
            let (tx, printer) = spawn_printer();
            let tally = process::run_to_sphere(&backend, &faces, &options, Some(tx));
            printer.join().ok();
            (tally, "stitched")
        }
        Command::Check { faces } => {
            load_config(config_path, threads)?;
            let (tx, printer) = spawn_printer();
            let tally = process::run_check(&backend, &faces, Some(tx));
            printer.join().ok();
            (tally, "valid")
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(true);
        }
    };

    print_summary(&tally, verb);
    Ok(tally.is_success())
}

/// Stock defaults, then the config file, then `--threads`.
fn load_config(
    path: Option<&Path>,
    threads: Option<usize>,
) -> Result<config::PanoConfig, config::ConfigError> {
    let mut config = match path {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(Path::new("."))?,
    };
    if let Some(threads) = threads {
        config.processing.max_processes = Some(threads);
    }
    config.validate()?;
    Ok(config)
}

fn apply_encode_args(config: &mut config::PanoConfig, encode: &EncodeArgs) {
    if let Some(format) = encode.format {
        config.output.format = format;
    }
    if let Some(quality) = encode.quality {
        config.output.quality = quality;
    }
}

/// Print progress events as they arrive; failures go to stderr.
fn spawn_printer() -> (Sender<ProcessEvent>, JoinHandle<()>) {
    let (tx, rx) = std::sync::mpsc::channel::<ProcessEvent>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            let lines = output::format_process_event(&event);
            if event.is_failure() {
                lines.iter().for_each(|line| eprintln!("{}", line));
            } else {
                lines.iter().for_each(|line| println!("{}", line));
            }
        }
    });
    (tx, printer)
}

fn print_summary(tally: &Tally, verb: &str) {
    let line = output::format_summary(tally, verb);
    if tally.is_success() {
        println!("{}", line);
    } else {
        eprintln!("{}", line);
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; `--threads` can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
