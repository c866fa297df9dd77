use clap::{Parser, Subcommand};
use portfolio_media::process::{Pipeline, ProcessEvent};
use portfolio_media::{config, manifest, metadata, output, scan};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portfolio-media")]
#[command(about = "Rendition pipeline for a flat-file portfolio site")]
#[command(long_about = "\
Rendition pipeline for a flat-file portfolio site

Every subdirectory of the content root is a project. Photos dropped into a
project are resized into bounded renditions and the originals archived:

  workshops/
  ├── pipeline.toml                # Pipeline config (optional)
  └── birdhouse/
      ├── project.yaml             # Metadata sidecar (read by `metadata`)
      ├── IMG_0001.jpg             # New upload, picked up by `process`
      ├── sizes/
      │   ├── thumb/IMG_0002.jpg   # ≤400px on the longer edge
      │   ├── medium/IMG_0002.jpg  # ≤800px
      │   ├── large/IMG_0002.jpg   # ≤1200px
      │   └── xlarge/IMG_0002.jpg  # ≤2000px
      └── originals/IMG_0002.jpg   # Archived source

Sources are never upscaled: a rendition whose bound covers the image is a
byte-for-byte copy. Rerunning `process` only touches new files.

Set RUST_LOG (e.g. RUST_LOG=portfolio_media=debug) for diagnostics on stderr.
Run 'portfolio-media gen-config' to generate a documented pipeline.toml.")]
#[command(version)]
struct Cli {
    /// Content root holding one directory per project
    #[arg(long, default_value = "workshops", global = true)]
    root: PathBuf,

    /// Pipeline config file [default: <root>/pipeline.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Derive renditions for new uploads and archive the originals
    Process {
        /// Only this project (default: every project under the root)
        project: Option<String>,
        /// Print per-image progress to stderr
        #[arg(long)]
        progress: bool,
    },
    /// Print srcset records for every processed project
    Manifest {
        /// Human-readable overview instead of JSON
        #[arg(long)]
        text: bool,
    },
    /// Print a project's metadata sidecar
    Metadata {
        project: String,
        /// Human-readable listing instead of JSON
        #[arg(long)]
        text: bool,
    },
    /// Print a stock pipeline.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.root.join(config::CONFIG_FILENAME));

    match cli.command {
        Command::Process { project, progress } => {
            let pipeline_config = config::load_config(&config_path)?;
            init_thread_pool(&pipeline_config.processing);
            let pipeline = Pipeline::new(&cli.root, pipeline_config);

            match project {
                Some(name) => {
                    let result =
                        with_progress(progress, |events| pipeline.process_project(&name, events))?;
                    match result {
                        Ok(result) => {
                            if progress {
                                eprintln!("{}", output::format_processing_summary(&name, &result));
                            }
                            println!("{}", serde_json::to_string_pretty(&result)?);
                        }
                        Err(e) => {
                            tracing::error!(project = %name, error = %e, "processing failed");
                            println!("{}", serde_json::json!({ "error": e.to_string() }));
                            std::process::exit(1);
                        }
                    }
                }
                None => {
                    let outcomes =
                        with_progress(progress, |events| pipeline.process_all_projects(events))?;
                    if progress {
                        for line in output::format_all_summary(&outcomes) {
                            eprintln!("{}", line);
                        }
                    }
                    println!("{}", serde_json::to_string_pretty(&outcomes)?);
                }
            }
        }
        Command::Manifest { text } => {
            let pipeline_config = config::load_config(&config_path)?;
            let manifest = manifest::build_manifest(&cli.root, &pipeline_config)?;
            if text {
                print_lines(output::format_manifest_overview(&manifest));
            } else {
                println!("{}", serde_json::to_string_pretty(&manifest)?);
            }
        }
        Command::Metadata { project, text } => {
            let project_dir = scan::project_dir(&cli.root, &project)
                .ok_or_else(|| format!("Project directory not found: {}", project))?;
            let sidecar = metadata::load_project_metadata(&project_dir)?.unwrap_or_default();
            if text {
                print_lines(output::format_metadata(&sidecar));
            } else {
                println!("{}", serde_json::to_string_pretty(&sidecar)?);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the `warn` default.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Run `f` with an event sender drained by a printer thread when `progress`
/// is set, or with no sender otherwise.
fn with_progress<T>(
    progress: bool,
    f: impl FnOnce(Option<Sender<ProcessEvent>>) -> T,
) -> Result<T, Box<dyn std::error::Error>> {
    if !progress {
        return Ok(f(None));
    }
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_process_event(&event);
        }
    });
    // The sender moves into `f` and is dropped when it returns, ending the printer
    let value = f(Some(tx));
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    Ok(value)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}
