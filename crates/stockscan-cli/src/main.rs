use anyhow::bail;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use stockscan_core::{
    discovery, logging, BarcodeScanner, Config, DecodeOutcome, Error, LogLevel, Symbology,
};

#[derive(Parser)]
#[command(name = "stockscan")]
#[command(about = "Read product barcodes from label photos")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode barcodes from photos or directories of photos
    Decode {
        /// Photos or directories to decode
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Restrict decoding to these symbologies (repeatable)
        #[arg(short, long = "symbology")]
        symbologies: Vec<Symbology>,

        /// Skip the fast-path detector
        #[arg(long)]
        no_fast_path: bool,

        /// Print one JSON object per photo
        #[arg(long)]
        json: bool,

        /// Verbosity level
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Write logs to rotating files in this directory instead of stderr
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "stockscan.json")]
        path: PathBuf,
    },
}

/// One line of output per photo
#[derive(Serialize)]
struct ScanReport {
    path: PathBuf,
    barcode: Option<String>,
    symbology: Option<Symbology>,
    error: Option<String>,
}

impl ScanReport {
    fn new(path: PathBuf, outcome: DecodeOutcome) -> Self {
        match outcome {
            DecodeOutcome::Success(barcode) => Self {
                path,
                barcode: Some(barcode.text().to_string()),
                symbology: barcode.symbology(),
                error: None,
            },
            DecodeOutcome::Failure(e) => Self {
                path,
                barcode: None,
                symbology: None,
                error: Some(e.user_message()),
            },
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Decode {
            paths,
            symbologies,
            no_fast_path,
            json,
            verbose,
            log_dir,
            config,
        } => {
            // Set up configuration
            let mut config = if let Some(config_path) = config {
                Config::from_file(&config_path)?
            } else {
                Config::default()
            };

            // Override config with command line arguments
            if !symbologies.is_empty() {
                config.symbologies = symbologies;
            }
            if no_fast_path {
                config.fast_path = false;
            }

            // Set log level based on verbosity
            config.log_level = match verbose {
                0 => LogLevel::Info,
                1 => LogLevel::Debug,
                _ => LogLevel::Trace,
            };

            init_logging(log_dir.as_ref(), config.log_level)?;

            if let Err(e) = config.validate() {
                error!("{}", e);
                bail!(e.user_message());
            }

            let photos = discovery::discover_images(&paths, &config)?;
            info!("Decoding {} photos", photos.len());

            let reports = decode_all(&photos, &config);
            let failed = reports.iter().filter(|r| r.error.is_some()).count();

            for report in &reports {
                if json {
                    println!("{}", serde_json::to_string(report)?);
                } else {
                    match (&report.barcode, &report.error) {
                        (Some(text), _) => println!("{}\t{}", report.path.display(), text),
                        (None, Some(msg)) => println!("{}\t! {}", report.path.display(), msg),
                        (None, None) => {}
                    }
                }
            }

            if failed > 0 {
                bail!("{} of {} photos could not be decoded", failed, reports.len());
            }
            Ok(())
        }

        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }
    }
}

fn init_logging(log_dir: Option<&PathBuf>, level: LogLevel) -> Result<(), anyhow::Error> {
    match log_dir {
        Some(dir) => {
            logging::init_logger(&dir.to_string_lossy(), level.to_level_filter())
                .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
        }
        None => {
            env_logger::Builder::new()
                .filter_level(level.to_level_filter())
                .parse_env(logging::LOG_ENV_VAR)
                .init();
        }
    }
    Ok(())
}

/// Decode every photo independently. Each rayon worker owns its own scanner.
fn decode_all(photos: &[PathBuf], config: &Config) -> Vec<ScanReport> {
    let progress_bar = if photos.len() > 1 {
        let pb = ProgressBar::new(photos.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{eta}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        pb.set_message("Decoding photos...");
        Some(pb)
    } else {
        None
    };

    let reports = photos
        .par_iter()
        .map_init(
            || BarcodeScanner::new(config.clone()),
            |scanner, path| {
                let outcome = scanner.decode_file(path);
                if let DecodeOutcome::Failure(Error::Configuration(msg)) = &outcome {
                    error!("Configuration problem while decoding {}: {}", path.display(), msg);
                }
                if let Some(pb) = &progress_bar {
                    pb.inc(1);
                }
                ScanReport::new(path.clone(), outcome)
            },
        )
        .collect();

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Done");
    }
    reports
}
