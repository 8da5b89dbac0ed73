use clap::Parser;
use insta_prep::config::{self, PrepConfig};
use insta_prep::imaging::RustBackend;
use insta_prep::process::{self, ProcessOptions};
use insta_prep::{output, scan};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "insta-prep")]
#[command(version)]
#[command(about = "Prepare images for Instagram publishing")]
#[command(long_about = "\
Prepare images for Instagram publishing

Processes images to Instagram's optimal specifications:
  Portrait images:  cropped to 4:5, scaled to 1080x1350px
  Landscape images: scaled to max 1350px long edge
  Square images:    scaled to 1080x1080px
  All images:       sharpened for screens, converted to sRGB,
                    saved as progressive JPEG under the size limit

INPUT may be a file, a directory (direct children only), or a quoted glob
pattern. OUTPUT defaults to an INSTA folder next to the input.

Run 'insta-prep --gen-config' to print a documented config file.")]
struct Cli {
    /// File, directory, or glob pattern of images to process
    #[arg(required_unless_present = "gen_config")]
    input: Option<String>,

    /// Destination folder (default: INPUT/INSTA, or next to a single file)
    output: Option<PathBuf>,

    /// Starting JPEG quality; lowered in steps of 5 until the file fits
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(60..=100))]
    quality: Option<u32>,

    /// Maximum output file size, e.g. 8MB, 2.5MiB, 500KB, or plain bytes
    #[arg(long, value_name = "SIZE", value_parser = config::parse_size_arg)]
    max_size: Option<u64>,

    /// Keep the original aspect ratio and scale down to fit the size limit
    #[arg(long)]
    fit_size: bool,

    /// Skip sharpening (useful if images are pre-sharpened in your editor)
    #[arg(long)]
    no_sharpen: bool,

    /// Preserve GPS and DateTime EXIF data (stripped by default for privacy)
    #[arg(long)]
    keep_exif: bool,

    /// Show what would be processed without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Show detailed processing information
    #[arg(short, long)]
    verbose: bool,

    /// TOML config file; command-line flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a stock config file with all options documented, then exit
    #[arg(long)]
    gen_config: bool,
}

impl Cli {
    /// Layer command-line flags on top of the loaded config.
    fn apply_overrides(&self, mut config: PrepConfig) -> PrepConfig {
        if let Some(quality) = self.quality {
            config.output.quality = quality;
        }
        if let Some(max_size) = self.max_size {
            config.output.max_file_size = max_size;
        }
        if self.fit_size {
            config.output.fit_size = true;
        }
        if self.no_sharpen {
            config.sharpening.enabled = false;
        }
        if self.keep_exif {
            config.metadata.keep = true;
        }
        config
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "insta_prep=debug"
    } else {
        "insta_prep=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }
    let Some(input) = cli.input.as_deref() else {
        return Err("INPUT is required".into());
    };

    let config = cli.apply_overrides(config::load_config(cli.config.as_deref())?);
    config.validate()?;
    let options = ProcessOptions::from_config(&config);

    let discovery = scan::discover(input)?;
    let output_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| discovery.default_output.clone());
    output::print_discovery(discovery.images.len(), &output_dir);

    if cli.dry_run {
        println!();
        output::print_dry_run(&discovery.images, &output_dir);
        return Ok(());
    }

    let ceiling = options.max_file_size;
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event, Some(ceiling)) {
                println!("{}", line);
            }
        }
    });
    let report = process::process_batch(
        &RustBackend::new(),
        &discovery.images,
        &output_dir,
        &options,
        Some(tx),
    );
    if printer.join().is_err() {
        warn!("progress printer panicked");
    }

    output::print_summary(&report?);
    Ok(())
}
