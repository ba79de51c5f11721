use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use mask2roi::{Configuration, Mask, OptionValue, mask2roi, mask2roi_with_boundaries};
use mask2roi_cli::{OutputFormat, collect_overrides, option_help, parse_option, render, write_boundary_masks};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace the regions of a mask image into ROI polygons
    Extract {
        /// Path to the mask image
        #[arg(short, long)]
        input: PathBuf,
        /// Binarize a grayscale image: values above this are foreground
        #[arg(short, long)]
        threshold: Option<u8>,
        /// TOML or JSON file with option overrides
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Option override, e.g. `--option NumROIs=2` (repeatable, wins over --config)
        #[arg(short = 'O', long = "option", value_parser = parse_option)]
        options: Vec<(String, OptionValue)>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output encoding
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Also write each ROI's boundary mask as a PNG into this directory
        #[arg(long)]
        boundaries: Option<PathBuf>,
    },
    /// Print the JSON schema of the resolved configuration
    Schema,
    /// List the recognised option names
    Options,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    // Logs go to stderr so stdout stays clean for the ROI output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            threshold,
            config,
            options,
            output,
            format,
            boundaries,
        } => {
            extract(
                &input,
                threshold,
                config.as_deref(),
                &options,
                output.as_deref(),
                format,
                boundaries.as_deref(),
            )?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&Configuration::schema())?);
        }
        Commands::Options => {
            for help in option_help() {
                println!("{:<18} {}", help.name, help.description);
            }
        }
    }

    Ok(())
}

fn extract(
    input: &Path,
    threshold: Option<u8>,
    config: Option<&Path>,
    options: &[(String, OptionValue)],
    output: Option<&Path>,
    format: OutputFormat,
    boundaries: Option<&Path>,
) -> Result<()> {
    let mask = Mask::open(input, threshold)?;
    info!(
        "Loaded mask {:?} ({}x{}, {} foreground pixels)",
        input,
        mask.width(),
        mask.height(),
        mask.foreground_count()
    );

    let overrides = collect_overrides(config, options)?;
    let rois = match boundaries {
        Some(_) => mask2roi_with_boundaries(&mask, &overrides)?,
        None => mask2roi(&mask, &overrides)?,
    };

    info!(
        "Extracted {} ROIs from {} regions ({} vertices)",
        rois.len(),
        rois.regions_found,
        rois.vertex_count()
    );

    if let Some(dir) = boundaries {
        let written = write_boundary_masks(&rois, dir)?;
        info!("Wrote {} boundary masks to {:?}", written.len(), dir);
    }

    let text = render(&rois, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            info!("📄 ROIs saved to: {:?}", path);
        }
        None => println!("{text}"),
    }

    Ok(())
}
