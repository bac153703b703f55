use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use journey2html::{backup_dir, compile, exit_code, DEFAULT_CSS};

/// Render a static HTML page from a Journey ZIP backup.
///
/// The page is written as `index.html` inside a directory named after the
/// backup: `journey-foo.zip` becomes `journey-foo/index.html`, with the
/// backup's photos expanded next to it.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the ZIP backup (including filename)
    zipfile: PathBuf,

    /// Stylesheet URL linked from the generated page
    #[arg(long, default_value = DEFAULT_CSS)]
    css: String,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "journey2html=info",
        1 => "journey2html=debug",
        _ => "journey2html=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<PathBuf> {
    if !cli.zipfile.exists() {
        bail!("ZIP file {} does not exist", cli.zipfile.display());
    }
    let outdir = backup_dir(&cli.zipfile)?;
    if outdir.exists() {
        bail!("directory {} already exists", outdir.display());
    }
    compile(&cli.zipfile, &outdir, &cli.css)?;
    Ok(outdir.join("index.html"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(htmlfile) => {
            info!("wrote {}", htmlfile.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
