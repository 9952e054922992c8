use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use splib07::archive::SplibArchive;
use splib07::cache;
use splib07::error::Splib07Error;
use splib07::index::Splib07Index;

#[derive(Parser)]
#[command(name = "splib07-index")]
#[command(about = "Generate the serialized index for a local splib07 archive")]
struct Cli {
    /// Archive root: an extracted directory or a zip distribution.
    library_path: Utf8PathBuf,

    /// Destination for the compressed index blob.
    output_path: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<Splib07Error>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &Splib07Error) -> u8 {
    match error {
        Splib07Error::StructuralMismatch { .. }
        | Splib07Error::UnknownSampling(_)
        | Splib07Error::MissingRequiredField { .. }
        | Splib07Error::Markup(_) => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let archive = SplibArchive::open(&cli.library_path).into_diagnostic()?;
    let index = Splib07Index::generate(&archive).into_diagnostic()?;
    cache::save(&index, &cli.output_path).into_diagnostic()?;

    info!(
        samplings = index.len(),
        output = %cli.output_path,
        "index written"
    );
    Ok(())
}
