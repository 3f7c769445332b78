use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use phytofetch::app::{App, ProgressSinkKind, RunOptions};
use phytofetch::config::{ConfigLoader, ResolvedConfig};
use phytofetch::domain::{PlantName, Provider};
use phytofetch::error::PhytoError;
use phytofetch::imppat::ImppatHttpClient;
use phytofetch::output::{ConsoleOutput, JsonOutput, OutputMode};
use phytofetch::pubchem::PubchemHttpClient;
use phytofetch::workspace::PlantWorkspace;

#[derive(Parser)]
#[command(name = "phytofetch")]
#[command(about = "Phytocompound retrieval from IMPPAT and 3D SDF downloader")]
#[command(version, author)]
struct Cli {
    /// Print JSON results instead of progress lines and never prompt.
    #[arg(long, global = true)]
    non_interactive: bool,

    /// Config file (defaults to ./phytofetch.json when present).
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Show a plant's phytochemicals")]
    Search(PlantArgs),
    #[command(about = "Save a plant's phytochemicals to a spreadsheet")]
    Export(ExportArgs),
    #[command(about = "Export phytochemicals and download a 3D SDF for each")]
    Download(DownloadArgs),
}

#[derive(Args)]
struct PlantArgs {
    /// Plant name, e.g. "Ocimum sanctum".
    plant: String,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    plant: PlantArgs,

    /// Root directory; a folder per plant is created inside it.
    #[arg(long)]
    out: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct DownloadArgs {
    #[command(flatten)]
    export: ExportArgs,

    /// Structure database. Prompted for when omitted in interactive mode.
    #[arg(long, value_enum)]
    provider: Option<Provider>,

    /// Download structures without writing a new spreadsheet.
    #[arg(long)]
    skip_export: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<PhytoError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PhytoError) -> u8 {
    match error {
        PhytoError::NotFound(_) => 2,
        PhytoError::RetrievalHttp(_) | PhytoError::Retrieval { .. } => 3,
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
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let imppat = ImppatHttpClient::new(&config.imppat_base_url, config.timeout)?;
    let pubchem = PubchemHttpClient::new(&config.pubchem_base_url, config.timeout)?;
    let app = App::new(imppat, pubchem, config.columns.clone());

    match cli.command {
        Command::Search(args) => run_search(args, &app, output_mode),
        Command::Export(args) => run_export(args, &app, &config, output_mode),
        Command::Download(args) => run_download(args, &app, &config, output_mode),
    }
}

type HttpApp = App<ImppatHttpClient, PubchemHttpClient>;

fn run_search(args: PlantArgs, app: &HttpApp, output_mode: OutputMode) -> miette::Result<()> {
    let plant: PlantName = args.plant.parse()?;
    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.search(&plant, &JsonOutput)?;
            JsonOutput::print_search(&result).into_diagnostic()
        }
        OutputMode::Interactive => {
            let result = app.search(&plant, &ConsoleOutput::new(ProgressSinkKind::Search))?;
            ConsoleOutput::print_table(&result);
            Ok(())
        }
    }
}

fn run_export(
    args: ExportArgs,
    app: &HttpApp,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let plant: PlantName = args.plant.plant.parse()?;
    let root = args.out.unwrap_or_else(|| config.output_dir.clone());
    let workspace = PlantWorkspace::new(&root, &plant);
    match output_mode {
        OutputMode::NonInteractive => {
            let table = app.fetch_table(&plant, &JsonOutput)?;
            let result = app.export(&table, &workspace, &JsonOutput)?;
            JsonOutput::print_export(&result).into_diagnostic()
        }
        OutputMode::Interactive => {
            let sink = ConsoleOutput::new(ProgressSinkKind::Export);
            let table = app.fetch_table(&plant, &sink)?;
            let result = app.export(&table, &workspace, &sink)?;
            ConsoleOutput::print_export(&result);
            Ok(())
        }
    }
}

fn run_download(
    args: DownloadArgs,
    app: &HttpApp,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let plant: PlantName = args.export.plant.plant.parse()?;
    let root = args.export.out.unwrap_or_else(|| config.output_dir.clone());

    match output_mode {
        OutputMode::NonInteractive => {
            let options = RunOptions {
                provider: args.provider.unwrap_or(config.default_provider),
                skip_export: args.skip_export,
            };
            let result = app.run(&plant, &root, options, &JsonOutput)?;
            JsonOutput::print_run(&result).into_diagnostic()
        }
        OutputMode::Interactive => {
            let sink = ConsoleOutput::new(ProgressSinkKind::Download);
            let table = app.fetch_table(&plant, &sink)?;
            let workspace = PlantWorkspace::new(&root, &plant);
            if !args.skip_export {
                let export = app.export(&table, &workspace, &sink)?;
                ConsoleOutput::print_export(&export);
            }
            let provider = match args.provider {
                Some(provider) => provider,
                None => ConsoleOutput::prompt_provider(config.default_provider).into_diagnostic()?,
            };
            let batch = app.download_structures(&table, &workspace, provider, &sink)?;
            ConsoleOutput::print_batch(&batch);
            Ok(())
        }
    }
}
