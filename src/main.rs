use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

use pagemaster::error::Result;
use pagemaster::ledger::{DEFAULT_LEDGER_FILE, Ledger};
use pagemaster::menu::{MenuChoice, prompt_settings, read_choice, render_menu};
use pagemaster::settings::{DEFAULT_SETTINGS_FILE, Settings};
use pagemaster::types::StageReport;

/// Splits CBZ archives into one CBZ per chapter using their index.json chapter map.
#[derive(Debug, Parser)]
#[command(name = "pagemaster", version, about, long_about = None)]
struct Cli {
    /// Settings file holding the three working directories
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    /// Ledger of extracted archives
    #[arg(long, default_value = DEFAULT_LEDGER_FILE)]
    manifest: PathBuf,

    /// Use the default directories without reading or prompting for settings
    #[arg(long)]
    standalone: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    /// Run one stage non-interactively; without a command the menu is shown
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Extract source archives into the extraction directory
    Extract,
    /// Sort extracted images into volume/chapter directories
    Organize,
    /// Zip chapter directories into per-chapter archives
    Package,
    /// Extract, organize and package in one go
    Run,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    if let Err(e) = TermLogger::init(level, log_config, TerminalMode::Mixed, ColorChoice::Auto) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let settings = load_settings(&cli).await?;
    match cli.command {
        Some(command) => run_command(command, &settings, &cli.manifest).await,
        None => {
            menu_loop(settings, &cli).await?;
            Ok(true)
        }
    }
}

async fn load_settings(cli: &Cli) -> Result<Settings> {
    if cli.standalone {
        return Ok(Settings::default());
    }
    if let Some(settings) = Settings::load(&cli.config).await? {
        return Ok(settings);
    }
    if cli.command.is_some() {
        log::warn!(
            "No configuration found at {:?}, using default directories",
            cli.config
        );
        return Ok(Settings::default());
    }

    println!("No configuration found. Running setup...");
    reconfigure(&Settings::default(), &cli.config).await
}

async fn reconfigure(current: &Settings, path: &Path) -> Result<Settings> {
    let settings = {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        prompt_settings(&mut stdin.lock(), &mut stdout, current)?
    };
    settings.save(path).await?;
    Ok(settings)
}

async fn menu_loop(mut settings: Settings, cli: &Cli) -> Result<()> {
    loop {
        let choice = {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            render_menu(&mut stdout, &settings)?;
            read_choice(&mut stdin.lock(), &mut stdout)?
        };

        let command = match choice {
            MenuChoice::Extract => Command::Extract,
            MenuChoice::Organize => Command::Organize,
            MenuChoice::Package => Command::Package,
            MenuChoice::Reconfigure => {
                settings = reconfigure(&settings, &cli.config).await?;
                continue;
            }
            MenuChoice::Exit => {
                println!("\nGoodbye!");
                if Ledger::clear(&cli.manifest).await? {
                    log::info!("Manifest cleared");
                }
                io::stdout().flush()?;
                return Ok(());
            }
        };

        // A failed stage is reported and the menu comes back.
        if let Err(e) = run_command(command, &settings, &cli.manifest).await {
            log::error!("{:?} failed: {}", command, e);
        }
    }
}

/// Runs one command; `Ok(false)` when at least one archive failed.
async fn run_command(command: Command, settings: &Settings, manifest: &Path) -> Result<bool> {
    let config = settings.to_config()?;
    let mut ledger = Ledger::load(manifest).await?;

    let clean = match command {
        Command::Extract => {
            let report = config.extract(&mut ledger).await?;
            ledger.save(manifest).await?;
            summarize("Extraction", &report)
        }
        Command::Organize => summarize("Organization", &config.organize(&ledger).await?),
        Command::Package => summarize("Packaging", &config.package(&ledger).await?),
        Command::Run => {
            let extract = config.extract(&mut ledger).await?;
            ledger.save(manifest).await?;
            let organize = config.organize(&ledger).await?;
            let package = config.package(&ledger).await?;
            let results = [
                summarize("Extraction", &extract),
                summarize("Organization", &organize),
                summarize("Packaging", &package),
            ];
            results.iter().all(|clean| *clean)
        }
    };

    Ok(clean)
}

fn summarize<T>(stage: &str, report: &StageReport<T>) -> bool {
    for (id, reason) in &report.skipped {
        log::warn!("{}: skipped {} ({})", stage, id, reason);
    }
    for (id, error) in &report.failed {
        log::error!("{}: {} failed: {}", stage, id, error);
    }
    log::info!(
        "{} finished: {} completed, {} skipped, {} failed",
        stage,
        report.completed.len(),
        report.skipped.len(),
        report.failed.len()
    );
    report.is_clean()
}
