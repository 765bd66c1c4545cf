use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use zimbra_migrate::execution::export::{ExportOptions, export_accounts};
use zimbra_migrate::execution::import::{AttributeImport, ImportAction};
use zimbra_migrate::execution::report::ImportReport;
use zimbra_migrate::ops::log_sink::ConsoleFileSink;
use zimbra_migrate::ops::snapshot::{JsonSnapshot, write_snapshot};
use zimbra_migrate::ops::soap::admin::AdminClient;
use zimbra_migrate::prelude::*;
use zimbra_migrate::settings::{ServerSpec, Settings};
use zimbra_migrate::utils::http::build_client;

#[derive(Parser)]
#[command(name = "zimbra-migrate")]
#[command(about = "Move accounts and shared folders between two mail installations", long_about = None)]
struct Cli {
    /// Settings file (default: ./migrate.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the source installation into a snapshot file
    Export {
        /// Also capture folders, grants and mount points
        #[arg(long)]
        shared_folders: bool,

        #[arg(short, long, value_enum)]
        mode: Option<RunMode>,

        /// Snapshot file to write
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply a snapshot file to the target installation
    Import {
        #[arg(short, long, value_enum, default_value = "modify")]
        action: ImportAction,

        /// Attribute groups to import, comma separated
        #[arg(short, long, value_enum, value_delimiter = ',', required = true)]
        options: Vec<ImportOption>,

        #[arg(short, long, value_enum)]
        mode: Option<RunMode>,

        /// Snapshot file to read
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

async fn connect_admin(settings: &Settings, server: &ServerSpec) -> Result<AdminClient> {
    let http = build_client(settings.accept_invalid_certs)?;
    AdminClient::authenticate(
        http,
        &server.admin_url,
        &server.mail_url,
        &server.username,
        &server.password,
    )
    .await
    .with_context(|| format!("admin authentication at {} failed", server.admin_url))
}

async fn export(
    settings: &Settings,
    shared_folders: bool,
    mode: RunMode,
    output: PathBuf,
) -> Result<()> {
    let source = settings
        .source
        .as_ref()
        .context("no [source] installation configured")?;
    let admin = connect_admin(settings, source).await?;
    let sink = ConsoleFileSink::create(&settings.paths.log_dir, "export")?;

    let options = ExportOptions {
        shared_folders,
        mode,
        parallelism: settings.run.parallelism,
    };
    let accounts = export_accounts(&admin, options, &sink)
        .await
        .context("listing source accounts failed")?;
    write_snapshot(&output, &accounts)
        .with_context(|| format!("writing {} failed", output.display()))?;
    info!("wrote {} account(s) to {}", accounts.len(), output.display());
    Ok(())
}

async fn import(
    settings: &Settings,
    action: ImportAction,
    options: Vec<ImportOption>,
    mode: RunMode,
    input: PathBuf,
) -> Result<()> {
    let target = settings
        .target
        .as_ref()
        .context("no [target] installation configured")?;
    let snapshot = JsonSnapshot::open(&input)
        .with_context(|| format!("reading {} failed", input.display()))?;
    let admin = connect_admin(settings, target).await?;
    let sink = ConsoleFileSink::create(&settings.paths.log_dir, "import")?;
    let accounts = snapshot.accounts();
    sink.info(
        "IMPORT",
        &format!("Found {} accounts in {}", accounts.len(), input.display()),
    );

    let mut report = ImportReport::default();
    let attributes = AttributeImport {
        action,
        options,
        mode,
        parallelism: settings.run.parallelism,
    };

    if attributes.reconciles_shared_folders() {
        let runner = BatchRunner::new(&admin, &sink).with_parallelism(settings.run.parallelism);
        report.shared_folders = runner.run(&accounts, mode).await;
        report.stats = runner.stats().clone();
    } else if attributes.options.contains(&ImportOption::SharedFolders) {
        sink.info(
            "IMPORT",
            "Shared folders are only imported with --action modify, skipping them",
        );
    }

    if attributes.has_work() {
        report.attributes = attributes.run(&admin, &accounts, &sink).await;
    } else {
        sink.info("All Accounts", "All accounts have been imported");
    }

    let path = report.write(&settings.paths.report_dir).await?;
    info!("report written to {}", path.display());
    if report.has_failures() {
        info!(
            "accounts needing attention: {}",
            report.failed_accounts().into_iter().collect::<Vec<_>>().join(", ")
        );
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("loading settings failed")?;
    match cli.command {
        Commands::Export {
            shared_folders,
            mode,
            output,
        } => {
            export(
                &settings,
                shared_folders,
                mode.unwrap_or(settings.run.mode),
                output.unwrap_or_else(|| settings.paths.snapshot.clone()),
            )
            .await
        }
        Commands::Import {
            action,
            options,
            mode,
            input,
        } => {
            import(
                &settings,
                action,
                options,
                mode.unwrap_or(settings.run.mode),
                input.unwrap_or_else(|| settings.paths.snapshot.clone()),
            )
            .await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
