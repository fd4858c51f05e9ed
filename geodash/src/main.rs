//! Point d'entrée CLI pour geodash

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Dashboard de portfolio géospatial (Colab + Google My Maps)
#[derive(Parser)]
#[command(name = "geodash")]
#[command(author, version)]
#[command(about = "Merge Colab GeoJSON and My Maps KML layers into a filterable map dashboard")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        #[cfg(feature = "server")]
        Commands::Serve {
            config,
            port,
            static_dir,
            report,
        } => {
            info!(config = %config, port = ?port, "Démarrage du serveur");
            cli::cmd_serve(&config, port, static_dir, report.as_deref()).await?;
        }
        Commands::Export {
            config,
            output,
            filters,
            report,
        } => {
            info!(config = %config, output = %output.display(), "Export vers GeoJSON");
            cli::cmd_export(&config, &output, &filters, report.as_deref()).await?;
        }
        Commands::Snapshot {
            config,
            output,
            filters,
        } => {
            cli::cmd_snapshot(&config, output.as_deref(), &filters).await?;
        }
        Commands::Kml { input, output } => {
            info!(input = %input.display(), output = %output.display(), "Conversion KML");
            cli::cmd_kml(&input, &output)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs sur stderr: `snapshot` écrit son JSON sur stdout
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
