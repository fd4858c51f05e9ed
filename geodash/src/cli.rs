//! Définition et implémentation des commandes CLI
//!
//! - `serve`: charge les sources puis sert l'API et la page
//! - `export`: features fusionnées (et filtrées) → GeoJSON
//! - `snapshot`: vue complète du dashboard en JSON
//! - `kml`: export KML My Maps → GeoJSON, sans réseau

use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::{info, warn};

use geodash::export::export_to_geojson;
use geodash::filter::{self, FilterState, SizeBucket};
use geodash::sources::{loader_from_config, mymaps::placemarks_to_collection, HttpFetcher};
use geodash::{Config, Dashboard, LoadReport, SourceKind};

#[derive(Subcommand)]
pub enum Commands {
    /// Load every source and serve the dashboard API
    #[cfg(feature = "server")]
    Serve {
        /// Config preset name (default/offline) or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,

        /// Listening port (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory of the static page (overrides server.static_dir)
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Save the load report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Export merged features to a GeoJSON file
    Export {
        /// Config preset name (default/offline) or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Save the load report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the computed dashboard view (map, charts, table, stats) as JSON
    Snapshot {
        /// Config preset name (default/offline) or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Convert a My Maps KML export to GeoJSON
    Kml {
        /// KML file
        #[arg(short, long)]
        input: PathBuf,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Filtres communs à `export` et `snapshot`
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Continent (exact match, "all" to disable)
    #[arg(long)]
    pub continent: Option<String>,

    /// Size bucket: all, grande, medio, pequeno
    #[arg(long)]
    pub size: Option<SizeBucket>,

    /// Free-text search over name, country, continent and genres
    #[arg(long)]
    pub search: Option<String>,

    /// Source: all, colab, my_maps, geojson
    #[arg(long)]
    pub source: Option<SourceArg>,

    /// Specialisation areas (repeatable)
    #[arg(long = "area")]
    pub areas: Vec<String>,
}

/// Valeur de `--source`; `all` désactive le filtre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceArg(Option<SourceKind>);

impl FromStr for SourceArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        filter::parse_source(s).map(SourceArg)
    }
}

impl FilterArgs {
    pub fn to_state(&self) -> FilterState {
        let mut state = FilterState::default();
        if let Some(continent) = &self.continent {
            state.set_continent(continent.as_str());
        }
        if let Some(size) = self.size {
            state.set_size(size);
        }
        if let Some(search) = &self.search {
            state.set_search(search.as_str());
        }
        state.set_source(self.source.and_then(|s| s.0));
        state.set_areas(self.areas.iter().cloned());
        state
    }
}

/// Charge la configuration puis toutes les sources
async fn load_dashboard(config: &str) -> Result<(Dashboard, LoadReport)> {
    let config = Config::resolve(config)?;
    let fetcher = HttpFetcher::new(&config.http).context("Failed to build HTTP client")?;
    let loader = loader_from_config(&config, Arc::new(fetcher));

    let mut dashboard = Dashboard::new(config);
    let report = dashboard.init(loader.as_ref()).await;
    Ok((dashboard, report))
}

fn save_report(report: &LoadReport, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Rapport sauvegardé");
    }
    Ok(())
}

#[cfg(feature = "server")]
pub async fn cmd_serve(
    config: &str,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
    report_path: Option<&Path>,
) -> Result<()> {
    let (dashboard, report) = load_dashboard(config).await?;
    report.display();
    save_report(&report, report_path)?;

    let server = &dashboard.config().server;
    let port = port.unwrap_or(server.port);
    let static_dir = static_dir.or_else(|| server.static_dir.clone());
    if let Some(dir) = &static_dir {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "Répertoire statique introuvable");
        }
    }

    geodash::server::start_server(dashboard, report, port, static_dir.as_deref()).await
}

pub async fn cmd_export(
    config: &str,
    output: &Path,
    filters: &FilterArgs,
    report_path: Option<&Path>,
) -> Result<()> {
    let (dashboard, report) = load_dashboard(config).await?;
    report.display();
    save_report(&report, report_path)?;

    let state = filters.to_state();
    let records = filter::filter(dashboard.store(), &state);
    let count = export_to_geojson(&records, output)?;

    info!(
        features = count,
        total = dashboard.store().len(),
        output = %output.display(),
        "Export GeoJSON terminé"
    );
    Ok(())
}

pub async fn cmd_snapshot(config: &str, output: Option<&Path>, filters: &FilterArgs) -> Result<()> {
    let (dashboard, report) = load_dashboard(config).await?;
    info!(summary = %report.summary(), "Sources chargées");

    let view = dashboard.view_for(&filters.to_state());
    let json = serde_json::to_string_pretty(&view)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .context(format!("Failed to write snapshot: {}", path.display()))?;
            info!(path = %path.display(), features = view.stats.total, "Snapshot écrit");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

pub fn cmd_kml(input: &Path, output: &Path) -> Result<()> {
    let parsed = kml_flat::parse_file(input)
        .context(format!("Failed to parse KML: {}", input.display()))?;

    for e in &parsed.errors {
        warn!(error = %e, "Placemark ignoré");
    }

    let collection = placemarks_to_collection(&parsed.placemarks);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = std::fs::File::create(output)
        .context(format!("Failed to create file: {}", output.display()))?;
    serde_json::to_writer(std::io::BufWriter::new(file), &collection)?;

    info!(
        placemarks = parsed.placemarks.len(),
        skipped = parsed.skipped,
        encoding = parsed.encoding,
        output = %output.display(),
        "Conversion KML terminée"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_to_state() {
        let args = FilterArgs {
            continent: Some("all".to_string()),
            size: Some(SizeBucket::Medium),
            search: Some("psy".to_string()),
            source: None,
            areas: vec!["webgis".to_string()],
        };
        let state = args.to_state();
        assert_eq!(state.continent, None);
        assert_eq!(state.size, SizeBucket::Medium);
        assert_eq!(state.search, "psy");
        assert_eq!(state.areas, vec!["webgis"]);
    }

    #[test]
    fn test_source_arg_accepts_all() {
        let all: SourceArg = "all".parse().unwrap();
        assert_eq!(all, SourceArg(None));
        assert_eq!("ALL".parse::<SourceArg>().unwrap(), SourceArg(None));
        assert_eq!(
            "my_maps".parse::<SourceArg>().unwrap(),
            SourceArg(Some(SourceKind::MyMaps))
        );
        assert!("drive".parse::<SourceArg>().is_err());

        let args = FilterArgs {
            source: Some(all),
            ..Default::default()
        };
        assert!(args.to_state().is_inactive());
    }

    #[test]
    fn test_default_filter_args_are_inactive() {
        assert!(FilterArgs::default().to_state().is_inactive());
    }
}
