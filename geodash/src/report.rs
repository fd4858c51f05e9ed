//! Rapport de chargement avec graceful degradation
//!
//! Chaque sous-source (dataset Colab, couche My Maps, GeoJSON) y laisse une
//! entrée. Un échec de sous-source est enregistré une seule fois puis ignoré;
//! le dashboard termine toujours dans un état affichable.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::schema::SourceKind;
use crate::sources::EmbedDescriptor;

/// Statut global du chargement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadStatus {
    /// Toutes les sous-sources chargées
    Success,
    /// Au moins une sous-source ignorée
    PartialSuccess,
    /// Aucune donnée réelle: jeu d'exemple affiché
    Fallback,
}

/// Résultat d'une sous-source
#[derive(Debug, Clone, Serialize)]
pub struct SourceEntry {
    pub source: SourceKind,
    /// Nom du dataset ou de la couche
    pub name: String,
    pub url: String,
    pub features: usize,
    /// Message d'erreur si la sous-source a été ignorée
    pub error: Option<String>,
}

impl SourceEntry {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Warning de chargement
#[derive(Debug, Clone, Serialize)]
pub struct LoadWarning {
    pub source: String,
    pub message: String,
}

/// Niveau d'une notification affichée à l'utilisateur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Notification non bloquante pour la page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Rapport complet d'un chargement
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub status: LoadStatus,

    /// Features dans le store après chargement
    pub total_features: usize,

    pub entries: Vec<SourceEntry>,
    pub warnings: Vec<LoadWarning>,
    pub notices: Vec<Notice>,

    /// Mode embed My Maps (aucune couche KML exploitable)
    pub embed: Option<EmbedDescriptor>,
}

impl Default for LoadReport {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            duration_secs: 0.0,
            status: LoadStatus::Success,
            total_features: 0,
            entries: Vec::new(),
            warnings: Vec::new(),
            notices: Vec::new(),
            embed: None,
        }
    }
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre une sous-source chargée
    pub fn record_success(&mut self, source: SourceKind, name: &str, url: &str, features: usize) {
        self.entries.push(SourceEntry {
            source,
            name: name.to_string(),
            url: url.to_string(),
            features,
            error: None,
        });
    }

    /// Enregistre une sous-source ignorée
    pub fn record_failure(&mut self, source: SourceKind, name: &str, url: &str, message: &str) {
        self.entries.push(SourceEntry {
            source,
            name: name.to_string(),
            url: url.to_string(),
            features: 0,
            error: Some(message.to_string()),
        });
    }

    /// Enregistre un warning
    pub fn record_warning(&mut self, source: &str, message: impl Into<String>) {
        self.warnings.push(LoadWarning {
            source: source.to_string(),
            message: message.into(),
        });
    }

    pub fn add_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn set_embed(&mut self, embed: EmbedDescriptor) {
        self.embed = Some(embed);
    }

    /// Intègre le rapport d'un chargement concurrent
    pub fn absorb(&mut self, other: LoadReport) {
        self.entries.extend(other.entries);
        self.warnings.extend(other.warnings);
        self.notices.extend(other.notices);
        if other.embed.is_some() {
            self.embed = other.embed;
        }
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self, total_features: usize, fallback: bool) {
        self.total_features = total_features;
        self.status = if fallback {
            LoadStatus::Fallback
        } else if self.sources_failed() > 0 || self.embed.is_some() {
            LoadStatus::PartialSuccess
        } else {
            LoadStatus::Success
        };
    }

    pub fn sources_ok(&self) -> usize {
        self.entries.iter().filter(|e| e.is_ok()).count()
    }

    pub fn sources_failed(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_ok()).count()
    }

    /// Features chargées par type de source
    pub fn features_from(&self, source: SourceKind) -> usize {
        self.entries
            .iter()
            .filter(|e| e.source == source)
            .map(|e| e.features)
            .sum()
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("LOAD REPORT - {}", self.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!(
            "Sources: {} loaded, {} failed",
            self.sources_ok(),
            self.sources_failed()
        );
        println!("Features: {}", self.total_features);

        if !self.entries.is_empty() {
            println!("\n--- BY SOURCE ---");
            for entry in &self.entries {
                match &entry.error {
                    None => println!(
                        "  {}/{}: {} features",
                        entry.source, entry.name, entry.features
                    ),
                    Some(e) => println!("  {}/{}: FAILED {}", entry.source, entry.name, e),
                }
            }
        }

        if let Some(embed) = &self.embed {
            println!("\n--- EMBED ---");
            println!("  {}", embed.url);
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in self.warnings.iter().take(10) {
                println!("  [{}] {}", w.source, w.message);
            }
            if self.warnings.len() > 10 {
                println!("  ... and {} more", self.warnings.len() - 10);
            }
        }

        if !self.notices.is_empty() {
            println!("\n--- NOTICES ---");
            for n in &self.notices {
                println!("  {:?} {}", n.level, n.message);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .context(format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{:?}: {} features, {} sources loaded, {} failed, {} warnings",
            self.status,
            self.total_features,
            self.sources_ok(),
            self.sources_failed(),
            self.warnings.len()
        )
    }
}
