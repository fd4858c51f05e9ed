//! API HTTP du dashboard (axum)
//!
//! La page statique lit `/api/view` à chaque changement de filtre et renvoie
//! les clics de boutons sur `/api/action`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{debug, info};

use crate::dashboard::{Action, ActionOutcome, Dashboard, DashboardView};
use crate::export::write_collection;
use crate::filter::{self, FilterState, SizeBucket};
use crate::report::LoadReport;

pub struct AppState {
    pub dashboard: RwLock<Dashboard>,
    pub report: LoadReport,
}

/// Filtres passés en query string
///
/// `areas` est une liste séparée par des virgules.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    continent: Option<String>,
    size: Option<String>,
    search: Option<String>,
    source: Option<String>,
    areas: Option<String>,
}

impl ViewQuery {
    pub fn into_filters(self) -> Result<FilterState, String> {
        let mut filters = FilterState::default();
        if let Some(continent) = self.continent {
            filters.set_continent(continent);
        }
        if let Some(size) = self.size {
            filters.set_size(size.parse::<SizeBucket>()?);
        }
        if let Some(search) = self.search {
            filters.set_search(search);
        }
        if let Some(source) = self.source {
            filters.set_source(filter::parse_source(&source)?);
        }
        if let Some(areas) = self.areas {
            filters.set_areas(
                areas
                    .split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty()),
            );
        }
        Ok(filters)
    }
}

pub fn router(state: Arc<AppState>, static_dir: Option<&std::path::Path>) -> Router {
    let api = Router::new()
        .route("/api/view", get(view_handler))
        .route("/api/features", get(features_handler))
        .route("/api/features/:id", get(feature_handler))
        .route("/api/continents", get(continents_handler))
        .route("/api/report", get(report_handler))
        .route("/api/action", post(action_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    }
}

pub async fn start_server(
    dashboard: Dashboard,
    report: LoadReport,
    port: u16,
    static_dir: Option<&std::path::Path>,
) -> Result<()> {
    let state = Arc::new(AppState {
        dashboard: RwLock::new(dashboard),
        report,
    });
    let app = router(state, static_dir);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Serveur démarré");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

type ApiError = (StatusCode, String);

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, message)
}

async fn view_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<DashboardView>, ApiError> {
    let filters = query.into_filters().map_err(bad_request)?;
    debug!(?filters, "GET /api/view");
    let dashboard = state.dashboard.read().await;
    Ok(Json(dashboard.view_for(&filters)))
}

async fn features_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Response, ApiError> {
    let filters = query.into_filters().map_err(bad_request)?;
    let dashboard = state.dashboard.read().await;
    let records = filter::filter(dashboard.store(), &filters);

    let mut body = Vec::with_capacity(records.len() * 256);
    write_collection(&mut body, &records)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "application/geo+json")], body).into_response())
}

async fn feature_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<geojson::Feature>, ApiError> {
    let dashboard = state.dashboard.read().await;
    dashboard
        .store()
        .get(&id)
        .map(|record| Json(record.feature.clone()))
        .ok_or((StatusCode::NOT_FOUND, format!("Unknown feature: {}", id)))
}

async fn continents_handler(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.dashboard.read().await.continent_options())
}

async fn report_handler(State(state): State<Arc<AppState>>) -> Json<LoadReport> {
    Json(state.report.clone())
}

async fn action_handler(
    State(state): State<Arc<AppState>>,
    Json(action): Json<Action>,
) -> Json<ActionOutcome> {
    let mut dashboard = state.dashboard.write().await;
    Json(dashboard.dispatch(action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceKind;

    #[test]
    fn test_view_query_into_filters() {
        let query = ViewQuery {
            continent: Some("Europa".to_string()),
            size: Some("grande".to_string()),
            search: Some("boom".to_string()),
            source: Some("my_maps".to_string()),
            areas: Some("webgis, cartografia,".to_string()),
        };
        let filters = query.into_filters().unwrap();
        assert_eq!(filters.continent.as_deref(), Some("Europa"));
        assert_eq!(filters.size, SizeBucket::Large);
        assert_eq!(filters.search, "boom");
        assert_eq!(filters.source, Some(SourceKind::MyMaps));
        assert_eq!(filters.areas, vec!["webgis", "cartografia"]);
    }

    #[test]
    fn test_view_query_all_means_inactive() {
        let query = ViewQuery {
            continent: Some("all".to_string()),
            size: Some("all".to_string()),
            source: Some("all".to_string()),
            ..Default::default()
        };
        assert!(query.into_filters().unwrap().is_inactive());
    }

    #[test]
    fn test_view_query_rejects_unknown_values() {
        let query = ViewQuery {
            size: Some("huge".to_string()),
            ..Default::default()
        };
        assert!(query.into_filters().is_err());

        let query = ViewQuery {
            source: Some("drive".to_string()),
            ..Default::default()
        };
        assert!(query.into_filters().is_err());
    }
}
