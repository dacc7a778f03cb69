//! Read-only HTTP API over one canonical data file.

use crate::metrics::{btk, damage_at_range, ttk, MetricIndex, Modifiers, RpmSelector};
use crate::model::{AmmoStat, CategoryTree, WeaponConfiguration, WeaponConfigurationStat};
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub struct AppState {
    pub index: MetricIndex,
    pub modifiers: Modifiers,
    pub rpm_selector: RpmSelector,
}

type AppStateArc = Arc<AppState>;

#[derive(Deserialize)]
pub struct StatsQuery {
    name: String,
    barrel: String,
    ammo: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse<'a> {
    category: &'a str,
    stat: &'a WeaponConfigurationStat,
    #[serde(skip_serializing_if = "Option::is_none")]
    ammo_stat: Option<&'a AmmoStat>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtkRequest {
    configurations: Vec<WeaponConfiguration>,
    #[serde(default)]
    modifiers: Option<Modifiers>,
    #[serde(default)]
    range: f64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TtkEntry {
    configuration: WeaponConfiguration,
    found: bool,
    btk: Option<u32>,
    ttk_ms: Option<u32>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error(status: StatusCode, msg: String) -> (StatusCode, Json<ErrorBody>) {
    (status, Json(ErrorBody { error: msg }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn data(State(state): State<AppStateArc>) -> Json<CategoryTree> {
    Json(state.index.tree().clone())
}

async fn stats(
    State(state): State<AppStateArc>,
    Query(q): Query<StatsQuery>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let c = state.index.get(&q.name, &q.barrel, &q.ammo).ok_or_else(|| {
        error(
            StatusCode::NOT_FOUND,
            format!("no stats for ({}, {}, {})", q.name, q.barrel, q.ammo),
        )
    })?;
    let body = serde_json::to_value(StatsResponse {
        category: c.category,
        stat: c.stat,
        ammo_stat: c.ammo,
    })
    .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(body))
}

/// BTK and TTK at `range` for each requested configuration. Unknown
/// configurations come back with `found: false`.
pub fn ttk_entries(
    index: &MetricIndex,
    configurations: Vec<WeaponConfiguration>,
    modifiers: &Modifiers,
    rpm_selector: RpmSelector,
    range: f64,
) -> Vec<TtkEntry> {
    configurations
        .into_iter()
        .map(|configuration| {
            let Some(c) = index.get_stats_for_configuration(&configuration) else {
                return TtkEntry {
                    configuration,
                    found: false,
                    btk: None,
                    ttk_ms: None,
                };
            };
            let damage = damage_at_range(&c.stat.dropoffs, range);
            TtkEntry {
                btk: damage.and_then(|d| btk(c.ammo, modifiers, d)),
                ttk_ms: damage.and_then(|d| ttk(c.ammo, modifiers, d, rpm_selector.select(c.stat))),
                found: true,
                configuration,
            }
        })
        .collect()
}

async fn ttk_handler(
    State(state): State<AppStateArc>,
    Json(req): Json<TtkRequest>,
) -> Json<Vec<TtkEntry>> {
    let modifiers = req.modifiers.unwrap_or_else(|| state.modifiers.clone());
    Json(ttk_entries(
        &state.index,
        req.configurations,
        &modifiers,
        state.rpm_selector,
        req.range,
    ))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/data", get(data))
        .route("/stats", get(stats))
        .route("/ttk", post(ttk_handler))
        .with_state(Arc::new(state))
}

pub async fn run(state: AppState, addr: &str) -> Result<(), String> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| e.to_string())?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExceptionTable;
    use crate::model::{DamageRange, Weapon, WeaponCategory};

    #[test]
    fn ttk_entries_resolve_by_key() {
        let mut w = Weapon::new("M5A3");
        let mut s = WeaponConfigurationStat::new("Factory", "Standard");
        s.dropoffs = vec![
            DamageRange {
                damage: 25.0,
                range: 0.0,
            },
            DamageRange {
                damage: 20.0,
                range: 30.0,
            },
        ];
        s.rpm_auto = Some(600);
        w.stats.push(s);
        let index = MetricIndex::new(
            CategoryTree {
                categories: vec![WeaponCategory {
                    name: "Assault Rifles".to_string(),
                    weapons: vec![w],
                }],
            },
            ExceptionTable::empty(),
        );
        let out = ttk_entries(
            &index,
            vec![
                WeaponConfiguration::new("M5A3", "Factory", "Standard"),
                WeaponConfiguration::new("M5A3", "Factory", "Subsonic"),
            ],
            &Modifiers::default(),
            RpmSelector::Fastest,
            35.0,
        );
        assert!(out[0].found);
        assert_eq!(out[0].btk, Some(5));
        assert_eq!(out[0].ttk_ms, Some(400));
        assert!(!out[1].found);
        assert_eq!(out[1].ttk_ms, None);
    }
}
