//! SQLite persistence for extraction snapshots.

use crate::diagnostics::{DiagnosticLog, Severity};
use crate::model::{CategoryTree, Weapon, WeaponCategory};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    created_at TEXT NOT NULL,
    summary_json TEXT
);

CREATE TABLE IF NOT EXISTS snapshot_weapons (
    snapshot_id INTEGER NOT NULL REFERENCES snapshots(id),
    position INTEGER NOT NULL,
    category TEXT NOT NULL,
    weapon TEXT NOT NULL,
    weapon_json TEXT NOT NULL,
    PRIMARY KEY (snapshot_id, weapon)
);

CREATE INDEX IF NOT EXISTS idx_snapshot_weapons_snapshot ON snapshot_weapons(snapshot_id);
";

/// Counts stored with each snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub weapons: usize,
    pub configurations: usize,
    pub warnings: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInfo {
    pub id: i64,
    pub source: String,
    pub created_at: String,
    pub summary: Option<SnapshotSummary>,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| e.to_string())?;
        conn.execute_batch(SCHEMA).map_err(|e| e.to_string())?;
        Ok(Store { conn })
    }

    pub fn insert_snapshot(
        &mut self,
        source: &str,
        tree: &CategoryTree,
        diagnostics: &DiagnosticLog,
    ) -> Result<i64, String> {
        let now: DateTime<Utc> = Utc::now();
        let created = now.to_rfc3339();
        let summary = SnapshotSummary {
            weapons: tree.weapon_count(),
            configurations: tree.stat_count(),
            warnings: diagnostics.count(Severity::Warn),
            errors: diagnostics.count(Severity::Error),
        };
        let summary_json = serde_json::to_string(&summary).map_err(|e| e.to_string())?;

        let tx = self.conn.transaction().map_err(|e| e.to_string())?;
        tx.execute(
            "INSERT INTO snapshots (source, created_at, summary_json) VALUES (?1, ?2, ?3)",
            params![source, created, summary_json],
        )
        .map_err(|e| e.to_string())?;
        let id = tx.last_insert_rowid();
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO snapshot_weapons (snapshot_id, position, category, weapon, weapon_json)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(|e| e.to_string())?;
            for (position, (category, weapon)) in tree.weapons_with_category().enumerate() {
                let json = serde_json::to_string(weapon).map_err(|e| e.to_string())?;
                stmt.execute(params![id, position as i64, category, weapon.name, json])
                    .map_err(|e| e.to_string())?;
            }
        }
        tx.commit().map_err(|e| e.to_string())?;
        tracing::debug!("stored snapshot {} ({} weapons)", id, summary.weapons);
        Ok(id)
    }

    pub fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, source, created_at, summary_json FROM snapshots ORDER BY id DESC")
            .map_err(|e| e.to_string())?;
        let rows = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, Option<String>>(3)?,
                ))
            })
            .map_err(|e| e.to_string())?;
        let mut out = Vec::new();
        for row in rows {
            let (id, source, created_at, summary) = row.map_err(|e| e.to_string())?;
            out.push(SnapshotInfo {
                id,
                source,
                created_at,
                summary: summary.and_then(|s| serde_json::from_str(&s).ok()),
            });
        }
        Ok(out)
    }

    pub fn latest_snapshot_id(&self) -> Result<Option<i64>, String> {
        Ok(self.list_snapshots()?.first().map(|s| s.id))
    }

    /// Rebuild the tree stored under `snapshot_id`, categories in first-seen order.
    pub fn get_snapshot_tree(&self, snapshot_id: i64) -> Result<CategoryTree, String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT category, weapon_json FROM snapshot_weapons
                 WHERE snapshot_id = ?1 ORDER BY position",
            )
            .map_err(|e| e.to_string())?;
        let rows = stmt
            .query_map(params![snapshot_id], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })
            .map_err(|e| e.to_string())?;
        let mut tree = CategoryTree::default();
        for row in rows {
            let (category, json) = row.map_err(|e| e.to_string())?;
            let weapon: Weapon = serde_json::from_str(&json).map_err(|e| e.to_string())?;
            match tree.categories.iter_mut().find(|c| c.name == category) {
                Some(c) => c.weapons.push(weapon),
                None => tree.categories.push(WeaponCategory {
                    name: category,
                    weapons: vec![weapon],
                }),
            }
        }
        Ok(tree)
    }
}
