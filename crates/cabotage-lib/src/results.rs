//! SQLite store for finished evaluations.
//!
//! One row per (origin, destination, cargo, truck) holding the serialized
//! result plus headline metrics as plain columns for ad-hoc queries.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::evaluator::EvaluationResult;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS evaluations (
    origin            TEXT NOT NULL,
    destination       TEXT NOT NULL,
    cargo_t           REAL NOT NULL,
    truck             TEXT NOT NULL,
    origin_port       TEXT NOT NULL,
    destination_port  TEXT NOT NULL,
    road_co2e_kg      REAL NOT NULL,
    cabotage_co2e_kg  REAL NOT NULL,
    road_cost_brl     REAL NOT NULL,
    cabotage_cost_brl REAL NOT NULL,
    delta_co2e_kg     REAL NOT NULL,
    delta_cost_brl    REAL NOT NULL,
    payload           TEXT NOT NULL,
    updated_at        INTEGER NOT NULL,
    PRIMARY KEY (origin, destination, cargo_t, truck)
);
";

/// Persistent evaluation results.
#[derive(Debug)]
pub struct ResultStore {
    conn: Connection,
}

impl ResultStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self::with_connection(Connection::open(path)?)?;
        info!(path = %path.display(), "opened result store");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert or replace the row for the result's key.
    pub fn upsert(&self, result: &EvaluationResult) -> Result<()> {
        let payload = serde_json::to_string(result)?;
        let cabotage = &result.cabotage.totals;
        let road = &result.road_only.leg;
        self.conn.execute(
            "INSERT INTO evaluations (
                origin, destination, cargo_t, truck, origin_port, destination_port,
                road_co2e_kg, cabotage_co2e_kg, road_cost_brl, cabotage_cost_brl,
                delta_co2e_kg, delta_cost_brl, payload, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(origin, destination, cargo_t, truck) DO UPDATE SET
                origin_port = excluded.origin_port,
                destination_port = excluded.destination_port,
                road_co2e_kg = excluded.road_co2e_kg,
                cabotage_co2e_kg = excluded.cabotage_co2e_kg,
                road_cost_brl = excluded.road_cost_brl,
                cabotage_cost_brl = excluded.cabotage_cost_brl,
                delta_co2e_kg = excluded.delta_co2e_kg,
                delta_cost_brl = excluded.delta_cost_brl,
                payload = excluded.payload,
                updated_at = excluded.updated_at",
            params![
                result.input.origin,
                result.input.destination,
                result.input.cargo_t,
                result.input.truck,
                result.selection.origin_port.port.name,
                result.selection.destination_port.port.name,
                road.co2e_kg,
                cabotage.co2e_kg,
                road.cost_brl,
                cabotage.cost_brl,
                result.deltas.co2e_kg,
                result.deltas.cost_brl,
                payload,
                Utc::now().timestamp(),
            ],
        )?;
        debug!(
            origin = %result.input.origin,
            destination = %result.input.destination,
            "stored evaluation"
        );
        Ok(())
    }

    /// Stored result for a key, if any.
    pub fn get(
        &self,
        origin: &str,
        destination: &str,
        cargo_t: f64,
        truck: &str,
    ) -> Result<Option<EvaluationResult>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM evaluations
                 WHERE origin = ?1 AND destination = ?2 AND cargo_t = ?3 AND truck = ?4",
                params![origin, destination, cargo_t, truck],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|p| {
                serde_json::from_str(&p).map_err(|err| Error::CachePayload {
                    key: format!("{origin} -> {destination}"),
                    message: err.to_string(),
                })
            })
            .transpose()
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM evaluations", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
