//! Hotspot tables - where tunneling queries go
//!
//! A hotspot is a globally known high-occupancy cell. The table is a
//! versioned piece of configuration, reloadable at runtime without touching
//! the radius logic; stale versions are rejected on reload.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use aura_core::{AuraError, AuraResult, CellKey, Timestamp, UserId};

use crate::occupancy::OccupancyIndex;

/// Versioned list of hotspot cells
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotTable {
    pub version: u64,
    pub cells: Vec<CellKey>,
}

impl HotspotTable {
    pub fn new(version: u64, cells: Vec<CellKey>) -> Self {
        HotspotTable { version, cells }
    }

    /// Parse and validate a table from JSON
    pub fn from_json_str(json: &str) -> AuraResult<HotspotTable> {
        let table: HotspotTable = serde_json::from_str(json)
            .map_err(|e| AuraError::InvalidHotspotTable(e.to_string()))?;

        for cell in &table.cells {
            aura_geo::CellIndex::parse(cell)
                .map_err(|_| AuraError::InvalidHotspotTable(format!("bad cell key: {cell}")))?;
        }
        Ok(table)
    }
}

/// Live registry holding the current hotspot table
pub struct HotspotRegistry {
    table: RwLock<HotspotTable>,
}

impl HotspotRegistry {
    pub fn new(initial: HotspotTable) -> Self {
        HotspotRegistry {
            table: RwLock::new(initial),
        }
    }

    /// Registry with no hotspots (version 0)
    pub fn empty() -> Self {
        Self::new(HotspotTable::default())
    }

    pub fn current(&self) -> HotspotTable {
        self.table.read().clone()
    }

    pub fn version(&self) -> u64 {
        self.table.read().version
    }

    /// Swap in a strictly newer table; older or equal versions are ignored
    pub fn reload(&self, table: HotspotTable) -> bool {
        let mut current = self.table.write();
        if table.version <= current.version {
            return false;
        }
        *current = table;
        tracing::debug!(
            version = current.version,
            cells = current.cells.len(),
            "hotspot table reloaded"
        );
        true
    }

    /// Fresh occupants of every hotspot cell, as `(cell, users)` pairs
    pub fn occupants(
        &self,
        index: &OccupancyIndex,
        now: Timestamp,
    ) -> Vec<(CellKey, Vec<UserId>)> {
        let table = self.current();
        table
            .cells
            .into_iter()
            .map(|cell| {
                let users = index.users_under(&cell, now);
                (cell, users)
            })
            .collect()
    }
}
