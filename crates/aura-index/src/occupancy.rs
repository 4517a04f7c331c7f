//! Live occupancy index - the only shared mutable state in the engine
//!
//! One record per user, replaced on every location update. The presence map
//! is the source of truth; the per-cell sets are an acceleration structure
//! verified against it on every read, so a concurrent reader can never
//! observe a user under two cells at once.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::time::Duration;

use parking_lot::RwLock;

use aura_core::{AuraResult, CellKey, Coordinate, Timestamp, UserId};

/// One user's live presence; replaced on update, never appended
#[derive(Clone, Debug)]
pub struct OccupancyRecord {
    pub user: UserId,
    pub cell: CellKey,
    pub resolution: u8,
    pub last_seen: Timestamp,
}

/// Occupancy counters for sweep logging. Counts only, never locations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub users: usize,
    pub cells: usize,
}

/// Sharded cell → occupant index
///
/// Constructed once per process and injected wherever occupancy is read;
/// never a module-level global.
pub struct OccupancyIndex {
    cell_shards: Box<[RwLock<HashMap<CellKey, HashSet<UserId>>>]>,
    presence: RwLock<HashMap<UserId, OccupancyRecord>>,
    staleness: Duration,
}

impl OccupancyIndex {
    pub fn new(shard_count: usize, staleness: Duration) -> Self {
        let shard_count = shard_count.max(1);
        let cell_shards = (0..shard_count)
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        OccupancyIndex {
            cell_shards,
            presence: RwLock::new(HashMap::new()),
            staleness,
        }
    }

    fn shard_of(&self, cell: &CellKey) -> &RwLock<HashMap<CellKey, HashSet<UserId>>> {
        let mut hasher = DefaultHasher::new();
        cell.hash(&mut hasher);
        let index = hasher.finish() as usize % self.cell_shards.len();
        &self.cell_shards[index]
    }

    #[inline]
    fn is_fresh(&self, record: &OccupancyRecord, now: Timestamp) -> bool {
        now.since(record.last_seen) <= self.staleness
    }

    /// Replace the user's presence with a fresh record
    ///
    /// Lock discipline: presence first, then the old cell's shard, then the
    /// new cell's shard; no two locks are ever held together. Old
    /// membership disappears before new membership appears, so readers see
    /// the user under at most one cell.
    pub fn upsert(
        &self,
        user: UserId,
        coord: Coordinate,
        resolution: u8,
        now: Timestamp,
    ) -> AuraResult<CellKey> {
        let cell = aura_geo::encode(coord, resolution)?;
        let record = OccupancyRecord {
            user,
            cell: cell.clone(),
            resolution,
            last_seen: now,
        };

        let previous = self.presence.write().insert(user, record);

        if let Some(prev) = previous {
            if prev.cell != cell {
                self.unlink(&prev.cell, user);
            }
        }

        self.shard_of(&cell)
            .write()
            .entry(cell.clone())
            .or_default()
            .insert(user);

        Ok(cell)
    }

    /// Drop the user entirely; they cannot reappear in reads that start
    /// after this returns
    pub fn remove(&self, user: UserId) -> bool {
        let removed = self.presence.write().remove(&user);
        match removed {
            Some(record) => {
                self.unlink(&record.cell, user);
                true
            }
            None => false,
        }
    }

    fn unlink(&self, cell: &CellKey, user: UserId) {
        let mut shard = self.shard_of(cell).write();
        if let Some(set) = shard.get_mut(cell) {
            set.remove(&user);
            if set.is_empty() {
                shard.remove(cell);
            }
        }
    }

    /// Fresh occupants of exactly this cell, sorted for determinism
    pub fn users_in(&self, cell: &CellKey, now: Timestamp) -> Vec<UserId> {
        let candidates: Vec<UserId> = match self.shard_of(cell).read().get(cell) {
            Some(set) => set.iter().copied().collect(),
            None => return Vec::new(),
        };

        let presence = self.presence.read();
        let mut users: Vec<UserId> = candidates
            .into_iter()
            .filter(|user| {
                presence
                    .get(user)
                    .is_some_and(|r| r.cell == *cell && self.is_fresh(r, now))
            })
            .collect();
        users.sort();
        users
    }

    /// Fresh occupants of this cell or any descendant, sorted
    ///
    /// Coarse cells have no shard entry of their own, so this scans the
    /// presence map; the hot path (exact-resolution lookups) stays on the
    /// shards.
    pub fn users_under(&self, cell: &CellKey, now: Timestamp) -> Vec<UserId> {
        let presence = self.presence.read();
        let mut users: Vec<UserId> = presence
            .values()
            .filter(|r| cell.covers(&r.cell) && self.is_fresh(r, now))
            .map(|r| r.user)
            .collect();
        users.sort();
        users
    }

    /// Distinct fresh occupants under this cell
    pub fn count_under(&self, cell: &CellKey, now: Timestamp) -> usize {
        let presence = self.presence.read();
        presence
            .values()
            .filter(|r| cell.covers(&r.cell) && self.is_fresh(r, now))
            .count()
    }

    /// Like `count_under`, leaving one user out of the count
    pub fn count_under_excluding(
        &self,
        cell: &CellKey,
        excluded: UserId,
        now: Timestamp,
    ) -> usize {
        let presence = self.presence.read();
        presence
            .values()
            .filter(|r| r.user != excluded && cell.covers(&r.cell) && self.is_fresh(r, now))
            .count()
    }

    /// Distinct fresh occupants within `rings` cells of `cell`
    pub fn count_near(&self, cell: &CellKey, rings: u32, now: Timestamp) -> AuraResult<usize> {
        let mut count = 0;
        for candidate in aura_geo::disc(cell, rings)? {
            count += self.count_under(&candidate, now);
        }
        Ok(count)
    }

    /// Fresh `(user, cell)` pairs, sorted by user
    ///
    /// One read lock, one clone; the query service classifies against this
    /// snapshot instead of locking per cell.
    pub fn snapshot(&self, now: Timestamp) -> Vec<(UserId, CellKey)> {
        let presence = self.presence.read();
        let mut entries: Vec<(UserId, CellKey)> = presence
            .values()
            .filter(|r| self.is_fresh(r, now))
            .map(|r| (r.user, r.cell.clone()))
            .collect();
        entries.sort_by_key(|(user, _)| *user);
        entries
    }

    /// Evict records older than the staleness window
    ///
    /// Candidates are collected under a read lock; each eviction then
    /// re-checks and removes one user at a time, so no lock is held for
    /// longer than a single cell's bucket.
    pub fn sweep(&self, now: Timestamp) -> usize {
        let expired: Vec<UserId> = {
            let presence = self.presence.read();
            presence
                .values()
                .filter(|r| !self.is_fresh(r, now))
                .map(|r| r.user)
                .collect()
        };

        let mut evicted = 0;
        for user in expired {
            let removed = {
                let mut presence = self.presence.write();
                match presence.get(&user) {
                    // Re-check: the record may have been refreshed since.
                    Some(r) if !self.is_fresh(r, now) => presence.remove(&user),
                    _ => None,
                }
            };
            if let Some(record) = removed {
                self.unlink(&record.cell, user);
                evicted += 1;
            }
        }
        evicted
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.presence.read().contains_key(&user)
    }

    /// Cell the user is currently indexed under
    pub fn cell_of(&self, user: UserId) -> Option<CellKey> {
        self.presence.read().get(&user).map(|r| r.cell.clone())
    }

    pub fn len(&self) -> usize {
        self.presence.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.presence.read().is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            users: self.presence.read().len(),
            cells: self.cell_shards.iter().map(|s| s.read().len()).sum(),
        }
    }

    pub fn staleness(&self) -> Duration {
        self.staleness
    }
}
