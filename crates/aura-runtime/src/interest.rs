//! Interest directory seam
//!
//! Interest tags belong to the external user store, not to the proximity
//! core: the occupancy index owns no user metadata. The service only needs
//! one question answered - "which tags does this user have" - so that is
//! the whole trait.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use aura_core::UserId;

/// Read-only view of users' interest tags, supplied by the application
pub trait InterestDirectory: Send + Sync {
    fn interests_of(&self, user: UserId) -> Option<HashSet<String>>;
}

/// In-memory directory for tests, demos, and single-process deployments
#[derive(Default)]
pub struct InMemoryInterests {
    inner: RwLock<HashMap<UserId, HashSet<String>>>,
}

impl InMemoryInterests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<I, S>(&self, user: UserId, interests: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: HashSet<String> = interests.into_iter().map(Into::into).collect();
        self.inner.write().insert(user, tags);
    }

    pub fn clear(&self, user: UserId) {
        self.inner.write().remove(&user);
    }
}

impl InterestDirectory for InMemoryInterests {
    fn interests_of(&self, user: UserId) -> Option<HashSet<String>> {
        self.inner.read().get(&user).cloned()
    }
}
