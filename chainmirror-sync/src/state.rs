use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::watch;

use crate::entity::Story;

pub type EntityMap = BTreeMap<u64, Story>;

/// The application's observable view of every synchronized story.
///
/// Subscribers are notified on each change. Clones share the same state.
#[derive(Clone)]
pub struct EntityStateStore {
    tx: Arc<watch::Sender<EntityMap>>,
}

impl Default for EntityStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStateStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(EntityMap::new());
        Self { tx: Arc::new(tx) }
    }

    pub fn upsert(&self, story: Story) {
        self.tx.send_modify(|entities| {
            entities.insert(story.id, story);
        });
    }

    pub fn remove(&self, id: u64) {
        self.tx.send_if_modified(|entities| entities.remove(&id).is_some());
    }

    pub fn get(&self, id: u64) -> Option<Story> {
        self.tx.borrow().get(&id).cloned()
    }

    /// All stories ordered by id.
    pub fn snapshot(&self) -> Vec<Story> {
        self.tx.borrow().values().cloned().collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<EntityMap> {
        self.tx.subscribe()
    }
}
