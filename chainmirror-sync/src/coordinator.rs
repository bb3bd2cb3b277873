use async_trait::async_trait;
use chainmirror_cache::{cache_keys, TtlCache};
use chainmirror_config::SyncConfig;
use chainmirror_core::normalize::normalize;
use chainmirror_metrics::metrics;
use chainmirror_rpc_client::{CallArg, ReadCallClient};
use log::*;

use crate::{
    entity::{record_from_response, value_u64, Story, StoryRound},
    errors::{SyncError, SyncResult},
    polling::Refresher,
    state::EntityStateStore,
};

/// Cache-first assembly of stories from contract reads.
///
/// Reads go through the shared [ReadCallClient], results land in the
/// [TtlCache] under the stable [cache_keys] and every successfully
/// assembled story is written through to the [EntityStateStore].
#[derive(Clone)]
pub struct SyncCoordinator {
    client: ReadCallClient,
    cache: TtlCache,
    state: EntityStateStore,
    functions: SyncConfig,
}

impl SyncCoordinator {
    pub fn new(
        client: ReadCallClient,
        cache: TtlCache,
        state: EntityStateStore,
        config: &SyncConfig,
    ) -> Self {
        Self {
            client,
            cache,
            state,
            functions: config.clone(),
        }
    }

    pub fn state(&self) -> &EntityStateStore {
        &self.state
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    // -----------------
    // Entities
    // -----------------
    /// `Err` means the story could not be read right now, `Ok(None)` means
    /// the remote has no such story.
    ///
    /// With `use_cache` unset the cached slot is not consulted, but the
    /// fresh result still replaces it.
    pub async fn fetch_entity(
        &self,
        id: u64,
        use_cache: bool,
    ) -> SyncResult<Option<Story>> {
        let key = cache_keys::entity(id);
        let story = if use_cache {
            self.cache
                .fetch_with_cache(&key, || self.fetch_and_assemble(id), None)
                .await
                .into_result()?
        } else {
            let fresh = self.fetch_and_assemble(id).await?;
            self.cache.set(&key, &fresh).await;
            fresh
        };

        match &story {
            Some(story) => self.state.upsert(story.clone()),
            None => self.state.remove(id),
        }
        Ok(story)
    }

    /// Drops the cached story and reads it again from the remote.
    pub async fn refresh_entity(&self, id: u64) -> SyncResult<Option<Story>> {
        metrics::inc_entity_refresh();
        self.cache.invalidate(&cache_keys::entity(id)).await;
        self.fetch_entity(id, false).await
    }

    /// Every story the counter knows of. Stories that fail to load are
    /// logged and left out; only a failing counter read fails the batch.
    pub async fn fetch_all_entities(&self) -> SyncResult<Vec<Story>> {
        let count = self.fetch_entity_count(true).await?;
        let mut stories = Vec::new();
        for id in 1..=count {
            match self.fetch_entity(id, true).await {
                Ok(Some(story)) => stories.push(story),
                Ok(None) => debug!("Story {} is not present upstream", id),
                Err(err) => {
                    metrics::inc_entity_fetch_failure();
                    warn!("Failed to fetch story {}: {}", id, err);
                }
            }
        }
        Ok(stories)
    }

    /// Like [Self::fetch_all_entities] but bypasses every cached value.
    pub async fn refresh_all_entities(&self) -> SyncResult<Vec<Story>> {
        let count = self.fetch_entity_count(false).await?;
        let mut stories = Vec::new();
        for id in 1..=count {
            match self.refresh_entity(id).await {
                Ok(Some(story)) => stories.push(story),
                Ok(None) => debug!("Story {} is not present upstream", id),
                Err(err) => {
                    metrics::inc_entity_fetch_failure();
                    warn!("Failed to refresh story {}: {}", id, err);
                }
            }
        }
        info!("Refreshed {}/{} stories", stories.len(), count);
        Ok(stories)
    }

    // -----------------
    // Sub-records
    // -----------------
    pub async fn fetch_round(
        &self,
        id: u64,
        round: u64,
        use_cache: bool,
    ) -> SyncResult<Option<StoryRound>> {
        let key = cache_keys::round_subset(id, round);
        if use_cache {
            Ok(self
                .cache
                .fetch_with_cache(&key, || self.read_round(id, round), None)
                .await
                .into_result()?)
        } else {
            let fresh = self.read_round(id, round).await?;
            self.cache.set(&key, &fresh).await;
            Ok(fresh)
        }
    }

    pub async fn fetch_entity_count(&self, use_cache: bool) -> SyncResult<u64> {
        let key = cache_keys::entity_count();
        if use_cache {
            Ok(self
                .cache
                .fetch_with_cache(&key, || self.read_entity_count(), None)
                .await
                .into_result()?)
        } else {
            let count = self.read_entity_count().await?;
            self.cache.set(&key, &count).await;
            Ok(count)
        }
    }

    // -----------------
    // Remote reads
    // -----------------
    /// Reads the primary record and then each round up to the current one.
    /// An absent primary record short-circuits before any round is read.
    async fn fetch_and_assemble(&self, id: u64) -> SyncResult<Option<Story>> {
        let response = self
            .client
            .call(&self.functions.story_function, &[CallArg::uint(id)], None)
            .await?;
        let Some(record) = record_from_response(&response) else {
            return Ok(None);
        };

        let mut story = Story::from_record(id, &record);
        for round in 1..=self.last_round_to_read(&story) {
            match self.read_round(id, round).await? {
                Some(story_round) => {
                    self.cache
                        .set(
                            &cache_keys::round_subset(id, round),
                            &Some(story_round.clone()),
                        )
                        .await;
                    story.rounds.push(story_round);
                }
                None => debug!("Story {} has no round {}", id, round),
            }
        }
        trace!("Assembled story {} with {} rounds", id, story.rounds.len());
        Ok(Some(story))
    }

    /// The record's current round, bounded by its own `max-rounds` and the
    /// configured limit.
    fn last_round_to_read(&self, story: &Story) -> u64 {
        let limit = match story.max_rounds {
            0 => self.functions.max_rounds,
            max_rounds => max_rounds.min(self.functions.max_rounds),
        };
        if story.current_round > limit {
            warn!(
                "Story {} claims round {} beyond the limit of {}",
                story.id, story.current_round, limit
            );
        }
        story.current_round.min(limit)
    }

    async fn read_round(
        &self,
        id: u64,
        round: u64,
    ) -> SyncResult<Option<StoryRound>> {
        let response = self
            .client
            .call(
                &self.functions.round_function,
                &[CallArg::uint(id), CallArg::uint(round)],
                None,
            )
            .await?;
        Ok(record_from_response(&response)
            .map(|record| StoryRound::from_record(round, &record)))
    }

    async fn read_entity_count(&self) -> SyncResult<u64> {
        let response = self
            .client
            .call(&self.functions.story_count_function, &[], None)
            .await?;
        let normalized = normalize(&response);
        let count = value_u64(&normalized).ok_or_else(|| {
            SyncError::InvalidCounter(normalized.to_string())
        })?;
        if count > self.functions.max_entities {
            return Err(SyncError::InvalidCounter(format!(
                "{} exceeds the limit of {}",
                count, self.functions.max_entities
            )));
        }
        Ok(count)
    }
}

#[async_trait]
impl Refresher for SyncCoordinator {
    async fn refresh(&self) {
        if let Err(err) = self.refresh_all_entities().await {
            warn!("Periodic refresh failed: {}", err);
        }
    }
}
