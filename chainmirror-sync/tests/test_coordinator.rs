use std::time::Duration;

use assert_matches::assert_matches;
use chainmirror_core::BlobStore;
use chainmirror_config::SyncConfig;
use chainmirror_rpc_client::{
    testing::MockFailure, ReadCallError, TransportError,
};
use chainmirror_sync::SyncError;
use serde_json::json;
use utils::*;

mod utils;

#[tokio::test(start_paused = true)]
async fn test_fetch_entity_assembles_story_with_rounds() {
    let ctx = setup(
        remote_with_stories(1)
            .response_for(
                ROUND_FN,
                &round_args(1, 1),
                round_response("first", 3),
            )
            .response_for(
                ROUND_FN,
                &round_args(1, 2),
                round_response("second", 1),
            ),
    );

    let story = ctx.coordinator.fetch_entity(1, true).await.unwrap().unwrap();

    assert_eq!(story.id, 1);
    assert_eq!(story.title, "Story 1");
    assert_eq!(story.author, "ST1AUTHOR");
    assert_eq!(story.current_round, 2);
    let contents = story
        .rounds
        .iter()
        .map(|r| (r.round, r.content.as_str(), r.votes))
        .collect::<Vec<_>>();
    assert_eq!(contents, vec![(1, "first", 3), (2, "second", 1)]);

    // Written through to local state
    assert_eq!(ctx.state.get(1), Some(story));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_entity_reads_remote_once_per_ttl_window() {
    let ctx = setup(remote_with_stories(1));

    let first = ctx.coordinator.fetch_entity(1, true).await.unwrap();
    ctx.clock.advance(Duration::from_millis(CACHE_TTL_MILLIS - 1));
    let second = ctx.coordinator.fetch_entity(1, true).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(ctx.transport.call_count(STORY_FN), 1);
    assert_eq!(ctx.transport.call_count(ROUND_FN), 2);

    ctx.clock.advance(Duration::from_millis(2));
    ctx.coordinator.fetch_entity(1, true).await.unwrap();
    assert_eq!(ctx.transport.call_count(STORY_FN), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_entity_always_reads_fresh_and_writes_through() {
    let ctx = setup(remote_with_stories(1));
    ctx.coordinator.fetch_entity(1, true).await.unwrap();

    ctx.transport.set_response_for(
        STORY_FN,
        &story_args(1),
        story_response("Renamed", 2),
    );
    let refreshed = ctx.coordinator.refresh_entity(1).await.unwrap().unwrap();
    ctx.coordinator.refresh_entity(1).await.unwrap();

    assert_eq!(refreshed.title, "Renamed");
    assert_eq!(ctx.transport.call_count(STORY_FN), 3);
    assert_eq!(ctx.state.get(1).unwrap().title, "Renamed");

    // The refreshed value now serves cached reads
    let cached = ctx.coordinator.fetch_entity(1, true).await.unwrap().unwrap();
    assert_eq!(cached.title, "Renamed");
    assert_eq!(ctx.transport.call_count(STORY_FN), 3);
}

#[tokio::test(start_paused = true)]
async fn test_absent_story_short_circuits_round_reads() {
    let ctx = setup(
        remote_with_stories(0).response_for(STORY_FN, &story_args(9), none()),
    );

    let story = ctx.coordinator.fetch_entity(9, true).await.unwrap();

    assert_eq!(story, None);
    assert_eq!(ctx.transport.call_count(ROUND_FN), 0);
    assert!(ctx.state.get(9).is_none());

    // Absence is cached like any other answer
    ctx.coordinator.fetch_entity(9, true).await.unwrap();
    assert_eq!(ctx.transport.call_count(STORY_FN), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_round_is_skipped() {
    let ctx = setup(
        remote_with_stories(1).response_for(
            ROUND_FN,
            &round_args(1, 1),
            none(),
        ),
    );

    let story = ctx.coordinator.fetch_entity(1, true).await.unwrap().unwrap();
    let rounds = story.rounds.iter().map(|r| r.round).collect::<Vec<_>>();
    assert_eq!(rounds, vec![2]);
}

#[tokio::test(start_paused = true)]
async fn test_failing_round_fails_the_entity_and_is_not_cached() {
    let ctx = setup(remote_with_stories(1).failure_for(
        ROUND_FN,
        &round_args(1, 2),
        MockFailure::Unavailable("node restarting".to_string()),
    ));

    let res = ctx.coordinator.fetch_entity(1, true).await;
    assert_matches!(
        res,
        Err(SyncError::ReadCall(ReadCallError::Transport(
            TransportError::Unavailable(_)
        )))
    );
    assert!(ctx.state.get(1).is_none());
    assert!(ctx
        .store
        .get_item("cache_entity_1")
        .await
        .unwrap()
        .is_none());

    ctx.transport.clear_failures();
    let story = ctx.coordinator.fetch_entity(1, true).await.unwrap().unwrap();
    assert_eq!(story.rounds.len(), 2);
    assert_eq!(ctx.transport.call_count(STORY_FN), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_all_entities_omits_failed_story() {
    let ctx = setup(remote_with_stories(5).failure_for(
        STORY_FN,
        &story_args(3),
        MockFailure::Status(500),
    ));

    let stories = ctx.coordinator.fetch_all_entities().await.unwrap();

    let ids = stories.iter().map(|s| s.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 2, 4, 5]);
    assert_eq!(ctx.state.snapshot().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_all_entities_fails_without_counter() {
    let ctx = setup(remote_with_stories(2).failure(
        COUNT_FN,
        MockFailure::Rejected("(err u500)".to_string()),
    ));

    assert_matches!(
        ctx.coordinator.fetch_all_entities().await,
        Err(SyncError::ReadCall(_))
    );
    assert_eq!(ctx.transport.call_count(STORY_FN), 0);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_all_entities_bypasses_cache() {
    let ctx = setup(remote_with_stories(2));
    ctx.coordinator.fetch_all_entities().await.unwrap();
    ctx.coordinator.fetch_all_entities().await.unwrap();
    assert_eq!(ctx.transport.call_count(COUNT_FN), 1);
    assert_eq!(ctx.transport.call_count(STORY_FN), 2);

    ctx.transport.set_response(COUNT_FN, uint(3));
    ctx.transport.set_response_for(
        STORY_FN,
        &story_args(3),
        story_response("Story 3", 1),
    );
    let stories = ctx.coordinator.refresh_all_entities().await.unwrap();

    assert_eq!(stories.len(), 3);
    assert_eq!(ctx.transport.call_count(COUNT_FN), 2);
    assert_eq!(ctx.transport.call_count(STORY_FN), 5);
}

#[tokio::test(start_paused = true)]
async fn test_uncached_fetch_still_stores_result() {
    let ctx = setup(remote_with_stories(1));

    ctx.coordinator.fetch_entity(1, false).await.unwrap();
    ctx.coordinator.fetch_entity(1, false).await.unwrap();
    assert_eq!(ctx.transport.call_count(STORY_FN), 2);

    ctx.coordinator.fetch_entity(1, true).await.unwrap();
    assert_eq!(ctx.transport.call_count(STORY_FN), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_round_uses_round_subset_slot() {
    let ctx = setup(remote_with_stories(1));

    // Assembling the story fills the round slots as a side effect
    ctx.coordinator.fetch_entity(1, true).await.unwrap();
    let round = ctx.coordinator.fetch_round(1, 2, true).await.unwrap().unwrap();
    assert_eq!(round.round, 2);
    assert_eq!(ctx.transport.call_count(ROUND_FN), 2);

    ctx.coordinator.fetch_round(1, 2, false).await.unwrap();
    assert_eq!(ctx.transport.call_count(ROUND_FN), 3);
    assert!(ctx
        .store
        .get_item("cache_roundsubset_1_2")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test(start_paused = true)]
async fn test_read_timeout_surfaces_as_retryable_error() {
    let ctx = setup(
        remote_with_stories(1).delay(STORY_FN, Duration::from_secs(30)),
    );

    let err = ctx.coordinator.fetch_entity(1, true).await.unwrap_err();
    assert!(err.is_retryable());
    assert_matches!(err, SyncError::ReadCall(ReadCallError::Timeout { .. }));
}

// -----------------
// Malformed responses
// -----------------
#[tokio::test(start_paused = true)]
async fn test_oversized_counter_is_rejected() {
    let ctx = setup(remote_with_stories(2).response(COUNT_FN, uint(u64::MAX)));

    let res = tokio::spawn({
        let coordinator = ctx.coordinator.clone();
        async move { coordinator.fetch_all_entities().await }
    })
    .await
    .expect("fetching all stories must not panic");

    assert_matches!(res, Err(SyncError::InvalidCounter(_)));
    assert_matches!(
        ctx.coordinator.refresh_all_entities().await,
        Err(SyncError::InvalidCounter(_))
    );
    assert_eq!(ctx.transport.call_count(STORY_FN), 0);
}

#[tokio::test(start_paused = true)]
async fn test_non_numeric_counter_is_rejected_and_not_cached() {
    let ctx =
        setup(remote_with_stories(1).response(COUNT_FN, ascii("plenty")));

    let err = ctx.coordinator.fetch_all_entities().await.unwrap_err();
    assert_matches!(err, SyncError::InvalidCounter(_));
    assert!(!err.is_retryable());

    ctx.transport.set_response(COUNT_FN, uint(1));
    let stories = ctx.coordinator.fetch_all_entities().await.unwrap();
    assert_eq!(stories.len(), 1);
    assert_eq!(ctx.transport.call_count(COUNT_FN), 2);
}

#[tokio::test(start_paused = true)]
async fn test_round_reads_bounded_by_record_max_rounds() {
    // max-rounds of the record is 10
    let ctx = setup(remote_with_stories(0).response_for(
        STORY_FN,
        &story_args(1),
        story_response("Runaway", u64::MAX),
    ));

    let story = ctx.coordinator.fetch_entity(1, true).await.unwrap().unwrap();

    assert_eq!(ctx.transport.call_count(ROUND_FN), 10);
    assert_eq!(story.rounds.len(), 10);
    assert_eq!(story.rounds.last().map(|r| r.round), Some(10));
}

#[tokio::test(start_paused = true)]
async fn test_round_reads_bounded_by_configured_limit() {
    let record = some_tuple(json!({
        "title": ascii("No limit"),
        "current-round": json!({
            "type": "uint",
            "value": "u18446744073709551615"
        }),
    }));
    let ctx = setup_with_sync_config(
        remote_with_stories(0).response_for(STORY_FN, &story_args(1), record),
        SyncConfig {
            max_rounds: 3,
            ..Default::default()
        },
    );

    let story = ctx.coordinator.fetch_entity(1, true).await.unwrap().unwrap();

    assert_eq!(story.max_rounds, 0);
    assert_eq!(ctx.transport.call_count(ROUND_FN), 3);
    assert_eq!(story.rounds.len(), 3);
}
