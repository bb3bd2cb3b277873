#![allow(dead_code)]
use std::sync::Arc;

use chainmirror_cache::TtlCache;
use chainmirror_config::{
    CacheConfig, RateLimitConfig, RemoteConfig, SyncConfig,
};
use chainmirror_core::{ManualClock, MemoryBlobStore};
use chainmirror_rate_limiter::RateLimiter;
use chainmirror_rpc_client::{
    testing::{ReadCallTransportMock, ReadCallTransportMockBuilder},
    CallArg, ReadCallClient,
};
use chainmirror_sync::{EntityStateStore, SyncCoordinator};
use serde_json::{json, Value};

pub const STORY_FN: &str = "get-story";
pub const ROUND_FN: &str = "get-round";
pub const COUNT_FN: &str = "get-story-count";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// -----------------
// Tagged responses
// -----------------
pub fn uint(n: u64) -> Value {
    json!({ "type": "uint", "value": n.to_string() })
}

pub fn ascii(s: &str) -> Value {
    json!({ "type": format!("(string-ascii {})", s.len()), "value": s })
}

pub fn principal(s: &str) -> Value {
    json!({ "type": "principal", "value": s })
}

pub fn boolean(b: bool) -> Value {
    json!({ "type": "bool", "value": b })
}

pub fn some_tuple(fields: Value) -> Value {
    json!({
        "type": "(optional (tuple ...))",
        "value": { "type": "(tuple ...)", "value": fields }
    })
}

pub fn none() -> Value {
    json!({ "type": "(optional none)", "value": null })
}

pub fn story_response(title: &str, current_round: u64) -> Value {
    some_tuple(json!({
        "title": ascii(title),
        "creator": principal("ST1AUTHOR"),
        "current-round": uint(current_round),
        "max-rounds": uint(10),
        "round-start-time": uint(1_000),
        "round-end-time": uint(4_600),
        "total-blocks": uint(100),
        "is-sealed": boolean(false),
    }))
}

pub fn round_response(content: &str, votes: u64) -> Value {
    some_tuple(json!({
        "author": principal("ST1WRITER"),
        "content": json!({ "type": "(string-utf8 64)", "value": content }),
        "votes": uint(votes),
        "finalized": boolean(true),
    }))
}

pub fn story_args(id: u64) -> Vec<CallArg> {
    vec![CallArg::uint(id)]
}

pub fn round_args(id: u64, round: u64) -> Vec<CallArg> {
    vec![CallArg::uint(id), CallArg::uint(round)]
}

// -----------------
// Setup
// -----------------
pub struct TestContext {
    pub coordinator: SyncCoordinator,
    pub transport: ReadCallTransportMock,
    pub store: Arc<MemoryBlobStore>,
    pub clock: Arc<ManualClock>,
    pub state: EntityStateStore,
}

pub const CACHE_TTL_MILLIS: u64 = 300_000;

pub fn setup(builder: ReadCallTransportMockBuilder) -> TestContext {
    setup_with_sync_config(builder, SyncConfig::default())
}

pub fn setup_with_sync_config(
    builder: ReadCallTransportMockBuilder,
    sync_config: SyncConfig,
) -> TestContext {
    init_logger();
    let transport = builder.build();
    let limiter = RateLimiter::new(&RateLimitConfig {
        max_requests: 1_000,
        inter_request_delay_millis: 0,
        ..Default::default()
    });
    let client = ReadCallClient::new(
        Arc::new(transport.clone()),
        limiter,
        &RemoteConfig::default(),
    );

    let store = Arc::new(MemoryBlobStore::new());
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let cache = TtlCache::new(
        store.clone(),
        clock.clone(),
        &CacheConfig {
            default_ttl_millis: CACHE_TTL_MILLIS,
            ..Default::default()
        },
    );

    let state = EntityStateStore::new();
    let coordinator =
        SyncCoordinator::new(client, cache, state.clone(), &sync_config);

    TestContext {
        coordinator,
        transport,
        store,
        clock,
        state,
    }
}

/// A remote holding `count` stories, each with two rounds.
pub fn remote_with_stories(count: u64) -> ReadCallTransportMockBuilder {
    let mut builder = ReadCallTransportMockBuilder::new()
        .response(COUNT_FN, uint(count))
        .response(ROUND_FN, round_response("a round", 1));
    for id in 1..=count {
        builder = builder.response_for(
            STORY_FN,
            &story_args(id),
            story_response(&format!("Story {id}"), 2),
        );
    }
    builder
}
