use serde::{Deserialize, Serialize};

/// Names of the contract read functions an entity is assembled from, and
/// the bounds applied to the counts the remote reports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SyncConfig {
    #[serde(default = "default_story_function")]
    pub story_function: String,
    #[serde(default = "default_round_function")]
    pub round_function: String,
    #[serde(default = "default_story_count_function")]
    pub story_count_function: String,
    /// A counter above this is treated as a malformed response.
    #[serde(default = "default_max_entities")]
    pub max_entities: u64,
    /// Upper bound of rounds read for one entity, whatever the record
    /// claims.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            story_function: default_story_function(),
            round_function: default_round_function(),
            story_count_function: default_story_count_function(),
            max_entities: default_max_entities(),
            max_rounds: default_max_rounds(),
        }
    }
}

fn default_story_function() -> String {
    "get-story".to_string()
}

fn default_round_function() -> String {
    "get-round".to_string()
}

fn default_story_count_function() -> String {
    "get-story-count".to_string()
}

fn default_max_entities() -> u64 {
    10_000
}

fn default_max_rounds() -> u64 {
    1_000
}
