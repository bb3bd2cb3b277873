mod coordinator;
mod entity;
pub mod errors;
mod polling;
mod state;

pub use coordinator::SyncCoordinator;
pub use entity::{record_from_response, Story, StoryRound};
pub use errors::{SyncError, SyncResult};
pub use polling::{AppState, PollingDriver, Refresher};
pub use state::EntityStateStore;
