//! Live game-state model: raw document, event ledgers, and the normalized
//! summary the agents consume.

pub mod fetcher;
pub mod monsters;
pub mod raw;
pub mod structures;
pub mod summary;

pub use fetcher::{FetchError, GameStateFetcher, GameStateSource};
pub use raw::RawGameState;
pub use summary::{GameStateSummary, SchemaError, normalize};
