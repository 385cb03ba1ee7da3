//! Game simulation modules

pub mod collision;
pub mod effects;
pub mod entity;
pub mod gravity;
pub mod r#match;
pub mod physics;
pub mod random;
pub mod snapshot;
pub mod state;
pub mod tuning;
pub mod vec2;

pub use r#match::{GameMatch, MatchHandle};
pub use random::entropy_source;
pub use state::{JoinAck, MatchPhase};
pub use tuning::GameTuning;
