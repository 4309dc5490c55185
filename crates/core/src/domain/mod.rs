pub mod events;
pub mod filter;
pub mod scoreboard;
pub mod scores;
pub mod sheet;
pub mod status;
pub mod submission;

// Re-exports for convenience
pub use events::*;
pub use filter::*;
pub use scoreboard::*;
pub use scores::*;
pub use sheet::*;
pub use status::*;
pub use submission::*;
