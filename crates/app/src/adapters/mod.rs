pub mod backend;
pub mod store;

pub use backend::LocalBackend;
pub use store::{JsonFileScoreStore, MemoryScoreStore};
