pub mod location;
pub mod store;

// Re-exports
pub use location::*;
pub use store::*;
