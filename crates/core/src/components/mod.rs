//! Independently mounted page components.
//!
//! Each component talks to the others only through the `EventBus`.

pub mod banner;
pub mod display;
pub mod form;
pub mod redirect;

pub use banner::StatusBanner;
pub use display::ScoreDisplay;
pub use form::ScoreEntryForm;
pub use redirect::FilterRedirect;
