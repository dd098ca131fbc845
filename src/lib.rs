//! Brezza - weather lookup with a persisted city list.
//!
//! The [`app::App`] session ties the domain crates together the way a
//! front end would drive them.

pub mod app;

pub use app::App;
