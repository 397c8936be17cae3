//! State module for tracking crawl progress
//!
//! `PageState` names the stage each URL is in while the engine drives it
//! from the frontier to a terminal outcome.

mod page_state;

pub use page_state::PageState;
