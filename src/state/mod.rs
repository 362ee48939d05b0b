//! State management for crawl tracking
//!
//! This module contains the resumable crawl state, the breadth-first
//! frontier it owns, and the page lifecycle states.

mod crawl_state;
mod frontier;
mod page_state;

pub use crawl_state::{CrawlState, PageResult, VisitOutcome};
pub use frontier::Frontier;
pub use page_state::PageState;
