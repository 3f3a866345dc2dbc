//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! Rules are cached per origin for the lifetime of one crawl session; a robots.txt that
//! cannot be fetched fails open (allow-all) so a transient outage does not halt an
//! otherwise-compliant crawl.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;
