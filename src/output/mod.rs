//! Output module for crawl reports
//!
//! The crawl keeps no state beyond the run, so the report is the only output.

mod report;

pub use report::{print_report, CrawlReport};
