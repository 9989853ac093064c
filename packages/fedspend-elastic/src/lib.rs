//! HTTP transport for the transaction search cluster: a retrying `_search`
//! client, response readers, and a `search_after` scanner.

pub mod client;
pub mod response;
pub mod scan;

mod error;

pub use client::ElasticClient;
pub use error::{Error, Result};
pub use scan::SearchAfterScan;
