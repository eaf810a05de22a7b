//! Client for a brokerage CMS property catalog: fetch, normalize, and query
//! listings in memory.

pub mod catalog;
pub mod config;
pub mod models;
