//! HTTP request handlers, grouped by resource.

pub mod catalog;
pub mod jobs;
pub mod storage;
pub mod training;
