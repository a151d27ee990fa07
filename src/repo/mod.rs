//! Repository functions: plain queries against an explicit connection
//! handle, returning plain data records.

pub mod media;
pub mod tweets;
pub mod users;
