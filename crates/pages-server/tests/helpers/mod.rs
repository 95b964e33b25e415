//! Test helpers para pages-server.

#![allow(dead_code, unused_imports)]

pub mod assertions;
pub mod client;
pub mod sites;

pub use assertions::*;
pub use client::{TestClient, TestResponse};
pub use sites::{ADMIN_PREFIX, TestSites};
