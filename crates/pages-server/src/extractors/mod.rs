//! Request extractors for content routes.

pub mod path;
pub mod query;

pub use path::RequestPath;
pub use query::{ContentQuery, VanityMarker};
