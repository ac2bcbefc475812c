//! Request extractors mapping rejections into [`crate::error::ApiError`].

mod json;
mod path_id;

pub use json::{JsonBody, ValidatedJson};
pub use path_id::{PathId, PathKey};
