//! Image representation: formats, aspect ratios and data URIs.

mod data_uri;
mod types;

pub use data_uri::DataUri;
pub use types::{AspectRatio, ImageFormat};
