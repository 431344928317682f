// src/extractors/mod.rs
pub mod url;

pub use url::extract_url;
