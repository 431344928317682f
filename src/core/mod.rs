// src/core/mod.rs
pub mod config;
pub mod debounce;
pub mod error;
pub mod host;
pub mod injector;
pub mod redirector;
pub mod registry;
pub mod rewrite;
pub mod service_info;
