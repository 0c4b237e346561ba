pub mod archive;
pub mod book;
pub mod client;
pub mod config;
pub mod fallback;
pub mod normalize;
pub mod project;
pub mod prompts;
pub mod service;
pub mod store;
