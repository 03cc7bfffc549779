pub mod assemble;
pub mod bio;
pub mod components;
pub mod config;
pub mod context;
pub mod dialogue;
pub mod durations;
pub mod ending;
pub mod error_codes;
pub mod errors;
pub mod export;
pub mod filters;
pub mod geometry;
pub mod info;
pub mod resource;
pub mod scene;
pub mod schema;
pub mod script;
pub mod timeline;
