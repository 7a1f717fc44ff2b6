pub mod api;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod server;
pub mod source;
