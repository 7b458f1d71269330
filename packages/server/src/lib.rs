// #FahanieCares member registry - API Core
//
// This crate owns registrant records, their lifecycle status and the
// member identifiers derived from sector and status.

pub mod common;
pub mod config;
pub mod data_migrations;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
