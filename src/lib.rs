pub mod analysis;
pub mod auth;
pub mod config;
pub mod domain;
pub mod mail;
pub mod prompt;
pub mod report;
pub mod terminal;
