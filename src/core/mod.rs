pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod job;
pub mod manager;
pub mod notify;
pub mod options;
pub mod terminal;
pub mod text;
pub mod workflow;
