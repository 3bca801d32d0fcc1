//! smartsend - Send one message to a list of recipients through Brevo
//!
//! This crate provides recipient list parsing, saved recipient lists, and a
//! paced batch sender that records a per-recipient delivery report.

pub mod app;
pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod storage;

pub use app::App;
