//! Core module - Configuration, events, and shared state types

pub mod config;
pub mod events;
pub mod state;
