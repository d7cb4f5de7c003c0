//! Chat application module for interactive conversations with the soul.
//!
//! This module provides a REPL chat interface built on top of the soulai
//! client library. It supports:
//!
//! - Streaming turns that show each faculty as soon as it answers
//! - One-shot turns for backends or proxies that cannot stream
//! - Slash commands for habits, learnings, and configuration
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Conversation ownership and turn driving
//! - [`commands`]: Slash command parsing
//! - [`render`]: Terminal output for snapshots

mod commands;
mod config;
mod render;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use render::{PlainTextRenderer, Renderer, render_progress};
pub use session::{ChatSession, SessionStats};
