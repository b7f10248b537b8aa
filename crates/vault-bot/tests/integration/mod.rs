//! Integration tests for vault-bot.
//!
//! These tests verify the interaction between components:
//! - Log tailing into decoding
//! - Classification and cooldowns
//! - Delivery to a sink

pub mod common;
