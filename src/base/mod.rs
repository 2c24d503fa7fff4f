//! Core components, types, and utilities for release-relay.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - The release, repository, and chat message data model.
//! - Markdown to Slack `mrkdwn` conversion.

pub mod config;
pub mod markdown;
pub mod types;
