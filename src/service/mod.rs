//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for various services used by release-relay:
//! - Chat services (e.g., Slack)
//! - Release event fan-out (e.g., in-process tokio tasks)
//! - Secret stores (e.g., the process environment)
//! - Local webhook forwarding for development
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod events;
pub mod forward;
pub mod secret;
