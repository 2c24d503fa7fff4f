//! Inbound and outbound release handling for release-relay.
//!
//! This module provides:
//! - The GitHub webhook endpoint that filters and publishes release deliveries
//! - The Slack publisher that formats and announces releases

pub mod ingress;
pub mod release;
