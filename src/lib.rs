//! VineCellar - Wine Club Fulfillment Orchestrator
//!
//! This crate turns billing processor webhooks into subscription lifecycle
//! transitions and per-period shipments: bottle allocation, carrier labels
//! and delivery tracking.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
