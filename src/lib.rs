//! Clint → D4Sign Contract Automation Library
//!
//! Receives deal webhooks from the Clint CRM and drives the D4Sign API to
//! create, populate and dispatch a contract for signature.
//!
//! # Modules
//!
//! - `api`: API-layer namespace.
//! - `core`: Domain namespace.
//! - `integrations`: External service namespace.
//! - `config`: Configuration management.
//! - `d4sign_client`: D4Sign API client.
//! - `deal_models`: Deal event, template mapping and D4Sign payloads.
//! - `errors`: Error handling types.
//! - `handlers`: Shared state and liveness handlers.
//! - `routes`: Router assembly.
//! - `webhook_handler`: Clint webhook handler.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and the binary
pub mod config;
pub mod d4sign_client;
pub mod deal_models;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod webhook_handler;
