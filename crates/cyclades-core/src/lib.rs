//! # cyclades-core
//!
//! Core types and utilities for talking to the Cyclades compute API.
//!
//! This crate provides the error taxonomy, configuration, typed resource ids and
//! the authenticated HTTP dispatcher shared by the Cyclades client crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types for transport and HTTP status failures
//! - [`ids`] - Strongly-typed ids for servers, images and flavors
//! - [`config`] - Configuration structures for Cyclades clients
//! - [`client`] - HTTP dispatcher that issues one authenticated request per call

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod ids;

// Re-export commonly used types
pub use error::{Error, Result};
