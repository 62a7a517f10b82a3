//! Cyclades compute client and data models.
//!
//! Provides an asynchronous client for the Cyclades compute API (virtual servers, images
//! and flavors), the request bodies it sends, and optional typed views of its responses.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{ComputeApi, CycladesClient, CycladesClientBuilder};
pub use cyclades_core::ids::{FlavorId, ImageId, ServerId};
pub use cyclades_core::Error;
pub use models::{
    decode, CreateServerRequest, Flavor, FlavorEnvelope, FlavorList, Image, ImageEnvelope,
    ImageList, NetworkAttachment, Personality, RebootRequest, RebootType, Server,
    ServerCreateOptions, ServerEnvelope, ServerList,
};

/// Convenient result alias using the shared Cyclades error type.
pub type Result<T> = cyclades_core::Result<T>;
