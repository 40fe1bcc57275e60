//! # Tether Core
//!
//! Core traits, types, and errors for Tether's connector activity log.
//!
//! This crate defines the envelope connectors use to report what they are
//! doing, and the capability the activity log consumes to listen to them.
//!
//! ## Key Traits
//!
//! - [`Connector`]: anything that accepts and removes activity handlers
//!
//! ## Key Types
//!
//! - [`ActivityEvent`]: one immutable diagnostic record
//! - [`ConnectorId`]: opaque connector identity
//! - [`ActivityEmitter`]: handler list for connector implementations
//! - [`SimulatedConnector`]: in-memory connector for testing

pub mod connector;
pub mod emitter;
pub mod error;
pub mod event;
pub mod identity;
pub mod mock_connector;

// Re-export main types
pub use connector::*;
pub use emitter::*;
pub use error::*;
pub use event::*;
pub use identity::*;
pub use mock_connector::*;
