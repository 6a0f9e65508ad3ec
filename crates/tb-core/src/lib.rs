//! tb-core: Client core for the toxicblend geometry service
//!
//! This crate owns the connection to the geometry server ([`Session`]), the
//! translation between host meshes and wire records ([`adapter`]), and the
//! configuration and error types shared by host integrations.
//!
//! A typical exchange:
//!
//! ```no_run
//! use tb_core::config::ClientConfig;
//! use tb_core::operators::MedianAxis;
//! use tb_core::{with_session, HostMesh};
//!
//! # fn run(active: &HostMesh) -> Result<(), tb_core::ToxicblendError> {
//! let objects = with_session(&ClientConfig::default(), |c| {
//!     c.execute(&MedianAxis::default(), Some(active))
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod communicator;
pub mod config;
pub mod error;
pub mod operators;
pub mod session;
pub mod types;

pub use communicator::{with_session, Communicator};
pub use error::ToxicblendError;
pub use session::{Session, SessionState};
pub use types::{HostMesh, UnitSettings, UnitSystem};
