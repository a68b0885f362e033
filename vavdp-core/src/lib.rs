//! # VAVDP Core
//!
//! VA-API driver state engine that decodes H.264 and presents frames through
//! a VDPAU device. Every VA entry point is a method on [`Driver`] returning
//! `Result<_, VaError>`; [`SharedDriver`] serialises calls from libva threads.

#![allow(dead_code)]

// ============================================================================
// VA-API Surface
// ============================================================================
pub mod va;
pub mod error;
pub mod caps;

// ============================================================================
// Object Model
// ============================================================================
pub mod heap;
pub mod objects;

// ============================================================================
// H.264 Translation
// ============================================================================
pub mod bitstream;
pub mod h264;

// ============================================================================
// Backends
// ============================================================================
pub mod backend;
pub mod vdpau;
#[cfg(feature = "x11")]
pub mod x11;
#[cfg(test)]
mod mock;

// ============================================================================
// Driver
// ============================================================================
pub mod options;
pub mod driver;
pub mod decode;
pub mod present;
pub mod unsupported;
pub mod shared;

pub use backend::{Backend, BackendError, DrawableProvider};
pub use driver::{Driver, DriverLimits};
pub use error::{status_of, VaError};
pub use heap::Handle;
pub use options::DriverOptions;
pub use shared::SharedDriver;

// ============================================================================
// Version
// ============================================================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
