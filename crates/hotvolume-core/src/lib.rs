//! HotVolume Core Library
//!
//! Per-application audio session discovery and step-wise volume control.
//!
//! # Example
//!
//! ```no_run
//! use hotvolume_core::{AppIdentity, CoreResult, SessionRegistry, VolumeAction, volume};
//!
//! fn main() -> CoreResult<()> {
//!     let registry = SessionRegistry::with_platform_backend();
//!     registry.refresh();
//!
//!     let spotify = AppIdentity::new("Spotify.exe");
//!     let outcome = volume::apply(&registry, &spotify, VolumeAction::Decrease, 0.1)?;
//!
//!     println!("Spotify: {:?}", outcome);
//!     Ok(())
//! }
//! ```

mod audio;
mod error;
pub mod volume;

pub use {
    audio::{
        AppIdentity, AudioBackend, Endpoint, EndpointControl, FanOut, ProcessInfo,
        SessionRegistry, SessionSnapshot, create_backend,
    },
    error::AudioError,
    error::Result as CoreResult,
    volume::{ActionOutcome, VolumeAction},
};

#[cfg(any(test, feature = "memory-backend"))]
pub use audio::memory;

#[cfg(test)]
mod tests;
