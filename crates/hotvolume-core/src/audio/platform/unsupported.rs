use crate::{
    AudioError, CoreResult,
    audio::{AudioBackend, Endpoint},
};

use std::panic::Location;

use error_location::ErrorLocation;

/// Backend for platforms without per-application session control.
///
/// Enumeration always fails, which the registry turns into an empty snapshot.
#[derive(Debug, Default)]
pub struct UnsupportedBackend;

impl AudioBackend for UnsupportedBackend {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    #[track_caller]
    fn enumerate(&self) -> CoreResult<Vec<Endpoint>> {
        Err(AudioError::EnumerationFailed {
            reason: format!(
                "per-application audio sessions are not available on {}",
                std::env::consts::OS
            ),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
