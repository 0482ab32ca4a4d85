use crate::{AppIdentity, CoreResult};

use std::fmt;

/// Volume and mute control over one audio stream.
///
/// Implementations talk to the OS on every call; values are never cached.
pub trait EndpointControl: Send + Sync {
    /// Current master volume in `[0.0, 1.0]`.
    fn volume(&self) -> CoreResult<f32>;

    /// Set master volume. Callers pass an already clamped level.
    fn set_volume(&self, level: f32) -> CoreResult<()>;

    /// Current mute flag.
    fn is_muted(&self) -> CoreResult<bool>;

    /// Set the mute flag.
    fn set_mute(&self, muted: bool) -> CoreResult<()>;
}

/// Process that owns an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Executable file name as reported by the OS (e.g. `Spotify.exe`).
    pub name: String,
    /// Process id.
    pub pid: u32,
}

/// One controllable audio stream belonging to a process.
///
/// An endpoint belongs to the snapshot it was enumerated in. Once a newer
/// snapshot exists it may point at a stream that no longer exists.
pub struct Endpoint {
    process: ProcessInfo,
    identity: AppIdentity,
    control: Box<dyn EndpointControl>,
}

impl Endpoint {
    /// Wrap a control handle for a process.
    pub fn new(process: ProcessInfo, control: impl EndpointControl + 'static) -> Self {
        let identity = AppIdentity::new(&process.name);
        Self {
            process,
            identity,
            control: Box::new(control),
        }
    }

    /// Owning process.
    pub fn process(&self) -> &ProcessInfo {
        &self.process
    }

    /// Identity this endpoint is grouped under.
    pub fn identity(&self) -> &AppIdentity {
        &self.identity
    }

    /// Live master volume.
    pub fn volume(&self) -> CoreResult<f32> {
        self.control.volume()
    }

    /// Set master volume, clamped to `[0.0, 1.0]`.
    pub fn set_volume(&self, level: f32) -> CoreResult<()> {
        self.control.set_volume(clamp_level(level))
    }

    /// Live mute flag.
    pub fn is_muted(&self) -> CoreResult<bool> {
        self.control.is_muted()
    }

    /// Set the mute flag.
    pub fn set_mute(&self, muted: bool) -> CoreResult<()> {
        self.control.set_mute(muted)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("process", &self.process)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Clamp a level into `[0.0, 1.0]`, mapping NaN to silence.
fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}
