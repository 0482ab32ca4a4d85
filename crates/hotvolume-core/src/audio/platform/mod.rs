#[cfg(target_os = "windows")]
mod wasapi;

#[cfg(not(target_os = "windows"))]
mod unsupported;

#[cfg(target_os = "windows")]
pub use wasapi::WindowsAudioBackend;

#[cfg(not(target_os = "windows"))]
pub use unsupported::UnsupportedBackend;

use crate::audio::AudioBackend;

/// Audio backend for the host platform.
pub fn create_backend() -> Box<dyn AudioBackend> {
    #[cfg(target_os = "windows")]
    return Box::new(WindowsAudioBackend::new());

    #[cfg(not(target_os = "windows"))]
    return Box::new(UnsupportedBackend);
}
