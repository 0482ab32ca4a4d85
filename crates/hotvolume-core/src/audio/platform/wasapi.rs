//! WASAPI session backend.
//!
//! Enumerates the audio sessions of the default render device and exposes
//! each session's `ISimpleAudioVolume` as an endpoint control.

use crate::{
    AppIdentity, AudioError, CoreResult,
    audio::{AudioBackend, Endpoint, EndpointControl, ProcessInfo},
};

use std::{cell::Cell, panic::Location, ptr};

use error_location::ErrorLocation;
use tracing::{debug, instrument, trace};
use windows::{
    Win32::{
        Foundation::{CloseHandle, ERROR_INSUFFICIENT_BUFFER, MAX_PATH, RPC_E_CHANGED_MODE},
        Media::Audio::{
            AudioSessionStateExpired, IAudioSessionControl2, IAudioSessionManager2,
            IMMDeviceEnumerator, ISimpleAudioVolume, MMDeviceEnumerator, eConsole, eRender,
        },
        System::{
            Com::{CLSCTX_ALL, COINIT_MULTITHREADED, CoCreateInstance, CoInitializeEx},
            Threading::{
                OpenProcess, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
                QueryFullProcessImageNameW,
            },
        },
    },
    core::{Interface, PWSTR},
};

/// Longest extended-length path Windows reports, in UTF-16 units.
const MAX_IMAGE_PATH: usize = 32_768;

thread_local! {
    static COM_READY: Cell<bool> = const { Cell::new(false) };
}

/// Audio backend backed by the Windows audio session API.
#[derive(Debug, Default)]
pub struct WindowsAudioBackend;

impl WindowsAudioBackend {
    /// Create the backend. COM is initialised lazily per calling thread.
    pub fn new() -> Self {
        Self
    }
}

impl AudioBackend for WindowsAudioBackend {
    fn name(&self) -> &'static str {
        "wasapi"
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn enumerate(&self) -> CoreResult<Vec<Endpoint>> {
        ensure_com()?;

        // SAFETY: COM is initialised on this thread and every interface is
        // used only through the windows crate's reference-counted wrappers.
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                    .map_err(|e| enumeration_error("create device enumerator", e))?;

            let device = enumerator
                .GetDefaultAudioEndpoint(eRender, eConsole)
                .map_err(|e| enumeration_error("get default render device", e))?;

            let manager: IAudioSessionManager2 = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| enumeration_error("activate session manager", e))?;

            let sessions = manager
                .GetSessionEnumerator()
                .map_err(|e| enumeration_error("get session enumerator", e))?;

            let count = sessions
                .GetCount()
                .map_err(|e| enumeration_error("count sessions", e))?;

            let mut endpoints = Vec::with_capacity(usize::try_from(count).unwrap_or(0));

            for index in 0..count {
                let Ok(session) = sessions.GetSession(index) else {
                    continue;
                };

                if session
                    .GetState()
                    .is_ok_and(|state| state == AudioSessionStateExpired)
                {
                    continue;
                }

                let Ok(session2) = session.cast::<IAudioSessionControl2>() else {
                    continue;
                };

                // pid 0 is the system sounds session.
                let pid = session2.GetProcessId().unwrap_or(0);
                if pid == 0 {
                    continue;
                }

                let Some(name) = process_image_name(pid) else {
                    debug!(pid, "Skipping session whose process image is not readable");
                    continue;
                };

                let Ok(volume) = session.cast::<ISimpleAudioVolume>() else {
                    continue;
                };

                trace!(pid, process = %name, "Found audio session");

                endpoints.push(Endpoint::new(
                    ProcessInfo {
                        name: name.clone(),
                        pid,
                    },
                    SessionVolume { volume, name, pid },
                ));
            }

            debug!(endpoint_count = endpoints.len(), "Audio sessions enumerated");

            Ok(endpoints)
        }
    }
}

/// `ISimpleAudioVolume` of one session.
struct SessionVolume {
    volume: ISimpleAudioVolume,
    name: String,
    pid: u32,
}

// SAFETY: audio session interfaces are free-threaded and every thread that
// touches them joins the multi-threaded apartment through `ensure_com`.
unsafe impl Send for SessionVolume {}
// SAFETY: see `Send`; the interface performs its own synchronisation.
unsafe impl Sync for SessionVolume {}

impl SessionVolume {
    #[track_caller]
    fn control_error(&self, error: windows::core::Error) -> AudioError {
        AudioError::EndpointControl {
            process: self.name.clone(),
            pid: self.pid,
            reason: error.message(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl EndpointControl for SessionVolume {
    fn volume(&self) -> CoreResult<f32> {
        ensure_com()?;
        // SAFETY: valid interface, COM initialised on this thread.
        unsafe { self.volume.GetMasterVolume() }.map_err(|e| self.control_error(e))
    }

    fn set_volume(&self, level: f32) -> CoreResult<()> {
        ensure_com()?;
        // SAFETY: valid interface, null event context is permitted.
        unsafe { self.volume.SetMasterVolume(level, ptr::null()) }
            .map_err(|e| self.control_error(e))
    }

    fn is_muted(&self) -> CoreResult<bool> {
        ensure_com()?;
        // SAFETY: valid interface, COM initialised on this thread.
        unsafe { self.volume.GetMute() }
            .map(|muted| muted.as_bool())
            .map_err(|e| self.control_error(e))
    }

    fn set_mute(&self, muted: bool) -> CoreResult<()> {
        ensure_com()?;
        // SAFETY: valid interface, null event context is permitted.
        unsafe { self.volume.SetMute(muted, ptr::null()) }.map_err(|e| self.control_error(e))
    }
}

/// Join the multi-threaded apartment once per thread.
///
/// A thread already in a single-threaded apartment (the tray's UI thread)
/// reports `RPC_E_CHANGED_MODE`, which is fine for free-threaded interfaces.
#[track_caller]
fn ensure_com() -> CoreResult<()> {
    if COM_READY.with(Cell::get) {
        return Ok(());
    }

    // SAFETY: plain COM initialisation with no reserved pointer.
    let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
    if hr.is_err() && hr != RPC_E_CHANGED_MODE {
        return Err(AudioError::EnumerationFailed {
            reason: format!("COM initialisation failed: {}", hr.message()),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    COM_READY.with(|ready| ready.set(true));
    Ok(())
}

#[track_caller]
fn enumeration_error(step: &str, error: windows::core::Error) -> AudioError {
    AudioError::EnumerationFailed {
        reason: format!("Failed to {}: {}", step, error.message()),
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Executable file name of a process, e.g. `Spotify.exe`.
fn process_image_name(pid: u32) -> Option<String> {
    let full_path = process_image_path(pid)?;
    let name = AppIdentity::executable_name(&full_path);
    (!name.is_empty()).then(|| name.to_string())
}

/// Full image path of a process. Grows the buffer for paths beyond `MAX_PATH`.
fn process_image_path(pid: u32) -> Option<String> {
    // SAFETY: the handle is closed on every path after the queries.
    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
        let mut capacity = MAX_PATH as usize;

        let path = loop {
            let mut buffer = vec![0u16; capacity];
            let mut size = capacity as u32;

            match QueryFullProcessImageNameW(
                handle,
                PROCESS_NAME_WIN32,
                PWSTR(buffer.as_mut_ptr()),
                &mut size,
            ) {
                Ok(()) => break Some(String::from_utf16_lossy(&buffer[..size as usize])),
                Err(e)
                    if e.code() == ERROR_INSUFFICIENT_BUFFER.to_hresult()
                        && capacity < MAX_IMAGE_PATH =>
                {
                    capacity = (capacity * 2).min(MAX_IMAGE_PATH);
                }
                Err(e) => {
                    trace!(pid, error = %e.message(), "Process image path query failed");
                    break None;
                }
            }
        };

        let _ = CloseHandle(handle);
        path
    }
}
