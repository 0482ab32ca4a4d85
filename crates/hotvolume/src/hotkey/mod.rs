mod dispatcher;
mod engine;
mod hook;

pub(crate) use {
    dispatcher::{DispatchOutcome, Dispatcher},
    engine::DispatchEngine,
    hook::{GlobalHotkeyHook, HotkeyHook},
};

#[cfg(test)]
pub(crate) use hook::PressRouter;
