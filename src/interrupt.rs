use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Exit code used when the run is interrupted
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

#[derive(Clone, Debug, Default)]
pub struct InterruptState {
    interrupted: Arc<AtomicBool>,
}

impl InterruptState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_interrupted(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

/// Install the Ctrl-C handler: record the interrupt and leave silently
///
/// In-flight child commands receive the same signal from the terminal.
pub fn set_up_process_interrupt_handler() -> anyhow::Result<InterruptState> {
    let state = InterruptState::new();
    let handler_state = state.clone();
    ctrlc::set_handler(move || {
        handler_state.set_interrupted();
        std::process::exit(i32::from(INTERRUPTED_EXIT_CODE));
    })?;
    Ok(state)
}
