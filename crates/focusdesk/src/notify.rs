//! Countdown-finished notifications
//!
//! Best effort only. A notifier that cannot reach its output stays quiet.

use std::io::Write;

use crate::timer::TimerMode;

pub trait Notifier {
    fn session_finished(&self, finished: TimerMode);
}

/// Rings the terminal bell
#[derive(Debug, Default, Clone, Copy)]
pub struct BellNotifier;

impl Notifier for BellNotifier {
    fn session_finished(&self, finished: TimerMode) {
        let mut out = std::io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
            tracing::debug!(mode = %finished, error = %e, "Bell failed");
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn session_finished(&self, _finished: TimerMode) {}
}

impl<N: Notifier + ?Sized> Notifier for std::rc::Rc<N> {
    fn session_finished(&self, finished: TimerMode) {
        (**self).session_finished(finished)
    }
}
