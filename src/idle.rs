//! Idle strategies for the cooperative receive loop.
//!
//! When a receive attempt finds no complete frame, the cooperative variant
//! invokes the configured strategy before retrying. On a cooperative
//! scheduler use [`IdleStrategy::Sleep`] with a short duration (10ms works
//! well) so other tasks keep running; `BusySpin` trades a core for latency.

use std::hint;
use std::time::Duration;

#[derive(Debug, Copy, Clone)]
pub enum IdleStrategy {
    NoOp,
    BusySpin,
    /// Yields the current thread back to the scheduler.
    Yield,
    Sleep(Duration),
}

impl IdleStrategy {
    #[inline]
    pub fn idle(&self, work_count: usize) {
        if work_count > 0 {
            return;
        }
        match *self {
            IdleStrategy::NoOp => {}
            IdleStrategy::BusySpin => hint::spin_loop(),
            IdleStrategy::Yield => std::thread::yield_now(),
            IdleStrategy::Sleep(duration) => std::thread::sleep(duration),
        }
    }
}
