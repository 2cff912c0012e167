//! Injectable blocking delay

use std::time::Duration;

/// Blocks the caller for a duration.
///
/// The ingestion loop sleeps for rate pacing and retry backoff only through
/// this trait, so tests can substitute a recording no-op.
pub trait Delay {
    fn delay(&self, duration: Duration);
}

impl<D: Delay + ?Sized> Delay for &D {
    fn delay(&self, duration: Duration) {
        (**self).delay(duration);
    }
}

/// Wall-clock delay via `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
