use std::time::Instant;

/// A source of time for measuring draw costs.
pub trait FrameClock {
    /// The elapsed time, in milliseconds, since an arbitrary but fixed origin.
    fn now_ms(&self) -> f64;
}

/// A [`FrameClock`] backed by [`Instant`].
#[derive(Copy, Clone, Debug)]
pub struct InstantClock {
    origin: Instant,
}

impl Default for InstantClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl FrameClock for InstantClock {
    #[inline]
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}
