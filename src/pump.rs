//! Scroll event coalescing.

/// Current state of the pump.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpState {
    /// No recomputation scheduled
    Idle,
    /// One recomputation is scheduled for the next display refresh
    Pending,
    /// Torn down; scroll events are ignored
    Stopped,
}

/// Coalesces bursts of scroll events into one recomputation per display
/// refresh.
///
/// The pump does not schedule anything itself. The host calls
/// [`on_scroll`](Self::on_scroll) from its (passive) scroll listener and
/// requests an animation frame whenever it returns `true`; the animation-frame
/// callback calls [`begin_tick`](Self::begin_tick) and recomputes only when it
/// returns `true`.
///
/// ## Example
///
/// ```rust
/// use scrollscrub_core::ScrollPump;
///
/// let mut pump = ScrollPump::new();
/// assert!(pump.on_scroll());  // schedule a frame
/// assert!(!pump.on_scroll()); // already pending, coalesced
/// assert!(pump.begin_tick()); // recompute once
/// assert!(pump.on_scroll());  // next burst schedules again
/// ```
#[derive(Clone, Debug)]
pub struct ScrollPump {
    state: PumpState,
    /// Scroll events absorbed by an already pending tick
    coalesced: u64,
    /// Ticks actually run
    ticks: u64,
}

impl Default for ScrollPump {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollPump {
    pub fn new() -> Self {
        Self {
            state: PumpState::Idle,
            coalesced: 0,
            ticks: 0,
        }
    }

    /// Record a scroll event.
    ///
    /// Returns `true` when the caller must schedule an animation frame.
    pub fn on_scroll(&mut self) -> bool {
        match self.state {
            PumpState::Idle => {
                self.state = PumpState::Pending;
                true
            }
            PumpState::Pending => {
                self.coalesced += 1;
                false
            }
            PumpState::Stopped => false,
        }
    }

    /// Consume the pending tick.
    ///
    /// Returns `false` when no tick was pending (cancelled or stopped), in
    /// which case the callback should do nothing.
    pub fn begin_tick(&mut self) -> bool {
        if self.state != PumpState::Pending {
            return false;
        }
        self.state = PumpState::Idle;
        self.ticks += 1;
        true
    }

    /// Drop a pending tick without running it.
    pub fn cancel(&mut self) {
        if self.state == PumpState::Pending {
            self.state = PumpState::Idle;
        }
    }

    /// Stop for good; used on teardown.
    pub fn stop(&mut self) {
        self.state = PumpState::Stopped;
    }

    #[inline]
    pub fn state(&self) -> PumpState {
        self.state
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state == PumpState::Pending
    }

    /// Number of scroll events absorbed into an already scheduled tick.
    #[inline]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Number of ticks run.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bursts_collapse_to_one_tick() {
        let mut pump = ScrollPump::new();
        let scheduled = (0..50).filter(|_| pump.on_scroll()).count();
        assert_eq!(scheduled, 1);
        assert_eq!(pump.coalesced(), 49);

        assert!(pump.begin_tick());
        assert!(!pump.begin_tick());
        assert_eq!(pump.ticks(), 1);
        assert_eq!(pump.state(), PumpState::Idle);
    }

    #[test]
    fn cancelled_tick_does_nothing() {
        let mut pump = ScrollPump::new();
        pump.on_scroll();
        pump.cancel();
        assert!(!pump.is_pending());
        assert!(!pump.begin_tick());
        assert!(pump.on_scroll());
    }

    #[test]
    fn stopped_pump_ignores_everything() {
        let mut pump = ScrollPump::new();
        pump.on_scroll();
        pump.stop();
        assert!(!pump.begin_tick());
        assert!(!pump.on_scroll());
        pump.cancel();
        assert_eq!(pump.state(), PumpState::Stopped);
    }
}
