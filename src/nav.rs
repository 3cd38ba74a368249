//! Navigation state machine and input adapters.
//!
//! The navigator owns the current feed position and moves through three
//! phases: `Idle` until the first feed load, `Ready` while accepting intents,
//! and `Locked` for a cooldown window after each accepted intent. The lock is
//! a debounce, not a queue: intents arriving while locked are dropped.
//!
//! Boundary policy: clamp. Advancing past the tail or retreating past index 0
//! keeps the position (the lock still engages, so held-down input does not
//! burst through when more items arrive).

use std::time::{Duration, Instant};

use crate::action::NavDirection;

/// A discrete move-forward/backward signal derived from raw input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIntent {
    Advance,
    Retreat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NavPhase {
    Idle,
    Ready,
    Locked { until: Instant },
}

/// Owns the current position and direction over the feed sequence.
#[derive(Debug)]
pub struct Navigator {
    index: usize,
    direction: NavDirection,
    phase: NavPhase,
    cooldown: Duration,
    lookahead: usize,
}

impl Navigator {
    pub fn new(cooldown: Duration, lookahead: usize) -> Self {
        Self {
            index: 0,
            direction: NavDirection::Forward,
            phase: NavPhase::Idle,
            cooldown,
            lookahead,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn direction(&self) -> NavDirection {
        self.direction
    }

    pub fn is_ready(&self) -> bool {
        self.phase == NavPhase::Ready
    }

    /// First feed load arrived: start accepting navigation.
    pub fn ready(&mut self) {
        if self.phase == NavPhase::Idle {
            self.phase = NavPhase::Ready;
        }
    }

    /// Back to the start of a fresh discovery session.
    pub fn reset(&mut self) {
        self.index = 0;
        self.direction = NavDirection::Forward;
        self.phase = NavPhase::Idle;
    }

    /// Release the cooldown lock once it has elapsed.
    pub fn tick(&mut self, now: Instant) {
        if let NavPhase::Locked { until } = self.phase {
            if now >= until {
                self.phase = NavPhase::Ready;
            }
        }
    }

    /// Apply a navigation intent against a feed of `len` items. Returns the
    /// new index when the position actually changed.
    pub fn apply(&mut self, intent: NavIntent, len: usize, now: Instant) -> Option<usize> {
        self.tick(now);
        if self.phase != NavPhase::Ready || len == 0 {
            return None;
        }

        self.phase = NavPhase::Locked {
            until: now + self.cooldown,
        };

        match intent {
            NavIntent::Advance => {
                self.direction = NavDirection::Forward;
                if self.index + 1 < len {
                    self.index += 1;
                    return Some(self.index);
                }
            }
            NavIntent::Retreat => {
                self.direction = NavDirection::Backward;
                if self.index > 0 {
                    self.index -= 1;
                    return Some(self.index);
                }
            }
        }
        None
    }

    /// True when the position is close enough to the tail that another
    /// aggregation round should be requested.
    pub fn needs_more(&self, len: usize) -> bool {
        len > 0 && len - self.index <= self.lookahead
    }
}

/// Turns raw wheel deltas into intents, requiring a minimum accumulated
/// magnitude so trackpad jitter does not navigate.
#[derive(Debug)]
pub struct WheelAdapter {
    accum: i32,
    threshold: i32,
}

impl WheelAdapter {
    pub fn new(threshold: i32) -> Self {
        Self {
            accum: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn feed(&mut self, delta: i32) -> Option<NavIntent> {
        // Direction reversal restarts the accumulation.
        if self.accum != 0 && self.accum.signum() != delta.signum() {
            self.accum = 0;
        }
        self.accum += delta;

        if self.accum >= self.threshold {
            self.accum = 0;
            Some(NavIntent::Advance)
        } else if self.accum <= -self.threshold {
            self.accum = 0;
            Some(NavIntent::Retreat)
        } else {
            None
        }
    }
}

/// Turns press/release row pairs (a vertical drag) into intents when the drop
/// exceeds the threshold. Dragging up advances, matching swipe-up-for-next.
#[derive(Debug)]
pub struct SwipeAdapter {
    origin: Option<u16>,
    threshold: u16,
}

impl SwipeAdapter {
    pub fn new(threshold: u16) -> Self {
        Self {
            origin: None,
            threshold: threshold.max(1),
        }
    }

    pub fn press(&mut self, row: u16) {
        self.origin = Some(row);
    }

    pub fn release(&mut self, row: u16) -> Option<NavIntent> {
        let origin = self.origin.take()?;
        let delta = i32::from(origin) - i32::from(row);

        if delta.unsigned_abs() < u32::from(self.threshold) {
            return None;
        }
        if delta > 0 {
            Some(NavIntent::Advance)
        } else {
            Some(NavIntent::Retreat)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_millis(700);

    fn ready_nav() -> Navigator {
        let mut nav = Navigator::new(COOLDOWN, 10);
        nav.ready();
        nav
    }

    /// Advance with the cooldown already elapsed.
    fn step(nav: &mut Navigator, intent: NavIntent, len: usize, now: &mut Instant) -> Option<usize> {
        *now += COOLDOWN;
        nav.apply(intent, len, *now)
    }

    #[test]
    fn test_idle_drops_intents() {
        let mut nav = Navigator::new(COOLDOWN, 10);
        assert_eq!(nav.apply(NavIntent::Advance, 5, Instant::now()), None);
        assert_eq!(nav.index(), 0);
    }

    #[test]
    fn test_advance_clamps_at_tail() {
        let mut nav = ready_nav();
        let mut now = Instant::now();

        for expected in 1..5 {
            assert_eq!(step(&mut nav, NavIntent::Advance, 5, &mut now), Some(expected));
        }
        // Fifth advance: clamp policy keeps the index at the last element.
        assert_eq!(step(&mut nav, NavIntent::Advance, 5, &mut now), None);
        assert_eq!(nav.index(), 4);
        assert_eq!(nav.direction(), NavDirection::Forward);
    }

    #[test]
    fn test_retreat_clamps_at_zero() {
        let mut nav = ready_nav();
        let mut now = Instant::now();

        assert_eq!(step(&mut nav, NavIntent::Retreat, 5, &mut now), None);
        assert_eq!(nav.index(), 0);
        assert_eq!(nav.direction(), NavDirection::Backward);

        assert_eq!(step(&mut nav, NavIntent::Advance, 5, &mut now), Some(1));
        assert_eq!(step(&mut nav, NavIntent::Retreat, 5, &mut now), Some(0));
        assert_eq!(step(&mut nav, NavIntent::Retreat, 5, &mut now), None);
    }

    #[test]
    fn test_locked_drops_not_queues() {
        let mut nav = ready_nav();
        let now = Instant::now();

        assert_eq!(nav.apply(NavIntent::Advance, 10, now), Some(1));

        // Burst of intents inside the cooldown window: all dropped.
        let inside = now + COOLDOWN / 2;
        for _ in 0..5 {
            assert_eq!(nav.apply(NavIntent::Advance, 10, inside), None);
        }
        assert_eq!(nav.index(), 1);

        // After the window, exactly one more is accepted.
        let after = now + COOLDOWN;
        assert_eq!(nav.apply(NavIntent::Advance, 10, after), Some(2));
    }

    #[test]
    fn test_tick_unlocks() {
        let mut nav = ready_nav();
        let now = Instant::now();
        nav.apply(NavIntent::Advance, 10, now);
        assert!(!nav.is_ready());

        nav.tick(now + COOLDOWN / 2);
        assert!(!nav.is_ready());
        nav.tick(now + COOLDOWN);
        assert!(nav.is_ready());
    }

    #[test]
    fn test_lookahead_window() {
        let mut nav = Navigator::new(COOLDOWN, 10);
        nav.ready();

        assert!(!nav.needs_more(0), "empty feed has nothing to extend");
        assert!(nav.needs_more(5), "short feed is always within lookahead");

        let mut now = Instant::now();
        for _ in 0..9 {
            step(&mut nav, NavIntent::Advance, 20, &mut now);
        }
        assert_eq!(nav.index(), 9);
        assert!(!nav.needs_more(20));

        step(&mut nav, NavIntent::Advance, 20, &mut now);
        assert!(nav.needs_more(20));
    }

    #[test]
    fn test_reset_returns_to_start() {
        let mut nav = ready_nav();
        let mut now = Instant::now();
        step(&mut nav, NavIntent::Advance, 5, &mut now);
        nav.reset();

        assert_eq!(nav.index(), 0);
        assert_eq!(nav.apply(NavIntent::Advance, 5, now), None, "idle until feed reloads");
    }

    #[test]
    fn test_wheel_threshold_rejects_jitter() {
        let mut wheel = WheelAdapter::new(3);
        assert_eq!(wheel.feed(1), None);
        assert_eq!(wheel.feed(1), None);
        assert_eq!(wheel.feed(1), Some(NavIntent::Advance));
        // Accumulator resets after emitting.
        assert_eq!(wheel.feed(1), None);

        assert_eq!(wheel.feed(-3), Some(NavIntent::Retreat));
    }

    #[test]
    fn test_wheel_direction_reversal_resets_accumulation() {
        let mut wheel = WheelAdapter::new(3);
        wheel.feed(2);
        assert_eq!(wheel.feed(-2), None);
        assert_eq!(wheel.feed(-1), Some(NavIntent::Retreat));
    }

    #[test]
    fn test_swipe_threshold() {
        let mut swipe = SwipeAdapter::new(3);

        swipe.press(10);
        assert_eq!(swipe.release(9), None, "below threshold");

        swipe.press(10);
        assert_eq!(swipe.release(6), Some(NavIntent::Advance), "drag up is next");

        swipe.press(10);
        assert_eq!(swipe.release(14), Some(NavIntent::Retreat), "drag down is previous");

        // Release without a press is ignored.
        assert_eq!(swipe.release(0), None);
    }
}
