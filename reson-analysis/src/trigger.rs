//! Dwell-confirmed two-threshold trigger
//!
//! Turns a noisy per-tick level into clean `Active` / `Inactive` transitions:
//! 1. An inactive band counts consecutive ticks at or above the enter
//!    threshold and switches to `Active` once the count reaches the dwell.
//! 2. An active band counts consecutive ticks at or below the exit
//!    threshold and switches to `Inactive` once the count reaches the dwell.
//! 3. A tick that breaks the condition resets the count to zero.
//!
//! Levels between the two thresholds never start a transition in either
//! direction.

use std::time::Duration;

use crate::band::BandConfig;

/// Logical state of a band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BandActivity {
    #[default]
    Inactive,
    Active,
}

impl BandActivity {
    pub fn is_active(self) -> bool {
        self == BandActivity::Active
    }
}

/// Snapshot of a band's trigger state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandState {
    pub activity: BandActivity,
    /// Ticks spent in the current activity (the transition tick included)
    pub held_ticks: u64,
    /// Sum of the tick durations supplied while in the current activity
    pub held_for: Duration,
    /// Consecutive ticks the condition for leaving the current activity has held
    pub pending_ticks: u32,
    /// Last level observed, `None` before the first tick
    pub last_db: Option<f32>,
}

/// Per-band hysteresis state machine
#[derive(Debug, Clone)]
pub struct HysteresisTrigger {
    enter_db: f32,
    exit_db: f32,
    min_dwell_ticks: u32,
    state: BandState,
}

impl HysteresisTrigger {
    /// Trigger using the thresholds and dwell of `band`
    pub fn new(band: &BandConfig) -> Self {
        Self {
            enter_db: band.enter_db(),
            exit_db: band.exit_db(),
            min_dwell_ticks: band.min_dwell_ticks(),
            state: BandState::default(),
        }
    }

    pub fn state(&self) -> &BandState {
        &self.state
    }

    pub fn activity(&self) -> BandActivity {
        self.state.activity
    }

    /// Feed one tick's level
    ///
    /// Returns the new activity when this tick confirms a transition.
    pub fn advance(&mut self, level_db: f32, dt: Option<Duration>) -> Option<BandActivity> {
        let state = &mut self.state;
        state.last_db = Some(level_db);

        let (leaving, target) = match state.activity {
            BandActivity::Inactive => (level_db >= self.enter_db, BandActivity::Active),
            BandActivity::Active => (level_db <= self.exit_db, BandActivity::Inactive),
        };

        if leaving {
            state.pending_ticks += 1;
        } else {
            state.pending_ticks = 0;
        }

        if state.pending_ticks >= self.min_dwell_ticks {
            state.activity = target;
            state.pending_ticks = 0;
            state.held_ticks = 1;
            state.held_for = dt.unwrap_or_default();
            Some(target)
        } else {
            state.held_ticks += 1;
            state.held_for = state.held_for.saturating_add(dt.unwrap_or_default());
            None
        }
    }

    /// Return to the initial inactive state
    pub fn reset(&mut self) {
        self.state = BandState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(enter_db: f32, exit_db: f32, dwell: u32) -> HysteresisTrigger {
        let band = BandConfig::new("test", 80.0, 200.0, enter_db, exit_db, dwell).unwrap();
        HysteresisTrigger::new(&band)
    }

    /// Feed a level sequence and collect (1-based tick, activity) transitions
    fn run(trigger: &mut HysteresisTrigger, levels: &[f32]) -> Vec<(usize, BandActivity)> {
        levels
            .iter()
            .enumerate()
            .filter_map(|(i, &db)| trigger.advance(db, None).map(|a| (i + 1, a)))
            .collect()
    }

    #[test]
    fn test_starts_inactive() {
        let trigger = trigger(-20.0, -30.0, 1);
        assert_eq!(trigger.activity(), BandActivity::Inactive);
        assert_eq!(trigger.state().last_db, None);
    }

    #[test]
    fn test_reference_sequence() {
        let mut trigger = trigger(-20.0, -30.0, 2);
        let events = run(
            &mut trigger,
            &[-40.0, -40.0, -15.0, -15.0, -15.0, -35.0, -35.0],
        );
        assert_eq!(
            events,
            vec![(4, BandActivity::Active), (7, BandActivity::Inactive)]
        );
    }

    #[test]
    fn test_stable_between_thresholds() {
        for start_active in [false, true] {
            let mut trigger = trigger(-20.0, -30.0, 1);
            if start_active {
                assert_eq!(trigger.advance(-10.0, None), Some(BandActivity::Active));
            }
            let before = trigger.activity();
            let levels = vec![-25.0f32; 10_000];
            assert!(run(&mut trigger, &levels).is_empty());
            assert_eq!(trigger.activity(), before);
        }
    }

    #[test]
    fn test_no_chatter_around_enter_threshold() {
        let mut trigger = trigger(-20.0, -30.0, 1);
        let levels: Vec<f32> = (0..200)
            .map(|i| if i % 2 == 0 { -19.0 } else { -21.0 })
            .collect();
        let events = run(&mut trigger, &levels);
        assert_eq!(events, vec![(1, BandActivity::Active)]);
    }

    #[test]
    fn test_dwell_requires_consecutive_ticks() {
        let mut trigger = trigger(-20.0, -30.0, 3);
        let events = run(&mut trigger, &[-10.0, -10.0, -40.0, -40.0, -40.0]);
        assert!(events.is_empty());
        assert_eq!(trigger.state().pending_ticks, 0);
    }

    #[test]
    fn test_interrupted_run_gets_no_partial_credit() {
        let mut trigger = trigger(-20.0, -30.0, 3);
        // Two above, one below, then three above: only the last run counts
        let events = run(&mut trigger, &[-10.0, -10.0, -25.0, -10.0, -10.0, -10.0]);
        assert_eq!(events, vec![(6, BandActivity::Active)]);
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let mut trigger = trigger(-20.0, -30.0, 1);
        assert_eq!(trigger.advance(-20.0, None), Some(BandActivity::Active));
        assert_eq!(trigger.advance(-30.0, None), Some(BandActivity::Inactive));
    }

    #[test]
    fn test_held_counters() {
        let mut trigger = trigger(-20.0, -30.0, 2);
        let tick = Some(Duration::from_millis(10));
        trigger.advance(-40.0, tick);
        trigger.advance(-10.0, tick);
        assert_eq!(trigger.state().held_ticks, 2);
        assert_eq!(trigger.state().pending_ticks, 1);

        assert_eq!(trigger.advance(-10.0, tick), Some(BandActivity::Active));
        assert_eq!(trigger.state().held_ticks, 1);
        assert_eq!(trigger.state().held_for, Duration::from_millis(10));

        trigger.advance(-25.0, tick);
        assert_eq!(trigger.state().held_ticks, 2);
        assert_eq!(trigger.state().held_for, Duration::from_millis(20));
        assert_eq!(trigger.state().last_db, Some(-25.0));
    }

    #[test]
    fn test_held_for_saturates() {
        let mut trigger = trigger(-20.0, -30.0, 1);
        trigger.advance(-40.0, Some(Duration::MAX));
        trigger.advance(-40.0, Some(Duration::MAX));
        assert_eq!(trigger.state().held_for, Duration::MAX);
        assert_eq!(trigger.state().held_ticks, 2);
    }

    #[test]
    fn test_reset() {
        let mut trigger = trigger(-20.0, -30.0, 1);
        trigger.advance(0.0, None);
        assert!(trigger.activity().is_active());
        trigger.reset();
        assert_eq!(*trigger.state(), BandState::default());
    }
}
