#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session outcome resolution for Horde Defence.
//!
//! The monitor watches the event stream and the battlefield views to decide
//! when a session ends. Defeat follows the configured lose condition and
//! always wins ties; victory is deferred until the final wave completed and
//! the field has stayed clear of living enemies for the configured grace
//! delay, at which point the star rating is the number of towers still
//! standing.

use std::time::Duration;

use horde_defence_core::{EnemyView, Event, LoseCondition, TowerView};

/// Terminal result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The session was won with the given star rating.
    Victory {
        /// Stars awarded; equals the number of surviving towers.
        stars: u32,
    },
    /// The session was lost.
    Defeat,
}

/// Pure system deciding whether a session has been won or lost.
#[derive(Debug)]
pub struct OutcomeMonitor {
    lose_condition: LoseCondition,
    victory_delay: Duration,
    waves_finished: bool,
    /// Time the field has stayed clear since the final wave completed.
    clear_for: Duration,
    decided: Option<Outcome>,
}

impl OutcomeMonitor {
    /// Creates a monitor enforcing the provided lose condition. Victory is
    /// announced only after the field has stayed clear for `victory_delay`
    /// past the final wave.
    #[must_use]
    pub fn new(lose_condition: LoseCondition, victory_delay: Duration) -> Self {
        Self {
            lose_condition,
            victory_delay,
            waves_finished: false,
            clear_for: Duration::ZERO,
            decided: None,
        }
    }

    /// Terminal outcome, once one has been reached.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.decided
    }

    /// Consumes events and the battlefield views, announcing the session
    /// outcome exactly once.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        towers: &TowerView,
        out_events: &mut Vec<Event>,
    ) {
        if self.decided.is_some() {
            return;
        }
        let mut dt = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt: step } => dt = dt.saturating_add(*step),
                Event::WavesFinished => self.waves_finished = true,
                _ => {}
            }
        }

        if self.is_lost(towers) {
            self.decided = Some(Outcome::Defeat);
            out_events.push(Event::Defeat);
            return;
        }

        if self.waves_finished && enemies.alive_count() == 0 {
            self.clear_for = self.clear_for.saturating_add(dt);
            if self.clear_for >= self.victory_delay {
                let stars = towers.standing_count() as u32;
                self.decided = Some(Outcome::Victory { stars });
                out_events.push(Event::Victory { stars });
            }
        } else {
            self.clear_for = Duration::ZERO;
        }
    }

    fn is_lost(&self, towers: &TowerView) -> bool {
        let total = towers.iter().count();
        if total == 0 {
            return false;
        }
        match self.lose_condition {
            LoseCondition::AnyTowerDestroyed => towers.standing_count() < total,
            LoseCondition::AllTowersDestroyed => towers.standing_count() == 0,
        }
    }
}
