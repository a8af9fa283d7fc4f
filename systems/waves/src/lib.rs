#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduling for Horde Defence sessions.
//!
//! The scheduler owns the wave/intermission state machine. It consumes the
//! world's event stream, advances on [`Event::TimeAdvanced`], and announces
//! transitions through [`Event::WaveStarted`], [`Event::IntermissionStarted`],
//! and [`Event::WavesFinished`]. It never mutates the world directly.

use std::time::Duration;

use horde_defence_core::{EnemyView, Event, WaveDefinition, WavePlan};

#[derive(Clone, Debug)]
enum Phase {
    /// Session created but not started yet.
    Idle,
    /// Pause between two waves.
    Intermission {
        next_wave: usize,
        remaining: Duration,
    },
    /// A wave is running.
    Wave {
        index: usize,
        elapsed: Duration,
        /// Wave-relative instant the field was last observed clear, used to
        /// arm the early-clear grace delay.
        clear_since: Option<Duration>,
        /// At least one enemy spawned during this wave; early clear never
        /// fires before the first spawn.
        spawn_seen: bool,
    },
    /// The final wave completed.
    Finished,
}

/// Handle onto the currently running wave exposed to collaborating systems.
#[derive(Clone, Copy, Debug)]
pub struct ActiveWave<'a> {
    number: u32,
    definition: &'a WaveDefinition,
    elapsed: Duration,
}

impl<'a> ActiveWave<'a> {
    /// One-based number of the running wave.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Definition of the running wave.
    #[must_use]
    pub const fn definition(&self) -> &'a WaveDefinition {
        self.definition
    }

    /// Time elapsed within the wave.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Progress through the wave, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        let duration = self.definition.duration.as_secs_f32();
        if duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / duration).clamp(0.0, 1.0)
    }

    /// Whether the wave is inside its final second, the window during which
    /// a configured boss may spawn.
    #[must_use]
    pub fn in_final_second(&self) -> bool {
        let duration = self.definition.duration;
        duration.saturating_sub(self.elapsed) <= Duration::from_secs(1)
    }
}

/// Pure system driving the wave/intermission state machine of a session.
#[derive(Debug)]
pub struct WaveScheduler {
    plan: WavePlan,
    phase: Phase,
}

impl WaveScheduler {
    /// Creates a scheduler for the provided plan, initially idle.
    #[must_use]
    pub fn new(plan: WavePlan) -> Self {
        Self {
            plan,
            phase: Phase::Idle,
        }
    }

    /// Plan driving this scheduler.
    #[must_use]
    pub fn plan(&self) -> &WavePlan {
        &self.plan
    }

    /// Number of waves in the plan.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        self.plan.waves.len() as u32
    }

    /// Returns the scheduler to its idle state; a subsequent [`start`]
    /// begins again from the first wave.
    ///
    /// [`start`]: WaveScheduler::start
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Begins the session by activating the first wave. Starting an empty
    /// plan finishes immediately.
    pub fn start(&mut self, out_events: &mut Vec<Event>) {
        if !matches!(self.phase, Phase::Idle) {
            return;
        }
        if self.plan.waves.is_empty() {
            self.phase = Phase::Finished;
            out_events.push(Event::WavesFinished);
        } else {
            self.begin_wave(0, out_events);
        }
    }

    /// Consumes events and the current enemy view to advance the state
    /// machine, announcing every transition it performs.
    pub fn handle(&mut self, events: &[Event], enemies: &EnemyView, out_events: &mut Vec<Event>) {
        let mut accumulated = Duration::ZERO;
        let mut spawned = false;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                Event::EnemySpawned { .. } => spawned = true,
                _ => {}
            }
        }
        if spawned {
            if let Phase::Wave { spawn_seen, .. } = &mut self.phase {
                *spawn_seen = true;
            }
        }

        let mut remaining_dt = accumulated;
        loop {
            match &mut self.phase {
                Phase::Idle | Phase::Finished => return,
                Phase::Intermission {
                    next_wave,
                    remaining,
                } => {
                    if remaining_dt < *remaining {
                        *remaining -= remaining_dt;
                        return;
                    }
                    remaining_dt -= *remaining;
                    let next = *next_wave;
                    self.begin_wave(next, out_events);
                }
                Phase::Wave { index, elapsed, .. } => {
                    let duration = self.plan.waves[*index].duration;
                    let left = duration.saturating_sub(*elapsed);
                    if remaining_dt < left {
                        *elapsed += remaining_dt;
                        break;
                    }
                    remaining_dt -= left;
                    let completed = *index;
                    self.complete_wave(completed, out_events);
                }
            }
        }

        self.check_early_clear(enemies, out_events);
    }

    /// Handle onto the running wave, if one is active.
    #[must_use]
    pub fn active(&self) -> Option<ActiveWave<'_>> {
        match &self.phase {
            Phase::Wave { index, elapsed, .. } => Some(ActiveWave {
                number: *index as u32 + 1,
                definition: &self.plan.waves[*index],
                elapsed: *elapsed,
            }),
            _ => None,
        }
    }

    /// Whether the scheduler sits in the pause between two waves.
    #[must_use]
    pub fn is_intermission(&self) -> bool {
        matches!(self.phase, Phase::Intermission { .. })
    }

    /// Whether every wave in the plan has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Time left in the running wave or intermission.
    #[must_use]
    pub fn time_remaining(&self) -> Option<Duration> {
        match &self.phase {
            Phase::Wave { index, elapsed, .. } => {
                Some(self.plan.waves[*index].duration.saturating_sub(*elapsed))
            }
            Phase::Intermission { remaining, .. } => Some(*remaining),
            Phase::Idle | Phase::Finished => None,
        }
    }

    fn begin_wave(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let definition = &self.plan.waves[index];
        out_events.push(Event::WaveStarted {
            wave: index as u32 + 1,
            kinds: definition.allowed_kinds(),
        });
        self.phase = Phase::Wave {
            index,
            elapsed: Duration::ZERO,
            clear_since: None,
            spawn_seen: false,
        };
    }

    fn complete_wave(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let next = index + 1;
        if next >= self.plan.waves.len() {
            self.phase = Phase::Finished;
            out_events.push(Event::WavesFinished);
            return;
        }
        out_events.push(Event::IntermissionStarted {
            completed_wave: index as u32 + 1,
        });
        if self.plan.time_between_waves.is_zero() {
            self.begin_wave(next, out_events);
        } else {
            self.phase = Phase::Intermission {
                next_wave: next,
                remaining: self.plan.time_between_waves,
            };
        }
    }

    fn check_early_clear(&mut self, enemies: &EnemyView, out_events: &mut Vec<Event>) {
        let Phase::Wave {
            index,
            elapsed,
            clear_since,
            spawn_seen,
        } = &mut self.phase
        else {
            return;
        };
        let clear_delay = self.plan.waves[*index].clear_delay;
        if clear_delay.is_zero() || !*spawn_seen {
            return;
        }
        if enemies.alive_count() > 0 {
            *clear_since = None;
            return;
        }
        let since = *clear_since.get_or_insert(*elapsed);
        if elapsed.saturating_sub(since) >= clear_delay {
            let completed = *index;
            self.complete_wave(completed, out_events);
        }
    }
}
