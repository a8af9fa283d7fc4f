#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawn pacing for Horde Defence waves.
//!
//! The spawn gate consumes the world's event stream alongside the wave
//! scheduler's state and emits [`Command::SpawnEnemy`] batches. The spawn
//! period interpolates linearly from the wave's starting cadence to its
//! ending cadence as the wave progresses, and a configured boss is released
//! exactly once during the wave's final second.

use std::time::Duration;

use horde_defence_core::{
    config::DEFAULT_SPAWN_PERIOD, Command, EnemyCatalog, EnemyKind, Event, WorldPos,
};
use horde_defence_system_waves::{ActiveWave, WaveScheduler};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the spawn gate.
#[derive(Clone, Debug)]
pub struct Config {
    catalog: EnemyCatalog,
    spawn_points: Vec<WorldPos>,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration from the enemy catalog, the battlefield
    /// spawn points, and the RNG seed.
    #[must_use]
    pub fn new(catalog: EnemyCatalog, spawn_points: Vec<WorldPos>, rng_seed: u64) -> Self {
        Self {
            catalog,
            spawn_points,
            rng_seed,
        }
    }
}

/// Pure system that paces enemy spawns while a wave is active.
#[derive(Debug)]
pub struct SpawnGate {
    catalog: EnemyCatalog,
    spawn_points: Vec<WorldPos>,
    rng: ChaCha8Rng,
    accumulator: Duration,
    current_wave: Option<u32>,
    boss_released_wave: Option<u32>,
}

impl SpawnGate {
    /// Creates a new spawn gate using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            catalog: config.catalog,
            spawn_points: config.spawn_points,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            accumulator: Duration::ZERO,
            current_wave: None,
            boss_released_wave: None,
        }
    }

    /// Consumes events and the scheduler state to emit spawn commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        scheduler: &WaveScheduler,
        out: &mut Vec<Command>,
    ) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        let Some(active) = scheduler.active() else {
            self.accumulator = Duration::ZERO;
            self.current_wave = None;
            return;
        };
        if self.current_wave != Some(active.number()) {
            self.accumulator = Duration::ZERO;
            self.current_wave = Some(active.number());
        }
        if self.spawn_points.is_empty() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let period = current_spawn_period(&active);
        let allowed = active.definition().allowed_kinds();

        while self.accumulator >= period {
            self.accumulator -= period;
            if let Some(kind) = self.pick_kind(&allowed) {
                self.push_spawn(kind, out);
            }
        }

        if active.in_final_second() && self.boss_released_wave != Some(active.number()) {
            if let Some(boss) = active.definition().boss_kind {
                self.boss_released_wave = Some(active.number());
                self.push_spawn(boss, out);
            }
        }
    }

    fn push_spawn(&mut self, kind: EnemyKind, out: &mut Vec<Command>) {
        let Some(stats) = self.catalog.get(kind) else {
            log::warn!("spawn requested for uncatalogued kind {kind:?}");
            return;
        };
        let stats = stats.clone();
        let position = self.select_spawn_point();
        out.push(Command::SpawnEnemy {
            kind,
            stats,
            position,
        });
    }

    /// Picks a kind from the allowed set, weighted by catalog spawn weight.
    fn pick_kind(&mut self, allowed: &[EnemyKind]) -> Option<EnemyKind> {
        let weighted: Vec<(EnemyKind, u32)> = allowed
            .iter()
            .filter_map(|kind| {
                self.catalog
                    .get(*kind)
                    .map(|stats| (*kind, stats.spawn_weight))
            })
            .filter(|(_, weight)| *weight > 0)
            .collect();
        let total: u32 = weighted.iter().map(|(_, weight)| weight).sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.rng.gen_range(0..total);
        for (kind, weight) in weighted {
            if roll < weight {
                return Some(kind);
            }
            roll -= weight;
        }
        None
    }

    fn select_spawn_point(&mut self) -> WorldPos {
        let index = self.rng.gen_range(0..self.spawn_points.len());
        self.spawn_points[index]
    }
}

/// Spawn period for the running wave, interpolated linearly from the wave's
/// starting period to its ending period. Degenerate configurations fall back
/// to [`DEFAULT_SPAWN_PERIOD`].
#[must_use]
pub fn current_spawn_period(active: &ActiveWave<'_>) -> Duration {
    let start = active.definition().start_spawn_period.as_secs_f32();
    let end = active.definition().end_spawn_period.as_secs_f32();
    let seconds = start + (end - start) * active.progress();
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f32(seconds)
    } else {
        DEFAULT_SPAWN_PERIOD
    }
}
