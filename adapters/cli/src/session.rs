//! Headless fixed-step session runner.
//!
//! The runner owns the world and every system, advances them on a fixed
//! timestep, and supplies the demo-only glue the engine leaves to adapters:
//! straight-line enemy movement toward the nearest tower, the hero's
//! auto-attack, ability autocasting, and corpse cleanup.

use std::time::Duration;

use horde_defence_core::{AbilityCatalog, Command, EnemyCatalog, EnemyId, Event, GlobalAbility};
use horde_defence_system_abilities::AbilityExecutor;
use horde_defence_system_outcome::{Outcome, OutcomeMonitor};
use horde_defence_system_progression::Progression;
use horde_defence_system_spawning::{Config as SpawnConfig, SpawnGate};
use horde_defence_system_waves::WaveScheduler;
use horde_defence_world::{self as world, query, World};

use crate::config::{HeroConfig, SessionConfig};

/// Distance at which an enemy detonates against a tower.
const CONTACT_RANGE: f32 = 0.5;

/// How long a corpse lingers before it is pruned.
const CORPSE_LINGER: Duration = Duration::from_secs(1);

/// Victory grace when the final wave configures no clear delay.
const VICTORY_GRACE_FALLBACK: Duration = Duration::from_secs(1);

const AUTOCAST_ORDER: [GlobalAbility; 4] = [
    GlobalAbility::Shield,
    GlobalAbility::Stun,
    GlobalAbility::Howl,
    GlobalAbility::Cannon,
];

/// Summary of a completed (or capped) session run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SessionReport {
    /// Terminal outcome, if one was reached before the time cap.
    pub outcome: Option<Outcome>,
    /// Number of fixed steps executed.
    pub ticks: u64,
    /// Number of waves that started.
    pub waves_started: u32,
    /// Number of enemies that spawned.
    pub enemies_spawned: u32,
    /// Player level at the end of the run.
    pub player_level: u32,
}

/// Owns the world and all systems for one session.
pub(crate) struct Session {
    world: World,
    scheduler: WaveScheduler,
    gate: SpawnGate,
    executor: AbilityExecutor,
    progression: Progression,
    outcome: OutcomeMonitor,
    enemy_catalog: EnemyCatalog,
    ability_catalog: AbilityCatalog,
    hero: HeroConfig,
    hero_timer: Duration,
    clock: Duration,
    corpses: Vec<(EnemyId, Duration)>,
    pending: Vec<Event>,
    ticks: u64,
    waves_started: u32,
    enemies_spawned: u32,
}

impl Session {
    /// Builds a session from its configuration and RNG seed.
    pub(crate) fn new(config: SessionConfig, seed: u64) -> Self {
        let mut session_world = World::new();
        let mut pending = Vec::new();
        for tower in &config.towers {
            world::apply(
                &mut session_world,
                Command::PlaceTower {
                    position: tower.position,
                    max_hp: tower.max_hp,
                },
                &mut pending,
            );
        }

        // Victory waits out the same delay the final wave uses for its
        // early-clear check.
        let victory_grace = config
            .wave_plan
            .waves
            .last()
            .map(|wave| wave.clear_delay)
            .filter(|delay| !delay.is_zero())
            .unwrap_or(VICTORY_GRACE_FALLBACK);

        let mut scheduler = WaveScheduler::new(config.wave_plan);
        scheduler.start(&mut pending);

        let gate = SpawnGate::new(SpawnConfig::new(
            config.enemies.clone(),
            config.spawn_points,
            seed,
        ));

        Self {
            world: session_world,
            scheduler,
            gate,
            executor: AbilityExecutor::new(config.abilities.clone()),
            progression: Progression::new(config.progression),
            outcome: OutcomeMonitor::new(config.lose_condition, victory_grace),
            enemy_catalog: config.enemies,
            ability_catalog: config.abilities,
            hero: config.hero,
            hero_timer: Duration::ZERO,
            clock: Duration::ZERO,
            corpses: Vec::new(),
            pending,
            ticks: 0,
            waves_started: 0,
            enemies_spawned: 0,
        }
    }

    /// Advances the session on a fixed step until an outcome is reached or
    /// the time cap elapses.
    pub(crate) fn run(&mut self, step: Duration, max_time: Duration) -> SessionReport {
        while self.outcome.outcome().is_none() && self.clock < max_time {
            self.step(step);
        }
        SessionReport {
            outcome: self.outcome.outcome(),
            ticks: self.ticks,
            waves_started: self.waves_started,
            enemies_spawned: self.enemies_spawned,
            player_level: self.progression.level(),
        }
    }

    /// Runs one fixed step: systems consume the previous step's events, then
    /// the world applies this step's mutations.
    fn step(&mut self, dt: Duration) {
        let mut events = std::mem::take(&mut self.pending);
        let enemies = query::enemy_view(&self.world);
        let towers = query::tower_view(&self.world);

        let mut emitted = Vec::new();
        let mut commands = Vec::new();
        self.scheduler.handle(&events, &enemies, &mut emitted);
        self.gate.handle(&events, &self.scheduler, &mut commands);
        self.executor
            .handle(&events, &enemies, &towers, &mut commands, &mut emitted);
        self.progression.handle(&events, &mut emitted);
        self.autocast(&enemies, &towers, &mut commands, &mut emitted);
        events.append(&mut emitted);
        let mut decided = Vec::new();
        self.outcome.handle(&events, &enemies, &towers, &mut decided);
        events.append(&mut decided);
        self.record(&events);
        if let Some(outcome) = self.outcome.outcome() {
            log::info!("session decided after {:?}: {outcome:?}", self.clock);
            return;
        }

        // World mutations for this step; their events feed the next step.
        let mut produced = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut produced);
        self.clock += dt;
        self.ticks += 1;

        // The systems' batch lands first so movement reads fresh stun and
        // invulnerability flags instead of last step's.
        for command in commands {
            world::apply(&mut self.world, command, &mut produced);
        }

        let mut adapter_commands = Vec::new();
        self.drive_enemies(dt, &mut adapter_commands);
        self.hero_attack(dt, &mut adapter_commands);
        self.prune_corpses(&mut adapter_commands);
        for command in adapter_commands {
            world::apply(&mut self.world, command, &mut produced);
        }

        for event in &produced {
            if let Event::EnemyDied { enemy, .. } = event {
                self.corpses.push((*enemy, self.clock + CORPSE_LINGER));
            }
        }
        // Produced events are recorded next step, when systems consume them.
        self.pending = produced;
    }

    /// Marches every living, unstunned enemy toward the nearest standing
    /// tower, detonating it on contact.
    fn drive_enemies(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let enemies = query::enemy_view(&self.world);
        let towers = query::tower_view(&self.world);
        for enemy in enemies.iter_alive() {
            if enemy.stunned {
                continue;
            }
            let Some(stats) = self.enemy_catalog.get(enemy.kind) else {
                continue;
            };
            let Some(target) = towers.iter_standing().min_by(|a, b| {
                let da = a.position.distance_squared(enemy.position);
                let db = b.position.distance_squared(enemy.position);
                da.total_cmp(&db)
            }) else {
                continue;
            };

            let distance = enemy.position.distance(target.position);
            if distance <= CONTACT_RANGE {
                out.push(Command::EnemyReachedTower {
                    enemy: enemy.id,
                    tower: target.id,
                });
                continue;
            }
            let step = stats.move_speed * dt.as_secs_f32();
            let travelled = step.min(distance - CONTACT_RANGE * 0.5);
            let scale = travelled / distance;
            let position = horde_defence_core::WorldPos::new(
                enemy.position.x() + (target.position.x() - enemy.position.x()) * scale,
                enemy.position.z() + (target.position.z() - enemy.position.z()) * scale,
            );
            out.push(Command::MoveEnemy {
                enemy: enemy.id,
                position,
            });
        }
    }

    /// Fires the hero's auto-attack at the lowest-id enemy in range.
    fn hero_attack(&mut self, dt: Duration, out: &mut Vec<Command>) {
        if self.hero.damage <= 0.0 {
            return;
        }
        self.hero_timer += dt;
        let period = Duration::from_secs_f32(self.hero.attack_period.max(0.05));
        if self.hero_timer < period {
            return;
        }

        let enemies = query::enemy_view(&self.world);
        let towers = query::tower_view(&self.world);
        let target = enemies.iter_alive().find(|enemy| {
            towers
                .iter_standing()
                .any(|tower| tower.position.distance(enemy.position) <= self.hero.range)
        });
        if let Some(target) = target {
            self.hero_timer -= period;
            out.push(Command::DamageEnemy {
                enemy: target.id,
                base_damage: self.hero.damage,
                armor_pierce: self.hero.armor_pierce,
            });
        }
    }

    /// Triggers every configured ability the moment it is ready.
    fn autocast(
        &mut self,
        enemies: &horde_defence_core::EnemyView,
        towers: &horde_defence_core::TowerView,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        for ability in AUTOCAST_ORDER {
            if self.ability_catalog.levels(ability).is_none() {
                continue;
            }
            if !self.executor.is_ready(ability) {
                continue;
            }
            if enemies.alive_count() == 0 {
                continue;
            }
            let level = self
                .progression
                .ability_level_index(&self.ability_catalog, ability);
            let target = match ability {
                GlobalAbility::Cannon => enemies.iter_alive().next().map(|enemy| enemy.position),
                _ => None,
            };
            let _ = self.executor.trigger(
                ability,
                level,
                target,
                enemies,
                towers,
                out_commands,
                out_events,
            );
        }
    }

    /// Prunes corpses whose linger delay elapsed.
    fn prune_corpses(&mut self, out: &mut Vec<Command>) {
        let clock = self.clock;
        self.corpses.retain(|(enemy, due)| {
            if clock >= *due {
                out.push(Command::RemoveEnemy { enemy: *enemy });
                false
            } else {
                true
            }
        });
    }

    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::WaveStarted { wave, kinds } => {
                    self.waves_started += 1;
                    log::info!("wave {wave} started with kinds {kinds:?}");
                }
                Event::EnemySpawned { .. } => self.enemies_spawned += 1,
                Event::IntermissionStarted { completed_wave } => {
                    log::info!("wave {completed_wave} complete, intermission");
                }
                Event::PlayerLevelledUp { level, gained } => {
                    log::info!("player reached level {level} (+{gained})");
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SessionConfig, TowerConfig};
    use horde_defence_core::{
        EnemyCatalog, EnemyKind, EnemyStats, LoseCondition, ProgressionTable, WaveDefinition,
        WavePlan, WorldPos,
    };

    fn quiet_hero() -> crate::config::HeroConfig {
        crate::config::HeroConfig {
            damage: 0.0,
            armor_pierce: 0,
            attack_period: 1.0,
            range: 30.0,
        }
    }

    fn empty_wave_config() -> SessionConfig {
        SessionConfig {
            wave_plan: WavePlan {
                time_between_waves: Duration::from_secs(2),
                waves: vec![WaveDefinition {
                    duration: Duration::from_secs(3),
                    enemy_kinds: vec![EnemyKind::Ghoul],
                    boss_kind: None,
                    start_spawn_period: Duration::from_secs(10),
                    end_spawn_period: Duration::from_secs(10),
                    clear_delay: Duration::ZERO,
                }],
            },
            enemies: EnemyCatalog::new(vec![]),
            abilities: horde_defence_core::AbilityCatalog::default(),
            progression: ProgressionTable::default(),
            lose_condition: LoseCondition::AnyTowerDestroyed,
            towers: vec![TowerConfig {
                position: WorldPos::new(0.0, 0.0),
                max_hp: 100,
            }],
            spawn_points: vec![WorldPos::new(100.0, 0.0)],
            hero: quiet_hero(),
        }
    }

    #[test]
    fn uneventful_final_wave_ends_in_victory() {
        let mut session = Session::new(empty_wave_config(), 7);
        let report = session.run(Duration::from_millis(100), Duration::from_secs(60));
        assert_eq!(report.outcome, Some(Outcome::Victory { stars: 1 }));
        assert_eq!(report.waves_started, 1);
        assert_eq!(report.enemies_spawned, 0);
    }

    #[test]
    fn victory_grace_follows_the_final_waves_clear_delay() {
        let run = |clear_delay| {
            let mut config = empty_wave_config();
            config.wave_plan.waves[0].clear_delay = clear_delay;
            let mut session = Session::new(config, 7);
            session.run(Duration::from_millis(100), Duration::from_secs(60))
        };
        let fallback = run(Duration::ZERO);
        let extended = run(Duration::from_secs(5));
        assert_eq!(fallback.outcome, Some(Outcome::Victory { stars: 1 }));
        assert_eq!(extended.outcome, Some(Outcome::Victory { stars: 1 }));
        // 5s grace versus the 1s fallback, at 100ms per tick.
        assert!(
            extended.ticks >= fallback.ticks + 35,
            "extended {} fallback {}",
            extended.ticks,
            fallback.ticks
        );
    }

    #[test]
    fn exploding_rusher_destroys_the_tower_and_loses() {
        let mut config = empty_wave_config();
        config.wave_plan.waves[0].duration = Duration::from_secs(10);
        config.wave_plan.waves[0].start_spawn_period = Duration::from_secs(1);
        config.wave_plan.waves[0].end_spawn_period = Duration::from_secs(1);
        config.enemies = EnemyCatalog::new(vec![EnemyStats {
            kind: EnemyKind::Ghoul,
            max_hp: 1000,
            armor: 0,
            move_speed: 10.0,
            explode_damage_to_tower: 200,
            xp_reward: 1,
            is_boss: false,
            spawn_weight: 1,
        }]);
        config.spawn_points = vec![WorldPos::new(2.0, 0.0)];

        let mut session = Session::new(config, 7);
        let report = session.run(Duration::from_millis(100), Duration::from_secs(60));
        assert_eq!(report.outcome, Some(Outcome::Defeat));
        assert!(report.enemies_spawned >= 1);
    }

    #[test]
    fn same_seed_reproduces_the_same_report() {
        let run = |seed: u64| {
            let mut session = Session::new(SessionConfig::demo(), seed);
            session.run(Duration::from_millis(100), Duration::from_secs(30))
        };
        assert_eq!(run(42), run(42));
    }
}
