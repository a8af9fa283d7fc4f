//! Session configuration loading for the command-line adapter.

use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

use horde_defence_core::{
    AbilityCatalog, AbilityLevel, EnemyCatalog, EnemyKind, EnemyStats, GlobalAbility,
    LoseCondition, ProgressionTable, WaveDefinition, WavePlan, WorldPos,
};

/// Hero auto-attack parameters used by the session runner.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct HeroConfig {
    /// Raw damage per attack; zero disables the hero entirely.
    pub damage: f32,
    /// Armor points each attack ignores.
    #[serde(default)]
    pub armor_pierce: u32,
    /// Seconds between attacks.
    pub attack_period: f32,
    /// Maximum engagement distance from the nearest standing tower.
    pub range: f32,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            damage: 12.0,
            armor_pierce: 1,
            attack_period: 0.8,
            range: 30.0,
        }
    }
}

/// Initial placement of a single tower.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct TowerConfig {
    /// Ground position of the tower.
    pub position: WorldPos,
    /// Hit points the tower starts and caps at.
    pub max_hp: u32,
}

/// Complete description of one playable session.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct SessionConfig {
    /// Wave sequence and the pause between waves.
    pub wave_plan: WavePlan,
    /// Statistics for every spawnable enemy kind.
    pub enemies: EnemyCatalog,
    /// Level tables for the global abilities.
    #[serde(default)]
    pub abilities: AbilityCatalog,
    /// Experience thresholds for player levels.
    #[serde(default)]
    pub progression: ProgressionTable,
    /// Condition under which the session is lost.
    #[serde(default)]
    pub lose_condition: LoseCondition,
    /// Towers standing when the session begins.
    pub towers: Vec<TowerConfig>,
    /// Positions enemies may spawn at.
    pub spawn_points: Vec<WorldPos>,
    /// Hero auto-attack parameters.
    #[serde(default)]
    pub hero: HeroConfig,
}

impl SessionConfig {
    /// Loads and validates a session description from a JSON file.
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read session config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse session config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid session config {}", path.display()))?;
        Ok(config)
    }

    /// Rejects configurations the engine cannot honour.
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        self.wave_plan.validate()?;
        self.enemies.validate()?;
        self.abilities.validate()?;
        Ok(())
    }

    /// Built-in three-wave session used when no config file is provided.
    pub(crate) fn demo() -> Self {
        use std::collections::BTreeMap;
        use std::time::Duration;

        let wave = |duration: u64,
                    kinds: Vec<EnemyKind>,
                    boss: Option<EnemyKind>,
                    start_ms: u64,
                    end_ms: u64| WaveDefinition {
            duration: Duration::from_secs(duration),
            enemy_kinds: kinds,
            boss_kind: boss,
            start_spawn_period: Duration::from_millis(start_ms),
            end_spawn_period: Duration::from_millis(end_ms),
            clear_delay: Duration::from_secs(3),
        };

        let stats = |kind: EnemyKind,
                     max_hp: u32,
                     armor: u32,
                     move_speed: f32,
                     explode: u32,
                     xp: u32,
                     weight: u32| EnemyStats {
            kind,
            max_hp,
            armor,
            move_speed,
            explode_damage_to_tower: explode,
            xp_reward: xp,
            is_boss: false,
            spawn_weight: weight,
        };

        let mut boss = stats(EnemyKind::BossGhoul, 400, 5, 1.0, 40, 60, 1);
        boss.is_boss = true;

        let level = |cooldown: u64,
                     duration: u64,
                     damage: f32,
                     is_percent: bool| AbilityLevel {
            cooldown: Duration::from_secs(cooldown),
            duration: Duration::from_secs(duration),
            damage,
            is_percent,
            splash_radius: 0.0,
            start_fire_delay: Duration::ZERO,
            fire_cooldown: Duration::ZERO,
        };
        let mut cannon = level(18, 6, 25.0, false);
        cannon.splash_radius = 2.5;
        cannon.start_fire_delay = Duration::from_millis(500);
        cannon.fire_cooldown = Duration::from_millis(1500);

        let mut abilities = BTreeMap::new();
        let _ = abilities.insert(GlobalAbility::Stun, vec![level(20, 3, 10.0, false)]);
        let _ = abilities.insert(GlobalAbility::Howl, vec![level(25, 6, 50.0, false)]);
        let _ = abilities.insert(GlobalAbility::Shield, vec![level(30, 4, 0.0, false)]);
        let _ = abilities.insert(GlobalAbility::Cannon, vec![cannon]);

        Self {
            wave_plan: WavePlan {
                time_between_waves: Duration::from_secs(5),
                waves: vec![
                    wave(
                        20,
                        vec![EnemyKind::Ghoul, EnemyKind::Skeleton],
                        None,
                        2000,
                        1000,
                    ),
                    wave(
                        25,
                        vec![EnemyKind::Skeleton, EnemyKind::Goblin, EnemyKind::BigGhoul],
                        None,
                        1800,
                        900,
                    ),
                    wave(
                        30,
                        vec![
                            EnemyKind::Goblin,
                            EnemyKind::BigSkeleton,
                            EnemyKind::ShamanGoblin,
                        ],
                        Some(EnemyKind::BossGhoul),
                        1500,
                        800,
                    ),
                ],
            },
            enemies: EnemyCatalog::new(vec![
                stats(EnemyKind::Ghoul, 60, 0, 1.5, 25, 4, 3),
                stats(EnemyKind::Skeleton, 45, 1, 2.2, 20, 5, 3),
                stats(EnemyKind::Goblin, 80, 3, 1.6, 30, 7, 2),
                stats(EnemyKind::BigGhoul, 160, 2, 1.1, 45, 12, 1),
                stats(EnemyKind::BigSkeleton, 140, 4, 1.4, 40, 14, 1),
                stats(EnemyKind::ShamanGoblin, 90, 2, 1.3, 25, 10, 1),
                boss,
            ]),
            abilities: AbilityCatalog::new(abilities),
            progression: ProgressionTable {
                xp_to_next: vec![20, 40, 80],
            },
            lose_condition: LoseCondition::AllTowersDestroyed,
            towers: vec![
                TowerConfig {
                    position: WorldPos::new(0.0, 0.0),
                    max_hp: 300,
                },
                TowerConfig {
                    position: WorldPos::new(3.0, 0.0),
                    max_hp: 300,
                },
            ],
            spawn_points: vec![WorldPos::new(20.0, 0.0), WorldPos::new(0.0, 20.0)],
            hero: HeroConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionConfig;

    #[test]
    fn demo_config_is_valid() {
        let config = SessionConfig::demo();
        assert!(config.validate().is_ok());
        assert_eq!(config.wave_plan.waves.len(), 3);
        assert!(!config.spawn_points.is_empty());
    }

    #[test]
    fn json_round_trip_parses_durations_as_seconds() {
        let raw = r#"{
            "wave_plan": {
                "time_between_waves": 5.0,
                "waves": [{
                    "duration": 10.0,
                    "enemy_kinds": ["Ghoul"],
                    "start_spawn_period": 2.0,
                    "end_spawn_period": 1.0,
                    "clear_delay": 3.0
                }]
            },
            "enemies": { "entries": [{
                "kind": "Ghoul",
                "max_hp": 60,
                "move_speed": 1.5,
                "explode_damage_to_tower": 25,
                "xp_reward": 4
            }]},
            "towers": [{ "position": { "x": 0.0, "z": 0.0 }, "max_hp": 300 }],
            "spawn_points": [{ "x": 20.0, "z": 0.0 }]
        }"#;
        let config: SessionConfig = serde_json::from_str(raw).expect("parse");
        assert!(config.validate().is_ok());
        assert_eq!(
            config.wave_plan.waves[0].duration,
            std::time::Duration::from_secs(10)
        );
        let ghoul = config
            .enemies
            .get(horde_defence_core::EnemyKind::Ghoul)
            .expect("ghoul stats");
        assert_eq!(ghoul.spawn_weight, 1, "weight defaults to 1");
    }
}
