//! Immutable session configuration consumed by the world and systems.
//!
//! Config values are loaded once by an adapter, validated, and then treated
//! as opaque read-only inputs by the core. Durations serialise as fractional
//! seconds so hand-written session files stay legible.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EnemyKind, GlobalAbility};

/// Spawn period used when no wave is active.
pub const DEFAULT_SPAWN_PERIOD: Duration = Duration::from_secs(2);

/// Condition under which a session is lost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoseCondition {
    /// Losing a single tower ends the session.
    #[default]
    AnyTowerDestroyed,
    /// The session is lost only once every tower is destroyed.
    AllTowersDestroyed,
}

/// Serialises [`Duration`] values as fractional seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(serde::de::Error::custom("duration seconds must be >= 0"));
        }
        Ok(Duration::from_secs_f64(seconds))
    }
}

/// Describes a single timed wave within a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Duration of the wave.
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    /// Enemy kinds that may spawn during the wave; `Unknown` entries and
    /// duplicates are filtered when the wave activates.
    pub enemy_kinds: Vec<EnemyKind>,
    /// Boss spawned during the wave's final second, if any.
    #[serde(default)]
    pub boss_kind: Option<EnemyKind>,
    /// Seconds between spawns at the start of the wave.
    #[serde(with = "duration_secs")]
    pub start_spawn_period: Duration,
    /// Seconds between spawns at the end of the wave.
    #[serde(with = "duration_secs")]
    pub end_spawn_period: Duration,
    /// Grace delay before the wave ends early once the field is clear;
    /// zero disables early clear for the wave.
    #[serde(with = "duration_secs", default)]
    pub clear_delay: Duration,
}

impl WaveDefinition {
    /// Allowed kinds with `Unknown` filtered and duplicates removed,
    /// preserving first-seen order.
    #[must_use]
    pub fn allowed_kinds(&self) -> Vec<EnemyKind> {
        let mut seen = Vec::new();
        for kind in &self.enemy_kinds {
            if *kind == EnemyKind::Unknown {
                continue;
            }
            if !seen.contains(kind) {
                seen.push(*kind);
            }
        }
        seen
    }
}

/// Ordered wave sequence plus the pause between consecutive waves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WavePlan {
    /// Pause inserted between two waves.
    #[serde(with = "duration_secs")]
    pub time_between_waves: Duration,
    /// Waves in play order; wave number = index + 1.
    pub waves: Vec<WaveDefinition>,
}

impl WavePlan {
    /// Validates the plan, rejecting values the scheduler cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, wave) in self.waves.iter().enumerate() {
            if wave.duration.is_zero() {
                return Err(ConfigError::ZeroWaveDuration { index });
            }
            if wave.start_spawn_period.is_zero() || wave.end_spawn_period.is_zero() {
                return Err(ConfigError::ZeroSpawnPeriod { index });
            }
        }
        Ok(())
    }
}

fn default_spawn_weight() -> u32 {
    1
}

/// Combat statistics for one enemy kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Kind these statistics describe.
    pub kind: EnemyKind,
    /// Maximum hit points; must be at least 1.
    pub max_hp: u32,
    /// Flat armor, 6% damage reduction per point up to 60%.
    #[serde(default)]
    pub armor: u32,
    /// Movement speed in world units per second, consumed by the movement
    /// collaborator rather than the core.
    pub move_speed: f32,
    /// Damage dealt to a tower when the enemy explodes against it.
    #[serde(default)]
    pub explode_damage_to_tower: u32,
    /// Experience awarded to the player on death.
    #[serde(default)]
    pub xp_reward: u32,
    /// Bosses detonate against every tower instead of only the contacted one.
    #[serde(default)]
    pub is_boss: bool,
    /// Relative weight used by the spawn gate's kind picker.
    #[serde(default = "default_spawn_weight")]
    pub spawn_weight: u32,
}

/// Catalog of enemy statistics, looked up by kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnemyCatalog {
    entries: Vec<EnemyStats>,
}

impl EnemyCatalog {
    /// Creates a catalog from the provided entries.
    #[must_use]
    pub fn new(entries: Vec<EnemyStats>) -> Self {
        Self { entries }
    }

    /// Finds the statistics for a kind. Linear search is fine for the small
    /// rosters this catalog holds.
    #[must_use]
    pub fn get(&self, kind: EnemyKind) -> Option<&EnemyStats> {
        self.entries.iter().find(|stats| stats.kind == kind)
    }

    /// Iterator over every configured entry.
    pub fn iter(&self) -> impl Iterator<Item = &EnemyStats> {
        self.entries.iter()
    }

    /// Validates every entry in the catalog.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for stats in &self.entries {
            if stats.kind == EnemyKind::Unknown {
                return Err(ConfigError::UnknownEnemyKind);
            }
            if stats.max_hp == 0 {
                return Err(ConfigError::ZeroMaxHp { kind: stats.kind });
            }
        }
        Ok(())
    }
}

/// Numeric payload of one global-ability level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityLevel {
    /// Cooldown between activations.
    #[serde(with = "duration_secs")]
    pub cooldown: Duration,
    /// How long the effect window stays active.
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    /// Damage payload; interpreted per `is_percent`.
    #[serde(default)]
    pub damage: f32,
    /// When true, `damage` is a percentage of each target's max HP.
    #[serde(default)]
    pub is_percent: bool,
    /// Splash radius for cannon impacts, in world units.
    #[serde(default)]
    pub splash_radius: f32,
    /// Delay before the cannon's first shot after activation.
    #[serde(with = "duration_secs", default)]
    pub start_fire_delay: Duration,
    /// Cooldown between consecutive cannon shots.
    #[serde(with = "duration_secs", default)]
    pub fire_cooldown: Duration,
}

/// Per-ability level tables, keyed by ability.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityCatalog {
    entries: BTreeMap<GlobalAbility, Vec<AbilityLevel>>,
}

impl AbilityCatalog {
    /// Creates a catalog from the provided level tables.
    #[must_use]
    pub fn new(entries: BTreeMap<GlobalAbility, Vec<AbilityLevel>>) -> Self {
        Self { entries }
    }

    /// Level table for an ability, if configured.
    #[must_use]
    pub fn levels(&self, ability: GlobalAbility) -> Option<&[AbilityLevel]> {
        self.entries.get(&ability).map(Vec::as_slice)
    }

    /// Specific level of an ability, if configured.
    #[must_use]
    pub fn level(&self, ability: GlobalAbility, index: usize) -> Option<&AbilityLevel> {
        self.entries.get(&ability).and_then(|levels| levels.get(index))
    }

    /// Highest level index available for an ability; zero when the ability
    /// has no upgrades configured.
    #[must_use]
    pub fn max_level_index(&self, ability: GlobalAbility) -> usize {
        self.entries
            .get(&ability)
            .map_or(0, |levels| levels.len().saturating_sub(1))
    }

    /// Validates that every configured ability carries at least one level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (ability, levels) in &self.entries {
            if levels.is_empty() {
                return Err(ConfigError::EmptyAbilityLevels { ability: *ability });
            }
        }
        Ok(())
    }
}

/// Experience thresholds for player level progression.
///
/// Index 0 holds the XP required to advance from level 1 to level 2.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressionTable {
    /// Ordered XP requirements between consecutive levels.
    pub xp_to_next: Vec<u32>,
}

impl ProgressionTable {
    /// Maximum attainable level; thresholds count plus one.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.xp_to_next.len() as u32 + 1
    }

    /// XP required to advance from `level` to `level + 1`, if such a step
    /// exists.
    #[must_use]
    pub fn requirement(&self, level: u32) -> Option<u32> {
        if level == 0 {
            return None;
        }
        self.xp_to_next.get(level as usize - 1).copied()
    }
}

/// Rejections produced while validating session configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A wave was configured with a zero duration.
    #[error("wave at index {index} has a zero duration")]
    ZeroWaveDuration {
        /// Zero-based index of the offending wave.
        index: usize,
    },
    /// A wave was configured with a zero spawn period.
    #[error("wave at index {index} has a zero spawn period")]
    ZeroSpawnPeriod {
        /// Zero-based index of the offending wave.
        index: usize,
    },
    /// An enemy entry used the `Unknown` sentinel kind.
    #[error("enemy catalog contains an entry for the Unknown kind")]
    UnknownEnemyKind,
    /// An enemy entry declared zero maximum hit points.
    #[error("enemy stats for {kind:?} require max_hp >= 1")]
    ZeroMaxHp {
        /// Kind of the offending entry.
        kind: EnemyKind,
    },
    /// An ability was configured without any levels.
    #[error("ability {ability:?} has no levels configured")]
    EmptyAbilityLevels {
        /// Ability missing its level table.
        ability: GlobalAbility,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(duration_secs: u64) -> WaveDefinition {
        WaveDefinition {
            duration: Duration::from_secs(duration_secs),
            enemy_kinds: vec![EnemyKind::Ghoul, EnemyKind::Ghoul, EnemyKind::Unknown],
            boss_kind: None,
            start_spawn_period: Duration::from_secs(2),
            end_spawn_period: Duration::from_secs(1),
            clear_delay: Duration::from_secs(3),
        }
    }

    #[test]
    fn allowed_kinds_filters_unknown_and_duplicates() {
        let wave = wave(10);
        assert_eq!(wave.allowed_kinds(), vec![EnemyKind::Ghoul]);
    }

    #[test]
    fn wave_plan_rejects_zero_duration() {
        let plan = WavePlan {
            time_between_waves: Duration::from_secs(5),
            waves: vec![wave(10), wave(0)],
        };
        assert_eq!(
            plan.validate(),
            Err(ConfigError::ZeroWaveDuration { index: 1 })
        );
    }

    #[test]
    fn enemy_catalog_rejects_unknown_kind() {
        let catalog = EnemyCatalog::new(vec![EnemyStats {
            kind: EnemyKind::Unknown,
            max_hp: 10,
            armor: 0,
            move_speed: 1.0,
            explode_damage_to_tower: 5,
            xp_reward: 1,
            is_boss: false,
            spawn_weight: 1,
        }]);
        assert_eq!(catalog.validate(), Err(ConfigError::UnknownEnemyKind));
    }

    #[test]
    fn ability_catalog_looks_up_levels() {
        let mut entries = BTreeMap::new();
        let _ = entries.insert(
            GlobalAbility::Stun,
            vec![
                AbilityLevel {
                    cooldown: Duration::from_secs(10),
                    duration: Duration::from_secs(3),
                    damage: 5.0,
                    is_percent: false,
                    splash_radius: 0.0,
                    start_fire_delay: Duration::ZERO,
                    fire_cooldown: Duration::ZERO,
                },
                AbilityLevel {
                    cooldown: Duration::from_secs(8),
                    duration: Duration::from_secs(4),
                    damage: 10.0,
                    is_percent: true,
                    splash_radius: 0.0,
                    start_fire_delay: Duration::ZERO,
                    fire_cooldown: Duration::ZERO,
                },
            ],
        );
        let catalog = AbilityCatalog::new(entries);
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.max_level_index(GlobalAbility::Stun), 1);
        assert_eq!(catalog.max_level_index(GlobalAbility::Shield), 0);
        let level = catalog.level(GlobalAbility::Stun, 1).expect("level");
        assert!(level.is_percent);
    }

    #[test]
    fn progression_table_reports_requirements() {
        let table = ProgressionTable {
            xp_to_next: vec![10, 20, 40],
        };
        assert_eq!(table.max_level(), 4);
        assert_eq!(table.requirement(1), Some(10));
        assert_eq!(table.requirement(3), Some(40));
        assert_eq!(table.requirement(4), None);
        assert_eq!(table.requirement(0), None);
    }
}
