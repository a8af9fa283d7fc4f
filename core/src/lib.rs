#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Horde Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod damage;

pub use config::{
    AbilityCatalog, AbilityLevel, ConfigError, EnemyCatalog, EnemyStats, LoseCondition,
    ProgressionTable, WaveDefinition, WavePlan,
};

/// Canonical banner emitted when a session boots.
pub const WELCOME_BANNER: &str = "Welcome to Horde Defence.";

/// Distinguishes enemy kinds for configuration, wave gating, and spawning.
///
/// `Unknown` is the zero-value sentinel used by configs; waves filter it out
/// of their allowed sets rather than treating it as spawnable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Placeholder for unconfigured slots; never spawnable.
    Unknown,
    /// Baseline melee enemy.
    Ghoul,
    /// Fast, lightly armoured enemy.
    Skeleton,
    /// Armoured enemy with moderate speed.
    Goblin,
    /// Durable ghoul variant.
    BigGhoul,
    /// Durable skeleton variant.
    BigSkeleton,
    /// Durable goblin variant.
    BigGoblin,
    /// Support enemy introduced in later waves.
    ShamanGoblin,
    /// Skeleton boss that detonates against towers.
    BossSkeleton,
    /// Goblin boss that detonates against towers.
    BossGoblin,
    /// Ghoul boss that detonates against towers.
    BossGhoul,
}

/// Global abilities the player can trigger during a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GlobalAbility {
    /// Halts every enemy for a duration and deals one-shot damage.
    Stun,
    /// Amplifies damage taken by every enemy for a duration.
    Howl,
    /// Repeatedly bombards an impact point with splash damage.
    Cannon,
    /// Renders towers invulnerable for a duration.
    Shield,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position on the battlefield ground plane expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    x: f32,
    z: f32,
}

impl WorldPos {
    /// Creates a new position from ground-plane coordinates.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Horizontal coordinate of the position.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Depth coordinate of the position.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Squared distance to another position, avoiding the square root.
    #[must_use]
    pub fn distance_squared(self, other: WorldPos) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(self, other: WorldPos) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Registers a new enemy at full health.
    SpawnEnemy {
        /// Kind of enemy to create.
        kind: EnemyKind,
        /// Combat statistics resolved by the spawner from its catalog.
        stats: EnemyStats,
        /// Ground position the enemy occupies after spawning.
        position: WorldPos,
    },
    /// Applies damage to an enemy through the armor mitigation model.
    DamageEnemy {
        /// Identifier of the enemy taking damage.
        enemy: EnemyId,
        /// Raw damage before mitigation.
        base_damage: f32,
        /// Armor points ignored by this hit.
        armor_pierce: u32,
    },
    /// Toggles the movement-halt flag read by presentation layers.
    SetEnemyStunned {
        /// Identifier of the affected enemy.
        enemy: EnemyId,
        /// Whether the enemy should halt.
        stunned: bool,
    },
    /// Applies a bonus-damage-taken modifier to an enemy.
    SetDamageTakenBonus {
        /// Identifier of the affected enemy.
        enemy: EnemyId,
        /// Additional damage taken in percent; 50 means +50%.
        percent: f32,
    },
    /// Clears any bonus-damage-taken modifier from an enemy.
    ClearDamageTakenBonus {
        /// Identifier of the affected enemy.
        enemy: EnemyId,
    },
    /// Damages every living enemy within a radius of an impact point.
    SplashDamage {
        /// Center of the impact.
        center: WorldPos,
        /// Radius of the affected area in world units.
        radius: f32,
        /// Damage value; interpreted per `is_percent`.
        damage: f32,
        /// When true, `damage` is a percentage of each enemy's max HP.
        is_percent: bool,
    },
    /// Updates an enemy's position as reported by the movement collaborator.
    MoveEnemy {
        /// Identifier of the enemy that moved.
        enemy: EnemyId,
        /// New ground position.
        position: WorldPos,
    },
    /// Reports that an enemy made contact with a tower and explodes.
    EnemyReachedTower {
        /// Identifier of the exploding enemy.
        enemy: EnemyId,
        /// Identifier of the contacted tower.
        tower: TowerId,
    },
    /// Removes a dead enemy once its presentation delay elapsed.
    RemoveEnemy {
        /// Identifier of the enemy to prune.
        enemy: EnemyId,
    },
    /// Registers a tower at full health.
    PlaceTower {
        /// Ground position of the tower.
        position: WorldPos,
        /// Hit points the tower starts and caps at.
        max_hp: u32,
    },
    /// Applies flat damage to a tower, blocked while invulnerable.
    DamageTower {
        /// Identifier of the tower taking damage.
        tower: TowerId,
        /// Flat damage amount.
        amount: u32,
    },
    /// Applies flat damage to a tower, ignoring the invulnerable flag.
    DamageTowerPiercing {
        /// Identifier of the tower taking damage.
        tower: TowerId,
        /// Flat damage amount.
        amount: u32,
    },
    /// Restores tower hit points up to its maximum.
    HealTower {
        /// Identifier of the tower to heal.
        tower: TowerId,
        /// Flat heal amount.
        amount: u32,
    },
    /// Toggles a tower's invulnerability flag.
    SetTowerInvulnerable {
        /// Identifier of the affected tower.
        tower: TowerId,
        /// Whether the tower ignores ordinary damage.
        invulnerable: bool,
    },
}

/// Events broadcast after processing commands or system transitions.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy was created.
    EnemySpawned {
        /// Identifier assigned to the new enemy.
        enemy: EnemyId,
        /// Kind of the spawned enemy.
        kind: EnemyKind,
        /// Hit points the enemy spawned with.
        hp: u32,
        /// Ground position the enemy occupies.
        position: WorldPos,
    },
    /// Reports damage dealt to an enemy.
    EnemyDamaged {
        /// Identifier of the damaged enemy.
        enemy: EnemyId,
        /// Hit points actually removed by the hit.
        amount: u32,
        /// Hit points remaining after the hit.
        remaining_hp: u32,
    },
    /// Announces an enemy's death; fired exactly once per enemy.
    EnemyDied {
        /// Identifier of the dead enemy.
        enemy: EnemyId,
        /// Kind of the dead enemy.
        kind: EnemyKind,
        /// Experience awarded to the player for the kill.
        xp_reward: u32,
    },
    /// Confirms that a dead enemy was pruned from the registry.
    EnemyRemoved {
        /// Identifier of the pruned enemy.
        enemy: EnemyId,
    },
    /// Confirms that a tower was registered.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Ground position of the tower.
        position: WorldPos,
        /// Hit points the tower starts with.
        max_hp: u32,
    },
    /// Reports damage dealt to a tower.
    TowerDamaged {
        /// Identifier of the damaged tower.
        tower: TowerId,
        /// Hit points removed by the hit.
        amount: u32,
        /// Hit points remaining after the hit.
        remaining_hp: u32,
    },
    /// Announces a tower's destruction; fired exactly once per tower.
    TowerDestroyed {
        /// Identifier of the destroyed tower.
        tower: TowerId,
    },
    /// Announces that a wave began and which kinds it permits.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// De-duplicated allowed kinds for the wave.
        kinds: Vec<EnemyKind>,
    },
    /// Announces the pause between two waves.
    IntermissionStarted {
        /// One-based number of the wave that just ended.
        completed_wave: u32,
    },
    /// Announces that the final wave completed; fired exactly once.
    WavesFinished,
    /// Reports that a global ability activated or re-triggered.
    AbilityActivated {
        /// Ability that activated.
        ability: GlobalAbility,
        /// Zero-based level index the ability activated at.
        level: u32,
    },
    /// Reports that a global ability's effect window elapsed.
    AbilityExpired {
        /// Ability whose effect ended.
        ability: GlobalAbility,
    },
    /// Reports a cannon shot resolving at its impact point.
    CannonFired {
        /// Impact position of the shot.
        target: WorldPos,
    },
    /// Reports experience progress after a kill was credited.
    ExperienceGained {
        /// Progress into the current level.
        into_level: u32,
        /// Experience required to reach the next level; 0 at max level.
        to_next: u32,
        /// Total experience accumulated this session.
        total: u64,
    },
    /// Announces that the player reached a new level.
    PlayerLevelledUp {
        /// New one-based player level.
        level: u32,
        /// Number of levels gained by the triggering award.
        gained: u32,
    },
    /// Announces victory once the field is clear after the final wave.
    Victory {
        /// Star rating awarded; equals the number of surviving towers.
        stars: u32,
    },
    /// Announces defeat according to the configured lose condition.
    Defeat,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Kind of the enemy.
    pub kind: EnemyKind,
    /// Current hit points; zero once dying.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Flat armor stat.
    pub armor: u32,
    /// Whether movement is currently halted by a stun effect.
    pub stunned: bool,
    /// Whether the enemy died and awaits removal.
    pub dying: bool,
    /// Whether the enemy detonates against all towers on contact.
    pub is_boss: bool,
    /// Ground position of the enemy.
    pub position: WorldPos,
}

/// Read-only snapshot describing all enemies on the battlefield.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over snapshots of enemies that are still alive.
    pub fn iter_alive(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter().filter(|snapshot| !snapshot.dying)
    }

    /// Number of enemies that are still alive.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.iter_alive().count()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Unique identifier assigned to the tower.
    pub id: TowerId,
    /// Current hit points; zero once destroyed.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Whether ordinary damage is currently blocked.
    pub invulnerable: bool,
    /// Ground position of the tower.
    pub position: WorldPos,
}

impl TowerSnapshot {
    /// Reports whether the tower has been destroyed.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.hp == 0
    }
}

/// Read-only snapshot describing all towers on the battlefield.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over snapshots of towers that still stand.
    pub fn iter_standing(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots
            .iter()
            .filter(|snapshot| !snapshot.is_destroyed())
    }

    /// Number of towers that still stand.
    #[must_use]
    pub fn standing_count(&self) -> usize {
        self.iter_standing().count()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::{EnemyId, EnemyKind, GlobalAbility, TowerId, WorldPos};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn enemy_id_round_trips_through_bincode() {
        assert_round_trip(&EnemyId::new(17));
    }

    #[test]
    fn tower_id_round_trips_through_bincode() {
        assert_round_trip(&TowerId::new(3));
    }

    #[test]
    fn enemy_kind_round_trips_through_bincode() {
        assert_round_trip(&EnemyKind::BossGhoul);
    }

    #[test]
    fn global_ability_round_trips_through_bincode() {
        assert_round_trip(&GlobalAbility::Shield);
    }

    #[test]
    fn world_pos_distance_matches_expectation() {
        let origin = WorldPos::new(0.0, 0.0);
        let point = WorldPos::new(3.0, 4.0);
        assert!((origin.distance(point) - 5.0).abs() < f32::EPSILON);
        assert!((point.distance_squared(origin) - 25.0).abs() < f32::EPSILON);
    }
}
