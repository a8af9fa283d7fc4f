#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Horde Defence.
//!
//! The world owns every enemy and tower registry and is the only place that
//! mutates them. Adapters and systems submit [`Command`] values through
//! [`apply`]; the world resolves them deterministically and reports the
//! outcome through [`Event`] values.

use horde_defence_core::{
    damage, Command, EnemyId, EnemyKind, EnemySnapshot, EnemyStats, Event, TowerId, TowerSnapshot,
    WorldPos, WELCOME_BANNER,
};

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    stats: EnemyStats,
    hp: u32,
    stunned: bool,
    dying: bool,
    damage_taken_multiplier: f32,
    position: WorldPos,
}

impl Enemy {
    fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            hp: self.hp,
            max_hp: self.stats.max_hp,
            armor: self.stats.armor,
            stunned: self.stunned,
            dying: self.dying,
            is_boss: self.stats.is_boss,
            position: self.position,
        }
    }
}

#[derive(Clone, Debug)]
struct Tower {
    id: TowerId,
    hp: u32,
    max_hp: u32,
    invulnerable: bool,
    position: WorldPos,
}

impl Tower {
    fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            hp: self.hp,
            max_hp: self.max_hp,
            invulnerable: self.invulnerable,
            position: self.position,
        }
    }
}

/// Authoritative container for all mutable battlefield state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    enemies: Vec<Enemy>,
    towers: Vec<Tower>,
    next_enemy_id: u32,
    next_tower_id: u32,
    tick_index: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            enemies: Vec::new(),
            towers: Vec::new(),
            next_enemy_id: 0,
            next_tower_id: 0,
            tick_index: 0,
        }
    }

    fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|enemy| enemy.id == id)
    }

    fn tower_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.towers.iter_mut().find(|tower| tower.id == id)
    }

    /// Whether any standing tower currently ignores ordinary damage. Boss
    /// detonations treat this as the shield being raised.
    fn shield_active(&self) -> bool {
        self.towers
            .iter()
            .any(|tower| tower.hp > 0 && tower.invulnerable)
    }

    fn allocate_enemy_id(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);
        id
    }

    fn allocate_tower_id(&mut self) -> TowerId {
        let id = TowerId::new(self.next_tower_id);
        self.next_tower_id = self.next_tower_id.wrapping_add(1);
        id
    }

    /// Resolves a mitigated hit against a living enemy. Dead enemies shrug
    /// off further damage so death announcements stay unique.
    fn damage_enemy(
        &mut self,
        id: EnemyId,
        base_damage: f32,
        armor_pierce: u32,
        out_events: &mut Vec<Event>,
    ) {
        if base_damage <= 0.0 {
            return;
        }
        let Some(enemy) = self.enemy_mut(id) else {
            log::warn!("damage requested for unknown enemy {id:?}");
            return;
        };
        if enemy.dying {
            return;
        }
        let dealt = damage::resolve_damage(
            base_damage,
            enemy.stats.armor,
            armor_pierce,
            enemy.damage_taken_multiplier,
        );
        let dealt = dealt.min(enemy.hp);
        enemy.hp -= dealt;
        out_events.push(Event::EnemyDamaged {
            enemy: id,
            amount: dealt,
            remaining_hp: enemy.hp,
        });
        if enemy.hp == 0 {
            enemy.dying = true;
            out_events.push(Event::EnemyDied {
                enemy: id,
                kind: enemy.kind,
                xp_reward: enemy.stats.xp_reward,
            });
        }
    }

    /// Applies flat damage to a tower. The piercing path bypasses the
    /// invulnerability flag; the ordinary path is fully blocked by it.
    fn damage_tower(
        &mut self,
        id: TowerId,
        amount: u32,
        piercing: bool,
        out_events: &mut Vec<Event>,
    ) {
        if amount == 0 {
            return;
        }
        let Some(tower) = self.tower_mut(id) else {
            log::warn!("damage requested for unknown tower {id:?}");
            return;
        };
        if tower.hp == 0 {
            return;
        }
        if tower.invulnerable && !piercing {
            return;
        }
        let dealt = amount.min(tower.hp);
        tower.hp -= dealt;
        out_events.push(Event::TowerDamaged {
            tower: id,
            amount: dealt,
            remaining_hp: tower.hp,
        });
        if tower.hp == 0 {
            out_events.push(Event::TowerDestroyed { tower: id });
        }
    }

    /// Detonates an enemy against the tower line. Bosses strike every
    /// standing tower through the piercing path, halved (rounded up) while
    /// the shield is raised; ordinary enemies strike only the contacted
    /// tower and are blocked by invulnerability.
    fn explode_enemy(&mut self, id: EnemyId, contacted: TowerId, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemy_mut(id) else {
            log::warn!("tower contact reported for unknown enemy {id:?}");
            return;
        };
        if enemy.dying {
            return;
        }
        let explode_damage = enemy.stats.explode_damage_to_tower;
        let is_boss = enemy.stats.is_boss;
        let kind = enemy.kind;
        let xp_reward = enemy.stats.xp_reward;
        enemy.dying = true;
        enemy.hp = 0;

        if is_boss {
            let amount = if self.shield_active() {
                explode_damage.div_ceil(2)
            } else {
                explode_damage
            };
            let targets: Vec<TowerId> = self
                .towers
                .iter()
                .filter(|tower| tower.hp > 0)
                .map(|tower| tower.id)
                .collect();
            for tower in targets {
                self.damage_tower(tower, amount, true, out_events);
            }
        } else {
            self.damage_tower(contacted, explode_damage, false, out_events);
        }

        out_events.push(Event::EnemyDied {
            enemy: id,
            kind,
            xp_reward,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnEnemy {
            kind,
            stats,
            position,
        } => {
            let id = world.allocate_enemy_id();
            let hp = stats.max_hp;
            world.enemies.push(Enemy {
                id,
                kind,
                stats,
                hp,
                stunned: false,
                dying: false,
                damage_taken_multiplier: 1.0,
                position,
            });
            out_events.push(Event::EnemySpawned {
                enemy: id,
                kind,
                hp,
                position,
            });
        }
        Command::DamageEnemy {
            enemy,
            base_damage,
            armor_pierce,
        } => {
            world.damage_enemy(enemy, base_damage, armor_pierce, out_events);
        }
        Command::SetEnemyStunned { enemy, stunned } => {
            if let Some(target) = world.enemy_mut(enemy) {
                if !target.dying {
                    target.stunned = stunned;
                }
            } else {
                log::warn!("stun toggle requested for unknown enemy {enemy:?}");
            }
        }
        Command::SetDamageTakenBonus { enemy, percent } => {
            if let Some(target) = world.enemy_mut(enemy) {
                target.damage_taken_multiplier = 1.0 + percent.max(0.0) / 100.0;
            } else {
                log::warn!("damage bonus requested for unknown enemy {enemy:?}");
            }
        }
        Command::ClearDamageTakenBonus { enemy } => {
            if let Some(target) = world.enemy_mut(enemy) {
                target.damage_taken_multiplier = 1.0;
            }
        }
        Command::SplashDamage {
            center,
            radius,
            damage,
            is_percent,
        } => {
            if radius <= 0.0 {
                return;
            }
            let radius_squared = radius * radius;
            let struck: Vec<(EnemyId, f32)> = world
                .enemies
                .iter()
                .filter(|enemy| !enemy.dying)
                .filter(|enemy| enemy.position.distance_squared(center) <= radius_squared)
                .map(|enemy| {
                    let base = if is_percent {
                        enemy.stats.max_hp as f32 * damage / 100.0
                    } else {
                        damage
                    };
                    (enemy.id, base)
                })
                .collect();
            for (enemy, base) in struck {
                world.damage_enemy(enemy, base, 0, out_events);
            }
        }
        Command::MoveEnemy { enemy, position } => {
            if let Some(target) = world.enemy_mut(enemy) {
                // A stunned enemy holds its ground even if a movement
                // collaborator computed the step from a stale view.
                if target.stunned || target.dying {
                    return;
                }
                target.position = position;
            }
        }
        Command::EnemyReachedTower { enemy, tower } => {
            world.explode_enemy(enemy, tower, out_events);
        }
        Command::RemoveEnemy { enemy } => {
            let Some(index) = world.enemies.iter().position(|e| e.id == enemy) else {
                return;
            };
            if !world.enemies[index].dying {
                log::warn!("removal requested for living enemy {enemy:?}");
                return;
            }
            let _ = world.enemies.remove(index);
            out_events.push(Event::EnemyRemoved { enemy });
        }
        Command::PlaceTower { position, max_hp } => {
            let id = world.allocate_tower_id();
            world.towers.push(Tower {
                id,
                hp: max_hp,
                max_hp,
                invulnerable: false,
                position,
            });
            out_events.push(Event::TowerPlaced {
                tower: id,
                position,
                max_hp,
            });
        }
        Command::DamageTower { tower, amount } => {
            world.damage_tower(tower, amount, false, out_events);
        }
        Command::DamageTowerPiercing { tower, amount } => {
            world.damage_tower(tower, amount, true, out_events);
        }
        Command::HealTower { tower, amount } => {
            if let Some(target) = world.tower_mut(tower) {
                if target.hp > 0 {
                    target.hp = target.hp.saturating_add(amount).min(target.max_hp);
                }
            } else {
                log::warn!("heal requested for unknown tower {tower:?}");
            }
        }
        Command::SetTowerInvulnerable {
            tower,
            invulnerable,
        } => {
            if let Some(target) = world.tower_mut(tower) {
                if target.hp > 0 {
                    target.invulnerable = invulnerable;
                }
            } else {
                log::warn!("invulnerability toggle requested for unknown tower {tower:?}");
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use horde_defence_core::{EnemyView, TowerView};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Captures a read-only view of every enemy on the battlefield.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(super::Enemy::snapshot).collect())
    }

    /// Captures a read-only view of every tower on the battlefield.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(super::Tower::snapshot).collect())
    }

    /// Number of ticks the world has processed.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use super::{apply, query, World};
    use horde_defence_core::{
        Command, EnemyId, EnemyKind, EnemyStats, Event, TowerId, WorldPos,
    };
    use std::time::Duration;

    fn stats(kind: EnemyKind, max_hp: u32, armor: u32) -> EnemyStats {
        EnemyStats {
            kind,
            max_hp,
            armor,
            move_speed: 1.0,
            explode_damage_to_tower: 20,
            xp_reward: 5,
            is_boss: matches!(
                kind,
                EnemyKind::BossSkeleton | EnemyKind::BossGoblin | EnemyKind::BossGhoul
            ),
            spawn_weight: 1,
        }
    }

    fn spawn(world: &mut World, kind: EnemyKind, max_hp: u32, armor: u32) -> EnemyId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnEnemy {
                kind,
                stats: stats(kind, max_hp, armor),
                position: WorldPos::new(0.0, 0.0),
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::EnemySpawned { enemy, .. }] => *enemy,
            other => panic!("unexpected spawn events: {other:?}"),
        }
    }

    fn place_tower(world: &mut World, max_hp: u32) -> TowerId {
        let mut events = Vec::new();
        apply(
            world,
            Command::PlaceTower {
                position: WorldPos::new(0.0, 0.0),
                max_hp,
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::TowerPlaced { tower, .. }] => *tower,
            other => panic!("unexpected placement events: {other:?}"),
        }
    }

    #[test]
    fn tick_advances_time_once() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                dt: Duration::from_millis(16),
            }]
        );
        assert_eq!(query::tick_index(&world), 1);
    }

    #[test]
    fn unarmored_enemy_takes_full_damage() {
        let mut world = World::new();
        let enemy = spawn(&mut world, EnemyKind::Ghoul, 100, 0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DamageEnemy {
                enemy,
                base_damage: 25.0,
                armor_pierce: 0,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::EnemyDamaged {
                enemy,
                amount: 25,
                remaining_hp: 75,
            }]
        );
    }

    #[test]
    fn death_is_announced_exactly_once() {
        let mut world = World::new();
        let enemy = spawn(&mut world, EnemyKind::Skeleton, 10, 0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DamageEnemy {
                enemy,
                base_damage: 50.0,
                armor_pierce: 0,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::DamageEnemy {
                enemy,
                base_damage: 50.0,
                armor_pierce: 0,
            },
            &mut events,
        );

        let deaths = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyDied { .. }))
            .count();
        assert_eq!(deaths, 1);
        assert_eq!(query::enemy_view(&world).alive_count(), 0);
    }

    #[test]
    fn damage_taken_bonus_amplifies_hits() {
        let mut world = World::new();
        let enemy = spawn(&mut world, EnemyKind::Ghoul, 100, 0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetDamageTakenBonus {
                enemy,
                percent: 50.0,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::DamageEnemy {
                enemy,
                base_damage: 20.0,
                armor_pierce: 0,
            },
            &mut events,
        );
        assert!(events.contains(&Event::EnemyDamaged {
            enemy,
            amount: 30,
            remaining_hp: 70,
        }));

        apply(
            &mut world,
            Command::ClearDamageTakenBonus { enemy },
            &mut events,
        );
        events.clear();
        apply(
            &mut world,
            Command::DamageEnemy {
                enemy,
                base_damage: 20.0,
                armor_pierce: 0,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::EnemyDamaged {
                enemy,
                amount: 20,
                remaining_hp: 50,
            }]
        );
    }

    #[test]
    fn stunned_enemies_hold_their_ground() {
        let mut world = World::new();
        let enemy = spawn(&mut world, EnemyKind::Ghoul, 50, 0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetEnemyStunned {
                enemy,
                stunned: true,
            },
            &mut events,
        );

        let before = query::enemy_view(&world).into_vec()[0].position;
        apply(
            &mut world,
            Command::MoveEnemy {
                enemy,
                position: WorldPos::new(5.0, 0.0),
            },
            &mut events,
        );
        assert_eq!(query::enemy_view(&world).into_vec()[0].position, before);

        apply(
            &mut world,
            Command::SetEnemyStunned {
                enemy,
                stunned: false,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::MoveEnemy {
                enemy,
                position: WorldPos::new(5.0, 0.0),
            },
            &mut events,
        );
        assert_eq!(
            query::enemy_view(&world).into_vec()[0].position,
            WorldPos::new(5.0, 0.0)
        );
    }

    #[test]
    fn splash_damage_respects_radius_and_percent() {
        let mut world = World::new();
        let near = spawn(&mut world, EnemyKind::Ghoul, 200, 0);
        let far = spawn(&mut world, EnemyKind::Ghoul, 200, 0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveEnemy {
                enemy: far,
                position: WorldPos::new(10.0, 0.0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SplashDamage {
                center: WorldPos::new(0.0, 0.0),
                radius: 3.0,
                damage: 10.0,
                is_percent: true,
            },
            &mut events,
        );

        // 10% of 200 max HP strikes only the enemy inside the radius.
        assert_eq!(
            events,
            vec![Event::EnemyDamaged {
                enemy: near,
                amount: 20,
                remaining_hp: 180,
            }]
        );
    }

    #[test]
    fn ordinary_explosion_hits_only_contacted_tower() {
        let mut world = World::new();
        let struck = place_tower(&mut world, 100);
        let spared = place_tower(&mut world, 100);
        let enemy = spawn(&mut world, EnemyKind::Goblin, 50, 0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::EnemyReachedTower {
                enemy,
                tower: struck,
            },
            &mut events,
        );

        assert!(events.contains(&Event::TowerDamaged {
            tower: struck,
            amount: 20,
            remaining_hp: 80,
        }));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::TowerDamaged { tower, .. } if *tower == spared)));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::EnemyDied { enemy: died, .. } if *died == enemy
        )));
    }

    #[test]
    fn boss_explosion_hits_every_tower_and_shield_halves_it() {
        let mut world = World::new();
        let first = place_tower(&mut world, 100);
        let second = place_tower(&mut world, 100);
        let boss = spawn(&mut world, EnemyKind::BossGhoul, 500, 0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetTowerInvulnerable {
                tower: first,
                invulnerable: true,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::EnemyReachedTower {
                enemy: boss,
                tower: first,
            },
            &mut events,
        );

        // 20 explode damage halves to 10 under the shield and pierces the
        // invulnerability flag on both towers.
        assert!(events.contains(&Event::TowerDamaged {
            tower: first,
            amount: 10,
            remaining_hp: 90,
        }));
        assert!(events.contains(&Event::TowerDamaged {
            tower: second,
            amount: 10,
            remaining_hp: 90,
        }));
    }

    #[test]
    fn invulnerable_tower_blocks_ordinary_damage_only() {
        let mut world = World::new();
        let tower = place_tower(&mut world, 100);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetTowerInvulnerable {
                tower,
                invulnerable: true,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::DamageTower { tower, amount: 30 },
            &mut events,
        );
        assert!(events.is_empty());

        apply(
            &mut world,
            Command::DamageTowerPiercing { tower, amount: 30 },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TowerDamaged {
                tower,
                amount: 30,
                remaining_hp: 70,
            }]
        );
    }

    #[test]
    fn heal_clamps_to_max_hp() {
        let mut world = World::new();
        let tower = place_tower(&mut world, 100);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DamageTower { tower, amount: 40 },
            &mut events,
        );
        apply(
            &mut world,
            Command::HealTower { tower, amount: 90 },
            &mut events,
        );

        let view = query::tower_view(&world);
        let snapshot = view.iter().find(|t| t.id == tower).expect("tower");
        assert_eq!(snapshot.hp, 100);
    }

    #[test]
    fn zero_valued_inputs_are_ignored() {
        let mut world = World::new();
        let enemy = spawn(&mut world, EnemyKind::Ghoul, 100, 0);
        let tower = place_tower(&mut world, 100);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DamageEnemy {
                enemy,
                base_damage: 0.0,
                armor_pierce: 0,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::DamageTower { tower, amount: 0 },
            &mut events,
        );
        apply(
            &mut world,
            Command::SplashDamage {
                center: WorldPos::new(0.0, 0.0),
                radius: 0.0,
                damage: 50.0,
                is_percent: false,
            },
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn removal_prunes_only_dead_enemies() {
        let mut world = World::new();
        let enemy = spawn(&mut world, EnemyKind::Ghoul, 10, 0);

        let mut events = Vec::new();
        apply(&mut world, Command::RemoveEnemy { enemy }, &mut events);
        assert!(events.is_empty());

        apply(
            &mut world,
            Command::DamageEnemy {
                enemy,
                base_damage: 99.0,
                armor_pierce: 0,
            },
            &mut events,
        );
        events.clear();
        apply(&mut world, Command::RemoveEnemy { enemy }, &mut events);
        assert_eq!(events, vec![Event::EnemyRemoved { enemy }]);
        assert!(query::enemy_view(&world).iter().next().is_none());
    }
}
