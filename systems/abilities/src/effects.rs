//! Effect behaviours bound to the ability windows.
//!
//! Each behaviour tracks which entities it touched so expiry only reverts
//! survivors; entities that died mid-window are pruned without emitting exit
//! mutations for them.

use std::collections::BTreeSet;

use horde_defence_core::{AbilityLevel, Command, EnemyId, EnemySnapshot, Event, TowerId, WorldPos};

use crate::{EffectBehaviour, EffectContext, EffectSink};

fn one_shot_base(level: &AbilityLevel, target: &EnemySnapshot) -> f32 {
    if level.is_percent {
        target.max_hp as f32 * level.damage / 100.0
    } else {
        level.damage
    }
}

/// Halts every enemy for the window and deals one-shot damage on each cast.
#[derive(Debug, Default)]
pub struct StunEffect {
    captured: BTreeSet<EnemyId>,
}

impl StunEffect {
    fn capture_alive(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        for snapshot in ctx.enemies.iter_alive() {
            if self.captured.insert(snapshot.id) {
                sink.commands.push(Command::SetEnemyStunned {
                    enemy: snapshot.id,
                    stunned: true,
                });
            }
        }
    }

    fn prune_dead(&mut self, ctx: &EffectContext<'_>) {
        let alive: BTreeSet<EnemyId> =
            ctx.enemies.iter_alive().map(|snapshot| snapshot.id).collect();
        self.captured.retain(|id| alive.contains(id));
    }
}

impl EffectBehaviour for StunEffect {
    fn on_activate(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        for snapshot in ctx.enemies.iter_alive() {
            sink.commands.push(Command::DamageEnemy {
                enemy: snapshot.id,
                base_damage: one_shot_base(ctx.level, snapshot),
                armor_pierce: 0,
            });
        }
        self.capture_alive(ctx, sink);
    }

    fn on_tick(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        self.prune_dead(ctx);
        self.capture_alive(ctx, sink);
    }

    fn on_expire(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        self.prune_dead(ctx);
        for id in std::mem::take(&mut self.captured) {
            sink.commands.push(Command::SetEnemyStunned {
                enemy: id,
                stunned: false,
            });
        }
    }
}

/// Amplifies damage taken by every enemy for the window.
///
/// The bonus percentage lives in the level's `damage` field; re-triggering
/// at a new level re-applies the new percentage to everyone.
#[derive(Debug, Default)]
pub struct HowlEffect {
    affected: BTreeSet<EnemyId>,
}

impl HowlEffect {
    fn apply(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>, refresh: bool) {
        for snapshot in ctx.enemies.iter_alive() {
            if self.affected.insert(snapshot.id) || refresh {
                sink.commands.push(Command::SetDamageTakenBonus {
                    enemy: snapshot.id,
                    percent: ctx.level.damage,
                });
            }
        }
    }

    fn prune_dead(&mut self, ctx: &EffectContext<'_>) {
        let alive: BTreeSet<EnemyId> =
            ctx.enemies.iter_alive().map(|snapshot| snapshot.id).collect();
        self.affected.retain(|id| alive.contains(id));
    }
}

impl EffectBehaviour for HowlEffect {
    fn on_activate(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        self.apply(ctx, sink, true);
    }

    fn on_tick(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        self.prune_dead(ctx);
        self.apply(ctx, sink, false);
    }

    fn on_expire(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        self.prune_dead(ctx);
        for id in std::mem::take(&mut self.affected) {
            sink.commands.push(Command::ClearDamageTakenBonus { enemy: id });
        }
    }
}

/// Renders every standing tower invulnerable for the window.
#[derive(Debug, Default)]
pub struct ShieldEffect {
    covered: BTreeSet<TowerId>,
}

impl ShieldEffect {
    fn cover_standing(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        for snapshot in ctx.towers.iter_standing() {
            let newly_covered = self.covered.insert(snapshot.id);
            // Re-assert the flag while the window is open; another system
            // may have toggled it off since the last frame.
            if newly_covered || !snapshot.invulnerable {
                sink.commands.push(Command::SetTowerInvulnerable {
                    tower: snapshot.id,
                    invulnerable: true,
                });
            }
        }
    }

    fn prune_destroyed(&mut self, ctx: &EffectContext<'_>) {
        let standing: BTreeSet<TowerId> = ctx
            .towers
            .iter_standing()
            .map(|snapshot| snapshot.id)
            .collect();
        self.covered.retain(|id| standing.contains(id));
    }
}

impl EffectBehaviour for ShieldEffect {
    fn on_activate(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        self.cover_standing(ctx, sink);
    }

    fn on_tick(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        self.prune_destroyed(ctx);
        self.cover_standing(ctx, sink);
    }

    fn on_expire(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        self.prune_destroyed(ctx);
        for id in std::mem::take(&mut self.covered) {
            sink.commands.push(Command::SetTowerInvulnerable {
                tower: id,
                invulnerable: false,
            });
        }
    }
}

/// Bombards an impact point on a fixed cadence for the window.
#[derive(Debug, Default)]
pub struct CannonEffect {
    target: Option<WorldPos>,
    next_shot_at: Option<std::time::Duration>,
}

impl CannonEffect {
    /// Sets the impact point for the next activation.
    pub fn aim(&mut self, target: WorldPos) {
        self.target = Some(target);
    }

    fn fire(target: WorldPos, level: &AbilityLevel, sink: &mut EffectSink<'_>) {
        sink.events.push(Event::CannonFired { target });
        sink.commands.push(Command::SplashDamage {
            center: target,
            radius: level.splash_radius,
            damage: level.damage,
            is_percent: level.is_percent,
        });
    }
}

impl EffectBehaviour for CannonEffect {
    fn on_activate(&mut self, ctx: &EffectContext<'_>, _sink: &mut EffectSink<'_>) {
        self.next_shot_at = Some(ctx.now + ctx.level.start_fire_delay);
    }

    fn on_tick(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        let Some(target) = self.target else {
            return;
        };
        let Some(mut next_shot_at) = self.next_shot_at else {
            return;
        };
        while next_shot_at <= ctx.now {
            Self::fire(target, ctx.level, sink);
            if ctx.level.fire_cooldown.is_zero() {
                // Zero cadence degrades to one shot per frame.
                next_shot_at = ctx.now + std::time::Duration::from_nanos(1);
                break;
            }
            next_shot_at += ctx.level.fire_cooldown;
        }
        self.next_shot_at = Some(next_shot_at);
    }

    fn on_expire(&mut self, _ctx: &EffectContext<'_>, _sink: &mut EffectSink<'_>) {
        self.target = None;
        self.next_shot_at = None;
    }
}
