#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Global ability execution for Horde Defence.
//!
//! Each ability owns an effect window driven by a shared timeline. A window
//! opens when the ability triggers, re-triggering extends the expiry to the
//! later of the two deadlines, and the bound behaviour decides what commands
//! the window emits while open and when it closes. Behaviours are plugged in
//! statically through [`EffectBehaviour`] so adding an ability means adding a
//! strategy type, not growing a match.

use std::collections::BTreeMap;
use std::time::Duration;

use horde_defence_core::{
    AbilityCatalog, AbilityLevel, Command, EnemyView, Event, GlobalAbility, TowerView, WorldPos,
};

pub mod effects;

use effects::{CannonEffect, HowlEffect, ShieldEffect, StunEffect};

/// Immutable inputs handed to an effect behaviour for a single callback.
pub struct EffectContext<'a> {
    /// Session time at the callback.
    pub now: Duration,
    /// Time advanced since the previous callback; zero during activation.
    pub dt: Duration,
    /// Level payload the window is running at.
    pub level: &'a AbilityLevel,
    /// Current enemy view.
    pub enemies: &'a EnemyView,
    /// Current tower view.
    pub towers: &'a TowerView,
}

/// Mutable sinks an effect behaviour writes its outcome into.
pub struct EffectSink<'a> {
    /// Commands queued for the world.
    pub commands: &'a mut Vec<Command>,
    /// Events announced to other systems.
    pub events: &'a mut Vec<Event>,
}

/// Strategy bound to an effect window.
///
/// `on_activate` runs on every trigger, including re-triggers of an already
/// open window. `on_tick` runs once per frame while the window is open, and
/// `on_expire` runs exactly once when the window closes.
pub trait EffectBehaviour {
    /// Reacts to the window opening or re-triggering.
    fn on_activate(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>);
    /// Reacts to a frame elapsing while the window is open.
    fn on_tick(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>);
    /// Reacts to the window closing.
    fn on_expire(&mut self, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>);
}

/// Timed window pairing an expiry deadline with a behaviour.
#[derive(Debug)]
struct EffectWindow<B> {
    behaviour: B,
    expires_at: Option<Duration>,
    level: usize,
}

impl<B: EffectBehaviour> EffectWindow<B> {
    fn new(behaviour: B) -> Self {
        Self {
            behaviour,
            expires_at: None,
            level: 0,
        }
    }

    /// Opens or re-triggers the window. The expiry only ever moves to the
    /// later deadline; a weaker re-trigger never shortens an open window.
    fn activate(&mut self, level_index: usize, ctx: &EffectContext<'_>, sink: &mut EffectSink<'_>) {
        let candidate = ctx.now + ctx.level.duration;
        self.expires_at = Some(match self.expires_at {
            Some(current) => current.max(candidate),
            None => candidate,
        });
        self.level = level_index;
        self.behaviour.on_activate(ctx, sink);
    }
}

/// Drives one window for a frame, closing it when its deadline passed.
fn drive<B: EffectBehaviour>(
    window: &mut EffectWindow<B>,
    ability: GlobalAbility,
    catalog: &AbilityCatalog,
    now: Duration,
    dt: Duration,
    enemies: &EnemyView,
    towers: &TowerView,
    out_commands: &mut Vec<Command>,
    out_events: &mut Vec<Event>,
) {
    let Some(expires_at) = window.expires_at else {
        return;
    };
    let Some(level) = catalog.level(ability, window.level) else {
        return;
    };
    let ctx = EffectContext {
        now,
        dt,
        level,
        enemies,
        towers,
    };
    let mut sink = EffectSink {
        commands: out_commands,
        events: out_events,
    };
    window.behaviour.on_tick(&ctx, &mut sink);
    if now >= expires_at {
        window.expires_at = None;
        window.behaviour.on_expire(&ctx, &mut sink);
        sink.events.push(Event::AbilityExpired { ability });
    }
}

/// Pure system executing the player's global abilities.
#[derive(Debug)]
pub struct AbilityExecutor {
    catalog: AbilityCatalog,
    clock: Duration,
    ready_at: BTreeMap<GlobalAbility, Duration>,
    stun: EffectWindow<StunEffect>,
    howl: EffectWindow<HowlEffect>,
    shield: EffectWindow<ShieldEffect>,
    cannon: EffectWindow<CannonEffect>,
}

impl AbilityExecutor {
    /// Creates an executor over the provided ability catalog.
    #[must_use]
    pub fn new(catalog: AbilityCatalog) -> Self {
        Self {
            catalog,
            clock: Duration::ZERO,
            ready_at: BTreeMap::new(),
            stun: EffectWindow::new(StunEffect::default()),
            howl: EffectWindow::new(HowlEffect::default()),
            shield: EffectWindow::new(ShieldEffect::default()),
            cannon: EffectWindow::new(CannonEffect::default()),
        }
    }

    /// Session time observed by the executor.
    #[must_use]
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Whether the ability is off cooldown and may trigger.
    #[must_use]
    pub fn is_ready(&self, ability: GlobalAbility) -> bool {
        self.ready_at
            .get(&ability)
            .map_or(true, |ready_at| self.clock >= *ready_at)
    }

    /// Attempts to trigger an ability at the provided level.
    ///
    /// `target` is required by [`GlobalAbility::Cannon`] and ignored by the
    /// other abilities. Returns whether the trigger was accepted; cooldown
    /// rejections, unconfigured levels, and zero-duration levels leave all
    /// state untouched.
    pub fn trigger(
        &mut self,
        ability: GlobalAbility,
        level_index: usize,
        target: Option<WorldPos>,
        enemies: &EnemyView,
        towers: &TowerView,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(level) = self.catalog.level(ability, level_index) else {
            log::warn!("trigger requested for unconfigured {ability:?} level {level_index}");
            return false;
        };
        let level = level.clone();
        if level.duration.is_zero() {
            log::warn!("trigger requested for zero-duration {ability:?} level {level_index}");
            return false;
        }
        if !self.is_ready(ability) {
            return false;
        }
        if ability == GlobalAbility::Cannon && target.is_none() {
            log::warn!("cannon trigger requested without an impact target");
            return false;
        }

        let _ = self.ready_at.insert(ability, self.clock + level.cooldown);
        let ctx = EffectContext {
            now: self.clock,
            dt: Duration::ZERO,
            level: &level,
            enemies,
            towers,
        };
        let mut sink = EffectSink {
            commands: out_commands,
            events: out_events,
        };
        match ability {
            GlobalAbility::Stun => self.stun.activate(level_index, &ctx, &mut sink),
            GlobalAbility::Howl => self.howl.activate(level_index, &ctx, &mut sink),
            GlobalAbility::Shield => self.shield.activate(level_index, &ctx, &mut sink),
            GlobalAbility::Cannon => {
                if let Some(target) = target {
                    self.cannon.behaviour.aim(target);
                }
                self.cannon.activate(level_index, &ctx, &mut sink);
            }
        }
        sink.events.push(Event::AbilityActivated {
            ability,
            level: level_index as u32,
        });
        true
    }

    /// Consumes events and the current views to advance every open window.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        towers: &TowerView,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        let mut dt = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt: step } = event {
                dt = dt.saturating_add(*step);
            }
        }
        self.clock = self.clock.saturating_add(dt);

        drive(
            &mut self.stun,
            GlobalAbility::Stun,
            &self.catalog,
            self.clock,
            dt,
            enemies,
            towers,
            out_commands,
            out_events,
        );
        drive(
            &mut self.howl,
            GlobalAbility::Howl,
            &self.catalog,
            self.clock,
            dt,
            enemies,
            towers,
            out_commands,
            out_events,
        );
        drive(
            &mut self.shield,
            GlobalAbility::Shield,
            &self.catalog,
            self.clock,
            dt,
            enemies,
            towers,
            out_commands,
            out_events,
        );
        drive(
            &mut self.cannon,
            GlobalAbility::Cannon,
            &self.catalog,
            self.clock,
            dt,
            enemies,
            towers,
            out_commands,
            out_events,
        );
    }
}
