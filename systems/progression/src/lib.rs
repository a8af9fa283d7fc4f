#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player experience and level progression for Horde Defence.
//!
//! The system credits the experience reward carried by every death
//! announcement, walks the progression table for level-ups (a single large
//! award may advance several levels at once), and reports progress through
//! [`Event::ExperienceGained`] and [`Event::PlayerLevelledUp`].

use horde_defence_core::{AbilityCatalog, Event, GlobalAbility, ProgressionTable};

/// Pure system accumulating player experience across a session.
#[derive(Debug)]
pub struct Progression {
    table: ProgressionTable,
    level: u32,
    into_level: u32,
    total: u64,
}

impl Progression {
    /// Creates a progression tracker at level 1 with no experience.
    #[must_use]
    pub fn new(table: ProgressionTable) -> Self {
        Self {
            table,
            level: 1,
            into_level: 0,
            total: 0,
        }
    }

    /// Current one-based player level.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Experience accumulated toward the next level.
    #[must_use]
    pub fn into_level(&self) -> u32 {
        self.into_level
    }

    /// Total experience credited this session.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Experience still required to reach the next level; zero at max level.
    #[must_use]
    pub fn to_next(&self) -> u32 {
        self.table
            .requirement(self.level)
            .map_or(0, |requirement| requirement.saturating_sub(self.into_level))
    }

    /// Level index abilities run at for the current player level, clamped to
    /// the levels the catalog actually configures.
    #[must_use]
    pub fn ability_level_index(&self, catalog: &AbilityCatalog, ability: GlobalAbility) -> usize {
        let unlocked = self.level.saturating_sub(1) as usize;
        unlocked.min(catalog.max_level_index(ability))
    }

    /// Returns the tracker to its initial state for a fresh session.
    pub fn reset(&mut self) {
        self.level = 1;
        self.into_level = 0;
        self.total = 0;
    }

    /// Consumes events and credits every announced experience reward.
    pub fn handle(&mut self, events: &[Event], out_events: &mut Vec<Event>) {
        for event in events {
            if let Event::EnemyDied { xp_reward, .. } = event {
                if *xp_reward > 0 {
                    self.award(*xp_reward, out_events);
                }
            }
        }
    }

    fn award(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        self.total = self.total.saturating_add(u64::from(amount));
        self.into_level = self.into_level.saturating_add(amount);

        let mut gained = 0;
        while let Some(requirement) = self.table.requirement(self.level) {
            if self.into_level < requirement {
                break;
            }
            self.into_level -= requirement;
            self.level += 1;
            gained += 1;
        }
        if self.table.requirement(self.level).is_none() {
            // Max level: surplus experience is discarded.
            self.into_level = 0;
        }

        out_events.push(Event::ExperienceGained {
            into_level: self.into_level,
            to_next: self.to_next(),
            total: self.total,
        });
        if gained > 0 {
            out_events.push(Event::PlayerLevelledUp {
                level: self.level,
                gained,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_defence_core::{EnemyId, EnemyKind};
    use std::collections::BTreeMap;

    fn table() -> ProgressionTable {
        ProgressionTable {
            xp_to_next: vec![10, 20, 40],
        }
    }

    fn kill(xp_reward: u32) -> Vec<Event> {
        vec![Event::EnemyDied {
            enemy: EnemyId::new(0),
            kind: EnemyKind::Ghoul,
            xp_reward,
        }]
    }

    #[test]
    fn small_award_reports_progress_without_level_up() {
        let mut progression = Progression::new(table());
        let mut events = Vec::new();
        progression.handle(&kill(4), &mut events);
        assert_eq!(
            events,
            vec![Event::ExperienceGained {
                into_level: 4,
                to_next: 6,
                total: 4,
            }]
        );
        assert_eq!(progression.level(), 1);
    }

    #[test]
    fn large_award_advances_multiple_levels_at_once() {
        let mut progression = Progression::new(table());
        let mut events = Vec::new();
        progression.handle(&kill(35), &mut events);
        assert_eq!(
            events,
            vec![
                Event::ExperienceGained {
                    into_level: 5,
                    to_next: 35,
                    total: 35,
                },
                Event::PlayerLevelledUp { level: 3, gained: 2 },
            ]
        );
    }

    #[test]
    fn zero_reward_deaths_are_ignored() {
        let mut progression = Progression::new(table());
        let mut events = Vec::new();
        progression.handle(&kill(0), &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn max_level_discards_surplus_experience() {
        let mut progression = Progression::new(table());
        let mut events = Vec::new();
        progression.handle(&kill(100), &mut events);
        assert_eq!(progression.level(), 4);
        assert_eq!(progression.into_level(), 0);
        assert_eq!(progression.to_next(), 0);

        events.clear();
        progression.handle(&kill(50), &mut events);
        assert_eq!(
            events,
            vec![Event::ExperienceGained {
                into_level: 0,
                to_next: 0,
                total: 150,
            }]
        );
    }

    #[test]
    fn ability_levels_follow_the_player_level() {
        let mut entries = BTreeMap::new();
        let _ = entries.insert(
            GlobalAbility::Stun,
            vec![
                horde_defence_core::AbilityLevel {
                    cooldown: std::time::Duration::from_secs(10),
                    duration: std::time::Duration::from_secs(3),
                    damage: 5.0,
                    is_percent: false,
                    splash_radius: 0.0,
                    start_fire_delay: std::time::Duration::ZERO,
                    fire_cooldown: std::time::Duration::ZERO,
                },
                horde_defence_core::AbilityLevel {
                    cooldown: std::time::Duration::from_secs(8),
                    duration: std::time::Duration::from_secs(4),
                    damage: 8.0,
                    is_percent: false,
                    splash_radius: 0.0,
                    start_fire_delay: std::time::Duration::ZERO,
                    fire_cooldown: std::time::Duration::ZERO,
                },
            ],
        );
        let catalog = AbilityCatalog::new(entries);

        let mut progression = Progression::new(table());
        assert_eq!(progression.ability_level_index(&catalog, GlobalAbility::Stun), 0);

        let mut events = Vec::new();
        progression.handle(&kill(100), &mut events);
        assert_eq!(progression.level(), 4);
        // Clamped to the highest configured level.
        assert_eq!(progression.ability_level_index(&catalog, GlobalAbility::Stun), 1);
    }

    #[test]
    fn reset_returns_to_the_initial_state() {
        let mut progression = Progression::new(table());
        let mut events = Vec::new();
        progression.handle(&kill(35), &mut events);
        progression.reset();
        assert_eq!(progression.level(), 1);
        assert_eq!(progression.into_level(), 0);
        assert_eq!(progression.total(), 0);
    }
}
