//! Pure damage resolution shared by the enemy and tower damage paths.
//!
//! Armor grants 6% damage reduction per point up to a 60% cap, armor pierce
//! subtracts points before the reduction is computed, and an externally
//! applied damage-taken multiplier scales the raw damage. Every resolved hit
//! deals at least 1 damage regardless of mitigation; this floor is a balance
//! rule that keeps heavily armoured enemies killable, not a bug.

/// Damage reduction granted by a single armor point.
pub const REDUCTION_PER_ARMOR: f64 = 0.06;

/// Upper bound on the total armor damage reduction.
pub const REDUCTION_CAP: f64 = 0.60;

/// Lower bound on the externally applied damage-taken multiplier.
pub const MIN_DAMAGE_TAKEN_MULTIPLIER: f64 = 0.01;

/// Resolves a raw hit into the hit points it removes.
///
/// `damage_taken_multiplier` of 1.0 means no modifier; a Howl-style effect
/// passes 1.5 for +50% damage taken. Non-positive base damage still resolves
/// to the 1-damage floor, matching the reference behaviour where every
/// connected hit chips at least one hit point.
///
/// The arithmetic runs in f64 so the `ceil` at the end lands exactly on the
/// integer boundaries the reduction fractions produce (100 base against the
/// 60% cap is 40, never 41).
#[must_use]
pub fn resolve_damage(
    base_damage: f32,
    armor: u32,
    armor_pierce: u32,
    damage_taken_multiplier: f32,
) -> u32 {
    let reduction = reduction_fraction(armor, armor_pierce);
    let multiplier = f64::from(damage_taken_multiplier).max(MIN_DAMAGE_TAKEN_MULTIPLIER);
    let modified_base = f64::from(base_damage).max(0.0) * multiplier;

    let mitigated = (modified_base * (1.0 - reduction)).ceil();
    if mitigated < 1.0 {
        1
    } else {
        mitigated as u32
    }
}

/// Computes the reduction fraction applied for the provided armor values.
#[must_use]
pub fn reduction_fraction(armor: u32, armor_pierce: u32) -> f64 {
    let effective_armor = armor.saturating_sub(armor_pierce);
    (REDUCTION_PER_ARMOR * f64::from(effective_armor)).min(REDUCTION_CAP)
}

#[cfg(test)]
mod tests {
    use super::{reduction_fraction, resolve_damage};

    #[test]
    fn armor_reduces_six_percent_per_point() {
        assert!((reduction_fraction(5, 0) - 0.30).abs() < f64::EPSILON);
        assert!((reduction_fraction(1, 0) - 0.06).abs() < f64::EPSILON);
    }

    #[test]
    fn reduction_caps_at_sixty_percent() {
        assert!((reduction_fraction(10, 0) - 0.60).abs() < f64::EPSILON);
        assert!((reduction_fraction(250, 0) - 0.60).abs() < f64::EPSILON);
    }

    #[test]
    fn pierce_subtracts_before_reduction() {
        assert!((reduction_fraction(5, 2) - 0.18).abs() < f64::EPSILON);
        assert!((reduction_fraction(2, 5) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn at_least_one_damage_is_always_dealt() {
        for armor in 0..64 {
            for pierce in 0..8 {
                assert!(resolve_damage(0.5, armor, pierce, 1.0) >= 1);
                assert!(resolve_damage(100.0, armor, pierce, 1.0) >= 1);
            }
        }
        assert_eq!(resolve_damage(0.0, 0, 0, 1.0), 1);
        assert_eq!(resolve_damage(-25.0, 0, 0, 1.0), 1);
    }

    #[test]
    fn unarmored_damage_passes_through() {
        assert_eq!(resolve_damage(25.0, 0, 0, 1.0), 25);
    }

    #[test]
    fn capped_armor_keeps_forty_percent() {
        // armor 10 hits the 60% cap, so 100 damage resolves to 40.
        assert_eq!(resolve_damage(100.0, 10, 0, 1.0), 40);
    }

    #[test]
    fn multiplier_amplifies_before_mitigation() {
        // +50% taken on 20 base with 30% reduction: ceil(30 * 0.7) = 21.
        assert_eq!(resolve_damage(20.0, 5, 0, 1.5), 21);
    }

    #[test]
    fn multiplier_is_floored_to_keep_damage_positive() {
        assert!(resolve_damage(100.0, 0, 0, 0.0) >= 1);
        assert!(resolve_damage(100.0, 0, 0, -3.0) >= 1);
    }

    #[test]
    fn fractional_results_round_up() {
        // 10 base, armor 1: 10 * 0.94 = 9.4 -> 10.
        assert_eq!(resolve_damage(10.0, 1, 0, 1.0), 10);
    }
}
