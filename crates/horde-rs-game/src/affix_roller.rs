//! Per-zone affix rolls.

use std::sync::Arc;

use rand::Rng;

use crate::affix::{Affix, AffixRegistry};
use crate::mob_registry::MobDefinition;
use crate::zone::ZoneId;

/// Chance of an affix by zone id. Zone 6 (the PvP zone) is tuned above zone 7.
pub const DEFAULT_AFFIX_CURVE: [f64; 12] = [
    0.00, 0.03, 0.05, 0.08, 0.12, 0.15, 0.20, 0.18, 0.22, 0.28, 0.35, 0.45,
];

/// Chance that an affixed mob rolls a second, different affix.
pub const DEFAULT_DOUBLE_AFFIX_CURVE: [f64; 12] = [
    0.00, 0.00, 0.00, 0.00, 0.02, 0.03, 0.05, 0.05, 0.08, 0.10, 0.15, 0.25,
];

/// Decides which affixes a new mob carries.
#[derive(Debug, Clone)]
pub struct AffixRoller {
    curve: Vec<f64>,
    double_curve: Vec<f64>,
    registry: AffixRegistry,
}

fn clamp_curve(curve: Vec<f64>) -> Vec<f64> {
    curve.into_iter().map(|c| c.clamp(0.0, 1.0)).collect()
}

fn curve_value(curve: &[f64], zone: ZoneId) -> f64 {
    curve
        .get(zone as usize)
        .or_else(|| curve.last())
        .copied()
        .unwrap_or(0.0)
}

impl AffixRoller {
    pub fn new(registry: AffixRegistry) -> Self {
        Self::with_curve(registry, DEFAULT_AFFIX_CURVE.to_vec())
    }

    /// Custom curve; values are clamped to `[0, 1]`.
    pub fn with_curve(registry: AffixRegistry, curve: Vec<f64>) -> Self {
        Self {
            curve: clamp_curve(curve),
            double_curve: DEFAULT_DOUBLE_AFFIX_CURVE.to_vec(),
            registry,
        }
    }

    /// Replace the second-affix curve.
    pub fn with_double_curve(mut self, curve: Vec<f64>) -> Self {
        self.double_curve = clamp_curve(curve);
        self
    }

    /// Affix chance in `zone`. Zones past the end of the curve use its last value.
    pub fn chance(&self, zone: ZoneId) -> f64 {
        curve_value(&self.curve, zone)
    }

    /// Chance of a second affix once the first one is rolled.
    pub fn double_chance(&self, zone: ZoneId) -> f64 {
        curve_value(&self.double_curve, zone)
    }

    pub fn registry(&self) -> &AffixRegistry {
        &self.registry
    }

    /// Roll for a mob of `def` spawning in `zone`: no affix, one, or two
    /// distinct ones. Bosses never get an affix.
    pub fn roll<R: Rng + ?Sized>(
        &self,
        zone: ZoneId,
        def: &MobDefinition,
        rng: &mut R,
    ) -> Vec<Arc<Affix>> {
        if def.is_boss() {
            return Vec::new();
        }
        let chance = self.chance(zone);
        if chance <= 0.0 || rng.gen::<f64>() >= chance {
            return Vec::new();
        }
        let Some(first) = self.pick(zone, rng) else {
            return Vec::new();
        };
        let double = self.double_chance(zone);
        let second = if double > 0.0 && rng.gen::<f64>() < double {
            self.pick_excluding(zone, Some(first.id.as_str()), rng)
        } else {
            None
        };
        std::iter::once(first).chain(second).collect()
    }

    /// Cumulative-weight scan over affixes allowed in `zone`.
    pub fn pick<R: Rng + ?Sized>(&self, zone: ZoneId, rng: &mut R) -> Option<Arc<Affix>> {
        self.pick_excluding(zone, None, rng)
    }

    fn pick_excluding<R: Rng + ?Sized>(
        &self,
        zone: ZoneId,
        exclude: Option<&str>,
        rng: &mut R,
    ) -> Option<Arc<Affix>> {
        let candidates: Vec<&Arc<Affix>> = self
            .registry
            .all()
            .iter()
            .filter(|a| a.min_zone <= zone && a.weight > 0)
            .filter(|a| exclude != Some(a.id.as_str()))
            .collect();
        let first = candidates.first()?;

        let total: u32 = candidates.iter().map(|a| a.weight).sum();
        let roll = rng.gen_range(0..total);
        let mut cumulative = 0;
        for affix in &candidates {
            cumulative += affix.weight;
            if roll < cumulative {
                return Some(Arc::clone(affix));
            }
        }
        Some(Arc::clone(first))
    }
}
