//! Constant-time weighted mob kind selection (Vose's alias method).
//!
//! One table is built per zone when the zone table is loaded. Sampling draws
//! a uniform column and a uniform `[0, 1)` value and never allocates.

use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use crate::mob_registry::{MobKind, MobRegistry};
use crate::zone::{ZoneId, ZoneTable, FALLBACK_ZONE};

/// Kind used when a zone has nothing eligible.
pub const FALLBACK_KIND: MobKind = MobKind::Walker;

/// Selection weight for a difficulty tier.
pub fn tier_weight(tier: u8) -> f64 {
    match tier {
        1 => 100.0,
        2 => 60.0,
        3 => 30.0,
        4 => 12.0,
        5 => 4.0,
        _ => 50.0,
    }
}

/// Precomputed alias table over a set of kinds.
#[derive(Debug, Clone)]
pub struct WeightedTable {
    kinds: Vec<MobKind>,
    prob: Vec<f64>,
    alias: Vec<usize>,
}

impl WeightedTable {
    /// Build a table from `(kind, weight)` pairs. Non-positive weights are
    /// dropped; returns `None` if nothing remains.
    pub fn build(entries: &[(MobKind, f64)]) -> Option<Self> {
        let entries: Vec<(MobKind, f64)> = entries
            .iter()
            .copied()
            .filter(|(_, w)| *w > 0.0 && w.is_finite())
            .collect();
        if entries.is_empty() {
            return None;
        }

        let n = entries.len();
        let total: f64 = entries.iter().map(|(_, w)| w).sum();
        // Scale so the average column weight is 1.0
        let mut scaled: Vec<f64> = entries.iter().map(|(_, w)| w * n as f64 / total).collect();

        let mut prob = vec![0.0; n];
        let mut alias = vec![0; n];
        let mut small = Vec::with_capacity(n);
        let mut large = Vec::with_capacity(n);
        for (i, &p) in scaled.iter().enumerate() {
            if p < 1.0 {
                small.push(i);
            } else {
                large.push(i);
            }
        }

        while let (Some(&s), Some(&l)) = (small.last(), large.last()) {
            small.pop();
            large.pop();
            prob[s] = scaled[s];
            alias[s] = l;
            scaled[l] = (scaled[l] + scaled[s]) - 1.0;
            if scaled[l] < 1.0 {
                small.push(l);
            } else {
                large.push(l);
            }
        }
        // Leftovers are full columns (small ones only through rounding error)
        for i in large.into_iter().chain(small) {
            prob[i] = 1.0;
            alias[i] = i;
        }

        Some(Self {
            kinds: entries.into_iter().map(|(k, _)| k).collect(),
            prob,
            alias,
        })
    }

    /// Table that always yields `kind`.
    pub fn single(kind: MobKind) -> Self {
        Self {
            kinds: vec![kind],
            prob: vec![1.0],
            alias: vec![0],
        }
    }

    /// Draw one kind.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> MobKind {
        let column = rng.gen_range(0..self.kinds.len());
        if rng.gen::<f64>() < self.prob[column] {
            self.kinds[column]
        } else {
            self.kinds[self.alias[column]]
        }
    }

    pub fn kinds(&self) -> &[MobKind] {
        &self.kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Exact probability the table yields `kind`.
    pub fn probability_of(&self, kind: MobKind) -> f64 {
        let n = self.kinds.len() as f64;
        let mut p = 0.0;
        for column in 0..self.kinds.len() {
            if self.kinds[column] == kind {
                p += self.prob[column] / n;
            }
            if self.kinds[self.alias[column]] == kind {
                p += (1.0 - self.prob[column]) / n;
            }
        }
        p
    }
}

/// Per-zone alias tables over naturally spawning, non-boss kinds.
#[derive(Debug, Clone)]
pub struct WeightedTypeSelector {
    tables: HashMap<ZoneId, WeightedTable>,
    fallback: WeightedTable,
}

impl WeightedTypeSelector {
    /// Build every zone's table eagerly.
    pub fn build(registry: &MobRegistry, zones: &ZoneTable) -> Self {
        let mut tables = HashMap::with_capacity(zones.len());
        for zone in zones.ids() {
            let entries: Vec<(MobKind, f64)> = registry
                .natural_spawns(zone)
                .map(|d| (d.kind, tier_weight(d.tier)))
                .collect();
            let table = WeightedTable::build(&entries).unwrap_or_else(|| {
                debug!("Zone {zone} has no eligible mob kinds, using {FALLBACK_KIND:?}");
                WeightedTable::single(FALLBACK_KIND)
            });
            tables.insert(zone, table);
        }
        Self {
            tables,
            fallback: WeightedTable::single(FALLBACK_KIND),
        }
    }

    /// Table for `zone`, falling back to zone 1 and then the fixed lowest tier.
    pub fn table(&self, zone: ZoneId) -> &WeightedTable {
        self.tables
            .get(&zone)
            .or_else(|| self.tables.get(&FALLBACK_ZONE))
            .unwrap_or(&self.fallback)
    }

    /// Pick a kind for a spawn in `zone`.
    pub fn select<R: Rng + ?Sized>(&self, zone: ZoneId, rng: &mut R) -> MobKind {
        self.table(zone).sample(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn two_tier_ratio_matches_weights() {
        let table =
            WeightedTable::build(&[(MobKind::Walker, 100.0), (MobKind::Stray, 60.0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut walkers = 0u32;
        let mut strays = 0u32;
        for _ in 0..100_000 {
            match table.sample(&mut rng) {
                MobKind::Walker => walkers += 1,
                MobKind::Stray => strays += 1,
                other => panic!("unexpected kind {other:?}"),
            }
        }
        let ratio = walkers as f64 / strays as f64;
        assert!((ratio - 100.0 / 60.0).abs() < 0.05, "ratio {ratio}");
    }

    #[test]
    fn alias_probabilities_are_exact() {
        let entries = [
            (MobKind::Walker, 100.0),
            (MobKind::Armored, 60.0),
            (MobKind::Berserker, 30.0),
            (MobKind::Colossus, 12.0),
            (MobKind::Archon, 4.0),
        ];
        let table = WeightedTable::build(&entries).unwrap();
        let total: f64 = entries.iter().map(|(_, w)| w).sum();
        for (kind, w) in entries {
            assert!((table.probability_of(kind) - w / total).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_weights_dropped() {
        assert!(WeightedTable::build(&[]).is_none());
        assert!(WeightedTable::build(&[(MobKind::Walker, 0.0)]).is_none());
        let t = WeightedTable::build(&[(MobKind::Walker, 0.0), (MobKind::Runner, 5.0)]).unwrap();
        assert_eq!(t.kinds(), &[MobKind::Runner]);
    }

    #[test]
    fn tier_weight_table() {
        assert_eq!(tier_weight(1), 100.0);
        assert_eq!(tier_weight(5), 4.0);
        assert_eq!(tier_weight(0), 50.0);
        assert_eq!(tier_weight(9), 50.0);
    }

    #[test]
    fn zone_without_kinds_yields_fallback() {
        let registry = MobRegistry::new();
        let zones = ZoneTable::generated(50, 100);
        let selector = WeightedTypeSelector::build(&registry, &zones);
        let mut rng = StdRng::seed_from_u64(1);
        // The spawn zone has no natural kinds
        assert_eq!(selector.table(0).kinds(), &[FALLBACK_KIND]);
        assert_eq!(selector.select(0, &mut rng), FALLBACK_KIND);
    }

    #[test]
    fn selection_never_returns_bosses_or_ineligible() {
        let registry = MobRegistry::new();
        let zones = ZoneTable::generated(50, 100);
        let selector = WeightedTypeSelector::build(&registry, &zones);
        let mut rng = StdRng::seed_from_u64(99);
        for zone in 1..=50 {
            for _ in 0..200 {
                let kind = selector.select(zone, &mut rng);
                let def = registry.get(kind).unwrap();
                assert!(!def.is_boss(), "zone {zone} produced boss {kind:?}");
                assert!(def.spawns_in(zone), "zone {zone} produced {kind:?}");
            }
        }
    }

    #[test]
    fn unknown_zone_uses_zone_one_table() {
        let registry = MobRegistry::new();
        let zones = ZoneTable::generated(5, 100);
        let selector = WeightedTypeSelector::build(&registry, &zones);
        assert_eq!(selector.table(1234).kinds(), selector.table(1).kinds());
    }
}
