//! Difficulty zones and the table that resolves them.
//!
//! Zones are bands along the Z axis. Zone 0 is the safe spawn area and never
//! receives natural spawns; zone 1 is the fallback for unknown ids.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::error::DataError;

pub type ZoneId = u32;

/// Safe zone around the world spawn.
pub const SPAWN_ZONE: ZoneId = 0;

/// Zone whose settings are used when an unknown id is requested.
pub const FALLBACK_ZONE: ZoneId = 1;

/// Immutable per-zone spawn configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    /// Maximum live mobs.
    pub capacity: u32,
    pub spawn_rate_per_minute: u32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub base_level: u32,
    /// Level used for boss spawns.
    pub max_level: u32,
    /// Inclusive Z band covered by the zone.
    pub min_z: i32,
    pub max_z: i32,
}

impl Zone {
    /// Per-player cooldown between spawns, or `None` when the zone never spawns.
    pub fn spawn_interval_ms(&self) -> Option<u64> {
        if self.spawn_rate_per_minute == 0 || self.capacity == 0 {
            return None;
        }
        Some(60_000 / self.spawn_rate_per_minute as u64)
    }

    pub fn contains_z(&self, z: i32) -> bool {
        (self.min_z..=self.max_z).contains(&z)
    }

    fn validate(&self) -> Result<(), DataError> {
        let invalid = |reason: &str| DataError::InvalidZone {
            id: self.id,
            reason: reason.into(),
        };
        if !self.min_radius.is_finite() || !self.max_radius.is_finite() {
            return Err(invalid("radius is not a finite number"));
        }
        if self.min_radius < 0.0 || self.max_radius < self.min_radius {
            return Err(invalid("radius range is empty"));
        }
        if self.max_z < self.min_z {
            return Err(invalid("z band is empty"));
        }
        if self.max_level < self.base_level {
            return Err(invalid("max_level below base_level"));
        }
        Ok(())
    }
}

/// Partial zone settings applied on top of the generated table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneOverride {
    pub id: ZoneId,
    pub name: Option<String>,
    pub capacity: Option<u32>,
    pub spawn_rate_per_minute: Option<u32>,
    pub min_radius: Option<f32>,
    pub max_radius: Option<f32>,
    pub base_level: Option<u32>,
    pub max_level: Option<u32>,
}

/// All zones keyed by id, plus a Z-band index.
#[derive(Debug, Clone)]
pub struct ZoneTable {
    zones: BTreeMap<ZoneId, Zone>,
    bands: BTreeMap<i32, ZoneId>,
    fallback: Zone,
}

impl ZoneTable {
    /// Build a table from explicit zones. Zone 1 must be present.
    pub fn new(zones: Vec<Zone>) -> Result<Self, DataError> {
        let mut map = BTreeMap::new();
        for zone in zones {
            zone.validate()?;
            if map.insert(zone.id, zone.clone()).is_some() {
                return Err(DataError::InvalidZone {
                    id: zone.id,
                    reason: "defined twice".into(),
                });
            }
        }
        let fallback = map
            .get(&FALLBACK_ZONE)
            .cloned()
            .ok_or(DataError::MissingFallbackZone)?;
        let bands = map.values().map(|z| (z.min_z, z.id)).collect();
        Ok(Self {
            zones: map,
            bands,
            fallback,
        })
    }

    /// Generate `count` playable zones (plus the spawn zone), each `depth`
    /// blocks deep along +Z, scaled by act.
    pub fn generated(count: u32, depth: i32) -> Self {
        let count = count.max(1);
        let depth = depth.max(1);
        let zones = (0..=count)
            .map(|id| generated_zone(id, depth))
            .map(|z| (z.id, z))
            .collect::<BTreeMap<_, _>>();
        let bands = zones.values().map(|z| (z.min_z, z.id)).collect();
        let fallback = generated_zone(FALLBACK_ZONE, depth);
        Self {
            zones,
            bands,
            fallback,
        }
    }

    /// Apply partial overrides, revalidating every touched zone.
    ///
    /// Each override is checked on a copy; a rejected override leaves its zone unchanged.
    pub fn apply_overrides(&mut self, overrides: &[ZoneOverride]) -> Result<(), DataError> {
        for o in overrides {
            let mut zone = self
                .zones
                .get(&o.id)
                .cloned()
                .ok_or_else(|| DataError::InvalidZone {
                    id: o.id,
                    reason: "no such zone".into(),
                })?;
            if let Some(name) = &o.name {
                zone.name = name.clone();
            }
            if let Some(v) = o.capacity {
                zone.capacity = v;
            }
            if let Some(v) = o.spawn_rate_per_minute {
                zone.spawn_rate_per_minute = v;
            }
            if let Some(v) = o.min_radius {
                zone.min_radius = v;
            }
            if let Some(v) = o.max_radius {
                zone.max_radius = v;
            }
            if let Some(v) = o.base_level {
                zone.base_level = v;
            }
            if let Some(v) = o.max_level {
                zone.max_level = v;
            }
            zone.validate()?;
            if zone.id == FALLBACK_ZONE {
                self.fallback = zone.clone();
            }
            self.zones.insert(zone.id, zone);
        }
        Ok(())
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    /// Zone settings for `id`, falling back to zone 1 for unknown ids.
    pub fn resolve(&self, id: ZoneId) -> &Zone {
        match self.zones.get(&id) {
            Some(zone) => zone,
            None => {
                debug!("Unknown zone {id}, using zone {FALLBACK_ZONE} settings");
                &self.fallback
            }
        }
    }

    /// Zone whose band contains `z`. Positions outside every band belong to the spawn zone.
    pub fn zone_id_at(&self, z: i32) -> ZoneId {
        self.bands
            .range(..=z)
            .next_back()
            .and_then(|(_, id)| self.zones.get(id))
            .filter(|zone| zone.contains_z(z))
            .map(|zone| zone.id)
            .unwrap_or(SPAWN_ZONE)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.zones.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Highest zone id in the table.
    pub fn max_id(&self) -> ZoneId {
        self.zones.keys().next_back().copied().unwrap_or(FALLBACK_ZONE)
    }
}

// ---------------------------------------------------------------------------
// Generated layout
// ---------------------------------------------------------------------------

fn generated_zone(id: ZoneId, depth: i32) -> Zone {
    let min_z = i32::try_from(id).unwrap_or(i32::MAX).saturating_mul(depth);
    let max_z = min_z.saturating_add(depth - 1);
    if id == SPAWN_ZONE {
        return Zone {
            id,
            name: "Spawn".into(),
            capacity: 0,
            spawn_rate_per_minute: 0,
            min_radius: 0.0,
            max_radius: 0.0,
            base_level: 1,
            max_level: 1,
            min_z,
            max_z,
        };
    }

    let (mut capacity, mut rate, min_radius, max_radius) = match id {
        1..=10 => (50 + 5 * id, 18 + 2 * id, 12.0, 25.0 + id as f32),
        11..=20 => (70 + 4 * (id - 10), 25 + (id - 10), 14.0, 35.0),
        21..=30 => (90 + 4 * (id - 20), 20 + (id - 20) / 2, 14.0, 36.0),
        31..=40 => (80 + 2 * (id - 30), 15 + (id - 30) / 3, 14.0, 34.0),
        _ => (
            (id - 40).saturating_mul(2).saturating_add(60),
            12 + (id - 40) / 3,
            12.0,
            30.0,
        ),
    };
    // Hand-tuned exceptions: the PvP arena and the final zone
    match id {
        26 => (capacity, rate) = (60, 12),
        50 => (capacity, rate) = (50, 10),
        _ => {}
    }

    let base_level = (id - 1).saturating_mul(2).saturating_add(1);
    Zone {
        id,
        name: format!("Zone {id}"),
        capacity,
        spawn_rate_per_minute: rate,
        min_radius,
        max_radius,
        base_level,
        max_level: base_level.saturating_add(5),
        min_z,
        max_z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_act_formulas() {
        let table = ZoneTable::generated(50, 200);
        assert_eq!(table.len(), 51);

        let z1 = table.get(1).unwrap();
        assert_eq!((z1.capacity, z1.spawn_rate_per_minute), (55, 20));
        assert_eq!((z1.min_radius, z1.max_radius), (12.0, 26.0));
        assert_eq!(z1.base_level, 1);

        let z15 = table.get(15).unwrap();
        assert_eq!((z15.capacity, z15.spawn_rate_per_minute), (90, 30));
        assert_eq!(z15.base_level, 29);

        let z25 = table.get(25).unwrap();
        assert_eq!((z25.capacity, z25.spawn_rate_per_minute), (110, 22));

        let z26 = table.get(26).unwrap();
        assert_eq!((z26.capacity, z26.spawn_rate_per_minute), (60, 12));

        let z50 = table.get(50).unwrap();
        assert_eq!((z50.capacity, z50.spawn_rate_per_minute), (50, 10));
    }

    #[test]
    fn spawn_zone_never_spawns() {
        let table = ZoneTable::generated(10, 100);
        let spawn = table.get(SPAWN_ZONE).unwrap();
        assert_eq!(spawn.capacity, 0);
        assert_eq!(spawn.spawn_interval_ms(), None);
    }

    #[test]
    fn spawn_interval_from_rate() {
        let table = ZoneTable::generated(10, 100);
        // Zone 1 spawns 20 per minute -> one every 3 s per player
        assert_eq!(table.get(1).unwrap().spawn_interval_ms(), Some(3000));
    }

    #[test]
    fn zone_lookup_by_z_band() {
        let table = ZoneTable::generated(5, 100);
        assert_eq!(table.zone_id_at(0), 0);
        assert_eq!(table.zone_id_at(99), 0);
        assert_eq!(table.zone_id_at(100), 1);
        assert_eq!(table.zone_id_at(350), 3);
        assert_eq!(table.zone_id_at(599), 5);
        // Outside every band
        assert_eq!(table.zone_id_at(600), SPAWN_ZONE);
        assert_eq!(table.zone_id_at(-40), SPAWN_ZONE);
    }

    #[test]
    fn unknown_zone_resolves_to_fallback() {
        let table = ZoneTable::generated(5, 100);
        assert_eq!(table.resolve(999).id, FALLBACK_ZONE);
        assert_eq!(table.resolve(3).id, 3);
    }

    #[test]
    fn overrides_apply_and_validate() {
        let mut table = ZoneTable::generated(5, 100);
        table
            .apply_overrides(&[ZoneOverride {
                id: 1,
                capacity: Some(10),
                ..Default::default()
            }])
            .unwrap();
        assert_eq!(table.get(1).unwrap().capacity, 10);
        assert_eq!(table.resolve(77).capacity, 10);

        let bad = table.apply_overrides(&[ZoneOverride {
            id: 2,
            min_radius: Some(50.0),
            ..Default::default()
        }]);
        assert!(matches!(bad, Err(DataError::InvalidZone { id: 2, .. })));

        let missing = table.apply_overrides(&[ZoneOverride {
            id: 42,
            ..Default::default()
        }]);
        assert!(missing.is_err());
    }

    #[test]
    fn non_finite_radius_rejected_without_partial_update() {
        let mut table = ZoneTable::generated(5, 100);
        let before = table.get(2).unwrap().clone();
        for radius in [f32::INFINITY, f32::NAN] {
            let result = table.apply_overrides(&[ZoneOverride {
                id: 2,
                capacity: Some(3),
                max_radius: Some(radius),
                ..Default::default()
            }]);
            assert!(matches!(result, Err(DataError::InvalidZone { id: 2, .. })));
            assert_eq!(table.get(2).unwrap(), &before);
        }

        // A rejected fallback override leaves the fallback copy alone too
        let bad = table.apply_overrides(&[ZoneOverride {
            id: 1,
            capacity: Some(1),
            min_radius: Some(f32::NAN),
            ..Default::default()
        }]);
        assert!(bad.is_err());
        assert_eq!(table.resolve(99).capacity, 55);
    }

    #[test]
    fn huge_ids_and_depths_saturate() {
        let zone = generated_zone(3_000_000_000, i32::MAX);
        assert_eq!(zone.min_z, i32::MAX);
        assert_eq!(zone.max_z, i32::MAX);
        assert_eq!(zone.max_level, u32::MAX);
        assert!(zone.validate().is_ok());
    }

    #[test]
    fn explicit_table_requires_fallback_zone() {
        let zone = generated_zone(2, 100);
        assert!(matches!(
            ZoneTable::new(vec![zone]),
            Err(DataError::MissingFallbackZone)
        ));
        let table = ZoneTable::new(vec![generated_zone(1, 100), generated_zone(2, 100)]).unwrap();
        assert_eq!(table.max_id(), 2);
    }
}
