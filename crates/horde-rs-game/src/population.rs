//! Live mob registry and per-zone population counts.
//!
//! All maps are concurrent so monitoring code can read through an
//! `Arc<PopulationTracker>` while the tick thread is the only writer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use horde_rs_world::Vec3;
use tracing::debug;

use crate::affix::Affix;
use crate::hooks::{EntityHandle, EntityLifecycle};
use crate::mob_registry::MobKind;
use crate::zone::{ZoneId, ZoneTable, FALLBACK_ZONE};

/// Tracker-assigned mob identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MobId(pub u64);

/// A mob spawned by the core and still considered alive.
#[derive(Debug, Clone)]
pub struct ActiveMob {
    pub id: MobId,
    pub entity: EntityHandle,
    pub kind: MobKind,
    pub level: u32,
    /// Zone resolved at spawn time; not updated as the mob wanders.
    pub zone: ZoneId,
    pub spawned_at_ms: u64,
    /// Last known position (spawn point, refreshed by sweeps).
    pub position: Vec3,
    /// Rolled affixes in order; empty for plain mobs.
    pub affixes: Vec<Arc<Affix>>,
    /// Bosses are never trimmed by crowd control.
    pub boss: bool,
}

impl ActiveMob {
    /// Product of every affix's reward multiplier.
    pub fn reward_multiplier(&self) -> f32 {
        self.affixes.iter().map(|a| a.reward_multiplier).product()
    }

    pub fn loot_bonus(&self) -> f32 {
        self.affixes.iter().map(|a| a.loot_bonus).sum()
    }
}

/// Why a mob left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Died,
    /// The entity no longer exists.
    Stale,
    /// No player nearby; the entity was despawned.
    Distant,
    /// Removed by an operator.
    Purged,
    /// Oldest mobs of a zone above its capacity.
    Overflow,
    /// Global population crossed the emergency threshold.
    Emergency,
    /// Too many mobs around an idle player.
    Crowding,
}

/// Outcome of a cleanup sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub removed: Vec<(ActiveMob, RemovalReason)>,
    /// Zones whose counter disagreed with the registry before reconciliation.
    pub corrected_zones: usize,
}

impl SweepReport {
    pub fn count(&self, reason: RemovalReason) -> usize {
        self.removed.iter().filter(|(_, r)| *r == reason).count()
    }
}

pub struct PopulationTracker {
    counts: DashMap<ZoneId, usize>,
    mobs: DashMap<MobId, ActiveMob>,
    by_entity: DashMap<EntityHandle, MobId>,
    capacities: DashMap<ZoneId, u32>,
    next_id: AtomicU64,
}

impl Default for PopulationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PopulationTracker {
    pub fn new() -> Self {
        Self {
            counts: DashMap::new(),
            mobs: DashMap::new(),
            by_entity: DashMap::new(),
            capacities: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Tracker with capacities taken from `zones`.
    pub fn with_zones(zones: &ZoneTable) -> Self {
        let tracker = Self::new();
        tracker.configure(zones);
        tracker
    }

    /// Replace zone capacities. Live mobs are kept.
    pub fn configure(&self, zones: &ZoneTable) {
        self.capacities.clear();
        for zone in zones.iter() {
            self.capacities.insert(zone.id, zone.capacity);
        }
    }

    /// Allocate the next unique mob id.
    pub fn allocate_id(&self) -> MobId {
        MobId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Capacity of `zone`; unknown zones use zone 1's.
    pub fn capacity(&self, zone: ZoneId) -> u32 {
        self.capacities
            .get(&zone)
            .or_else(|| self.capacities.get(&FALLBACK_ZONE))
            .map(|c| *c)
            .unwrap_or(0)
    }

    pub fn live_count(&self, zone: ZoneId) -> usize {
        self.counts.get(&zone).map(|c| *c).unwrap_or(0)
    }

    /// Free slots in `zone`, never negative.
    pub fn headroom(&self, zone: ZoneId) -> usize {
        (self.capacity(zone) as usize).saturating_sub(self.live_count(zone))
    }

    /// Total tracked mobs across all zones.
    pub fn total(&self) -> usize {
        self.mobs.len()
    }

    pub fn register(&self, mob: ActiveMob) {
        let (id, zone, entity) = (mob.id, mob.zone, mob.entity);
        if let Some(previous) = self.mobs.insert(id, mob) {
            // Re-registration under the same id moves the count and the handle
            self.decrement(previous.zone);
            if previous.entity != entity {
                self.by_entity.remove_if(&previous.entity, |_, mapped| *mapped == id);
            }
        }
        self.by_entity.insert(entity, id);
        *self.counts.entry(zone).or_insert(0) += 1;
    }

    /// Remove a mob. Unknown or already removed ids return `None`.
    pub fn unregister(&self, id: MobId) -> Option<ActiveMob> {
        let (_, mob) = self.mobs.remove(&id)?;
        self.by_entity.remove_if(&mob.entity, |_, mapped| *mapped == id);
        self.decrement(mob.zone);
        Some(mob)
    }

    /// Remove the mob backed by `handle`, e.g. when the entity dies.
    pub fn unregister_entity(&self, handle: EntityHandle) -> Option<ActiveMob> {
        let id = self.by_entity.get(&handle).map(|id| *id)?;
        self.unregister(id)
    }

    pub fn get(&self, id: MobId) -> Option<ActiveMob> {
        self.mobs.get(&id).map(|m| m.value().clone())
    }

    pub fn mob_for_entity(&self, handle: EntityHandle) -> Option<ActiveMob> {
        let id = self.by_entity.get(&handle).map(|id| *id)?;
        self.get(id)
    }

    pub fn mobs_in_zone(&self, zone: ZoneId) -> Vec<ActiveMob> {
        let mut mobs: Vec<ActiveMob> = self
            .mobs
            .iter()
            .filter(|m| m.zone == zone)
            .map(|m| m.value().clone())
            .collect();
        mobs.sort_by_key(|m| m.id);
        mobs
    }

    /// Snapshot of every tracked id.
    pub fn ids(&self) -> Vec<MobId> {
        self.mobs.iter().map(|m| *m.key()).collect()
    }

    /// Non-zero zone counts, sorted by zone.
    pub fn zone_counts(&self) -> Vec<(ZoneId, usize)> {
        let mut counts: Vec<(ZoneId, usize)> = self
            .counts
            .iter()
            .filter(|c| *c.value() > 0)
            .map(|c| (*c.key(), *c.value()))
            .collect();
        counts.sort_unstable();
        counts
    }

    /// Drop stale and distant mobs, rebuild counters from the registry, then
    /// trim every zone above capacity back down to it, oldest first.
    ///
    /// Iterates a snapshot of ids, so mobs removed concurrently (or by an
    /// earlier step of the same sweep) are skipped.
    pub fn sweep(&self, entities: &mut impl EntityLifecycle, despawn_radius: f32) -> SweepReport {
        let mut report = SweepReport::default();

        for id in self.ids() {
            let Some(mob) = self.get(id) else {
                continue;
            };
            let position = if entities.entity_exists(mob.entity) {
                entities.entity_position(mob.entity)
            } else {
                None
            };
            match position {
                None => {
                    if let Some(mob) = self.unregister(id) {
                        report.removed.push((mob, RemovalReason::Stale));
                    }
                }
                Some(pos) if !entities.nearby_player_within(pos, despawn_radius) => {
                    entities.despawn_entity(mob.entity);
                    if let Some(mob) = self.unregister(id) {
                        report.removed.push((mob, RemovalReason::Distant));
                    }
                }
                Some(pos) => {
                    if let Some(mut m) = self.mobs.get_mut(&id) {
                        m.position = pos;
                    }
                }
            }
        }

        report.corrected_zones = self.reconcile();

        if !self.capacities.is_empty() {
            for (zone, live) in self.zone_counts() {
                let capacity = self.capacity(zone) as usize;
                if live > capacity {
                    for mob in self.trim_zone(entities, zone, capacity) {
                        report.removed.push((mob, RemovalReason::Overflow));
                    }
                }
            }
        }

        if !report.removed.is_empty() || report.corrected_zones > 0 {
            debug!(
                "Sweep removed {} stale, {} distant, {} overflow; {} zone counters corrected",
                report.count(RemovalReason::Stale),
                report.count(RemovalReason::Distant),
                report.count(RemovalReason::Overflow),
                report.corrected_zones
            );
        }
        report
    }

    /// Despawn the oldest non-boss mobs of `zone` until at most `target` remain.
    pub fn trim_zone(
        &self,
        entities: &mut impl EntityLifecycle,
        zone: ZoneId,
        target: usize,
    ) -> Vec<ActiveMob> {
        let mut candidates: Vec<ActiveMob> =
            self.mobs_in_zone(zone).into_iter().filter(|m| !m.boss).collect();
        candidates.sort_by_key(|m| (m.spawned_at_ms, m.id));

        let mut removed = Vec::new();
        for mob in candidates {
            if self.live_count(zone) <= target {
                break;
            }
            entities.despawn_entity(mob.entity);
            if let Some(mob) = self.unregister(mob.id) {
                removed.push(mob);
            }
        }
        removed
    }

    /// Trim every populated zone to `fill` of its capacity, oldest first.
    pub fn emergency_trim(
        &self,
        entities: &mut impl EntityLifecycle,
        fill: f64,
    ) -> Vec<ActiveMob> {
        let fill = fill.clamp(0.0, 1.0);
        let mut removed = Vec::new();
        for (zone, live) in self.zone_counts() {
            let target = (f64::from(self.capacity(zone)) * fill).floor() as usize;
            if live > target {
                removed.extend(self.trim_zone(entities, zone, target));
            }
        }
        removed
    }

    /// Tracked mobs within `radius` of `center`, by current entity position.
    pub fn count_near(
        &self,
        entities: &impl EntityLifecycle,
        center: Vec3,
        radius: f32,
    ) -> usize {
        self.mobs
            .iter()
            .filter(|m| {
                let pos = entities.entity_position(m.entity).unwrap_or(m.position);
                pos.distance(&center) <= radius
            })
            .count()
    }

    /// Despawn the farthest non-boss mobs within `radius` of `center` until
    /// at most `keep` remain there.
    pub fn trim_around(
        &self,
        entities: &mut impl EntityLifecycle,
        center: Vec3,
        radius: f32,
        keep: usize,
    ) -> Vec<ActiveMob> {
        let mut near: Vec<(f32, ActiveMob)> = self
            .mobs
            .iter()
            .filter_map(|m| {
                let pos = entities.entity_position(m.entity).unwrap_or(m.position);
                let d = pos.distance(&center);
                (d <= radius).then(|| (d, m.value().clone()))
            })
            .collect();
        let excess = near.len().saturating_sub(keep);
        near.retain(|(_, m)| !m.boss);
        near.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.id.cmp(&b.1.id)));

        let mut removed = Vec::new();
        for (_, mob) in near.into_iter().take(excess) {
            entities.despawn_entity(mob.entity);
            if let Some(mob) = self.unregister(mob.id) {
                removed.push(mob);
            }
        }
        removed
    }

    /// Remove every tracked mob in `zone` (or all zones), despawning the entities.
    pub fn purge(
        &self,
        entities: &mut impl EntityLifecycle,
        zone: Option<ZoneId>,
    ) -> Vec<ActiveMob> {
        let mut removed = Vec::new();
        for id in self.ids() {
            let Some(mob) = self.get(id) else {
                continue;
            };
            if zone.is_some_and(|z| z != mob.zone) {
                continue;
            }
            entities.despawn_entity(mob.entity);
            if let Some(mob) = self.unregister(id) {
                removed.push(mob);
            }
        }
        removed
    }

    /// Rebuild zone counters from the registry. Returns how many zones changed.
    pub fn reconcile(&self) -> usize {
        let mut fresh: HashMap<ZoneId, usize> = HashMap::new();
        for mob in self.mobs.iter() {
            *fresh.entry(mob.zone).or_insert(0) += 1;
        }

        let mut corrected = 0;
        self.counts.retain(|zone, count| {
            if !fresh.contains_key(zone) && *count != 0 {
                corrected += 1;
            }
            fresh.contains_key(zone)
        });
        for (zone, count) in fresh {
            let previous = self.counts.insert(zone, count);
            if previous != Some(count) {
                corrected += 1;
            }
        }
        corrected
    }

    fn decrement(&self, zone: ZoneId) {
        if let Some(mut count) = self.counts.get_mut(&zone) {
            *count = count.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockEntities;

    fn tracker(capacity: u32) -> PopulationTracker {
        let mut zones = ZoneTable::generated(3, 100);
        zones
            .apply_overrides(&[crate::zone::ZoneOverride {
                id: 1,
                capacity: Some(capacity),
                ..Default::default()
            }])
            .unwrap();
        PopulationTracker::with_zones(&zones)
    }

    fn mob(t: &PopulationTracker, entity: u64, zone: ZoneId) -> ActiveMob {
        ActiveMob {
            id: t.allocate_id(),
            entity: EntityHandle(entity),
            kind: MobKind::Walker,
            level: 1,
            zone,
            spawned_at_ms: 0,
            position: Vec3::new(0.0, 4.0, 0.0),
            affixes: Vec::new(),
            boss: false,
        }
    }

    #[test]
    fn register_and_unregister_adjust_counts() {
        let t = tracker(10);
        let a = mob(&t, 1, 1);
        let b = mob(&t, 2, 1);
        let a_id = a.id;
        t.register(a);
        t.register(b);
        assert_eq!(t.live_count(1), 2);
        assert_eq!(t.headroom(1), 8);
        assert_eq!(t.total(), 2);

        assert!(t.unregister(a_id).is_some());
        assert_eq!(t.live_count(1), 1);
        // Second removal is a no-op
        assert!(t.unregister(a_id).is_none());
        assert_eq!(t.live_count(1), 1);

        assert!(t.unregister_entity(EntityHandle(2)).is_some());
        assert_eq!(t.live_count(1), 0);
        assert!(t.unregister_entity(EntityHandle(2)).is_none());
    }

    #[test]
    fn headroom_floors_at_zero() {
        let t = tracker(1);
        t.register(mob(&t, 1, 1));
        t.register(mob(&t, 2, 1));
        assert_eq!(t.live_count(1), 2);
        assert_eq!(t.headroom(1), 0);
    }

    #[test]
    fn unknown_zone_uses_fallback_capacity() {
        let t = tracker(7);
        assert_eq!(t.capacity(99), 7);
        assert_eq!(t.headroom(99), 7);
        assert_eq!(t.capacity(0), 0);
    }

    #[test]
    fn ids_are_unique() {
        let t = tracker(1);
        let a = t.allocate_id();
        let b = t.allocate_id();
        assert_ne!(a, b);
    }

    #[test]
    fn reward_multiplier_reads_affix() {
        let t = tracker(5);
        let mut m = mob(&t, 1, 1);
        assert_eq!(m.reward_multiplier(), 1.0);
        let registry = crate::affix::AffixRegistry::new();
        m.affixes = vec![Arc::clone(registry.get("tough").unwrap())];
        assert_eq!(m.reward_multiplier(), 1.3);
        assert_eq!(m.loot_bonus(), 0.1);

        m.affixes.push(Arc::clone(registry.get("vampiric").unwrap()));
        assert!((m.reward_multiplier() - 1.3 * 1.8).abs() < 1e-6);
        assert!((m.loot_bonus() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn reregistering_with_new_entity_drops_old_handle() {
        let t = tracker(10);
        let m = mob(&t, 1, 1);
        let id = m.id;
        t.register(m.clone());
        let mut moved = m;
        moved.entity = EntityHandle(2);
        moved.zone = 2;
        t.register(moved);

        assert!(t.mob_for_entity(EntityHandle(1)).is_none());
        assert!(t.unregister_entity(EntityHandle(1)).is_none());
        assert_eq!(t.live_count(1), 0);
        assert_eq!(t.live_count(2), 1);
        assert_eq!(t.unregister_entity(EntityHandle(2)).unwrap().id, id);
        assert_eq!(t.total(), 0);
    }

    fn spawn_tracked(
        t: &PopulationTracker,
        entities: &mut MockEntities,
        zone: ZoneId,
        pos: Vec3,
        spawned_at_ms: u64,
    ) -> MobId {
        let h = entities.insert_entity(pos);
        let mut m = mob(t, h.0, zone);
        m.entity = h;
        m.position = pos;
        m.spawned_at_ms = spawned_at_ms;
        let id = m.id;
        t.register(m);
        id
    }

    #[test]
    fn sweep_trims_over_capacity_zone_oldest_first() {
        let t = tracker(10);
        let mut entities = MockEntities::new();
        entities.add_player(Vec3::new(0.0, 4.0, 0.0));
        let ids: Vec<MobId> = (0..23)
            .map(|i| spawn_tracked(&t, &mut entities, 1, Vec3::new(2.0, 4.0, 2.0), i * 100))
            .collect();
        assert_eq!(t.live_count(1), 23);

        let report = t.sweep(&mut entities, 64.0);
        assert_eq!(report.count(RemovalReason::Overflow), 13);
        assert_eq!(t.live_count(1), 10);
        assert!(t.live_count(1) <= t.capacity(1) as usize);
        assert_eq!(entities.entity_count(), 10);
        // The newest ten survive
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(t.get(*id).is_some(), i >= 13, "mob {i}");
        }

        // At capacity nothing more is trimmed
        let again = t.sweep(&mut entities, 64.0);
        assert_eq!(again.count(RemovalReason::Overflow), 0);
    }

    #[test]
    fn trimming_skips_bosses() {
        let t = tracker(2);
        let mut entities = MockEntities::new();
        let h = entities.insert_entity(Vec3::new(0.0, 4.0, 0.0));
        let mut boss = mob(&t, h.0, 1);
        boss.entity = h;
        boss.boss = true;
        let boss_id = boss.id;
        t.register(boss);
        for i in 1..5 {
            spawn_tracked(&t, &mut entities, 1, Vec3::new(1.0, 4.0, 0.0), i);
        }
        let removed = t.trim_zone(&mut entities, 1, 2);
        assert_eq!(removed.len(), 3);
        assert!(t.get(boss_id).is_some());
        assert_eq!(t.live_count(1), 2);
    }

    #[test]
    fn emergency_trim_to_fraction_of_capacity() {
        let t = tracker(10);
        let mut entities = MockEntities::new();
        for i in 0..10 {
            spawn_tracked(&t, &mut entities, 1, Vec3::new(0.0, 4.0, 0.0), i);
        }
        for i in 0..3 {
            spawn_tracked(&t, &mut entities, 2, Vec3::new(0.0, 4.0, 150.0), i);
        }
        let removed = t.emergency_trim(&mut entities, 0.7);
        // Zone 1 keeps floor(10 * 0.7); zone 2 is under its own 70% line
        assert_eq!(removed.len(), 3);
        assert_eq!(t.live_count(1), 7);
        assert_eq!(t.live_count(2), 3);
        assert!(removed.iter().all(|m| m.zone == 1 && m.spawned_at_ms < 3));
    }

    #[test]
    fn trim_around_removes_farthest() {
        let t = tracker(100);
        let mut entities = MockEntities::new();
        let center = Vec3::new(0.0, 4.0, 0.0);
        for d in 1..=20 {
            spawn_tracked(&t, &mut entities, 1, Vec3::new(d as f32, 4.0, 0.0), 0);
        }
        // Outside the radius; untouched
        let outside = spawn_tracked(&t, &mut entities, 1, Vec3::new(200.0, 4.0, 0.0), 0);
        assert_eq!(t.count_near(&entities, center, 48.0), 20);

        let removed = t.trim_around(&mut entities, center, 48.0, 15);
        assert_eq!(removed.len(), 5);
        assert!(removed.iter().all(|m| m.position.x > 15.0));
        assert_eq!(t.count_near(&entities, center, 48.0), 15);
        assert!(t.get(outside).is_some());
        assert!(t.trim_around(&mut entities, center, 48.0, 15).is_empty());
    }

    #[test]
    fn sweep_matches_live_entities_near_players() {
        let t = tracker(50);
        let mut entities = MockEntities::new();
        entities.add_player(Vec3::new(0.0, 4.0, 0.0));

        // Near, alive
        let near = entities.insert_entity(Vec3::new(10.0, 4.0, 0.0));
        // Far from every player
        let far = entities.insert_entity(Vec3::new(500.0, 4.0, 0.0));
        // Entity gone without notifying the tracker
        let gone = entities.insert_entity(Vec3::new(5.0, 4.0, 0.0));
        for (handle, zone) in [(near, 1), (far, 1), (gone, 2)] {
            let mut m = mob(&t, handle.0, zone);
            m.entity = handle;
            t.register(m);
        }
        entities.remove_entity(gone);

        let report = t.sweep(&mut entities, 64.0);
        assert_eq!(report.count(RemovalReason::Stale), 1);
        assert_eq!(report.count(RemovalReason::Distant), 1);
        assert!(!entities.entity_exists(far));

        // Remaining count equals mobs whose entity exists near a player
        for zone in [1, 2] {
            let expected = t
                .mobs_in_zone(zone)
                .iter()
                .filter(|m| {
                    entities
                        .entity_position(m.entity)
                        .is_some_and(|p| entities.nearby_player_within(p, 64.0))
                })
                .count();
            assert_eq!(t.live_count(zone), expected);
        }
        assert_eq!(t.live_count(1), 1);
        assert_eq!(t.live_count(2), 0);
    }

    #[test]
    fn sweep_refreshes_positions() {
        let t = tracker(50);
        let mut entities = MockEntities::new();
        entities.add_player(Vec3::new(0.0, 4.0, 0.0));
        let h = entities.insert_entity(Vec3::new(3.0, 4.0, 3.0));
        let mut m = mob(&t, h.0, 1);
        m.entity = h;
        let id = m.id;
        t.register(m);
        entities.move_entity(h, Vec3::new(8.0, 4.0, 8.0));
        t.sweep(&mut entities, 64.0);
        assert_eq!(t.get(id).unwrap().position, Vec3::new(8.0, 4.0, 8.0));
    }

    #[test]
    fn reconcile_repairs_drifted_counters() {
        let t = tracker(50);
        t.register(mob(&t, 1, 1));
        t.register(mob(&t, 2, 2));
        // Simulate drift
        t.counts.insert(1, 9);
        t.counts.insert(3, 4);
        let corrected = t.reconcile();
        assert_eq!(corrected, 2);
        assert_eq!(t.live_count(1), 1);
        assert_eq!(t.live_count(2), 1);
        assert_eq!(t.live_count(3), 0);
    }

    #[test]
    fn purge_zone_only() {
        let t = tracker(50);
        let mut entities = MockEntities::new();
        for zone in [1, 1, 2] {
            let h = entities.insert_entity(Vec3::new(0.0, 4.0, 0.0));
            let mut m = mob(&t, h.0, zone);
            m.entity = h;
            t.register(m);
        }
        let removed = t.purge(&mut entities, Some(1));
        assert_eq!(removed.len(), 2);
        assert_eq!(t.live_count(1), 0);
        assert_eq!(t.live_count(2), 1);
        assert_eq!(entities.entity_count(), 1);
    }

    #[test]
    fn concurrent_readers_see_consistent_counts() {
        let t = Arc::new(tracker(10_000));
        std::thread::scope(|s| {
            let reader = Arc::clone(&t);
            s.spawn(move || {
                for _ in 0..1000 {
                    let live = reader.live_count(1);
                    assert!(live <= 1000);
                    let _ = reader.zone_counts();
                }
            });
            for i in 0..1000 {
                t.register(mob(&t, i, 1));
            }
        });
        assert_eq!(t.live_count(1), 1000);
    }
}
