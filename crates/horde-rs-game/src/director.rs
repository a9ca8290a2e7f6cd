//! Spawn director: owns the spawning state and advances it once per game tick.

use std::collections::HashSet;
use std::sync::Arc;

use horde_rs_world::{BlockAccess, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::affix::AffixRegistry;
use crate::affix_roller::AffixRoller;
use crate::error::EntityError;
use crate::hooks::{BehaviorHook, EntityHandle, EntityLifecycle};
use crate::mob_registry::{MobKind, MobRegistry};
use crate::population::{ActiveMob, MobId, PopulationTracker, RemovalReason};
use crate::selector::WeightedTypeSelector;
use crate::settings::SpawnSettings;
use crate::spawning::horde::{
    BossSpawn, BurstEvent, BurstStats, HordeOutcome, HordePlan, HordeState, WaveBurstController,
};
use crate::spawning::scheduler::SpawnScheduler;
use crate::spawning::{PlayerSnapshot, SpawnContext};
use crate::task_queue::{TICKS_PER_SECOND, TICK_MILLIS};
use crate::zone::{ZoneId, ZoneTable};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events produced by the director, consumed by the server layer.
#[derive(Debug, Clone)]
pub enum GameEvent {
    MobSpawned {
        id: MobId,
        entity: EntityHandle,
        kind: MobKind,
        zone: ZoneId,
        level: u32,
        position: Vec3,
        /// Rolled affix ids in order.
        affixes: Vec<String>,
    },
    MobRemoved {
        id: MobId,
        kind: MobKind,
        zone: ZoneId,
        reason: RemovalReason,
    },
    HordeWaveStarted {
        zone: ZoneId,
        wave: u32,
        target: u32,
    },
    HordeEnded(HordeOutcome),
    MassEventStarted {
        factor: f64,
        duration_ticks: u64,
    },
    MassEventEnded,
    BossSpawned {
        id: MobId,
        kind: MobKind,
        zone: ZoneId,
        level: u32,
    },
}

impl GameEvent {
    fn spawned(mob: &ActiveMob) -> Self {
        GameEvent::MobSpawned {
            id: mob.id,
            entity: mob.entity,
            kind: mob.kind,
            zone: mob.zone,
            level: mob.level,
            position: mob.position,
            affixes: mob.affixes.iter().map(|a| a.id.clone()).collect(),
        }
    }

    fn removed(mob: &ActiveMob, reason: RemovalReason) -> Self {
        GameEvent::MobRemoved {
            id: mob.id,
            kind: mob.kind,
            zone: mob.zone,
            reason,
        }
    }
}

/// Outgoing events queued during a tick.
#[derive(Default)]
pub struct OutgoingEvents {
    pub events: Vec<GameEvent>,
}

/// Counters for the stats report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirectorStats {
    pub ticks: u64,
    pub steady_spawns: u64,
    pub sweeps: u64,
    pub swept_mobs: u64,
    /// Mobs removed by emergency and idle-player trims.
    pub crowd_trimmed: u64,
    pub deaths: u64,
}

// ---------------------------------------------------------------------------
// Day cycle
// ---------------------------------------------------------------------------

/// World clock in ticks.
#[derive(Debug, Clone, Copy)]
pub struct DayCycle {
    pub time: u64,
    pub day_length: u64,
    pub night_start: u64,
    pub night_end: u64,
}

impl DayCycle {
    pub fn advance(&mut self) {
        self.time = (self.time + 1) % self.day_length.max(1);
    }

    /// Night runs from `night_start` through `night_end`, both included.
    pub fn is_night(&self) -> bool {
        (self.night_start..=self.night_end).contains(&self.time)
    }
}

// ---------------------------------------------------------------------------
// SpawnDirector
// ---------------------------------------------------------------------------

pub struct SpawnDirector {
    settings: SpawnSettings,
    mobs: MobRegistry,
    zones: ZoneTable,
    selector: WeightedTypeSelector,
    affixes: AffixRoller,
    population: Arc<PopulationTracker>,
    scheduler: SpawnScheduler,
    bursts: WaveBurstController,
    tick: u64,
    day: DayCycle,
    rng: StdRng,
    events: OutgoingEvents,
    stats: DirectorStats,
}

impl SpawnDirector {
    /// Build the director. `seed` makes every random decision reproducible.
    pub fn new(
        settings: SpawnSettings,
        zones: ZoneTable,
        affixes: AffixRegistry,
        seed: Option<u64>,
    ) -> Self {
        let mobs = MobRegistry::new();
        let selector = WeightedTypeSelector::build(&mobs, &zones);
        let population = Arc::new(PopulationTracker::with_zones(&zones));
        let affixes = AffixRoller::with_curve(affixes, settings.affix_curve.clone())
            .with_double_curve(settings.double_affix_curve.clone());
        let day = DayCycle {
            time: settings.day_cycle.start_time,
            day_length: settings.day_cycle.day_length_ticks,
            night_start: settings.day_cycle.night_start,
            night_end: settings.day_cycle.night_end,
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(
            "Spawn director ready: {} zones, {} mob kinds, {} affixes",
            zones.len(),
            mobs.all().len(),
            affixes.registry().len()
        );
        Self {
            scheduler: SpawnScheduler::new(settings.clone()),
            bursts: WaveBurstController::new(settings.clone()),
            settings,
            mobs,
            zones,
            selector,
            affixes,
            population,
            tick: 0,
            day,
            rng,
            events: OutgoingEvents::default(),
            stats: DirectorStats::default(),
        }
    }

    /// Shared handle for concurrent readers.
    pub fn population(&self) -> Arc<PopulationTracker> {
        Arc::clone(&self.population)
    }

    pub fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    pub fn mobs(&self) -> &MobRegistry {
        &self.mobs
    }

    pub fn selector(&self) -> &WeightedTypeSelector {
        &self.selector
    }

    pub fn affixes(&self) -> &AffixRoller {
        &self.affixes
    }

    pub fn settings(&self) -> &SpawnSettings {
        &self.settings
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn now_ms(&self) -> u64 {
        self.tick * TICK_MILLIS
    }

    pub fn day(&self) -> &DayCycle {
        &self.day
    }

    pub fn is_night(&self) -> bool {
        self.day.is_night()
    }

    pub fn set_time_of_day(&mut self, time: u64) {
        self.day.time = time % self.day.day_length.max(1);
    }

    pub fn stats(&self) -> DirectorStats {
        self.stats
    }

    pub fn burst_stats(&self) -> BurstStats {
        self.bursts.stats()
    }

    /// Run one game tick: day cycle, burst tasks, steady-state spawning, cleanup.
    pub fn tick<W, E, B>(
        &mut self,
        world: &W,
        entities: &mut E,
        behavior: &mut B,
        players: &[PlayerSnapshot],
    ) where
        W: BlockAccess,
        E: EntityLifecycle,
        B: BehaviorHook,
    {
        self.tick += 1;
        self.stats.ticks += 1;
        self.day.advance();

        let multiplier = self.bursts.spawn_multiplier();
        let run_spawn = self.tick % self.settings.spawn_interval_ticks.max(1) == 0;
        let cleanup_ticks = (self.settings.cleanup_interval_seconds * TICKS_PER_SECOND).max(1);
        let run_cleanup = self.tick % cleanup_ticks == 0;
        let relief_ticks =
            (self.settings.crowding.overpopulation_check_seconds * TICKS_PER_SECOND).max(1);
        let run_relief = self.tick % relief_ticks == 0;

        let mut ctx = SpawnContext {
            world,
            entities: &mut *entities,
            behavior,
            zones: &self.zones,
            mobs: &self.mobs,
            selector: &self.selector,
            affixes: &self.affixes,
            population: &self.population,
            now_ms: self.tick * TICK_MILLIS,
            night: self.day.is_night(),
        };

        for mob in self.bursts.process(&mut ctx, players, self.tick, &mut self.rng) {
            self.events.events.push(GameEvent::spawned(&mob));
        }

        if run_spawn {
            let report = self.scheduler.run_pass(&mut ctx, players, multiplier, &mut self.rng);
            self.stats.steady_spawns += report.spawned.len() as u64;
            for mob in &report.spawned {
                self.events.events.push(GameEvent::spawned(mob));
            }
        }

        if run_cleanup {
            self.cleanup(entities, players);
        }
        if run_relief {
            self.relieve_crowding(entities, players);
        }

        self.collect_burst_events();
    }

    /// Emergency trim when the tracked total crosses the threshold, then thin
    /// out mobs piling up around idle players.
    fn relieve_crowding<E: EntityLifecycle>(
        &mut self,
        entities: &mut E,
        players: &[PlayerSnapshot],
    ) {
        let crowding = &self.settings.crowding;
        let total = self.population.total();
        if total >= crowding.emergency_threshold {
            let removed = self.population.emergency_trim(entities, crowding.emergency_fill);
            warn!(
                "Emergency cleanup: {total} mobs tracked, removed {} oldest",
                removed.len()
            );
            self.stats.crowd_trimmed += removed.len() as u64;
            for mob in &removed {
                self.events.events.push(GameEvent::removed(mob, RemovalReason::Emergency));
            }
        }

        let radius = crowding.player_check_radius;
        let limit = crowding.afk_mob_limit;
        for player in players.iter().filter(|p| self.scheduler.is_afk(p.id)) {
            let near = self.population.count_near(&*entities, player.position, radius);
            if near <= limit + crowding.afk_excess_margin {
                continue;
            }
            let removed = self.population.trim_around(entities, player.position, radius, limit);
            debug!(
                "Idle player {}: {near} mobs nearby, removed {}",
                player.id.0,
                removed.len()
            );
            self.stats.crowd_trimmed += removed.len() as u64;
            for mob in &removed {
                self.events.events.push(GameEvent::removed(mob, RemovalReason::Crowding));
            }
        }
    }

    fn cleanup<E: EntityLifecycle>(&mut self, entities: &mut E, players: &[PlayerSnapshot]) {
        let report = self.population.sweep(entities, self.settings.despawn_radius);
        self.stats.sweeps += 1;
        self.stats.swept_mobs += report.removed.len() as u64;
        if report.corrected_zones > 0 {
            warn!("Sweep corrected {} zone counters", report.corrected_zones);
        }
        for (mob, reason) in &report.removed {
            self.events.events.push(GameEvent::removed(mob, *reason));
        }

        let online: HashSet<_> = players.iter().map(|p| p.id).collect();
        self.scheduler.retain_players(&online);
        debug!(
            "Cleanup: {} mobs tracked, {} removed",
            self.population.total(),
            report.removed.len()
        );
    }

    fn collect_burst_events(&mut self) {
        for event in self.bursts.drain_events() {
            let event = match event {
                BurstEvent::HordeWaveStarted { zone, wave, target } => {
                    GameEvent::HordeWaveStarted { zone, wave, target }
                }
                BurstEvent::HordeEnded(outcome) => GameEvent::HordeEnded(outcome),
                BurstEvent::MassEventStarted {
                    factor,
                    duration_ticks,
                } => GameEvent::MassEventStarted {
                    factor,
                    duration_ticks,
                },
                BurstEvent::MassEventEnded => GameEvent::MassEventEnded,
                BurstEvent::BossSpawned(mob) => GameEvent::BossSpawned {
                    id: mob.id,
                    kind: mob.kind,
                    zone: mob.zone,
                    level: mob.level,
                },
            };
            self.events.events.push(event);
        }
    }

    /// Drain all pending outgoing events.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.collect_burst_events();
        std::mem::take(&mut self.events.events)
    }

    /// Forget a mob whose entity died. Returns its record for reward handling.
    pub fn on_mob_death(&mut self, handle: EntityHandle) -> Option<ActiveMob> {
        let mob = self.population.unregister_entity(handle)?;
        self.stats.deaths += 1;
        self.events.events.push(GameEvent::removed(&mob, RemovalReason::Died));
        Some(mob)
    }

    /// Despawn every tracked mob in `zone`, or everywhere.
    pub fn purge<E: EntityLifecycle>(&mut self, entities: &mut E, zone: Option<ZoneId>) -> usize {
        let removed = self.population.purge(entities, zone);
        for mob in &removed {
            self.events.events.push(GameEvent::removed(mob, RemovalReason::Purged));
        }
        info!("Purged {} mobs", removed.len());
        removed.len()
    }

    // -----------------------------------------------------------------------
    // Bursts
    // -----------------------------------------------------------------------

    pub fn start_horde(&mut self, zone: ZoneId, center: Vec3, plan: HordePlan) -> bool {
        self.bursts.start_horde(zone, center, plan, self.tick)
    }

    pub fn cancel_horde(&mut self, zone: ZoneId) -> Option<HordeOutcome> {
        self.bursts.cancel_horde(zone)
    }

    pub fn horde_state(&self, zone: ZoneId) -> HordeState {
        self.bursts.horde_state(zone)
    }

    pub fn horde_placed(&self, zone: ZoneId) -> Option<u32> {
        self.bursts.horde_placed(zone)
    }

    pub fn active_hordes(&self) -> Vec<ZoneId> {
        self.bursts.active_hordes().collect()
    }

    /// Start a mass event; `None` arguments use the configured defaults.
    pub fn start_mass_event(&mut self, factor: Option<f64>, duration_seconds: Option<u64>) -> bool {
        let cfg = &self.settings.mass_event;
        let factor = factor.unwrap_or(cfg.default_factor);
        let duration = duration_seconds.unwrap_or(cfg.default_duration_seconds) * TICKS_PER_SECOND;
        self.bursts.start_mass_event(factor, duration, self.tick)
    }

    pub fn end_mass_event(&mut self) -> bool {
        self.bursts.end_mass_event()
    }

    pub fn spawn_multiplier(&self) -> f64 {
        self.bursts.spawn_multiplier()
    }

    /// Spawn the zone boss at `position`, subject to the zone cooldown.
    pub fn try_spawn_boss<W, E, B>(
        &mut self,
        world: &W,
        entities: &mut E,
        behavior: &mut B,
        zone: ZoneId,
        position: Vec3,
    ) -> Result<BossSpawn, EntityError>
    where
        W: BlockAccess,
        E: EntityLifecycle,
        B: BehaviorHook,
    {
        let mut ctx = SpawnContext {
            world,
            entities,
            behavior,
            zones: &self.zones,
            mobs: &self.mobs,
            selector: &self.selector,
            affixes: &self.affixes,
            population: &self.population,
            now_ms: self.tick * TICK_MILLIS,
            night: self.day.is_night(),
        };
        let result = self.bursts.try_spawn_boss(&mut ctx, zone, position, &mut self.rng);
        self.collect_burst_events();
        result
    }

    /// Spawn a specific boss kind, bypassing and restarting the zone cooldown.
    pub fn force_spawn_boss<W, E, B>(
        &mut self,
        world: &W,
        entities: &mut E,
        behavior: &mut B,
        zone: ZoneId,
        kind: MobKind,
        position: Vec3,
    ) -> Result<ActiveMob, EntityError>
    where
        W: BlockAccess,
        E: EntityLifecycle,
        B: BehaviorHook,
    {
        let mut ctx = SpawnContext {
            world,
            entities,
            behavior,
            zones: &self.zones,
            mobs: &self.mobs,
            selector: &self.selector,
            affixes: &self.affixes,
            population: &self.population,
            now_ms: self.tick * TICK_MILLIS,
            night: self.day.is_night(),
        };
        let result = self
            .bursts
            .force_spawn_boss(&mut ctx, zone, kind, position, &mut self.rng);
        self.collect_burst_events();
        result
    }

    // -----------------------------------------------------------------------
    // Reload
    // -----------------------------------------------------------------------

    /// Swap in a new zone table. Selector tables and capacities are rebuilt;
    /// tracked mobs are kept.
    pub fn reload_zones(&mut self, zones: ZoneTable) {
        self.selector = WeightedTypeSelector::build(&self.mobs, &zones);
        self.population.configure(&zones);
        self.zones = zones;
        info!("Reloaded {} zones", self.zones.len());
    }

    /// Replace the affix set, keeping the configured chance curves.
    pub fn reload_affixes(&mut self, affixes: AffixRegistry) {
        info!("Reloaded {} affixes", affixes.len());
        self.affixes = AffixRoller::with_curve(affixes, self.settings.affix_curve.clone())
            .with_double_curve(self.settings.double_affix_curve.clone());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::BehaviorQueue;
    use crate::spawning::PlayerId;
    use crate::test_support::MockEntities;
    use crate::zone::ZoneOverride;
    use horde_rs_world::flat_generator::FlatLayers;
    use horde_rs_world::level::SKY_LIGHT_NIGHT;
    use horde_rs_world::Level;

    fn night_settings() -> SpawnSettings {
        let mut settings = SpawnSettings::default();
        settings.day_cycle.start_time = 14_000;
        settings
    }

    fn night_level() -> Level {
        let mut level = Level::flat(FlatLayers::default());
        level.set_sky_light(SKY_LIGHT_NIGHT);
        level
    }

    fn director(settings: SpawnSettings) -> SpawnDirector {
        SpawnDirector::new(settings, ZoneTable::generated(12, 100), AffixRegistry::new(), Some(42))
    }

    fn zone1_capacity(capacity: u32) -> ZoneTable {
        let mut zones = ZoneTable::generated(12, 100);
        zones
            .apply_overrides(&[ZoneOverride {
                id: 1,
                capacity: Some(capacity),
                ..Default::default()
            }])
            .unwrap();
        zones
    }

    fn removals(events: &[GameEvent], reason: RemovalReason) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::MobRemoved { reason: r, .. } if *r == reason))
            .count()
    }

    fn player_at(id: u64, x: f32, z: f32) -> PlayerSnapshot {
        PlayerSnapshot {
            id: PlayerId(id),
            position: Vec3::new(x, 4.0, z),
            level: 1,
        }
    }

    #[test]
    fn day_cycle_wraps_and_flags_night() {
        let mut day = DayCycle {
            time: 23_999,
            day_length: 24_000,
            night_start: 13_000,
            night_end: 23_000,
        };
        assert!(!day.is_night());
        day.advance();
        assert_eq!(day.time, 0);
        day.time = 13_000;
        assert!(day.is_night());
        day.time = 23_000;
        assert!(day.is_night());
        day.time = 23_001;
        assert!(!day.is_night());
        day.time = 12_999;
        assert!(!day.is_night());
    }

    #[test]
    fn spawns_on_cadence_only() {
        let mut dir = director(night_settings());
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        let players = [player_at(1, 0.5, 150.5)];
        entities.add_player(players[0].position);

        for _ in 0..9 {
            dir.tick(&level, &mut entities, &mut behavior, &players);
        }
        assert_eq!(dir.population().total(), 0);
        dir.tick(&level, &mut entities, &mut behavior, &players);
        assert_eq!(dir.population().total(), 1);
        assert_eq!(behavior.len(), 1);

        let events = dir.drain_events();
        assert!(matches!(events[0], GameEvent::MobSpawned { zone: 1, .. }));
        assert!(dir.drain_events().is_empty());
    }

    #[test]
    fn steady_state_respects_capacity() {
        let mut settings = night_settings();
        settings.cleanup_interval_seconds = 10_000;
        let zones = zone1_capacity(10);
        let mut dir = SpawnDirector::new(settings, zones, AffixRegistry::new(), Some(7));
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        let players: Vec<_> = (0..4).map(|i| player_at(i, i as f32 * 60.0, 150.5)).collect();

        // Five simulated minutes
        for _ in 0..6000 {
            dir.tick(&level, &mut entities, &mut behavior, &players);
        }
        assert_eq!(dir.population().live_count(1), 10);
        assert_eq!(dir.stats().steady_spawns, 10);
    }

    #[test]
    fn cleanup_sweeps_distant_mobs() {
        let mut dir = director(night_settings());
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        let players = [player_at(1, 0.5, 150.5)];

        for _ in 0..10 {
            dir.tick(&level, &mut entities, &mut behavior, &players);
        }
        assert_eq!(dir.population().total(), 1);
        // No player registered with the entity layer, so everything is distant
        for _ in 10..600 {
            dir.tick(&level, &mut entities, &mut behavior, &[]);
        }
        assert_eq!(dir.population().total(), 0);
        assert_eq!(dir.stats().sweeps, 1);
        let removed = dir
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::MobRemoved { reason: RemovalReason::Distant, .. }))
            .count();
        assert_eq!(removed, 1);
    }

    #[test]
    fn horde_overflow_is_trimmed_by_cleanup() {
        let zones = zone1_capacity(10);
        let mut dir = SpawnDirector::new(night_settings(), zones, AffixRegistry::new(), Some(3));
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        let players = [player_at(1, 0.5, 150.5)];
        entities.add_player(players[0].position);
        assert!(dir.start_horde(1, players[0].position, HordePlan::Fixed { total: 23 }));

        // Three simulated minutes
        for _ in 0..3600 {
            dir.tick(&level, &mut entities, &mut behavior, &players);
        }
        assert_eq!(dir.stats().sweeps, 6);
        assert!(dir.population().live_count(1) <= 10);
        assert!(removals(&dir.drain_events(), RemovalReason::Overflow) >= 13);
    }

    #[test]
    fn emergency_cleanup_trims_zones_to_fill() {
        let mut settings = night_settings();
        settings.horde.batch_min = 5;
        settings.horde.batch_max = 5;
        settings.crowding.emergency_threshold = 10;
        let zones = zone1_capacity(10);
        let mut dir = SpawnDirector::new(settings, zones, AffixRegistry::new(), Some(5));
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        dir.start_horde(1, Vec3::new(0.5, 4.0, 150.5), HordePlan::Fixed { total: 23 });

        // Batches of five at ticks 1, 41 and 81
        for _ in 0..99 {
            dir.tick(&level, &mut entities, &mut behavior, &[]);
        }
        assert_eq!(dir.population().live_count(1), 15);
        dir.tick(&level, &mut entities, &mut behavior, &[]);
        assert_eq!(dir.population().live_count(1), 7);
        assert_eq!(entities.entity_count(), 7);
        assert_eq!(dir.stats().crowd_trimmed, 8);
        assert_eq!(removals(&dir.drain_events(), RemovalReason::Emergency), 8);
    }

    #[test]
    fn idle_player_crowd_is_thinned() {
        let zones = zone1_capacity(100);
        let mut dir = SpawnDirector::new(night_settings(), zones, AffixRegistry::new(), Some(9));
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        let players = [player_at(1, 0.5, 150.5)];
        entities.add_player(players[0].position);
        let population = dir.population();
        for i in 0..30 {
            let position = Vec3::new(0.5 + i as f32 * 0.5, 4.0, 165.5);
            population.register(ActiveMob {
                id: population.allocate_id(),
                entity: entities.insert_entity(position),
                kind: MobKind::Walker,
                level: 1,
                zone: 1,
                spawned_at_ms: 0,
                position,
                affixes: Vec::new(),
                boss: false,
            });
        }

        // Idle from tick 610; the check at tick 700 trims
        for _ in 0..699 {
            dir.tick(&level, &mut entities, &mut behavior, &players);
        }
        let center = players[0].position;
        let before = population.count_near(&entities, center, 48.0);
        assert!(before > 25, "only {before} nearby");
        assert_eq!(dir.stats().crowd_trimmed, 0);

        dir.tick(&level, &mut entities, &mut behavior, &players);
        assert_eq!(population.count_near(&entities, center, 48.0), 15);
        assert_eq!(removals(&dir.drain_events(), RemovalReason::Crowding), before - 15);
    }

    #[test]
    fn death_unregisters_once() {
        let mut dir = director(night_settings());
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        let players = [player_at(1, 0.5, 150.5)];
        for _ in 0..10 {
            dir.tick(&level, &mut entities, &mut behavior, &players);
        }
        let handle = entities.spawned[0].0;
        let mob = dir.on_mob_death(handle).unwrap();
        assert_eq!(mob.entity, handle);
        assert!(dir.on_mob_death(handle).is_none());
        assert_eq!(dir.population().live_count(1), 0);
        assert_eq!(dir.stats().deaths, 1);
    }

    #[test]
    fn mass_event_speeds_up_spawning() {
        let mut settings = night_settings();
        settings.cleanup_interval_seconds = 10_000;
        let level = night_level();
        let players = [player_at(1, 0.5, 150.5)];

        let mut spawned = Vec::new();
        for boost in [false, true] {
            let mut dir = director(settings.clone());
            let mut entities = MockEntities::new();
            let mut behavior = BehaviorQueue::new();
            if boost {
                assert!(dir.start_mass_event(Some(3.0), Some(60)));
                assert_eq!(dir.spawn_multiplier(), 3.0);
            }
            // 30 simulated seconds
            for _ in 0..600 {
                dir.tick(&level, &mut entities, &mut behavior, &players);
            }
            spawned.push(dir.stats().steady_spawns);
        }
        // Passes run every 500 ms: a 2100 ms cooldown spawns every 2.5 s,
        // the boosted 700 ms one every second
        assert_eq!(spawned[0], 12);
        assert_eq!(spawned[1], 30);
    }

    #[test]
    fn mass_event_throughput_caps_at_one_per_pass() {
        let mut settings = night_settings();
        settings.cleanup_interval_seconds = 10_000;
        settings.crowding.max_mobs_per_player = 1000;
        let level = night_level();
        let players = [player_at(1, 0.5, 150.5)];

        for factor in [5.0, 10.0] {
            let mut dir = SpawnDirector::new(
                settings.clone(),
                zone1_capacity(1000),
                AffixRegistry::new(),
                Some(11),
            );
            let mut entities = MockEntities::new();
            let mut behavior = BehaviorQueue::new();
            dir.start_mass_event(Some(factor), Some(60));
            // 60 passes in 30 simulated seconds, one spawn each at most
            for _ in 0..600 {
                dir.tick(&level, &mut entities, &mut behavior, &players);
            }
            assert_eq!(dir.stats().steady_spawns, 60, "factor {factor}");
        }
    }

    #[test]
    fn mass_event_reverts_and_emits_events() {
        let mut dir = director(night_settings());
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        assert!(dir.start_mass_event(Some(99.0), Some(1)));
        assert_eq!(dir.spawn_multiplier(), 10.0);
        for _ in 0..20 {
            dir.tick(&level, &mut entities, &mut behavior, &[]);
        }
        assert_eq!(dir.spawn_multiplier(), 1.0);
        let events = dir.drain_events();
        assert!(matches!(events[0], GameEvent::MassEventStarted { .. }));
        assert!(matches!(events.last(), Some(GameEvent::MassEventEnded)));
        assert!(!dir.end_mass_event());
    }

    #[test]
    fn horde_through_director() {
        let mut dir = director(night_settings());
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        assert!(dir.start_horde(2, Vec3::new(0.5, 4.0, 250.5), HordePlan::Fixed { total: 8 }));
        assert!(!dir.start_horde(2, Vec3::new(0.5, 4.0, 250.5), HordePlan::Fixed { total: 8 }));
        for _ in 0..100 {
            dir.tick(&level, &mut entities, &mut behavior, &[]);
        }
        assert_eq!(dir.horde_state(2), HordeState::Idle);
        assert_eq!(dir.population().live_count(2), 8);
        assert!(dir
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::HordeEnded(HordeOutcome { success: true, .. }))));
    }

    #[test]
    fn boss_through_director() {
        let mut dir = director(SpawnSettings::default());
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        let pos = Vec3::new(0.5, 4.0, 950.5);
        let first = dir.try_spawn_boss(&level, &mut entities, &mut behavior, 9, pos).unwrap();
        assert!(matches!(first, BossSpawn::Spawned(ActiveMob { kind: MobKind::PatientZero, .. })));
        let second = dir.try_spawn_boss(&level, &mut entities, &mut behavior, 9, pos).unwrap();
        assert!(matches!(second, BossSpawn::OnCooldown { .. }));
        assert!(dir
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::BossSpawned { zone: 9, .. })));
    }

    #[test]
    fn forced_boss_ignores_cooldown() {
        let mut dir = director(SpawnSettings::default());
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        let pos = Vec3::new(0.5, 4.0, 350.5);
        dir.try_spawn_boss(&level, &mut entities, &mut behavior, 3, pos).unwrap();
        let mob = dir
            .force_spawn_boss(&level, &mut entities, &mut behavior, 3, MobKind::Butcher, pos)
            .unwrap();
        assert_eq!(mob.kind, MobKind::Butcher);
        assert_eq!(mob.level, dir.zones().resolve(3).max_level);
        assert_eq!(dir.population().live_count(3), 2);
        assert_eq!(dir.burst_stats().bosses_spawned, 2);
    }

    #[test]
    fn reload_zones_updates_capacity() {
        let mut dir = director(SpawnSettings::default());
        assert_eq!(dir.population().capacity(1), 55);
        let mut zones = ZoneTable::generated(12, 100);
        zones
            .apply_overrides(&[ZoneOverride {
                id: 1,
                capacity: Some(5),
                ..Default::default()
            }])
            .unwrap();
        dir.reload_zones(zones);
        assert_eq!(dir.population().capacity(1), 5);
        assert_eq!(dir.zones().get(1).unwrap().capacity, 5);
    }

    #[test]
    fn purge_removes_zone_mobs() {
        let mut dir = director(night_settings());
        let level = night_level();
        let mut entities = MockEntities::new();
        let mut behavior = BehaviorQueue::new();
        dir.start_horde(3, Vec3::new(0.5, 4.0, 350.5), HordePlan::Fixed { total: 3 });
        for _ in 0..5 {
            dir.tick(&level, &mut entities, &mut behavior, &[]);
        }
        assert_eq!(dir.purge(&mut entities, Some(3)), 3);
        assert_eq!(dir.population().total(), 0);
        assert_eq!(entities.entity_count(), 0);
    }
}
