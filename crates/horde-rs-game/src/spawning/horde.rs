//! Hordes, timed mass events, and the boss cooldown gate.

use std::collections::{BTreeMap, HashMap};

use horde_rs_world::{BlockAccess, Vec3};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use super::placement::find_spawn_point;
use super::{PlayerSnapshot, SpawnContext};
use crate::error::EntityError;
use crate::hooks::{BehaviorHook, EntityLifecycle};
use crate::mob_registry::{boss_for_zone, MobKind};
use crate::population::ActiveMob;
use crate::settings::SpawnSettings;
use crate::task_queue::{TaskId, TaskQueue, TICKS_PER_SECOND};
use crate::zone::ZoneId;

pub const MIN_MASS_FACTOR: f64 = 0.1;
pub const MAX_MASS_FACTOR: f64 = 10.0;

/// How many mobs a horde places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HordePlan {
    /// A single wave of exactly `total` mobs.
    Fixed { total: u32 },
    /// Escalating waves; wave `k` targets `wave_base + wave_step * k`.
    Waves { max_waves: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HordeState {
    Idle,
    Running { wave: u32 },
}

/// Final report of a horde, successful or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HordeOutcome {
    pub zone: ZoneId,
    pub success: bool,
    /// Mobs placed across all waves.
    pub placed: u32,
    pub waves: u32,
}

#[derive(Debug, Clone)]
pub enum BurstEvent {
    HordeWaveStarted { zone: ZoneId, wave: u32, target: u32 },
    HordeEnded(HordeOutcome),
    MassEventStarted { factor: f64, duration_ticks: u64 },
    MassEventEnded,
    BossSpawned(ActiveMob),
}

/// Result of a boss request.
#[derive(Debug, Clone)]
pub enum BossSpawn {
    Spawned(ActiveMob),
    OnCooldown { remaining_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassEvent {
    pub factor: f64,
    pub ends_at_tick: u64,
    task: TaskId,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BurstStats {
    pub hordes_started: u64,
    pub hordes_won: u64,
    pub hordes_cancelled: u64,
    /// Hordes ended because nothing could be placed.
    pub hordes_abandoned: u64,
    pub horde_mobs_spawned: u64,
    pub mass_events: u64,
    pub bosses_spawned: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BurstTask {
    HordeBatch(ZoneId),
    NextWave(ZoneId),
    EndMassEvent,
}

struct ActiveHorde {
    center: Vec3,
    plan: HordePlan,
    wave: u32,
    wave_target: u32,
    wave_placed: u32,
    placed: u32,
    /// Consecutive batches that placed nothing.
    empty_batches: u32,
    /// Pending batch or next-wave task.
    task: Option<TaskId>,
}

enum AfterBatch {
    Continue,
    NextWave,
    Won,
    Abandoned,
}

/// Burst spawning layered on top of the steady-state scheduler.
pub struct WaveBurstController {
    settings: SpawnSettings,
    hordes: BTreeMap<ZoneId, ActiveHorde>,
    tasks: TaskQueue<BurstTask>,
    mass_event: Option<MassEvent>,
    /// Time of the last boss spawn per zone.
    boss_spawned_at: HashMap<ZoneId, u64>,
    stats: BurstStats,
    events: Vec<BurstEvent>,
}

impl WaveBurstController {
    pub fn new(settings: SpawnSettings) -> Self {
        Self {
            settings,
            hordes: BTreeMap::new(),
            tasks: TaskQueue::new(),
            mass_event: None,
            boss_spawned_at: HashMap::new(),
            stats: BurstStats::default(),
            events: Vec::new(),
        }
    }

    pub fn stats(&self) -> BurstStats {
        self.stats
    }

    pub fn drain_events(&mut self) -> Vec<BurstEvent> {
        std::mem::take(&mut self.events)
    }

    fn wave_target(&self, plan: HordePlan, wave: u32) -> u32 {
        match plan {
            HordePlan::Fixed { total } => total,
            HordePlan::Waves { .. } => {
                self.settings.horde.wave_base + self.settings.horde.wave_step * wave
            }
        }
    }

    fn wave_count(plan: HordePlan) -> u32 {
        match plan {
            HordePlan::Fixed { .. } => 1,
            HordePlan::Waves { max_waves } => max_waves.max(1),
        }
    }

    // -----------------------------------------------------------------------
    // Hordes
    // -----------------------------------------------------------------------

    /// Start a horde in `zone`. Returns `false` when one is already running there.
    pub fn start_horde(
        &mut self,
        zone: ZoneId,
        center: Vec3,
        plan: HordePlan,
        current_tick: u64,
    ) -> bool {
        if self.hordes.contains_key(&zone) {
            debug!("Horde already running in zone {zone}, ignoring start");
            return false;
        }
        let target = self.wave_target(plan, 1);
        let task = self.tasks.schedule(0, current_tick, BurstTask::HordeBatch(zone));
        self.hordes.insert(
            zone,
            ActiveHorde {
                center,
                plan,
                wave: 1,
                wave_target: target,
                wave_placed: 0,
                placed: 0,
                empty_batches: 0,
                task: Some(task),
            },
        );
        self.stats.hordes_started += 1;
        info!("Horde started in zone {zone} ({plan:?})");
        self.events.push(BurstEvent::HordeWaveStarted { zone, wave: 1, target });
        true
    }

    /// End a running horde as failed. Returns `None` if no horde was running.
    pub fn cancel_horde(&mut self, zone: ZoneId) -> Option<HordeOutcome> {
        let horde = self.hordes.remove(&zone)?;
        if let Some(task) = horde.task {
            self.tasks.cancel(task);
        }
        self.stats.hordes_cancelled += 1;
        let outcome = HordeOutcome {
            zone,
            success: false,
            placed: horde.placed,
            waves: horde.wave,
        };
        info!("Horde in zone {zone} cancelled after {} mobs", horde.placed);
        self.events.push(BurstEvent::HordeEnded(outcome));
        Some(outcome)
    }

    pub fn horde_state(&self, zone: ZoneId) -> HordeState {
        match self.hordes.get(&zone) {
            Some(h) => HordeState::Running { wave: h.wave },
            None => HordeState::Idle,
        }
    }

    /// Zones with a running horde.
    pub fn active_hordes(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.hordes.keys().copied()
    }

    /// Mobs placed so far by the horde in `zone`.
    pub fn horde_placed(&self, zone: ZoneId) -> Option<u32> {
        self.hordes.get(&zone).map(|h| h.placed)
    }

    // -----------------------------------------------------------------------
    // Mass events
    // -----------------------------------------------------------------------

    /// Multiply steady-state throughput by `factor` for `duration_ticks`.
    /// Ignored while another mass event is active.
    pub fn start_mass_event(
        &mut self,
        factor: f64,
        duration_ticks: u64,
        current_tick: u64,
    ) -> bool {
        if self.mass_event.is_some() {
            return false;
        }
        let factor = if factor.is_finite() {
            factor.clamp(MIN_MASS_FACTOR, MAX_MASS_FACTOR)
        } else {
            MAX_MASS_FACTOR
        };
        let task = self.tasks.schedule(duration_ticks, current_tick, BurstTask::EndMassEvent);
        self.mass_event = Some(MassEvent {
            factor,
            ends_at_tick: current_tick.saturating_add(duration_ticks),
            task,
        });
        self.stats.mass_events += 1;
        info!("Mass event started: x{factor} for {duration_ticks} ticks");
        self.events.push(BurstEvent::MassEventStarted {
            factor,
            duration_ticks,
        });
        true
    }

    /// Start a mass event with the configured factor and duration.
    pub fn start_default_mass_event(&mut self, current_tick: u64) -> bool {
        let factor = self.settings.mass_event.default_factor;
        let duration = self.settings.mass_event.default_duration_seconds * TICKS_PER_SECOND;
        self.start_mass_event(factor, duration, current_tick)
    }

    /// End the active mass event. Returns `false` when none was active.
    pub fn end_mass_event(&mut self) -> bool {
        let Some(event) = self.mass_event.take() else {
            return false;
        };
        self.tasks.cancel(event.task);
        info!("Mass event ended");
        self.events.push(BurstEvent::MassEventEnded);
        true
    }

    pub fn mass_event(&self) -> Option<&MassEvent> {
        self.mass_event.as_ref()
    }

    /// Current steady-state throughput multiplier.
    pub fn spawn_multiplier(&self) -> f64 {
        self.mass_event.map_or(1.0, |e| e.factor)
    }

    // -----------------------------------------------------------------------
    // Bosses
    // -----------------------------------------------------------------------

    /// Spawn the zone's boss at `position` unless the zone is on cooldown.
    pub fn try_spawn_boss<W, E, B>(
        &mut self,
        ctx: &mut SpawnContext<'_, W, E, B>,
        zone: ZoneId,
        position: Vec3,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<BossSpawn, EntityError>
    where
        W: BlockAccess,
        E: EntityLifecycle,
        B: BehaviorHook,
    {
        if let Some(remaining_ms) = self.boss_cooldown_remaining(zone, ctx.now_ms) {
            debug!("Boss in zone {zone} on cooldown for {remaining_ms} ms");
            return Ok(BossSpawn::OnCooldown { remaining_ms });
        }
        let mob = self.force_spawn_boss(ctx, zone, boss_for_zone(zone), position, rng)?;
        Ok(BossSpawn::Spawned(mob))
    }

    /// Spawn a specific boss, ignoring and resetting the zone cooldown.
    pub fn force_spawn_boss<W, E, B>(
        &mut self,
        ctx: &mut SpawnContext<'_, W, E, B>,
        zone: ZoneId,
        kind: MobKind,
        position: Vec3,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<ActiveMob, EntityError>
    where
        W: BlockAccess,
        E: EntityLifecycle,
        B: BehaviorHook,
    {
        let level = ctx.zones.resolve(zone).max_level;
        let mob = ctx.spawn_mob(zone, kind, position, level, rng)?;
        self.boss_spawned_at.insert(zone, ctx.now_ms);
        self.stats.bosses_spawned += 1;
        info!("Boss {kind:?} spawned in zone {zone} at level {level}");
        self.events.push(BurstEvent::BossSpawned(mob.clone()));
        Ok(mob)
    }

    /// Milliseconds left on the zone's boss cooldown, `None` when ready.
    pub fn boss_cooldown_remaining(&self, zone: ZoneId, now_ms: u64) -> Option<u64> {
        let last = *self.boss_spawned_at.get(&zone)?;
        let window = self.settings.boss.cooldown_minutes.saturating_mul(60_000);
        let elapsed = now_ms.saturating_sub(last);
        (elapsed < window).then(|| window - elapsed)
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Run every burst task due at `current_tick`. Returns the mobs spawned.
    pub fn process<W, E, B>(
        &mut self,
        ctx: &mut SpawnContext<'_, W, E, B>,
        players: &[PlayerSnapshot],
        current_tick: u64,
        rng: &mut (impl Rng + ?Sized),
    ) -> Vec<ActiveMob>
    where
        W: BlockAccess,
        E: EntityLifecycle,
        B: BehaviorHook,
    {
        let mut spawned = Vec::new();
        for ready in self.tasks.drain_ready(current_tick) {
            match ready.task {
                BurstTask::HordeBatch(zone) => {
                    self.run_batch(ctx, zone, players, current_tick, rng, &mut spawned);
                }
                BurstTask::NextWave(zone) => self.next_wave(zone, current_tick),
                BurstTask::EndMassEvent => {
                    self.end_mass_event();
                }
            }
        }
        spawned
    }

    fn run_batch<W, E, B>(
        &mut self,
        ctx: &mut SpawnContext<'_, W, E, B>,
        zone: ZoneId,
        players: &[PlayerSnapshot],
        current_tick: u64,
        rng: &mut (impl Rng + ?Sized),
        spawned: &mut Vec<ActiveMob>,
    ) where
        W: BlockAccess,
        E: EntityLifecycle,
        B: BehaviorHook,
    {
        let cfg = &self.settings.horde;
        let Some(horde) = self.hordes.get_mut(&zone) else {
            return;
        };
        horde.task = None;

        let base_level = ctx.zones.resolve(zone).base_level;
        let anchors: Vec<Vec3> = players
            .iter()
            .filter(|p| ctx.zone_at(p.position) == zone)
            .map(|p| p.position)
            .collect();

        let remaining = horde.wave_target.saturating_sub(horde.wave_placed);
        let batch = rng
            .gen_range(cfg.batch_min..=cfg.batch_max.max(cfg.batch_min))
            .min(remaining);
        let placed_before = horde.wave_placed;
        for _ in 0..batch {
            let anchor = anchors.choose(rng).copied().unwrap_or(horde.center);
            let placement = find_spawn_point(
                ctx.world,
                anchor,
                cfg.min_radius,
                cfg.max_radius,
                &self.settings.placement,
                false,
                rng,
            );
            let Some(position) = placement.position else {
                continue;
            };
            let kind = ctx.selector.select(zone, rng);
            match ctx.spawn_mob(zone, kind, position, base_level + horde.wave, rng) {
                Ok(mob) => {
                    horde.wave_placed += 1;
                    horde.placed += 1;
                    self.stats.horde_mobs_spawned += 1;
                    spawned.push(mob);
                }
                Err(e) => warn!("Horde spawn of {kind:?} in zone {zone} failed: {e}"),
            }
        }

        if batch > 0 && horde.wave_placed == placed_before {
            horde.empty_batches += 1;
        } else {
            horde.empty_batches = 0;
        }

        let next = if horde.empty_batches >= cfg.max_empty_batches.max(1) {
            AfterBatch::Abandoned
        } else if horde.wave_placed < horde.wave_target {
            AfterBatch::Continue
        } else if horde.wave < Self::wave_count(horde.plan) {
            AfterBatch::NextWave
        } else {
            AfterBatch::Won
        };
        match next {
            AfterBatch::Continue => {
                let delay = cfg.batch_interval_seconds * TICKS_PER_SECOND;
                let task = self
                    .tasks
                    .schedule(delay, current_tick, BurstTask::HordeBatch(zone));
                horde.task = Some(task);
            }
            AfterBatch::NextWave => {
                let delay = cfg.inter_wave_delay_seconds * TICKS_PER_SECOND;
                let task = self
                    .tasks
                    .schedule(delay, current_tick, BurstTask::NextWave(zone));
                horde.task = Some(task);
            }
            AfterBatch::Won => self.finish_horde(zone),
            AfterBatch::Abandoned => self.abandon_horde(zone),
        }
    }

    fn abandon_horde(&mut self, zone: ZoneId) {
        let Some(horde) = self.hordes.remove(&zone) else {
            return;
        };
        self.stats.hordes_abandoned += 1;
        let outcome = HordeOutcome {
            zone,
            success: false,
            placed: horde.placed,
            waves: horde.wave,
        };
        warn!(
            "Horde in zone {zone} abandoned: {} batches in a row found no spawn point",
            horde.empty_batches
        );
        self.events.push(BurstEvent::HordeEnded(outcome));
    }

    fn next_wave(&mut self, zone: ZoneId, current_tick: u64) {
        let Some(plan) = self.hordes.get(&zone).map(|h| h.plan) else {
            return;
        };
        let Some(wave) = self.hordes.get(&zone).map(|h| h.wave + 1) else {
            return;
        };
        let target = self.wave_target(plan, wave);
        let task = self.tasks.schedule(0, current_tick, BurstTask::HordeBatch(zone));
        if let Some(horde) = self.hordes.get_mut(&zone) {
            horde.wave = wave;
            horde.wave_target = target;
            horde.wave_placed = 0;
            horde.task = Some(task);
        }
        info!("Horde in zone {zone}: wave {wave} ({target} mobs)");
        self.events.push(BurstEvent::HordeWaveStarted { zone, wave, target });
    }

    fn finish_horde(&mut self, zone: ZoneId) {
        let Some(horde) = self.hordes.remove(&zone) else {
            return;
        };
        self.stats.hordes_won += 1;
        let outcome = HordeOutcome {
            zone,
            success: true,
            placed: horde.placed,
            waves: horde.wave,
        };
        info!("Horde in zone {zone} repelled after {} waves", horde.wave);
        self.events.push(BurstEvent::HordeEnded(outcome));
    }

    /// Drop all hordes and the mass event without emitting outcomes.
    pub fn reset(&mut self) {
        self.hordes.clear();
        self.tasks.clear();
        self.mass_event = None;
    }
}
