//! Steady-state spawning around each player.

use std::collections::{HashMap, HashSet};

use horde_rs_world::{BlockAccess, Vec3};
use rand::Rng;
use tracing::{debug, warn};

use super::placement::find_spawn_point;
use super::{PlayerId, PlayerSnapshot, SpawnContext};
use crate::hooks::{BehaviorHook, EntityLifecycle};
use crate::population::ActiveMob;
use crate::settings::SpawnSettings;
use crate::zone::Zone;

/// Why a player got no spawn this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpawnSkip {
    /// Player stands in a zone that never spawns.
    SafeZone,
    /// Per-player cooldown has not elapsed.
    Cooldown,
    ZoneFull,
    NoPlacement,
    /// The per-pass budget ran out before this player.
    Budget,
    /// Total tracked mobs reached the hard global cap.
    GlobalCap,
    /// Too many mobs already around the player.
    Crowded,
    /// The entity layer refused the spawn.
    Rejected,
}

/// Result of one scheduler pass.
#[derive(Debug, Default)]
pub struct PassReport {
    pub spawned: Vec<ActiveMob>,
    pub skipped: Vec<(PlayerId, SpawnSkip)>,
}

impl PassReport {
    pub fn skipped_for(&self, reason: SpawnSkip) -> usize {
        self.skipped.iter().filter(|(_, r)| *r == reason).count()
    }
}

/// Where a player was last seen moving, and whether they count as idle.
#[derive(Debug, Clone, Copy)]
struct Activity {
    anchor: Vec3,
    still_since_ms: u64,
    afk: bool,
}

/// Per-player cooldown bookkeeping and the spawn pass itself.
pub struct SpawnScheduler {
    settings: SpawnSettings,
    /// Time of each player's last successful spawn.
    last_spawn_ms: HashMap<PlayerId, u64>,
    activity: HashMap<PlayerId, Activity>,
}

impl SpawnScheduler {
    pub fn new(settings: SpawnSettings) -> Self {
        Self {
            settings,
            last_spawn_ms: HashMap::new(),
            activity: HashMap::new(),
        }
    }

    /// Record where `player` is now. Returns whether they are idle: no
    /// movement past the threshold for `afk_threshold_seconds`.
    pub fn update_activity(&mut self, player: &PlayerSnapshot, now_ms: u64) -> bool {
        let crowding = &self.settings.crowding;
        let threshold_ms = crowding.afk_threshold_seconds.saturating_mul(1000);
        let entry = self.activity.entry(player.id).or_insert(Activity {
            anchor: player.position,
            still_since_ms: now_ms,
            afk: false,
        });
        if entry.anchor.distance(&player.position) > crowding.afk_movement_threshold {
            entry.anchor = player.position;
            entry.still_since_ms = now_ms;
        }
        let afk = now_ms.saturating_sub(entry.still_since_ms) >= threshold_ms;
        if afk != entry.afk {
            debug!("Player {} {}", player.id.0, if afk { "is idle" } else { "is active again" });
        }
        entry.afk = afk;
        afk
    }

    /// Idle state from the last pass; unknown players are active.
    pub fn is_afk(&self, player: PlayerId) -> bool {
        self.activity.get(&player).is_some_and(|a| a.afk)
    }

    pub fn settings(&self) -> &SpawnSettings {
        &self.settings
    }

    /// Cooldown for a zone under the current conditions.
    ///
    /// `spawn_multiplier` is the mass-event factor (1.0 when none is active).
    pub fn effective_interval_ms(
        &self,
        zone: &Zone,
        night: bool,
        spawn_multiplier: f64,
    ) -> Option<u64> {
        let base = zone.spawn_interval_ms()? as f64;
        let night_factor = if night {
            self.settings.night_spawn_speedup_factor
        } else {
            1.0
        };
        let multiplier = if spawn_multiplier > 0.0 {
            spawn_multiplier
        } else {
            1.0
        };
        Some((base * night_factor / multiplier).round().max(1.0) as u64)
    }

    /// Level for a natural spawn near `player`, never below 1.
    pub fn roll_level(
        &self,
        zone: &Zone,
        player: &PlayerSnapshot,
        night: bool,
        rng: &mut (impl Rng + ?Sized),
    ) -> u32 {
        let jitter = self.settings.level_jitter as i64;
        let mut level = zone.base_level as i64 + rng.gen_range(-jitter..=jitter);
        if self.settings.player_levels_per_bonus > 0 {
            level += (player.level / self.settings.player_levels_per_bonus) as i64;
        }
        if night {
            level += self.settings.night_level_bonus as i64;
        }
        level.max(1) as u32
    }

    /// Run one pass over `players`, spawning at most one mob per player and
    /// at most `max_spawns_per_tick` in total.
    ///
    /// Nothing spawns while the tracked total is at the hard global cap.
    /// Idle players get a longer cooldown and a lower nearby-mob limit.
    pub fn run_pass<W, E, B>(
        &mut self,
        ctx: &mut SpawnContext<'_, W, E, B>,
        players: &[PlayerSnapshot],
        spawn_multiplier: f64,
        rng: &mut (impl Rng + ?Sized),
    ) -> PassReport
    where
        W: BlockAccess,
        E: EntityLifecycle,
        B: BehaviorHook,
    {
        let mut report = PassReport::default();
        let zones = ctx.zones;

        for player in players {
            let afk = self.update_activity(player, ctx.now_ms);
            if report.spawned.len() >= self.settings.max_spawns_per_tick as usize {
                report.skipped.push((player.id, SpawnSkip::Budget));
                continue;
            }
            if ctx.population.total() >= self.settings.crowding.hard_global_cap {
                report.skipped.push((player.id, SpawnSkip::GlobalCap));
                continue;
            }

            let zone = zones.resolve(ctx.zone_at(player.position));
            let Some(mut interval) = self.effective_interval_ms(zone, ctx.night, spawn_multiplier)
            else {
                report.skipped.push((player.id, SpawnSkip::SafeZone));
                continue;
            };
            if afk {
                let slowed = interval as f64 * self.settings.crowding.afk_interval_multiplier;
                interval = slowed.round().max(1.0) as u64;
            }
            if let Some(&last) = self.last_spawn_ms.get(&player.id) {
                if ctx.now_ms.saturating_sub(last) < interval {
                    report.skipped.push((player.id, SpawnSkip::Cooldown));
                    continue;
                }
            }
            if ctx.population.headroom(zone.id) == 0 {
                report.skipped.push((player.id, SpawnSkip::ZoneFull));
                continue;
            }
            let crowding = &self.settings.crowding;
            let limit = if afk {
                crowding.afk_mob_limit
            } else {
                crowding.max_mobs_per_player
            };
            let radius = crowding.player_check_radius;
            if ctx.population.count_near(&*ctx.entities, player.position, radius) >= limit {
                report.skipped.push((player.id, SpawnSkip::Crowded));
                continue;
            }

            let placement = find_spawn_point(
                ctx.world,
                player.position,
                zone.min_radius,
                zone.max_radius,
                &self.settings.placement,
                true,
                rng,
            );
            let Some(position) = placement.position else {
                debug!(
                    "No spawn point near player {} in zone {} ({:?})",
                    player.id.0, zone.id, placement.rejections
                );
                report.skipped.push((player.id, SpawnSkip::NoPlacement));
                continue;
            };

            let kind = ctx.selector.select(zone.id, rng);
            let level = self.roll_level(zone, player, ctx.night, rng);
            match ctx.spawn_mob(zone.id, kind, position, level, rng) {
                Ok(mob) => {
                    self.last_spawn_ms.insert(player.id, ctx.now_ms);
                    report.spawned.push(mob);
                }
                Err(e) => {
                    warn!("Spawn of {kind:?} in zone {} failed: {e}", zone.id);
                    report.skipped.push((player.id, SpawnSkip::Rejected));
                }
            }
        }

        report
    }

    /// Forget cooldowns and activity of players no longer connected.
    pub fn retain_players(&mut self, online: &HashSet<PlayerId>) {
        self.last_spawn_ms.retain(|id, _| online.contains(id));
        self.activity.retain(|id, _| online.contains(id));
    }

    pub fn tracked_players(&self) -> usize {
        self.last_spawn_ms.len()
    }
}
