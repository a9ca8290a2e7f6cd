//! Console commands, registry, and handlers.

use std::collections::HashMap;

use horde_rs_game::mob_registry::boss_for_zone;
use horde_rs_game::spawning::horde::{BossSpawn, HordePlan, HordeState};
use horde_rs_game::zone::{ZoneId, SPAWN_ZONE};
use horde_rs_world::Vec3;

use crate::server::ServerState;

/// Result returned by a command handler.
pub struct CommandResult {
    /// Whether the command executed successfully.
    pub success: bool,
    /// Lines to print on the console.
    pub messages: Vec<String>,
    /// If true, the server should shut down.
    pub should_stop: bool,
}

impl CommandResult {
    /// Create a successful result with a single message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
            should_stop: false,
        }
    }

    /// Create a failed result with a single message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
            should_stop: false,
        }
    }

    fn lines(messages: Vec<String>) -> Self {
        Self {
            success: true,
            messages,
            should_stop: false,
        }
    }
}

/// Function pointer type for command handlers.
pub type CommandFn = fn(&mut ServerState, &[String]) -> CommandResult;

/// A registered command.
pub struct CommandEntry {
    pub name: String,
    pub usage: String,
    pub description: String,
    pub handler: CommandFn,
}

/// Registry of console commands.
pub struct CommandRegistry {
    commands: HashMap<String, CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            commands: HashMap::new(),
        };
        registry.register("stats", "stats", "Show population and spawn counters", cmd_stats);
        registry.register("zones", "zones", "List zones with live mobs", cmd_zones);
        registry.register("horde", "horde <zone> [total]", "Start a fixed-size horde", cmd_horde);
        registry.register("waves", "waves <zone> [max]", "Start an escalating wave horde", cmd_waves);
        registry.register("cancel", "cancel <zone>", "Cancel a running horde", cmd_cancel);
        registry.register(
            "bloodmoon",
            "bloodmoon [factor] [seconds]",
            "Start a mass spawn event",
            cmd_bloodmoon,
        );
        registry.register("endmoon", "endmoon", "End the mass spawn event", cmd_endmoon);
        registry.register(
            "boss",
            "boss <zone> [type]",
            "Spawn the zone boss, or force a specific one",
            cmd_boss,
        );
        registry.register("purge", "purge [zone]", "Despawn tracked mobs", cmd_purge);
        registry.register("time", "time <ticks>", "Set the time of day", cmd_time);
        registry.register("reload", "reload", "Reload zones and affixes from the config", cmd_reload);
        registry.register("stop", "stop", "Stop the server", cmd_stop);
        registry
    }

    fn register(&mut self, name: &str, usage: &str, description: &str, handler: CommandFn) {
        self.commands.insert(
            name.to_string(),
            CommandEntry {
                name: name.to_string(),
                usage: usage.to_string(),
                description: description.to_string(),
                handler,
            },
        );
    }

    /// Parse and run one console line.
    pub fn dispatch(&self, state: &mut ServerState, line: &str) -> CommandResult {
        let mut parts = line.split_whitespace().map(String::from);
        let Some(name) = parts.next() else {
            return CommandResult::lines(Vec::new());
        };
        let args: Vec<String> = parts.collect();
        self.execute(state, name.trim_start_matches('/'), &args)
    }

    /// Execute a command by name.
    pub fn execute(&self, state: &mut ServerState, name: &str, args: &[String]) -> CommandResult {
        if name == "help" {
            return self.help();
        }
        match self.commands.get(name) {
            Some(entry) => (entry.handler)(state, args),
            None => CommandResult::err(format!(
                "Unknown command: {name}. Type help for a list of commands."
            )),
        }
    }

    fn help(&self) -> CommandResult {
        let mut entries: Vec<&CommandEntry> = self.commands.values().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let mut lines = vec!["Available commands:".to_string()];
        lines.extend(
            entries
                .iter()
                .map(|e| format!("  {} - {}", e.usage, e.description)),
        );
        CommandResult::lines(lines)
    }

    pub fn get_commands(&self) -> &HashMap<String, CommandEntry> {
        &self.commands
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn parse_zone(state: &ServerState, arg: Option<&String>, usage: &str) -> Result<ZoneId, CommandResult> {
    let Some(arg) = arg else {
        return Err(CommandResult::err(format!("Usage: {usage}")));
    };
    let zone: ZoneId = arg
        .parse()
        .map_err(|_| CommandResult::err(format!("Invalid zone: {arg}")))?;
    if zone == SPAWN_ZONE || state.director.zones().get(zone).is_none() {
        return Err(CommandResult::err(format!("No playable zone {zone}")));
    }
    Ok(zone)
}

fn parse_opt<T: std::str::FromStr>(arg: Option<&String>, what: &str) -> Result<Option<T>, CommandResult> {
    match arg {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| CommandResult::err(format!("Invalid {what}: {s}"))),
    }
}

/// Ground-level point in the middle of the zone's band.
fn zone_center(state: &ServerState, zone: ZoneId) -> Vec3 {
    let z = state.director.zones().resolve(zone);
    let mid = (z.min_z + z.max_z) / 2;
    Vec3::block_center(0, state.level.surface_y(), mid)
}

/// First player standing in `zone`, else the zone center.
fn anchor_in_zone(state: &ServerState, zone: ZoneId) -> Vec3 {
    state
        .entities
        .players()
        .into_iter()
        .find(|p| state.director.zones().zone_id_at(p.position.z.floor() as i32) == zone)
        .map(|p| p.position)
        .unwrap_or_else(|| zone_center(state, zone))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn cmd_stats(state: &mut ServerState, _args: &[String]) -> CommandResult {
    let d = state.director.stats();
    let b = state.director.burst_stats();
    let population = state.director.population();
    let day = state.director.day();
    CommandResult::lines(vec![
        format!(
            "Tick {} | time {} ({}) | multiplier x{:.1}",
            d.ticks,
            day.time,
            if day.is_night() { "night" } else { "day" },
            state.director.spawn_multiplier()
        ),
        format!(
            "Mobs: {} tracked, {} entities, {} players",
            population.total(),
            state.entities.mob_count(),
            state.demo.len()
        ),
        format!(
            "Spawns: {} steady, {} horde, {} bosses | deaths {} | swept {} | crowd trims {}",
            d.steady_spawns,
            b.horde_mobs_spawned,
            b.bosses_spawned,
            d.deaths,
            d.swept_mobs,
            d.crowd_trimmed
        ),
        format!(
            "Hordes: {} started, {} won, {} cancelled, {} abandoned | mass events {}",
            b.hordes_started, b.hordes_won, b.hordes_cancelled, b.hordes_abandoned, b.mass_events
        ),
    ])
}

fn cmd_zones(state: &mut ServerState, _args: &[String]) -> CommandResult {
    let population = state.director.population();
    let mut lines = Vec::new();
    for (zone, live) in population.zone_counts() {
        let z = state.director.zones().resolve(zone);
        let horde = match state.director.horde_state(zone) {
            HordeState::Idle => String::new(),
            HordeState::Running { wave } => format!(" [horde wave {wave}]"),
        };
        lines.push(format!("  {zone:>3} {:<20} {live}/{}{horde}", z.name, z.capacity));
    }
    if lines.is_empty() {
        return CommandResult::ok("No live mobs.");
    }
    lines.insert(0, "Zones with live mobs:".to_string());
    CommandResult::lines(lines)
}

fn cmd_horde(state: &mut ServerState, args: &[String]) -> CommandResult {
    let zone = match parse_zone(state, args.first(), "horde <zone> [total]") {
        Ok(z) => z,
        Err(e) => return e,
    };
    let total = match parse_opt::<u32>(args.get(1), "total") {
        Ok(t) => t.unwrap_or(state.director.settings().horde.wave_base),
        Err(e) => return e,
    };
    if total == 0 {
        return CommandResult::err("Total must be at least 1");
    }
    let center = zone_center(state, zone);
    if state.director.start_horde(zone, center, HordePlan::Fixed { total }) {
        CommandResult::ok(format!("Horde of {total} started in zone {zone}"))
    } else {
        CommandResult::err(format!("A horde is already running in zone {zone}"))
    }
}

fn cmd_waves(state: &mut ServerState, args: &[String]) -> CommandResult {
    let zone = match parse_zone(state, args.first(), "waves <zone> [max]") {
        Ok(z) => z,
        Err(e) => return e,
    };
    let max_waves = match parse_opt::<u32>(args.get(1), "wave count") {
        Ok(m) => m.unwrap_or(state.director.settings().horde.max_waves),
        Err(e) => return e,
    };
    if max_waves == 0 {
        return CommandResult::err("Wave count must be at least 1");
    }
    let center = zone_center(state, zone);
    if state.director.start_horde(zone, center, HordePlan::Waves { max_waves }) {
        CommandResult::ok(format!("{max_waves} waves incoming in zone {zone}"))
    } else {
        CommandResult::err(format!("A horde is already running in zone {zone}"))
    }
}

fn cmd_cancel(state: &mut ServerState, args: &[String]) -> CommandResult {
    let zone = match parse_zone(state, args.first(), "cancel <zone>") {
        Ok(z) => z,
        Err(e) => return e,
    };
    match state.director.cancel_horde(zone) {
        Some(outcome) => CommandResult::ok(format!(
            "Cancelled horde in zone {zone} after {} mobs",
            outcome.placed
        )),
        None => CommandResult::err(format!("No horde running in zone {zone}")),
    }
}

fn cmd_bloodmoon(state: &mut ServerState, args: &[String]) -> CommandResult {
    let factor = match parse_opt::<f64>(args.first(), "factor") {
        Ok(f) => f,
        Err(e) => return e,
    };
    let seconds = match parse_opt::<u64>(args.get(1), "duration") {
        Ok(s) => s,
        Err(e) => return e,
    };
    if state.director.start_mass_event(factor, seconds) {
        CommandResult::ok(format!(
            "Blood moon started: spawns x{:.1}",
            state.director.spawn_multiplier()
        ))
    } else {
        CommandResult::err("A mass event is already running")
    }
}

fn cmd_endmoon(state: &mut ServerState, _args: &[String]) -> CommandResult {
    if state.director.end_mass_event() {
        CommandResult::ok("Blood moon ended")
    } else {
        CommandResult::err("No mass event running")
    }
}

fn cmd_boss(state: &mut ServerState, args: &[String]) -> CommandResult {
    let zone = match parse_zone(state, args.first(), "boss <zone> [type]") {
        Ok(z) => z,
        Err(e) => return e,
    };
    let position = anchor_in_zone(state, zone);
    let ServerState {
        director,
        level,
        entities,
        behavior,
        ..
    } = state;

    if let Some(type_id) = args.get(1) {
        let kind = match director.mobs().by_type_id(type_id) {
            Some(def) if def.is_boss() => def.kind,
            Some(_) => return CommandResult::err(format!("{type_id} is not a boss")),
            None => return CommandResult::err(format!("Unknown mob type: {type_id}")),
        };
        return match director.force_spawn_boss(&*level, entities, behavior, zone, kind, position) {
            Ok(mob) => CommandResult::ok(format!("Forced {:?} (level {}) in zone {zone}", mob.kind, mob.level)),
            Err(e) => CommandResult::err(format!("Boss spawn failed: {e}")),
        };
    }

    match director.try_spawn_boss(&*level, entities, behavior, zone, position) {
        Ok(BossSpawn::Spawned(mob)) => {
            CommandResult::ok(format!("{:?} (level {}) spawned in zone {zone}", mob.kind, mob.level))
        }
        Ok(BossSpawn::OnCooldown { remaining_ms }) => CommandResult::err(format!(
            "{:?} is on cooldown for {}s",
            boss_for_zone(zone),
            remaining_ms.div_ceil(1000)
        )),
        Err(e) => CommandResult::err(format!("Boss spawn failed: {e}")),
    }
}

fn cmd_purge(state: &mut ServerState, args: &[String]) -> CommandResult {
    let zone = match args.first() {
        None => None,
        Some(_) => match parse_zone(state, args.first(), "purge [zone]") {
            Ok(z) => Some(z),
            Err(e) => return e,
        },
    };
    let removed = state.director.purge(&mut state.entities, zone);
    match zone {
        Some(zone) => CommandResult::ok(format!("Purged {removed} mobs from zone {zone}")),
        None => CommandResult::ok(format!("Purged {removed} mobs")),
    }
}

fn cmd_time(state: &mut ServerState, args: &[String]) -> CommandResult {
    let time = match parse_opt::<u64>(args.first(), "time") {
        Ok(Some(t)) => t,
        Ok(None) => return CommandResult::err("Usage: time <ticks>"),
        Err(e) => return e,
    };
    state.director.set_time_of_day(time);
    let day = state.director.day();
    CommandResult::ok(format!(
        "Time set to {} ({})",
        day.time,
        if day.is_night() { "night" } else { "day" }
    ))
}

fn cmd_reload(state: &mut ServerState, _args: &[String]) -> CommandResult {
    match state.reload() {
        Ok(zones) => CommandResult::ok(format!("Reloaded {zones} zones")),
        Err(e) => CommandResult::err(format!("Reload failed: {e}")),
    }
}

fn cmd_stop(_state: &mut ServerState, _args: &[String]) -> CommandResult {
    CommandResult {
        success: true,
        messages: vec!["Stopping the server...".to_string()],
        should_stop: true,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
