//! Mob kind definitions.
//!
//! Every hostile kind carries a difficulty tier, base stats, the zones it may
//! appear in naturally, and a category. Boss categories are never produced by
//! the natural spawn path and never roll affixes.

use std::ops::RangeInclusive;

use crate::zone::ZoneId;

/// Every mob kind known to the spawning core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MobKind {
    // Tier 1
    Walker,
    Crawler,
    Runner,
    Shambler,
    Mummy,
    Drowner,
    Husk,
    Skeleton,
    // Tier 2
    Stray,
    RabidWolf,
    Armored,
    ArmoredElite,
    Spitter,
    Screamer,
    Lurker,
    Bloater,
    Shadow,
    Toxic,
    Pillager,
    HordeZombie,
    // Tier 3
    Vindicator,
    Evoker,
    Berserker,
    Necromancer,
    Explosive,
    Giant,
    Frozen,
    Yeti,
    Wendigo,
    // Tier 4
    Colossus,
    Spectre,
    Ravager,
    Mutant,
    // Tier 5
    GiantBoss,
    CorruptedWarden,
    Archon,
    // Bosses
    Butcher,
    Widow,
    TheGiant,
    ThePhantom,
    PatientZero,
}

/// Behavioral family of a mob kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobCategory {
    Basic,
    Skeleton,
    Pack,
    Tank,
    Elite,
    Ranged,
    Support,
    Stealth,
    Explosive,
    Hazard,
    Illager,
    Melee,
    Summoner,
    Elemental,
    /// Only spawned by scripted events (hordes).
    Event,
    MiniBoss,
    ZoneBoss,
    FinalBoss,
}

impl MobCategory {
    pub fn is_boss(self) -> bool {
        matches!(
            self,
            MobCategory::MiniBoss | MobCategory::ZoneBoss | MobCategory::FinalBoss
        )
    }
}

/// Definition of a mob kind.
#[derive(Debug, Clone)]
pub struct MobDefinition {
    pub kind: MobKind,
    /// Stable identifier, e.g. `"armored_elite"`.
    pub type_id: &'static str,
    pub display_name: &'static str,
    /// Difficulty tier, `1..=5`. Bosses use tier 0.
    pub tier: u8,
    pub category: MobCategory,
    pub max_health: f32,
    pub attack_damage: f32,
    pub movement_speed: f32,
    /// Zones the kind appears in naturally. Empty for event-only kinds.
    pub zones: Vec<RangeInclusive<ZoneId>>,
}

impl MobDefinition {
    pub fn is_boss(&self) -> bool {
        self.category.is_boss()
    }

    pub fn spawns_in(&self, zone: ZoneId) -> bool {
        self.zones.iter().any(|r| r.contains(&zone))
    }
}

/// Registry of mob kinds.
pub struct MobRegistry {
    mobs: Vec<MobDefinition>,
}

impl Default for MobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn def(
    kind: MobKind,
    type_id: &'static str,
    display_name: &'static str,
    tier: u8,
    (max_health, attack_damage, movement_speed): (f32, f32, f32),
    category: MobCategory,
    zones: &[(ZoneId, ZoneId)],
) -> MobDefinition {
    MobDefinition {
        kind,
        type_id,
        display_name,
        tier,
        category,
        max_health,
        attack_damage,
        movement_speed,
        zones: zones.iter().map(|&(a, b)| a..=b).collect(),
    }
}

impl MobRegistry {
    /// Build the registry with all built-in kinds.
    pub fn new() -> Self {
        use MobCategory as C;
        use MobKind as K;

        let mobs = vec![
            def(K::Walker, "walker", "Walker", 1, (25.0, 4.0, 0.18), C::Basic, &[(1, 20), (26, 26)]),
            def(K::Crawler, "crawler", "Crawler", 1, (15.0, 3.0, 0.28), C::Basic, &[(1, 16)]),
            def(K::Runner, "runner", "Runner", 1, (20.0, 5.0, 0.32), C::Basic, &[(3, 26)]),
            def(K::Shambler, "shambler", "Shambler", 1, (35.0, 3.0, 0.14), C::Basic, &[(1, 10)]),
            def(K::Mummy, "mummy", "Mummy", 1, (30.0, 5.0, 0.16), C::Basic, &[(8, 15)]),
            def(K::Drowner, "drowner", "Drowner", 1, (25.0, 4.0, 0.22), C::Basic, &[(3, 9), (13, 14), (34, 35)]),
            def(K::Husk, "husk", "Husk", 1, (30.0, 5.0, 0.20), C::Basic, &[(2, 12), (15, 17), (21, 24)]),
            def(K::Skeleton, "skeleton", "Skeleton", 1, (22.0, 4.0, 0.24), C::Skeleton, &[(1, 40)]),
            def(K::Stray, "stray", "Stray", 2, (28.0, 5.0, 0.22), C::Skeleton, &[(31, 38)]),
            def(K::RabidWolf, "rabid_wolf", "Rabid Wolf", 2, (35.0, 8.0, 0.34), C::Pack, &[(5, 20), (25, 25), (30, 33), (35, 36)]),
            def(K::Armored, "armored", "Armored", 2, (50.0, 6.0, 0.14), C::Tank, &[(6, 30)]),
            def(K::ArmoredElite, "armored_elite", "Armored Elite", 2, (80.0, 8.0, 0.14), C::Elite, &[(10, 30)]),
            def(K::Spitter, "spitter", "Spitter", 2, (30.0, 3.0, 0.20), C::Ranged, &[(13, 25), (43, 44), (47, 47)]),
            def(K::Screamer, "screamer", "Screamer", 2, (25.0, 4.0, 0.22), C::Support, &[(8, 20), (32, 32)]),
            def(K::Lurker, "lurker", "Lurker", 2, (28.0, 8.0, 0.26), C::Stealth, &[(7, 20), (42, 42)]),
            def(K::Bloater, "bloater", "Bloater", 2, (45.0, 2.0, 0.12), C::Explosive, &[(13, 20), (25, 25), (44, 44), (47, 47)]),
            def(K::Shadow, "shadow", "Shadow", 2, (32.0, 7.0, 0.28), C::Stealth, &[(7, 7), (11, 20), (42, 42)]),
            def(K::Toxic, "toxic", "Toxic", 2, (35.0, 4.0, 0.18), C::Hazard, &[(11, 11), (13, 15), (25, 25)]),
            def(K::Pillager, "pillager", "Pillager", 2, (35.0, 6.0, 0.24), C::Illager, &[(10, 25), (28, 30)]),
            def(K::HordeZombie, "horde_zombie", "Horde Zombie", 2, (40.0, 5.0, 0.25), C::Event, &[]),
            def(K::Vindicator, "vindicator", "Vindicator", 3, (45.0, 10.0, 0.26), C::Illager, &[(12, 30), (35, 35), (40, 40)]),
            def(K::Evoker, "evoker", "Evoker", 3, (50.0, 5.0, 0.20), C::Illager, &[(15, 25), (28, 28), (30, 30), (35, 35), (38, 40), (43, 43), (45, 46), (48, 48)]),
            def(K::Berserker, "berserker", "Berserker", 3, (60.0, 8.0, 0.24), C::Melee, &[(12, 12), (16, 30)]),
            def(K::Necromancer, "necromancer", "Necromancer", 3, (45.0, 5.0, 0.16), C::Summoner, &[(15, 15), (19, 19), (38, 39), (43, 43), (46, 46), (48, 48)]),
            def(K::Explosive, "explosive", "Explosive", 3, (35.0, 3.0, 0.30), C::Explosive, &[(18, 18), (21, 22), (24, 24), (27, 27)]),
            def(K::Giant, "giant", "Giant", 3, (120.0, 15.0, 0.10), C::Tank, &[(17, 17), (20, 20), (23, 23), (29, 29)]),
            def(K::Frozen, "frozen", "Frozen", 3, (50.0, 6.0, 0.16), C::Elemental, &[(31, 35), (37, 37)]),
            def(K::Yeti, "yeti", "Yeti", 3, (80.0, 12.0, 0.22), C::Elite, &[(31, 38)]),
            def(K::Wendigo, "wendigo", "Wendigo", 3, (70.0, 14.0, 0.32), C::Elite, &[(31, 31), (35, 38)]),
            def(K::Colossus, "colossus", "Colossus", 4, (150.0, 18.0, 0.08), C::Tank, &[(22, 22), (24, 24), (27, 27), (29, 29), (31, 31), (33, 33), (36, 36), (48, 49)]),
            def(K::Spectre, "spectre", "Spectre", 4, (60.0, 12.0, 0.30), C::Stealth, &[(19, 20), (28, 28), (30, 30), (34, 35), (37, 40), (42, 42), (46, 46)]),
            def(K::Ravager, "ravager", "Ravager", 4, (100.0, 16.0, 0.28), C::Melee, &[(22, 23), (28, 28), (30, 30), (33, 33), (49, 49)]),
            def(K::Mutant, "mutant", "Mutant", 4, (90.0, 13.0, 0.24), C::Tank, &[(28, 30), (35, 35), (40, 40), (45, 45), (48, 49)]),
            def(K::GiantBoss, "giant_boss", "Titan", 5, (500.0, 35.0, 0.12), C::Elite, &[(25, 25), (30, 30), (35, 35), (40, 40), (45, 45), (50, 50)]),
            def(K::CorruptedWarden, "corrupted_warden", "Corrupted Warden", 5, (250.0, 25.0, 0.22), C::Elite, &[(39, 42), (44, 50)]),
            def(K::Archon, "archon", "Archon", 5, (200.0, 22.0, 0.26), C::Elite, &[(40, 41), (43, 43), (45, 50)]),
            def(K::Butcher, "butcher", "The Butcher", 0, (200.0, 12.0, 0.20), C::MiniBoss, &[(10, 10), (15, 15), (20, 20), (25, 25), (30, 30), (35, 35), (40, 40), (45, 45)]),
            def(K::Widow, "widow", "The Widow", 0, (180.0, 10.0, 0.28), C::MiniBoss, &[(15, 15), (20, 20), (25, 25), (30, 30), (35, 35), (40, 40), (45, 45)]),
            def(K::TheGiant, "the_giant", "The Colossal", 0, (300.0, 20.0, 0.08), C::MiniBoss, &[(20, 20), (25, 25), (30, 30), (35, 35), (40, 40), (45, 45)]),
            def(K::ThePhantom, "the_phantom", "The Phantom", 0, (150.0, 14.0, 0.32), C::MiniBoss, &[(25, 25), (30, 30), (35, 35), (40, 40), (45, 45)]),
            def(K::PatientZero, "patient_zero", "Patient Zero", 0, (10_000.0, 50.0, 0.24), C::FinalBoss, &[(50, 50)]),
        ];
        Self { mobs }
    }

    /// Look up a definition by kind.
    pub fn get(&self, kind: MobKind) -> Option<&MobDefinition> {
        self.mobs.iter().find(|m| m.kind == kind)
    }

    /// Look up a definition by its type identifier.
    pub fn by_type_id(&self, type_id: &str) -> Option<&MobDefinition> {
        self.mobs.iter().find(|m| m.type_id == type_id)
    }

    /// All known definitions.
    pub fn all(&self) -> &[MobDefinition] {
        &self.mobs
    }

    /// Non-boss kinds that spawn naturally in `zone`.
    pub fn natural_spawns(&self, zone: ZoneId) -> impl Iterator<Item = &MobDefinition> {
        self.mobs
            .iter()
            .filter(move |m| !m.is_boss() && m.spawns_in(zone))
    }

    pub fn is_boss(&self, kind: MobKind) -> bool {
        self.get(kind).is_some_and(MobDefinition::is_boss)
    }

    /// Replace or add a definition.
    pub fn register_mob(&mut self, def: MobDefinition) {
        self.mobs.retain(|m| m.kind != def.kind);
        self.mobs.push(def);
    }
}

/// Boss kind guarding a zone's boss encounter.
pub fn boss_for_zone(zone: ZoneId) -> MobKind {
    match zone {
        1..=2 => MobKind::Butcher,
        3..=4 => MobKind::Widow,
        5..=6 => MobKind::TheGiant,
        7..=8 => MobKind::ThePhantom,
        9..=11 => MobKind::PatientZero,
        _ => MobKind::Butcher,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_one_definition() {
        let reg = MobRegistry::new();
        for def in reg.all() {
            let count = reg.all().iter().filter(|d| d.kind == def.kind).count();
            assert_eq!(count, 1, "{:?} defined {count} times", def.kind);
            assert_eq!(reg.by_type_id(def.type_id).unwrap().kind, def.kind);
        }
    }

    #[test]
    fn bosses_excluded_from_natural_spawns() {
        let reg = MobRegistry::new();
        assert!(reg.is_boss(MobKind::Butcher));
        assert!(reg.is_boss(MobKind::PatientZero));
        assert!(!reg.is_boss(MobKind::Walker));
        for zone in 0..=50 {
            assert!(reg.natural_spawns(zone).all(|d| !d.is_boss()));
        }
        // Butcher lists zone 10 but must not show up there
        assert!(!reg.natural_spawns(10).any(|d| d.kind == MobKind::Butcher));
    }

    #[test]
    fn zone_one_is_tier_one_only() {
        let reg = MobRegistry::new();
        let kinds: Vec<_> = reg.natural_spawns(1).map(|d| d.kind).collect();
        assert!(kinds.contains(&MobKind::Walker));
        assert!(kinds.contains(&MobKind::Skeleton));
        assert!(reg.natural_spawns(1).all(|d| d.tier == 1));
    }

    #[test]
    fn event_kinds_have_no_zones() {
        let reg = MobRegistry::new();
        let horde = reg.get(MobKind::HordeZombie).unwrap();
        assert!(horde.zones.is_empty());
        assert!(!(0..=50).any(|z| horde.spawns_in(z)));
    }

    #[test]
    fn boss_mapping() {
        assert_eq!(boss_for_zone(1), MobKind::Butcher);
        assert_eq!(boss_for_zone(4), MobKind::Widow);
        assert_eq!(boss_for_zone(6), MobKind::TheGiant);
        assert_eq!(boss_for_zone(7), MobKind::ThePhantom);
        assert_eq!(boss_for_zone(11), MobKind::PatientZero);
        assert_eq!(boss_for_zone(30), MobKind::Butcher);
    }

    #[test]
    fn register_replaces_existing() {
        let mut reg = MobRegistry::new();
        let before = reg.all().len();
        let mut walker = reg.get(MobKind::Walker).unwrap().clone();
        walker.max_health = 99.0;
        reg.register_mob(walker);
        assert_eq!(reg.all().len(), before);
        assert_eq!(reg.get(MobKind::Walker).unwrap().max_health, 99.0);
    }
}
