//! Skill catalog and skill pool
//!
//! Skills are data. Their behavior lives in the hook points of the combat
//! resolver (`chain_lightning`, `shield_barrier`, `vampiric_touch`) and the
//! per-tick passive hooks (`fire_aura`, `ice_shatter`).

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::game::constants::skills::{CHAIN_UNLOCK_WAVE, OFFER_COUNT};

/// Stable skill identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillId {
    ChainLightning,
    ShieldBarrier,
    FireAura,
    IceShatter,
    VampiricTouch,
}

impl SkillId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillId::ChainLightning => "chain_lightning",
            SkillId::ShieldBarrier => "shield_barrier",
            SkillId::FireAura => "fire_aura",
            SkillId::IceShatter => "ice_shatter",
            SkillId::VampiricTouch => "vampiric_touch",
        }
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown skill id: {0}")]
pub struct UnknownSkill(pub String);

impl FromStr for SkillId {
    type Err = UnknownSkill;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATALOG
            .iter()
            .map(|skill| skill.id)
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownSkill(s.to_string()))
    }
}

/// Hook category a skill plugs into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillEffect {
    /// Runs after a typed defeat
    DefeatTrigger,
    /// Runs every tick around the player
    PassiveAura,
    /// Alters damage intake
    DamageMitigation,
    /// Heals on every defeat
    OnHitHeal,
    /// Runs when the player starts typing
    InputTrigger,
}

/// Immutable skill definition
#[derive(Debug, Clone, Serialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: Option<&'static str>,
    pub effect: SkillEffect,
    /// Minimum wave before the skill can be offered
    pub unlock_wave: u32,
}

impl Skill {
    /// Look up a definition in the catalog
    pub fn get(id: SkillId) -> &'static Skill {
        // Every SkillId variant has exactly one catalog entry, in declaration order.
        &CATALOG[id as usize]
    }

    pub fn is_unlocked(&self, current_wave: u32) -> bool {
        current_wave >= self.unlock_wave
    }
}

/// Master skill catalog, in offer order
pub static CATALOG: [Skill; 5] = [
    Skill {
        id: SkillId::ChainLightning,
        name: "Chain Lightning",
        description: "30% chance on defeat to strike another adversary for 30% of the defeated one's HP",
        icon: Some("⚡"),
        effect: SkillEffect::DefeatTrigger,
        unlock_wave: CHAIN_UNLOCK_WAVE,
    },
    Skill {
        id: SkillId::ShieldBarrier,
        name: "Shield Barrier",
        description: "Negates the first damage taken",
        icon: Some("🛡"),
        effect: SkillEffect::DamageMitigation,
        unlock_wave: 1,
    },
    Skill {
        id: SkillId::FireAura,
        name: "Fire Aura",
        description: "Burns nearby adversaries for 5 damage every tick",
        icon: Some("🔥"),
        effect: SkillEffect::PassiveAura,
        unlock_wave: 1,
    },
    Skill {
        id: SkillId::IceShatter,
        name: "Ice Shatter",
        description: "Starting to type freezes every adversary for 1s (10s cooldown)",
        icon: Some("❄"),
        effect: SkillEffect::InputTrigger,
        unlock_wave: 1,
    },
    Skill {
        id: SkillId::VampiricTouch,
        name: "Vampiric Touch",
        description: "Heal 1 HP on every defeat",
        icon: Some("❤"),
        effect: SkillEffect::OnHitHeal,
        unlock_wave: 1,
    },
];

/// Offered and chosen skills
///
/// A skill id lives in at most one of the two sets, and once active it is
/// never offered again.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SkillPool {
    available: SmallVec<[SkillId; 5]>,
    active: SmallVec<[SkillId; 5]>,
}

impl SkillPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer up to `OFFER_COUNT` new candidates for `current_wave`
    ///
    /// Candidates come in catalog order and skip skills that are already
    /// available, already active, or still locked. They are appended to the
    /// available set and returned.
    pub fn offer(&mut self, current_wave: u32) -> SmallVec<[SkillId; OFFER_COUNT]> {
        let candidates: SmallVec<[SkillId; OFFER_COUNT]> = CATALOG
            .iter()
            .filter(|skill| skill.is_unlocked(current_wave))
            .map(|skill| skill.id)
            .filter(|id| !self.is_available(*id) && !self.is_active(*id))
            .take(OFFER_COUNT)
            .collect();

        self.available.extend(candidates.iter().copied());
        candidates
    }

    /// Move a skill from available to active
    ///
    /// Returns false (and changes nothing) when the skill was not on offer.
    pub fn choose(&mut self, id: SkillId) -> bool {
        if self.is_active(id) {
            return false;
        }
        let Some(index) = self.available.iter().position(|s| *s == id) else {
            return false;
        };
        self.available.remove(index);
        self.active.push(id);
        true
    }

    #[inline]
    pub fn is_active(&self, id: SkillId) -> bool {
        self.active.contains(&id)
    }

    #[inline]
    pub fn is_available(&self, id: SkillId) -> bool {
        self.available.contains(&id)
    }

    pub fn available(&self) -> &[SkillId] {
        &self.available
    }

    pub fn active(&self) -> &[SkillId] {
        &self.active
    }
}

/// Per-skill runtime bookkeeping (charges and cooldowns)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SkillRuntime {
    /// Shield charge armed when the shield is chosen, consumed by the first hit
    pub shield_charge: bool,
    /// First tick at which ice shatter may trigger again
    pub freeze_ready_at: u64,
    /// First tick at which lifesteal may heal again
    pub lifesteal_ready_at: u64,
    /// Lifesteal cooldown in ticks (0 = heal on every defeat)
    pub lifesteal_cooldown_ticks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_indexes_match_ids() {
        for skill in CATALOG.iter() {
            assert_eq!(Skill::get(skill.id).id, skill.id);
        }
    }

    #[test]
    fn test_skill_id_parse() {
        assert_eq!("fire_aura".parse::<SkillId>(), Ok(SkillId::FireAura));
        assert_eq!(
            "vampiric_touch".parse::<SkillId>(),
            Ok(SkillId::VampiricTouch)
        );
        assert!("laser_eyes".parse::<SkillId>().is_err());
    }

    #[test]
    fn test_offer_wave_one_skips_locked_chain() {
        let mut pool = SkillPool::new();
        let offered = pool.offer(1);
        assert_eq!(
            offered.as_slice(),
            &[SkillId::ShieldBarrier, SkillId::FireAura, SkillId::IceShatter]
        );
        assert_eq!(pool.available(), offered.as_slice());
    }

    #[test]
    fn test_offer_wave_two_includes_chain() {
        let mut pool = SkillPool::new();
        let offered = pool.offer(2);
        assert_eq!(offered[0], SkillId::ChainLightning);
        assert_eq!(offered.len(), 3);
    }

    #[test]
    fn test_offer_excludes_available_and_active() {
        let mut pool = SkillPool::new();
        pool.offer(2);
        assert!(pool.choose(SkillId::ShieldBarrier));

        let second = pool.offer(2);
        assert_eq!(second.as_slice(), &[SkillId::IceShatter, SkillId::VampiricTouch]);
        assert!(!second.contains(&SkillId::ShieldBarrier));

        // Catalog exhausted
        assert!(pool.offer(10).is_empty());
    }

    #[test]
    fn test_choose_moves_to_active() {
        let mut pool = SkillPool::new();
        pool.offer(1);
        assert!(pool.choose(SkillId::FireAura));
        assert!(pool.is_active(SkillId::FireAura));
        assert!(!pool.is_available(SkillId::FireAura));
    }

    #[test]
    fn test_choose_unknown_or_repeated_is_noop() {
        let mut pool = SkillPool::new();
        pool.offer(1);
        let before = pool.clone();

        // Locked at wave 1, never offered
        assert!(!pool.choose(SkillId::ChainLightning));
        assert_eq!(pool, before);

        assert!(pool.choose(SkillId::ShieldBarrier));
        let after_first = pool.clone();
        assert!(!pool.choose(SkillId::ShieldBarrier));
        assert_eq!(pool, after_first);
    }

    #[test]
    fn test_sets_stay_disjoint() {
        let mut pool = SkillPool::new();
        for wave in 1..6 {
            pool.offer(wave);
            if let Some(&first) = pool.available().first() {
                pool.choose(first);
            }
            for id in pool.active() {
                assert!(!pool.is_available(*id));
            }
        }
    }
}
