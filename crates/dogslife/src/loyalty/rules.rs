use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Cents, RequirementId};

/// Requirement id of the exam, which gets special treatment in level 5.
pub const EXAM: &str = "exam";

/// Highest numeric level; VIP and Expert are overlays, not levels.
pub const MAX_LEVEL: u8 = 5;

/// A named tier in the progression ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub id: u8,
    pub name: &'static str,
}

/// A countable prerequisite gating advancement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub name: &'static str,
    pub required: u32,
}

impl Requirement {
    fn new(id: &str, name: &'static str, required: u32) -> Self {
        Self {
            id: RequirementId::new(id),
            name,
            required,
        }
    }
}

/// One step of the top-up bonus ladder. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusTier {
    pub min_base_cents: Cents,
    pub bonus_cents: Cents,
}

/// A bookable course/event with its catalog price and progress tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitPreset {
    pub title: &'static str,
    pub amount_cents: Cents,
    pub requirement: RequirementId,
}

/// Immutable rule tables injected into the engine and booking helpers.
///
/// Plain data; tests and alternative school configurations can replace
/// [`Rulebook::standard`] wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rulebook {
    pub levels: Vec<LevelDefinition>,
    pub level_requirements: BTreeMap<u8, Vec<Requirement>>,
    pub license_prereqs: Vec<Requirement>,
    /// Sorted descending by `min_base_cents`; the first matching tier wins.
    pub bonus_tiers: Vec<BonusTier>,
    pub debit_presets: Vec<DebitPreset>,
    pub vip_label: &'static str,
    pub expert_label: &'static str,
}

impl Rulebook {
    /// The production rule set of the school.
    pub fn standard() -> Self {
        let level_requirements = BTreeMap::from([
            // Level 1 (Welpen) has no completion requirements.
            (
                2,
                vec![
                    Requirement::new("group_class", "Gruppenstunde", 6),
                    Requirement::new(EXAM, "Prüfung", 1),
                ],
            ),
            (
                3,
                vec![
                    Requirement::new("group_class", "Gruppenstunde", 6),
                    Requirement::new(EXAM, "Prüfung", 1),
                ],
            ),
            (
                4,
                vec![
                    Requirement::new("social_walk", "Social Walk", 6),
                    Requirement::new("tavern_training", "Wirtshaustraining", 2),
                    Requirement::new(EXAM, "Prüfung", 1),
                ],
            ),
            (5, vec![Requirement::new(EXAM, "Prüfung", 1)]),
        ]);

        let license_prereqs = vec![
            Requirement::new("lecture_bonding", "Vortrag Bindung & Beziehung", 1),
            Requirement::new("lecture_hunting", "Vortrag Jagdverhalten", 1),
            Requirement::new("ws_communication", "WS Kommunikation & Körpersprache", 1),
            Requirement::new("ws_stress", "WS Stress & Impulskontrolle", 1),
            Requirement::new("theory_license", "Theorieabend Hundeführerschein", 1),
            Requirement::new("first_aid", "Erste-Hilfe-Kurs", 1),
        ];

        Self {
            levels: vec![
                LevelDefinition { id: 1, name: "Welpen" },
                LevelDefinition { id: 2, name: "Grundlagen" },
                LevelDefinition { id: 3, name: "Fortgeschrittene" },
                LevelDefinition { id: 4, name: "Masterclass" },
                LevelDefinition { id: 5, name: "Hundeführerschein" },
            ],
            level_requirements,
            license_prereqs,
            bonus_tiers: vec![
                BonusTier { min_base_cents: 30_000, bonus_cents: 15_000 },
                BonusTier { min_base_cents: 15_000, bonus_cents: 3_000 },
                BonusTier { min_base_cents: 10_000, bonus_cents: 1_500 },
                BonusTier { min_base_cents: 5_000, bonus_cents: 500 },
            ],
            debit_presets: vec![
                DebitPreset { title: "Gruppenstunde", amount_cents: -1_500, requirement: RequirementId::new("group_class") },
                DebitPreset { title: "Trail", amount_cents: -1_800, requirement: RequirementId::new("trail") },
                DebitPreset { title: "Prüfungsstunde", amount_cents: -1_500, requirement: RequirementId::new(EXAM) },
                DebitPreset { title: "Social Walk", amount_cents: -1_500, requirement: RequirementId::new("social_walk") },
                DebitPreset { title: "Wirtshaustraining", amount_cents: -1_500, requirement: RequirementId::new("tavern_training") },
                DebitPreset { title: "Erste Hilfe Kurs", amount_cents: -5_000, requirement: RequirementId::new("first_aid") },
                DebitPreset { title: "Vortrag Bindung & Beziehung", amount_cents: -1_500, requirement: RequirementId::new("lecture_bonding") },
                DebitPreset { title: "Vortrag Jagdverhalten", amount_cents: -1_500, requirement: RequirementId::new("lecture_hunting") },
                DebitPreset { title: "WS Kommunikation & Körpersprache", amount_cents: -1_500, requirement: RequirementId::new("ws_communication") },
                DebitPreset { title: "WS Stress & Impulskontrolle", amount_cents: -1_500, requirement: RequirementId::new("ws_stress") },
                DebitPreset { title: "Theorieabend Hundeführerschein", amount_cents: -2_500, requirement: RequirementId::new("theory_license") },
            ],
            vip_label: "VIP-Kunde",
            expert_label: "Experte",
        }
    }

    pub fn level_name(&self, level_id: u8) -> Option<&'static str> {
        self.levels
            .iter()
            .find(|level| level.id == level_id)
            .map(|level| level.name)
    }

    /// Requirements to complete `level_id`, empty for level 1 and unknown ids.
    pub fn requirements_for(&self, level_id: u8) -> &[Requirement] {
        self.level_requirements
            .get(&level_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_license_prereq(&self, id: &RequirementId) -> bool {
        self.license_prereqs.iter().any(|req| &req.id == id)
    }

    pub fn debit_preset(&self, requirement: &RequirementId) -> Option<&DebitPreset> {
        self.debit_presets
            .iter()
            .find(|preset| &preset.requirement == requirement)
    }
}
