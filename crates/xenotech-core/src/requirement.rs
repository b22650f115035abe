//! Prerequisite model: single requirements and AND/OR requirement sets.
//!
//! References inside a [`Requirement`] are already resolved to direct ids;
//! symbolic-name resolution happens exactly once, during catalog build, and
//! a failure there is a configuration error. Evaluation is pure and cheap.

use crate::id::{ItemId, SiteId, SpeciesId, TopicId};
use crate::topic::{ResearchStatus, Topic};
use crate::world::{Inventory, Vitality};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requirement
// ---------------------------------------------------------------------------

/// A single precondition. The comparator for every counted kind is `>=`,
/// in both the AND and the OR branch of a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement {
    /// The referenced topic must be finished.
    TechResearched(TopicId),
    /// The referenced topic must NOT be finished.
    TechMissing(TopicId),
    /// The evaluation site must stock at least `amount` of `item`.
    ItemStock { item: ItemId, amount: u32 },
    /// The evaluation site must hold at least `amount` specimens of
    /// `species` with the given vitality.
    SpecimenHeld {
        species: SpeciesId,
        vitality: Vitality,
        amount: u32,
    },
    /// At least `amount` specimens campaign-wide, any site, any vitality.
    SpecimenGlobal { amount: u32 },
    /// Placeholder for a scripted campaign trigger. The trigger backend was
    /// never built; this kind evaluates to unsatisfied in both branches and
    /// exists so data files mentioning it still load.
    Event { trigger: String },
}

impl Requirement {
    /// Evaluate against the current topic statuses and the site's inventory.
    pub fn is_met(&self, topics: &[Topic], site: SiteId, inventory: &dyn Inventory) -> bool {
        match self {
            Requirement::TechResearched(t) => {
                topics[t.index()].status == ResearchStatus::Finished
            }
            Requirement::TechMissing(t) => topics[t.index()].status != ResearchStatus::Finished,
            Requirement::ItemStock { item, amount } => {
                inventory.item_count(site, *item) >= *amount
            }
            Requirement::SpecimenHeld {
                species,
                vitality,
                amount,
            } => inventory.specimen_count(site, *species, *vitality) >= *amount,
            Requirement::SpecimenGlobal { amount } => {
                inventory.specimen_count_global() >= *amount
            }
            Requirement::Event { .. } => false,
        }
    }
}

// ---------------------------------------------------------------------------
// RequirementSet
// ---------------------------------------------------------------------------

/// An ANDed list and an ORed list of requirements.
///
/// The set is met when either branch is sufficient on its own:
/// - both lists empty: vacuously met;
/// - AND branch: non-empty and every entry holds;
/// - OR branch: any entry holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSet {
    pub all: Vec<Requirement>,
    pub any: Vec<Requirement>,
}

impl RequirementSet {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.any.is_empty()
    }

    /// See the type-level rules. Short-circuits on the first unmet AND entry
    /// and the first met OR entry.
    pub fn is_met(&self, topics: &[Topic], site: SiteId, inventory: &dyn Inventory) -> bool {
        if self.is_empty() {
            return true;
        }
        let met_all = !self.all.is_empty()
            && self.all.iter().all(|req| req.is_met(topics, site, inventory));
        let met_any = self.any.iter().any(|req| req.is_met(topics, site, inventory));
        met_all || met_any
    }
}

// ===========================================================================
// Tests
// ===========================================================================
