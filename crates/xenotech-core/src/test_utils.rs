//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these are
//! available everywhere test code runs without shipping in release builds.

use crate::catalog::{Catalog, TopicDef};
use crate::effort::Fixed64;
use crate::engine::{EngineConfig, ResearchEngine};
use crate::id::TopicId;
use crate::requirement::RequirementSet;
use crate::topic::{DescriptionList, MailState, ResearchStatus, Topic, TopicKind};
use crate::world::CampaignWorld;

/// A plain costed tech definition with no requirements.
pub fn def(id: &str, cost: f64) -> TopicDef {
    TopicDef::new(id, TopicKind::Tech, cost)
}

/// Build a catalog from `defs` resolving against `world`, wrap it in an
/// engine with default config. Panics on configuration errors; definitions
/// in tests are expected to be well-formed.
pub fn engine_with(defs: Vec<TopicDef>, world: &CampaignWorld) -> ResearchEngine {
    let catalog = Catalog::build(defs, world).expect("test catalog should build");
    ResearchEngine::new(catalog, EngineConfig::default())
}

/// A free-standing topic value for tests that evaluate requirements against
/// a plain slice without building a catalog.
pub fn bare_topic(id: &str, index: u32, cost: f64) -> Topic {
    Topic {
        id: id.to_string(),
        index: TopicId(index),
        name: id.to_string(),
        kind: TopicKind::Tech,
        base_cost: Fixed64::from_num(cost),
        requires: RequirementSet::default(),
        production_requires: RequirementSet::default(),
        provides: None,
        redirect: None,
        researched_at_start: false,
        description: DescriptionList::plain("No description available."),
        proposal: DescriptionList::plain("No research proposal available."),
        status: ResearchStatus::Unstarted,
        remaining_cost: Fixed64::from_num(cost),
        discoverable: false,
        collected: false,
        site: None,
        workers: 0,
        mail: MailState::None,
        first_discoverable: None,
        finished_at: None,
    }
}
