//! Topic definitions and per-topic runtime state.
//!
//! A [`Topic`] is one node of the research graph. Its static shape
//! (requirements, cost, kind, provided product) comes from the catalog
//! build and never changes; its runtime fields (status, remaining cost,
//! staffing, notification guard) mutate continuously during play.

use crate::effort::{Fixed64, Ticks};
use crate::id::{ProductId, SiteId, TopicId};
use crate::requirement::RequirementSet;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// What a topic describes. Mostly relevant to the layers above the engine;
/// the engine itself only special-cases `Logic` (structural nodes that never
/// produce a finished notification).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopicKind {
    Tech,
    Weapon,
    Armour,
    Craft,
    CraftItem,
    Building,
    Alien,
    Ugv,
    News,
    /// Structural/invisible node used to join requirement subtrees.
    Logic,
}

impl TopicKind {
    /// Kinds that are expected to provide a product id.
    pub fn expects_provides(self) -> bool {
        !matches!(
            self,
            TopicKind::Tech | TopicKind::News | TopicKind::Logic | TopicKind::Alien
        )
    }
}

// ---------------------------------------------------------------------------
// Status state machine
// ---------------------------------------------------------------------------

/// Research status. Only moves forward, except for the Running/Paused
/// oscillation driven by worker assignment. Finished is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResearchStatus {
    /// Never staffed.
    Unstarted,
    /// At least one worker assigned.
    Running,
    /// Was running at some point, currently has zero workers.
    Paused,
    /// Done. Terminal.
    Finished,
}

// ---------------------------------------------------------------------------
// Mail guard
// ---------------------------------------------------------------------------

/// Tracks which notifications have already been emitted for a topic, so the
/// proposal and finished notifications fire at most once each. A side
/// channel only; no engine decision depends on it beyond duplicate
/// suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MailState {
    None,
    ProposalSent,
    FinishedSent,
}

// ---------------------------------------------------------------------------
// Description variants
// ---------------------------------------------------------------------------

/// A description text list with tech-gated variants. The variant in force is
/// chosen by first-match over finished gate topics and locked the first time
/// the player could have seen it; later research never rewrites text the
/// player already read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionList {
    /// Fallback text, always present.
    pub default_text: String,
    /// `(gate topic, text)` pairs, scanned in order.
    pub variants: Vec<(TopicId, String)>,
    /// Index into `variants` once locked.
    pub locked: Option<usize>,
}

impl DescriptionList {
    pub fn plain(default_text: impl Into<String>) -> Self {
        Self {
            default_text: default_text.into(),
            variants: Vec::new(),
            locked: None,
        }
    }

    /// The variant that would be in force right now: the locked one if any,
    /// else the first variant whose gate topic satisfies `gate_finished`.
    /// Returns `None` when the default text applies.
    pub fn pick(&self, gate_finished: impl Fn(TopicId) -> bool) -> Option<usize> {
        if self.locked.is_some() {
            return self.locked;
        }
        self.variants
            .iter()
            .position(|(gate, _)| gate_finished(*gate))
    }

    /// Lock the given variant choice. First lock wins; `None` leaves the
    /// list unlocked so a later pass may still pick a variant.
    pub fn lock(&mut self, choice: Option<usize>) {
        if self.locked.is_none() {
            self.locked = choice;
        }
    }

    /// The text currently in force.
    pub fn text(&self) -> &str {
        match self.locked {
            Some(i) => &self.variants[i].1,
            None => &self.default_text,
        }
    }
}

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

/// One research node: static definition plus mutable campaign state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    // -- Static (rebuilt from configuration, never persisted) --
    /// Stable unique id from the data files. Save files match on this.
    pub id: String,
    /// Dense session-local index.
    pub index: TopicId,
    /// Display name. Falls back to `id` when the data files give none.
    pub name: String,
    pub kind: TopicKind,
    /// Nominal effort for a canonical team. Zero means auto-research: the
    /// topic completes the instant it becomes discoverable.
    pub base_cost: Fixed64,
    /// Prerequisites for discoverability.
    pub requires: RequirementSet,
    /// Prerequisites the production collaborator evaluates; resolved here,
    /// never evaluated here.
    pub production_requires: RequirementSet,
    /// Product unlocked by finishing this topic.
    pub provides: Option<ProductId>,
    /// Alias target for pure-redirect topics.
    pub redirect: Option<TopicId>,
    /// Finish this topic silently when the engine is constructed.
    pub researched_at_start: bool,
    /// Research-result text, variant-locked at finish.
    pub description: DescriptionList,
    /// Research-proposal text, variant-locked at first discoverability.
    pub proposal: DescriptionList,

    // -- Mutable (persisted across save/load) --
    pub status: ResearchStatus,
    /// Effort still outstanding. Counts down from `base_cost` to zero.
    pub remaining_cost: Fixed64,
    /// All prerequisites currently met. Recomputed wholesale on every
    /// reachability pass, never incrementally.
    pub discoverable: bool,
    /// Raw materials were present at least once.
    pub collected: bool,
    /// Site this topic is pinned to while staffed. At most one site owns a
    /// topic at a time.
    pub site: Option<SiteId>,
    /// Workers currently assigned. Non-zero implies `site` is set and
    /// status is Running.
    pub workers: u32,
    pub mail: MailState,
    /// Tick at which the topic first became discoverable.
    pub first_discoverable: Option<Ticks>,
    /// Tick at which research finished.
    pub finished_at: Option<Ticks>,
}

impl Topic {
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.status == ResearchStatus::Finished
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.status == ResearchStatus::Running
    }

    /// Zero-cost topics never enter Running; they jump straight to Finished
    /// inside the reachability pass.
    #[inline]
    pub fn is_auto_research(&self) -> bool {
        self.base_cost == Fixed64::ZERO
    }
}

// ===========================================================================
// Tests
// ===========================================================================
