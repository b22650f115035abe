//! The research engine: owns the catalog and drives the three mutating
//! subsystems over it.
//!
//! # Pipeline
//!
//! - **Reachability** ([`ResearchEngine::mark_researchable`]) — recompute
//!   the discoverable set for a site and auto-finish zero-cost topics,
//!   looping to a fixpoint.
//! - **Allocation** ([`ResearchEngine::assign`] / [`ResearchEngine::remove`]
//!   and friends) — move workers between a site's idle pool and running
//!   topics against the site's lab capacity.
//! - **Progress** ([`ResearchEngine::advance`]) — once per campaign tick,
//!   decrement the remaining cost of every running topic, finish the ones
//!   that reach zero, and cascade reachability for their sites.
//!
//! Everything is synchronous and single-threaded; the campaign driver calls
//! in, the engine mutates its own state and the injected collaborators, and
//! returns. The engine is the sole writer of per-topic worker counts and
//! site pins.

use crate::catalog::Catalog;
use crate::effort::{Fixed64, Ticks};
use crate::id::{SiteId, TopicId};
use crate::notify::{Notifier, NullNotifier};
use crate::topic::{MailState, ResearchStatus, Topic, TopicKind};
use crate::world::{Inventory, Workforce};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables fixed at engine construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Effort units one worker contributes per tick.
    pub worker_rate: Fixed64,
    /// When false (campaign modes without tech progression), every topic
    /// reports finished and the rest of the engine is effectively inert.
    pub progression: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_rate: Fixed64::from_num(0.8),
            progression: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a worker assignment was refused. No partial mutation happens on any
/// of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AssignError {
    #[error("topic {0:?} does not exist")]
    UnknownTopic(TopicId),

    #[error("topic {0:?} is already finished")]
    AlreadyFinished(TopicId),

    #[error("topic {0:?} is not discoverable")]
    NotDiscoverable(TopicId),

    #[error("topic {topic:?} is already being researched at another site")]
    WrongSite { topic: TopicId, pinned: SiteId },

    #[error("no unassigned worker available at the site")]
    NoFreeWorker(SiteId),

    #[error("lab capacity at the site is saturated")]
    NoCapacity(SiteId),
}

/// Why a worker removal was refused. Removing from an unstaffed topic is a
/// checked no-op, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RemoveError {
    #[error("topic {0:?} does not exist")]
    UnknownTopic(TopicId),
}

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

/// What one [`ResearchEngine::advance`] call did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Topics that reached zero remaining cost this tick, in index order.
    pub finished: Vec<TopicId>,
    /// Running topics paused because their prerequisites were lost.
    pub halted: Vec<TopicId>,
}

// ---------------------------------------------------------------------------
// ResearchEngine
// ---------------------------------------------------------------------------

/// The campaign-owned research state: catalog plus clock.
#[derive(Debug, Clone)]
pub struct ResearchEngine {
    catalog: Catalog,
    config: EngineConfig,
    /// Campaign ticks elapsed; advanced by [`ResearchEngine::advance`].
    tick: Ticks,
}

impl ResearchEngine {
    /// Wrap a built catalog. Topics flagged researched-at-start finish
    /// silently here, before the first reachability pass.
    pub fn new(catalog: Catalog, config: EngineConfig) -> Self {
        let mut engine = Self {
            catalog,
            config,
            tick: 0,
        };
        let mut quiet = NullNotifier;
        for idx in 0..engine.catalog.topics.len() {
            if engine.catalog.topics[idx].researched_at_start {
                let t = &mut engine.catalog.topics[idx];
                if t.mail < MailState::FinishedSent {
                    t.mail = MailState::FinishedSent;
                }
                engine.finish_research(idx, &mut quiet);
            }
        }
        engine
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Campaign ticks elapsed so far.
    pub fn ticks(&self) -> Ticks {
        self.tick
    }

    pub fn topic(&self, id: TopicId) -> Option<&Topic> {
        self.catalog.topic(id)
    }

    /// The single most-called query in the game: O(1), side-effect-free.
    /// Always true when progression is disabled.
    #[inline]
    pub fn is_finished(&self, id: TopicId) -> bool {
        if !self.config.progression {
            return true;
        }
        self.catalog.is_finished(id)
    }

    // -----------------------------------------------------------------------
    // Reachability
    // -----------------------------------------------------------------------

    /// Recompute the discoverable set and auto-finish zero-cost topics,
    /// looping until a full sweep changes nothing.
    ///
    /// The discoverable flag is reset catalog-wide first — it is recomputed
    /// wholesale on every call, even though the call is nominally for one
    /// site. A topic pinned to a site evaluates against that site; all
    /// others evaluate against `site`. Finishing a zero-cost topic can
    /// satisfy further topics' tech requirements, hence the fixpoint loop.
    pub fn mark_researchable<I: Inventory, N: Notifier>(
        &mut self,
        site: SiteId,
        inventory: &I,
        notifier: &mut N,
    ) {
        for t in &mut self.catalog.topics {
            t.discoverable = false;
        }

        loop {
            let mut changed = false;
            for idx in 0..self.catalog.topics.len() {
                let (skip, eval_site) = {
                    let t = &self.catalog.topics[idx];
                    (t.is_finished() || t.discoverable, t.site.unwrap_or(site))
                };
                if skip {
                    continue;
                }
                let met = self.catalog.topics[idx].requires.is_met(
                    &self.catalog.topics,
                    eval_site,
                    inventory,
                );
                if !met {
                    continue;
                }
                self.mark_one_researchable(idx, notifier);
                if self.catalog.topics[idx].is_auto_research() {
                    // Finishing may unlock topics already passed over in
                    // this sweep; another sweep is required.
                    self.finish_research(idx, notifier);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Flip one topic discoverable: lock its proposal text, emit the
    /// proposal notification once, and stamp the first-discoverable tick.
    fn mark_one_researchable<N: Notifier>(&mut self, idx: usize, notifier: &mut N) {
        // Auto-research topics never get a proposal of their own; they
        // finish in the same pass that discovers them.
        if self.catalog.topics[idx].is_auto_research() {
            let t = &mut self.catalog.topics[idx];
            if t.mail < MailState::FinishedSent {
                t.mail = MailState::FinishedSent;
            }
        }

        self.lock_proposal(idx);

        let tick = self.tick;
        let t = &mut self.catalog.topics[idx];
        if t.mail < MailState::ProposalSent {
            t.mail = MailState::ProposalSent;
            notifier.proposal(t.index);
        }
        t.discoverable = true;
        if t.first_discoverable.is_none() {
            t.first_discoverable = Some(tick);
        }
    }

    /// Mark a topic's raw materials as present. Emits the proposal early
    /// (guarded by mail state, suppressed for finished and auto-research
    /// topics). Unknown ids are ignored.
    pub fn mark_collected<N: Notifier>(&mut self, id: TopicId, notifier: &mut N) {
        let tick = self.tick;
        let Some(t) = self.catalog.topics.get_mut(id.index()) else {
            return;
        };
        if t.is_auto_research() && t.mail < MailState::FinishedSent {
            t.mail = MailState::FinishedSent;
        }
        if t.mail < MailState::ProposalSent {
            if !t.is_finished() {
                notifier.proposal(id);
            }
            t.mail = MailState::ProposalSent;
        }
        if t.first_discoverable.is_none() {
            t.first_discoverable = Some(tick);
        }
        t.collected = true;
    }

    // -----------------------------------------------------------------------
    // Allocation
    // -----------------------------------------------------------------------

    /// Assign one worker to a discoverable topic at a site. On success the
    /// topic is pinned to the site and Running.
    pub fn assign<W: Workforce>(
        &mut self,
        id: TopicId,
        site: SiteId,
        workforce: &mut W,
    ) -> Result<(), AssignError> {
        let topic = self
            .catalog
            .topics
            .get(id.index())
            .ok_or(AssignError::UnknownTopic(id))?;
        if topic.is_finished() {
            return Err(AssignError::AlreadyFinished(id));
        }
        if !topic.discoverable {
            return Err(AssignError::NotDiscoverable(id));
        }
        if let Some(pinned) = topic.site
            && pinned != site
        {
            return Err(AssignError::WrongSite { topic: id, pinned });
        }
        if workforce.free_workers(site) == 0 {
            return Err(AssignError::NoFreeWorker(site));
        }
        if workforce.capacity(site).free() == 0 {
            return Err(AssignError::NoCapacity(site));
        }

        workforce.occupy(site);
        let t = &mut self.catalog.topics[id.index()];
        t.workers += 1;
        t.site = Some(site);
        t.status = ResearchStatus::Running;
        Ok(())
    }

    /// Remove one worker from a topic. Removing from an unstaffed topic
    /// succeeds as a no-op. When the last worker leaves, the topic unpins
    /// from its site and pauses — never back to Unstarted.
    pub fn remove<W: Workforce>(
        &mut self,
        id: TopicId,
        workforce: &mut W,
    ) -> Result<(), RemoveError> {
        let topic = self
            .catalog
            .topics
            .get(id.index())
            .ok_or(RemoveError::UnknownTopic(id))?;
        if topic.workers == 0 {
            return Ok(());
        }
        // workers > 0 implies a pinned site.
        let Some(site) = topic.site else {
            return Ok(());
        };

        workforce.release(site);
        let t = &mut self.catalog.topics[id.index()];
        t.workers -= 1;
        if t.workers == 0 {
            t.site = None;
            t.status = ResearchStatus::Paused;
        }
        Ok(())
    }

    /// Release every worker from a topic.
    pub fn stop_research<W: Workforce>(
        &mut self,
        id: TopicId,
        workforce: &mut W,
    ) -> Result<(), RemoveError> {
        loop {
            let topic = self
                .catalog
                .topics
                .get(id.index())
                .ok_or(RemoveError::UnknownTopic(id))?;
            if topic.workers == 0 {
                return Ok(());
            }
            self.remove(id, workforce)?;
        }
    }

    /// Assign workers until the site runs out of idle workers or lab
    /// capacity. Returns how many were assigned; what succeeded is never
    /// rolled back.
    pub fn max_out<W: Workforce>(
        &mut self,
        id: TopicId,
        site: SiteId,
        workforce: &mut W,
    ) -> Result<u32, AssignError> {
        let mut assigned = 0;
        loop {
            match self.assign(id, site, workforce) {
                Ok(()) => assigned += 1,
                Err(AssignError::NoFreeWorker(_)) | Err(AssignError::NoCapacity(_)) => {
                    return Ok(assigned);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// The running topic at `site` with the most workers. First-found wins
    /// on ties (iteration is index order).
    pub fn most_staffed_topic(&self, site: SiteId) -> Option<TopicId> {
        let mut best = None;
        let mut max = 0;
        for t in &self.catalog.topics {
            if t.is_running() && t.site == Some(site) && t.workers > max {
                max = t.workers;
                best = Some(t.index);
            }
        }
        best
    }

    /// Workers assigned across all topics pinned to `site`.
    pub fn workers_at(&self, site: SiteId) -> u32 {
        self.catalog
            .topics
            .iter()
            .filter(|t| t.site == Some(site))
            .map(|t| t.workers)
            .sum()
    }

    /// After a capacity decrease, unstaff the most-staffed topic one worker
    /// at a time until usage fits the ceiling again. Returns the number of
    /// workers released.
    pub fn enforce_capacity<W: Workforce>(&mut self, site: SiteId, workforce: &mut W) -> u32 {
        let mut released = 0;
        loop {
            let cap = workforce.capacity(site);
            if cap.used <= cap.max {
                break;
            }
            let Some(topic) = self.most_staffed_topic(site) else {
                break;
            };
            if self.remove(topic, workforce).is_err() {
                break;
            }
            released += 1;
        }
        released
    }

    // -----------------------------------------------------------------------
    // Progress clock
    // -----------------------------------------------------------------------

    /// Advance one campaign tick.
    ///
    /// Every running topic is advanced before any completion cascade runs,
    /// so same-tick completions are observed in topic index order. A
    /// running topic whose prerequisites no longer hold is unstaffed and
    /// paused instead of advancing; a site that is not currently allowed to
    /// research freezes its topics without halting them.
    pub fn advance<W: Inventory + Workforce, N: Notifier>(
        &mut self,
        world: &mut W,
        notifier: &mut N,
    ) -> TickReport {
        let mut report = TickReport::default();
        let rate = self.config.worker_rate;
        let mut completed: Vec<usize> = Vec::new();

        for idx in 0..self.catalog.topics.len() {
            let site = {
                let t = &self.catalog.topics[idx];
                if !t.is_running() {
                    continue;
                }
                match t.site {
                    Some(site) => site,
                    None => continue,
                }
            };

            let met =
                self.catalog.topics[idx]
                    .requires
                    .is_met(&self.catalog.topics, site, &*world);
            if !met {
                let id = self.catalog.topics[idx].index;
                let _ = self.stop_research(id, world);
                notifier.halted(id);
                report.halted.push(id);
                continue;
            }

            if !world.research_allowed(site) {
                continue;
            }

            let t = &mut self.catalog.topics[idx];
            if t.remaining_cost > Fixed64::ZERO && t.workers > 0 {
                let delta = rate.saturating_mul(Fixed64::from_num(t.workers));
                t.remaining_cost = t.remaining_cost.saturating_sub(delta);
                if t.remaining_cost <= Fixed64::ZERO {
                    t.remaining_cost = Fixed64::ZERO;
                    completed.push(idx);
                }
            }
        }

        for idx in completed {
            let id = self.catalog.topics[idx].index;
            let site = self.catalog.topics[idx].site;
            let _ = self.stop_research(id, world);
            self.finish_research(idx, notifier);
            report.finished.push(id);
            if let Some(site) = site {
                self.mark_researchable(site, &*world, notifier);
            }
        }

        self.tick += 1;
        report
    }

    /// Transition a topic to Finished: lock both text lists, stamp the
    /// finish tick, and emit the finished notification once (never for
    /// Logic topics). Finished is absorbing; a second call is a no-op.
    /// Workers must already have been released.
    fn finish_research<N: Notifier>(&mut self, idx: usize, notifier: &mut N) {
        if self.catalog.topics[idx].is_finished() {
            return;
        }
        debug_assert_eq!(self.catalog.topics[idx].workers, 0);

        self.lock_description(idx);
        self.lock_proposal(idx);

        let tick = self.tick;
        let t = &mut self.catalog.topics[idx];
        t.status = ResearchStatus::Finished;
        t.remaining_cost = Fixed64::ZERO;
        t.finished_at = Some(tick);
        if !t.discoverable {
            t.discoverable = true;
            if t.first_discoverable.is_none() {
                t.first_discoverable = Some(tick);
            }
        }
        if t.mail < MailState::FinishedSent && t.kind != TopicKind::Logic {
            notifier.finished(t.index);
            t.mail = MailState::FinishedSent;
        }
    }

    fn lock_proposal(&mut self, idx: usize) {
        let pick = {
            let topics = &self.catalog.topics;
            topics[idx]
                .proposal
                .pick(|gate| topics[gate.index()].status == ResearchStatus::Finished)
        };
        self.catalog.topics[idx].proposal.lock(pick);
    }

    fn lock_description(&mut self, idx: usize) {
        let pick = {
            let topics = &self.catalog.topics;
            topics[idx]
                .description
                .pick(|gate| topics[gate.index()].status == ResearchStatus::Finished)
        };
        self.catalog.topics[idx].description.lock(pick);
    }

    // -----------------------------------------------------------------------
    // Save/restore plumbing
    // -----------------------------------------------------------------------

    pub(crate) fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub(crate) fn set_tick(&mut self, tick: Ticks) {
        self.tick = tick;
    }
}

// ===========================================================================
// Tests
// ===========================================================================
