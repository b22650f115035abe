//! Xenotech Core -- the technology research engine for campaign games.
//!
//! This crate models a directed graph of research topics with AND/OR
//! prerequisite logic, decides which topics are currently researchable,
//! allocates scarce scientists across concurrently running projects against
//! per-site lab capacity, and advances research over simulated time.
//!
//! # Flow
//!
//! 1. Build a [`catalog::Catalog`] from topic definitions; every symbolic
//!    reference resolves exactly once, failures are fatal configuration
//!    errors.
//! 2. Wrap it in an [`engine::ResearchEngine`].
//! 3. Call [`engine::ResearchEngine::mark_researchable`] after load and
//!    after any inventory-affecting event; zero-cost topics auto-complete
//!    and cascade to a fixpoint.
//! 4. Drive player commands through [`engine::ResearchEngine::assign`] /
//!    [`engine::ResearchEngine::remove`].
//! 5. Call [`engine::ResearchEngine::advance`] once per campaign tick;
//!    completions release their workers, fire a notification, and cascade
//!    reachability for their site.
//!
//! # Key Types
//!
//! - [`engine::ResearchEngine`] -- owns the catalog, the mutating surface.
//! - [`catalog::Catalog`] -- all topics plus the by-id and by-provides
//!   indices.
//! - [`requirement::RequirementSet`] -- ANDed and ORed prerequisite lists.
//! - [`world::Inventory`] / [`world::Workforce`] -- collaborator traits the
//!   engine consumes; [`world::CampaignWorld`] is a reference
//!   implementation.
//! - [`notify::Notifier`] -- injected notification sink.
//! - [`save`] -- versioned binary snapshots of the mutable per-topic state
//!   via bitcode.

pub mod catalog;
pub mod effort;
pub mod engine;
pub mod id;
pub mod notify;
pub mod requirement;
pub mod save;
pub mod topic;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
