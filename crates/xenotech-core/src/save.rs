//! Save/restore of the mutable per-topic research state.
//!
//! Binary serialization via `bitcode` with a versioned header validated
//! before use. Only the mutable fields travel: the catalog's static
//! definition (requirements, costs, kinds, provides) is reloaded from
//! configuration and re-resolved, then a snapshot restores per-topic state
//! onto the freshly rebuilt topics by matching on stable id strings — never
//! on the session-local dense index, which may differ between builds.

use crate::effort::{Fixed64, Ticks};
use crate::engine::ResearchEngine;
use crate::id::SiteId;
use crate::topic::{MailState, ResearchStatus};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a research snapshot ("XENT").
pub const SAVE_MAGIC: u32 = 0x5845_4E54;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur while reading a snapshot. Per-topic problems are
/// not errors: unknown ids are skipped and inconsistent states repaired,
/// both reported in the [`RestoreReport`].
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("invalid magic number: expected 0x{SAVE_MAGIC:08X}, got 0x{0:08X}")]
    InvalidMagic(u32),

    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),

    #[error("unsupported format version: expected {FORMAT_VERSION}, got {0}")]
    UnsupportedVersion(u32),

    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot, checked before the payload is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveHeader {
    pub magic: u32,
    pub version: u32,
    /// Campaign tick at the time the snapshot was taken.
    pub tick: Ticks,
}

impl SaveHeader {
    pub fn new(tick: Ticks) -> Self {
        Self {
            magic: SAVE_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), RestoreError> {
        if self.magic != SAVE_MAGIC {
            return Err(RestoreError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(RestoreError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(RestoreError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// The persisted mutable state of one topic, keyed by its stable id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicState {
    pub id: String,
    pub collected: bool,
    pub remaining_cost: Fixed64,
    pub status: ResearchStatus,
    pub site: Option<SiteId>,
    pub workers: u32,
    pub discoverable: bool,
    pub first_discoverable: Option<Ticks>,
    pub finished_at: Option<Ticks>,
    pub mail: MailState,
}

/// A full research snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSnapshot {
    pub header: SaveHeader,
    pub topics: Vec<TopicState>,
}

/// What a restore pass did beyond the happy path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// Topics whose state was applied.
    pub restored: usize,
    /// Snapshot entries referencing topic ids this catalog does not know;
    /// dropped rather than aborting the load.
    pub skipped: Vec<String>,
    /// Consistency problems found and corrected, one note per topic.
    pub repaired: Vec<String>,
}

// ---------------------------------------------------------------------------
// Engine entry points
// ---------------------------------------------------------------------------

impl ResearchEngine {
    /// Serialize the mutable per-topic state.
    pub fn snapshot(&self) -> Result<Vec<u8>, SaveError> {
        let snapshot = ResearchSnapshot {
            header: SaveHeader::new(self.ticks()),
            topics: self
                .catalog()
                .topics()
                .iter()
                .map(|t| TopicState {
                    id: t.id.clone(),
                    collected: t.collected,
                    remaining_cost: t.remaining_cost,
                    status: t.status,
                    site: t.site,
                    workers: t.workers,
                    discoverable: t.discoverable,
                    first_discoverable: t.first_discoverable,
                    finished_at: t.finished_at,
                    mail: t.mail,
                })
                .collect(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SaveError::Encode(e.to_string()))
    }

    /// Apply a snapshot onto a freshly rebuilt catalog. Matching is by id
    /// string; entries for unknown ids are skipped. Site worker bookkeeping
    /// is the caller's to restore alongside — this only sets the engine's
    /// own fields.
    pub fn restore(&mut self, data: &[u8]) -> Result<RestoreReport, RestoreError> {
        let snapshot: ResearchSnapshot =
            bitcode::deserialize(data).map_err(|e| RestoreError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        self.set_tick(snapshot.header.tick);

        let mut report = RestoreReport::default();
        for state in snapshot.topics {
            let Some(idx) = self.catalog().topic_id(&state.id) else {
                report.skipped.push(state.id);
                continue;
            };

            let mut status = state.status;
            let mut remaining = state.remaining_cost;
            let mut site = state.site;
            let mut workers = state.workers;

            if status == ResearchStatus::Finished && remaining > Fixed64::ZERO {
                remaining = Fixed64::ZERO;
                report
                    .repaired
                    .push(format!("'{}': finished with positive remaining cost", state.id));
            }
            if status == ResearchStatus::Running && (workers == 0 || site.is_none()) {
                status = ResearchStatus::Paused;
                workers = 0;
                site = None;
                report
                    .repaired
                    .push(format!("'{}': running without workers or site", state.id));
            }
            if status != ResearchStatus::Running && workers > 0 {
                workers = 0;
                site = None;
                report
                    .repaired
                    .push(format!("'{}': workers assigned while not running", state.id));
            }

            let topic = &mut self.catalog_mut().topics[idx.index()];
            topic.collected = state.collected;
            topic.remaining_cost = remaining;
            topic.status = status;
            topic.site = site;
            topic.workers = workers;
            topic.discoverable = state.discoverable;
            topic.first_discoverable = state.first_discoverable;
            topic.finished_at = state.finished_at;
            topic.mail = state.mail;
            report.restored += 1;
        }

        Ok(report)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TopicId;
    use crate::notify::NullNotifier;
    use crate::test_utils::*;
    use crate::world::CampaignWorld;

    fn campaign() -> (CampaignWorld, crate::id::SiteId, ResearchEngine) {
        let mut world = CampaignWorld::new();
        let site = world.add_site("alpha", 5, 5);
        let engine = engine_with(
            vec![def("rs_done", 0.8), def("rs_partial", 10.0), def("rs_cold", 10.0)],
            &world,
        );
        (world, site, engine)
    }

    /// Run a small campaign: rs_done finishes, rs_partial is mid-research.
    fn played_campaign() -> (CampaignWorld, crate::id::SiteId, ResearchEngine) {
        let (mut world, site, mut engine) = campaign();
        let mut quiet = NullNotifier;
        engine.mark_researchable(site, &world, &mut quiet);
        engine.assign(TopicId(0), site, &mut world).unwrap();
        engine.advance(&mut world, &mut quiet);
        engine.assign(TopicId(1), site, &mut world).unwrap();
        engine.advance(&mut world, &mut quiet);
        (world, site, engine)
    }

    // -----------------------------------------------------------------------
    // Round trip
    // -----------------------------------------------------------------------

    #[test]
    fn snapshot_round_trips_onto_fresh_catalog() {
        let (world, site, engine) = played_campaign();
        let data = engine.snapshot().unwrap();

        // Rebuild from configuration, then restore.
        let mut restored = engine_with(
            vec![def("rs_done", 0.8), def("rs_partial", 10.0), def("rs_cold", 10.0)],
            &world,
        );
        let report = restored.restore(&data).unwrap();
        assert_eq!(report.restored, 3);
        assert!(report.skipped.is_empty());
        assert!(report.repaired.is_empty());
        assert_eq!(restored.ticks(), engine.ticks());

        for (a, b) in engine
            .catalog()
            .topics()
            .iter()
            .zip(restored.catalog().topics())
        {
            assert_eq!(a.status, b.status, "status of '{}'", a.id);
            assert_eq!(a.remaining_cost, b.remaining_cost);
            assert_eq!(a.site, b.site);
            assert_eq!(a.workers, b.workers);
            assert_eq!(a.discoverable, b.discoverable);
            assert_eq!(a.collected, b.collected);
            assert_eq!(a.mail, b.mail);
            assert_eq!(a.first_discoverable, b.first_discoverable);
            assert_eq!(a.finished_at, b.finished_at);
        }

        let partial = restored.topic(TopicId(1)).unwrap();
        assert_eq!(partial.site, Some(site));
        assert_eq!(partial.workers, 1);
    }

    #[test]
    fn restore_matches_by_id_not_index() {
        let (world, _site, engine) = played_campaign();
        let data = engine.snapshot().unwrap();

        // The rebuilt catalog lists the topics in a different order.
        let mut restored = engine_with(
            vec![def("rs_cold", 10.0), def("rs_partial", 10.0), def("rs_done", 0.8)],
            &world,
        );
        restored.restore(&data).unwrap();

        assert!(restored.catalog().by_id("rs_done").unwrap().is_finished());
        assert!(!restored.catalog().by_id("rs_cold").unwrap().is_finished());
        assert_eq!(restored.catalog().by_id("rs_partial").unwrap().workers, 1);
    }

    #[test]
    fn unknown_topic_ids_are_skipped_not_fatal() {
        let (world, _site, engine) = played_campaign();
        let data = engine.snapshot().unwrap();

        // The rebuilt catalog no longer contains rs_cold.
        let mut restored =
            engine_with(vec![def("rs_done", 0.8), def("rs_partial", 10.0)], &world);
        let report = restored.restore(&data).unwrap();
        assert_eq!(report.restored, 2);
        assert_eq!(report.skipped, vec!["rs_cold".to_string()]);
    }

    // -----------------------------------------------------------------------
    // Header validation
    // -----------------------------------------------------------------------

    #[test]
    fn bad_magic_is_rejected() {
        let (world, _site, _engine) = campaign();
        let snapshot = ResearchSnapshot {
            header: SaveHeader {
                magic: 0xDEAD_BEEF,
                version: FORMAT_VERSION,
                tick: 0,
            },
            topics: vec![],
        };
        let data = bitcode::serialize(&snapshot).unwrap();
        let mut engine = engine_with(vec![def("rs_done", 0.8)], &world);
        assert!(matches!(
            engine.restore(&data),
            Err(RestoreError::InvalidMagic(0xDEAD_BEEF))
        ));
    }

    #[test]
    fn future_version_is_rejected() {
        let (world, _site, _engine) = campaign();
        let snapshot = ResearchSnapshot {
            header: SaveHeader {
                magic: SAVE_MAGIC,
                version: FORMAT_VERSION + 1,
                tick: 0,
            },
            topics: vec![],
        };
        let data = bitcode::serialize(&snapshot).unwrap();
        let mut engine = engine_with(vec![def("rs_done", 0.8)], &world);
        assert!(matches!(
            engine.restore(&data),
            Err(RestoreError::FutureVersion(_))
        ));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let (world, _site, _engine) = campaign();
        let mut engine = engine_with(vec![def("rs_done", 0.8)], &world);
        assert!(matches!(
            engine.restore(&[0x00, 0x01, 0x02]),
            Err(RestoreError::Decode(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Consistency repairs
    // -----------------------------------------------------------------------

    #[test]
    fn finished_with_positive_cost_is_clamped() {
        let (world, _site, _engine) = campaign();
        let snapshot = ResearchSnapshot {
            header: SaveHeader::new(5),
            topics: vec![TopicState {
                id: "rs_done".to_string(),
                collected: false,
                remaining_cost: Fixed64::from_num(3),
                status: ResearchStatus::Finished,
                site: None,
                workers: 0,
                discoverable: true,
                first_discoverable: Some(1),
                finished_at: Some(4),
                mail: MailState::FinishedSent,
            }],
        };
        let data = bitcode::serialize(&snapshot).unwrap();

        let mut engine = engine_with(vec![def("rs_done", 0.8)], &world);
        let report = engine.restore(&data).unwrap();
        assert_eq!(report.repaired.len(), 1);
        let topic = engine.topic(TopicId(0)).unwrap();
        assert!(topic.is_finished());
        assert_eq!(topic.remaining_cost, Fixed64::ZERO);
    }

    #[test]
    fn running_without_site_is_paused() {
        let (world, _site, _engine) = campaign();
        let snapshot = ResearchSnapshot {
            header: SaveHeader::new(5),
            topics: vec![TopicState {
                id: "rs_partial".to_string(),
                collected: false,
                remaining_cost: Fixed64::from_num(6),
                status: ResearchStatus::Running,
                site: None,
                workers: 2,
                discoverable: true,
                first_discoverable: Some(1),
                finished_at: None,
                mail: MailState::ProposalSent,
            }],
        };
        let data = bitcode::serialize(&snapshot).unwrap();

        let mut engine = engine_with(vec![def("rs_partial", 10.0)], &world);
        let report = engine.restore(&data).unwrap();
        assert_eq!(report.repaired.len(), 1);
        let topic = engine.topic(TopicId(0)).unwrap();
        assert_eq!(topic.status, ResearchStatus::Paused);
        assert_eq!(topic.workers, 0);
        assert_eq!(topic.site, None);
    }
}
