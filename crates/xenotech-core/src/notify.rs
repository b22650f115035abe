//! Notification surface.
//!
//! The engine reports player-facing state transitions through an injected
//! [`Notifier`]; duplicate suppression for proposal/finished lives in the
//! topic's mail state, not here. Correctness never depends on a notifier
//! doing anything — [`NullNotifier`] is always a valid choice.

use crate::id::TopicId;

/// A notification the engine wants surfaced to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// A topic became discoverable for the first time.
    ProposalAvailable { topic: TopicId },
    /// A topic finished research.
    ResearchFinished { topic: TopicId },
    /// A running topic lost its prerequisites and was paused.
    ResearchHalted { topic: TopicId },
}

/// Fire-and-forget notification sink. Proposal and finished fire at most
/// once per topic; halted fires on every halt.
pub trait Notifier {
    fn proposal(&mut self, topic: TopicId);
    fn finished(&mut self, topic: TopicId);
    fn halted(&mut self, _topic: TopicId) {}
}

/// Discards everything. Used for silent passes (engine construction,
/// restore) and by callers that do their own messaging elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn proposal(&mut self, _topic: TopicId) {}
    fn finished(&mut self, _topic: TopicId) {}
}

/// Collects notifications in order for later draining. The usual choice in
/// tests and for UI layers that batch messages per tick.
#[derive(Debug, Default, Clone)]
pub struct NotificationLog {
    events: Vec<Notification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return all pending notifications and clear the log.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.events)
    }

    /// Read-only view of pending notifications.
    pub fn pending(&self) -> &[Notification] {
        &self.events
    }
}

impl Notifier for NotificationLog {
    fn proposal(&mut self, topic: TopicId) {
        self.events.push(Notification::ProposalAvailable { topic });
    }

    fn finished(&mut self, topic: TopicId) {
        self.events.push(Notification::ResearchFinished { topic });
    }

    fn halted(&mut self, topic: TopicId) {
        self.events.push(Notification::ResearchHalted { topic });
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_records_in_order() {
        let mut log = NotificationLog::new();
        log.proposal(TopicId(3));
        log.finished(TopicId(3));
        log.halted(TopicId(1));

        assert_eq!(
            log.pending(),
            &[
                Notification::ProposalAvailable { topic: TopicId(3) },
                Notification::ResearchFinished { topic: TopicId(3) },
                Notification::ResearchHalted { topic: TopicId(1) },
            ]
        );
    }

    #[test]
    fn drain_clears() {
        let mut log = NotificationLog::new();
        log.proposal(TopicId(0));
        assert_eq!(log.drain().len(), 1);
        assert!(log.drain().is_empty());
    }

    #[test]
    fn null_notifier_accepts_everything() {
        let mut n = NullNotifier;
        n.proposal(TopicId(0));
        n.finished(TopicId(0));
        n.halted(TopicId(0));
    }
}
