//! Event-log activity over a bounded recent window.

use nfa1_core::{AgentEventKind, EventLog, LogFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-event counts for one target over `[from_block, to_block]`.
///
/// Supplementary only: a store can exist without ever emitting, and any
/// contract can emit logs with NFA-1 topics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventActivity {
    pub from_block: u64,
    pub to_block: u64,
    pub total: u64,
    pub by_kind: BTreeMap<AgentEventKind, u64>,
    /// Logs whose first topic matches no known event
    pub unknown: u64,
    /// The node refused the scan. Counts are zero and carry no signal.
    #[serde(default)]
    pub unavailable: bool,
}

impl EventActivity {
    /// Count `logs` that fall inside `filter`. Anything outside is ignored.
    pub fn tally(filter: &LogFilter, logs: &[EventLog]) -> Self {
        let mut activity = Self {
            from_block: filter.from_block,
            to_block: filter.to_block,
            ..Self::default()
        };
        for log in logs
            .iter()
            .filter(|log| log.address == filter.address && filter.contains(log.block_number))
        {
            activity.total += 1;
            match log.kind() {
                Some(kind) => *activity.by_kind.entry(kind).or_insert(0) += 1,
                None => activity.unknown += 1,
            }
        }
        activity
    }

    /// Window the node would not scan.
    pub fn unavailable(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn count(&self, kind: AgentEventKind) -> u64 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Logs of events only an agent store emits (everything but `Transfer`).
    pub fn agent_specific(&self) -> u64 {
        self.by_kind
            .iter()
            .filter(|(kind, _)| kind.is_agent_specific())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn has_agent_activity(&self) -> bool {
        self.agent_specific() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, B256};

    const TARGET: Address = Address::with_last_byte(7);

    fn log(address: Address, block_number: u64, topic: B256) -> EventLog {
        EventLog {
            address,
            block_number,
            topics: vec![topic],
            data: Bytes::new(),
        }
    }

    #[test]
    fn test_tally_counts_known_and_unknown() {
        let filter = LogFilter::recent(TARGET, 100, 50);
        let logs = vec![
            log(TARGET, 60, AgentEventKind::AgentCreated.topic0()),
            log(TARGET, 61, AgentEventKind::Transfer.topic0()),
            log(TARGET, 62, AgentEventKind::Transfer.topic0()),
            log(TARGET, 63, B256::repeat_byte(0xee)),
        ];
        let activity = EventActivity::tally(&filter, &logs);
        assert_eq!(activity.total, 4);
        assert_eq!(activity.count(AgentEventKind::Transfer), 2);
        assert_eq!(activity.count(AgentEventKind::AgentCreated), 1);
        assert_eq!(activity.unknown, 1);
        assert_eq!(activity.agent_specific(), 1);
        assert!(activity.has_agent_activity());
    }

    #[test]
    fn test_tally_ignores_out_of_window_and_foreign_logs() {
        let filter = LogFilter::recent(TARGET, 100, 10);
        let logs = vec![
            log(TARGET, 90, AgentEventKind::StatusChanged.topic0()),
            log(Address::with_last_byte(8), 95, AgentEventKind::StatusChanged.topic0()),
        ];
        let activity = EventActivity::tally(&filter, &logs);
        assert_eq!((activity.from_block, activity.to_block), (91, 100));
        assert_eq!(activity.total, 0);
        assert!(!activity.has_agent_activity());
    }

    #[test]
    fn test_transfers_alone_are_not_agent_activity() {
        let filter = LogFilter::recent(TARGET, 10, 10);
        let logs = vec![log(TARGET, 5, AgentEventKind::Transfer.topic0())];
        assert!(!EventActivity::tally(&filter, &logs).has_agent_activity());
    }

    #[test]
    fn test_unavailable_window_has_no_activity() {
        let activity = EventActivity::unavailable(91, 100);
        assert!(activity.unavailable);
        assert_eq!((activity.from_block, activity.to_block), (91, 100));
        assert!(!activity.has_agent_activity());

        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["unavailable"], true);
    }

    #[test]
    fn test_older_documents_default_to_available() {
        let json = serde_json::json!({
            "from_block": 1, "to_block": 2, "total": 0, "by_kind": {}, "unknown": 0
        });
        let activity: EventActivity = serde_json::from_value(json).unwrap();
        assert!(!activity.unavailable);
    }

    #[test]
    fn test_serializes_kinds_by_name() {
        let filter = LogFilter::recent(TARGET, 10, 10);
        let logs = vec![log(TARGET, 5, AgentEventKind::LearningUpdated.topic0())];
        let json = serde_json::to_value(EventActivity::tally(&filter, &logs)).unwrap();
        assert_eq!(json["by_kind"]["LearningUpdated"], 1);
    }
}
