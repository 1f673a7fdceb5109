use crate::api::types::{BranchLogRecord, BranchSnapshot, EventRecord};
use crate::customer::CustomerOutput;
use serde::Serialize;
use std::collections::BTreeMap;

/// Report is the output of a whole run: every branch's final state and branch log, every
/// originator's events merged across branches, and what each customer received.
#[derive(Debug, Serialize)]
pub struct Report {
    pub branches: Vec<BranchReport>,
    pub events: Vec<OriginatorReport>,
    pub customers: Vec<CustomerOutput>,
}

#[derive(Debug, Serialize)]
pub struct BranchReport {
    pub id: u64,
    pub balance: i64,
    pub branch_log: Vec<BranchLogRecord>,
}

#[derive(Debug, Serialize)]
pub struct OriginatorReport {
    pub id: u64,
    pub data: Vec<EventRecord>,
}

impl Report {
    pub fn new(mut snapshots: Vec<BranchSnapshot>, mut customers: Vec<CustomerOutput>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.branch_id);
        customers.sort_by_key(|customer| customer.id);

        let events = Self::merge_event_logs(&snapshots);
        let branches = snapshots
            .into_iter()
            .map(|snapshot| BranchReport {
                id: snapshot.branch_id,
                balance: snapshot.balance,
                branch_log: snapshot.branch_log,
            })
            .collect();

        Report {
            branches,
            events,
            customers,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    // Expects snapshots in branch id order. The sort is stable, so equal clocks keep that order.
    fn merge_event_logs(snapshots: &[BranchSnapshot]) -> Vec<OriginatorReport> {
        let mut merged: BTreeMap<u64, Vec<EventRecord>> = BTreeMap::new();
        for snapshot in snapshots.iter() {
            for (originator_id, events) in snapshot.event_log.iter() {
                merged
                    .entry(*originator_id)
                    .or_insert_with(Vec::new)
                    .extend(events.iter().cloned());
            }
        }

        merged
            .into_iter()
            .map(|(id, mut data)| {
                data.sort_by_key(|event| event.clock);
                OriginatorReport { id, data }
            })
            .collect()
    }
}
