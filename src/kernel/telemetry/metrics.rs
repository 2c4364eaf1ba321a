use std::collections::BTreeMap;

use super::event::TelemetryEvent;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub decision_stats: DecisionStats,
    pub plan_stats: PlanStats,
    pub error_stats: ErrorStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionStats {
    pub total: u64,
    /// Decisions whose label was gated to `unknown`.
    pub gated_unknown: u64,
    pub per_label: BTreeMap<String, u64>,
    pub total_confidence: f64,
    pub avg_confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanStats {
    pub total: u64,
    pub low_confidence: u64,
    pub total_sub_goals: u64,
    pub avg_sub_goals: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorStats {
    pub total: u64,
    pub per_source: BTreeMap<String, u64>,
}

/// Pure aggregation over a replayed (or in-flight) event sequence.
pub fn compute_snapshot(events: &[TelemetryEvent]) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::TaskDecision(e) => {
                snap.decision_stats.total += 1;
                snap.decision_stats.total_confidence += e.confidence;
                if e.label.is_unknown() {
                    snap.decision_stats.gated_unknown += 1;
                }
                *snap.decision_stats.per_label.entry(e.label.to_string()).or_insert(0) += 1;
            }
            TelemetryEvent::PolicyPlan(e) => {
                snap.plan_stats.total += 1;
                snap.plan_stats.total_sub_goals += e.sub_goal_count as u64;
                let low_confidence = e
                    .metadata
                    .as_ref()
                    .and_then(|m| m.get("reason"))
                    .and_then(|r| r.as_str())
                    == Some("low_confidence");
                if low_confidence {
                    snap.plan_stats.low_confidence += 1;
                }
            }
            TelemetryEvent::Error(e) => {
                snap.error_stats.total += 1;
                *snap.error_stats.per_source.entry(e.source.clone()).or_insert(0) += 1;
            }
        }
    }

    // Averages
    if snap.decision_stats.total > 0 {
        snap.decision_stats.avg_confidence =
            snap.decision_stats.total_confidence / snap.decision_stats.total as f64;
    }

    if snap.plan_stats.total > 0 {
        snap.plan_stats.avg_sub_goals = snap.plan_stats.total_sub_goals as f64 / snap.plan_stats.total as f64;
    }

    snap
}
