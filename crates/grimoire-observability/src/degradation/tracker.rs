//! Records degraded-mode fallbacks per component with recovery status.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use grimoire_core::models::DegradationEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
    Active,
    Recovered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedDegradation {
    pub event: DegradationEvent,
    pub recovery_status: RecoveryStatus,
    pub recovered_at: Option<DateTime<Utc>>,
}

/// Degradation history, bounded to the most recent `max_events`.
#[derive(Debug, Clone)]
pub struct DegradationTracker {
    events: Vec<TrackedDegradation>,
    max_events: usize,
}

impl Default for DegradationTracker {
    fn default() -> Self {
        Self::with_capacity(1_000)
    }
}

impl DegradationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events: max_events.max(1),
        }
    }

    /// Record one event. Logging is left to the component that fell back.
    pub fn record(&mut self, event: DegradationEvent) {
        self.events.push(TrackedDegradation {
            event,
            recovery_status: RecoveryStatus::Active,
            recovered_at: None,
        });
        if self.events.len() > self.max_events {
            let excess = self.events.len() - self.max_events;
            self.events.drain(..excess);
        }
    }

    pub fn record_all<'a>(&mut self, events: impl IntoIterator<Item = &'a DegradationEvent>) {
        for event in events {
            self.record(event.clone());
        }
    }

    /// Mark every active degradation of `component` as recovered. Returns how many changed.
    pub fn mark_recovered(&mut self, component: &str) -> usize {
        let now = Utc::now();
        let mut changed = 0;
        for tracked in self
            .events
            .iter_mut()
            .filter(|t| t.event.component == component)
            .filter(|t| t.recovery_status == RecoveryStatus::Active)
        {
            tracked.recovery_status = RecoveryStatus::Recovered;
            tracked.recovered_at = Some(now);
            changed += 1;
        }
        changed
    }

    pub fn events(&self) -> &[TrackedDegradation] {
        &self.events
    }

    pub fn active(&self) -> Vec<&TrackedDegradation> {
        self.events
            .iter()
            .filter(|t| t.recovery_status == RecoveryStatus::Active)
            .collect()
    }

    pub fn is_degraded(&self, component: &str) -> bool {
        self.events.iter().any(|t| {
            t.event.component == component && t.recovery_status == RecoveryStatus::Active
        })
    }

    /// Active degradation count per component.
    pub fn active_by_component(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for tracked in self.active() {
            *counts.entry(tracked.event.component.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Events for `component` in the last `window_secs` seconds.
    pub fn count_recent(&self, component: &str, window_secs: i64) -> usize {
        let cutoff = Utc::now() - chrono::Duration::seconds(window_secs);
        self.events
            .iter()
            .filter(|t| t.event.component == component && t.event.timestamp > cutoff)
            .count()
    }
}
