//! Walk history tracking.
//!
//! Every processed step of a walk is recorded as a [`StepRecord`]: the state
//! that ran, the state selected next (if any), when it happened and, if the
//! action failed, the failure tag and whether an exception transition
//! caught it.

use super::state::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single processed step.
///
/// # Example
///
/// ```rust
/// use gameflow::core::WalkHistory;
///
/// let history = WalkHistory::new();
/// assert!(history.steps().is_empty());
/// assert!(history.duration().is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// The state whose action ran.
    pub state: StateId,
    /// The state selected to run next. `None` ends the walk.
    pub next: Option<StateId>,
    /// When the step finished.
    pub timestamp: DateTime<Utc>,
    /// Tag of the action failure raised in this step.
    pub failure: Option<u32>,
    /// Whether an exception transition caught the failure.
    #[serde(default)]
    pub recovered: bool,
}

impl StepRecord {
    pub fn new(state: StateId, next: Option<StateId>) -> Self {
        Self {
            state,
            next,
            timestamp: Utc::now(),
            failure: None,
            recovered: false,
        }
    }

    /// Mark the step as failed with `tag`. `recovered` is false when no
    /// exception transition caught the failure and the walk exited.
    pub fn with_failure(mut self, tag: u32, recovered: bool) -> Self {
        self.failure = Some(tag);
        self.recovered = recovered;
        self
    }
}

/// Ordered history of the steps of one walk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkHistory {
    steps: Vec<StepRecord>,
}

impl WalkHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn push(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// States in the order their actions ran.
    pub fn visited(&self) -> Vec<StateId> {
        self.steps.iter().map(|step| step.state).collect()
    }

    /// Number of steps whose action failed.
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|s| s.failure.is_some()).count()
    }

    /// Number of failed steps an exception transition caught.
    pub fn recovered_failures(&self) -> usize {
        self.steps.iter().filter(|s| s.recovered).count()
    }

    /// Time between the first and the last recorded step.
    ///
    /// Returns `None` while the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        match (self.steps.first(), self.steps.last()) {
            (Some(first), Some(last)) => last
                .timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok(),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> StateId {
        StateId::new(n)
    }

    #[test]
    fn new_history_is_empty() {
        let history = WalkHistory::new();
        assert!(history.is_empty());
        assert!(history.visited().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn visited_follows_push_order() {
        let mut history = WalkHistory::new();
        history.push(StepRecord::new(id(1), Some(id(2))));
        history.push(StepRecord::new(id(2), Some(id(1))));
        history.push(StepRecord::new(id(1), None));

        assert_eq!(history.visited(), vec![id(1), id(2), id(1)]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn failures_are_counted() {
        let mut history = WalkHistory::new();
        history.push(StepRecord::new(id(1), Some(id(2))).with_failure(9999, true));
        history.push(StepRecord::new(id(2), None));

        assert_eq!(history.failures(), 1);
        assert_eq!(history.recovered_failures(), 1);
        assert_eq!(history.steps()[0].failure, Some(9999));
    }

    #[test]
    fn uncaught_failure_is_not_recovered() {
        let mut history = WalkHistory::new();
        history.push(StepRecord::new(id(1), None).with_failure(7, false));

        assert_eq!(history.failures(), 1);
        assert_eq!(history.recovered_failures(), 0);
        assert!(!history.steps()[0].recovered);
    }

    #[test]
    fn duration_spans_first_to_last() {
        let mut history = WalkHistory::new();
        let mut first = StepRecord::new(id(1), Some(id(2)));
        let mut last = StepRecord::new(id(2), None);
        first.timestamp = Utc::now();
        last.timestamp = first.timestamp + chrono::Duration::milliseconds(50);
        history.push(first);
        history.push(last);

        assert_eq!(history.duration(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn clear_empties_history() {
        let mut history = WalkHistory::new();
        history.push(StepRecord::new(id(1), None));
        history.clear();
        assert!(history.is_empty());
    }
}
