use serde::{Deserialize, Serialize};

use crate::events::EventsResult;

/// Minimum number of events a fetch must produce before the crew accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SufficiencyThreshold(usize);

impl SufficiencyThreshold {
    pub const fn new(min_events: usize) -> Self {
        Self(min_events)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl Default for SufficiencyThreshold {
    fn default() -> Self {
        Self(8)
    }
}

/// Pure sufficiency check over a fetch result.
///
/// An absent result (no structured output available) counts as insufficient,
/// never as an error: the workflow reads "nothing collected yet" as "more
/// data is needed".
pub fn is_sufficient(result: Option<&EventsResult>, threshold: SufficiencyThreshold) -> bool {
    result.map(|r| r.len() >= threshold.get()).unwrap_or(false)
}

/// Outcome of one verify round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Result meets the bar; hand it to the summarizer.
    Accept,
    /// Result is short and attempts remain; run the collector again.
    Refetch,
    /// Result is short and the attempt budget is spent; proceed with the
    /// last result as a best effort.
    Exhaust,
}

/// Bounded refetch policy shared by the standalone controller and the
/// graph workflow.
///
/// `max_attempts` bounds the total number of fetch calls in a run. The
/// bound is always finite; an unbounded loop would hang whenever the
/// fetcher never returns enough events.
#[derive(Debug, Clone, Copy)]
pub struct RefetchPolicy {
    pub threshold: SufficiencyThreshold,
    pub max_attempts: usize,
}

impl RefetchPolicy {
    pub fn new(threshold: SufficiencyThreshold, max_attempts: usize) -> Self {
        Self {
            threshold,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Decide what to do after `attempts` fetch calls have produced `latest`.
    pub fn decide(&self, attempts: usize, latest: Option<&EventsResult>) -> Decision {
        if is_sufficient(latest, self.threshold) {
            Decision::Accept
        } else if attempts >= self.max_attempts {
            Decision::Exhaust
        } else {
            Decision::Refetch
        }
    }
}

impl Default for RefetchPolicy {
    fn default() -> Self {
        Self {
            threshold: SufficiencyThreshold::default(),
            max_attempts: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_of_len(len: usize) -> EventsResult {
        EventsResult::new((0..len).map(|i| format!("event {i}")).collect())
    }

    #[test]
    fn sufficient_at_and_above_threshold() {
        let threshold = SufficiencyThreshold::new(8);
        assert!(is_sufficient(Some(&result_of_len(8)), threshold));
        assert!(is_sufficient(Some(&result_of_len(12)), threshold));
        assert!(!is_sufficient(Some(&result_of_len(7)), threshold));
        assert!(!is_sufficient(Some(&result_of_len(0)), threshold));
    }

    #[test]
    fn absent_result_is_insufficient() {
        assert!(!is_sufficient(None, SufficiencyThreshold::new(0)));
        assert!(!is_sufficient(None, SufficiencyThreshold::new(8)));
    }

    #[test]
    fn predicate_is_idempotent() {
        let threshold = SufficiencyThreshold::new(8);
        let result = result_of_len(9);
        let first = is_sufficient(Some(&result), threshold);
        let second = is_sufficient(Some(&result), threshold);
        assert_eq!(first, second);
    }

    #[test]
    fn decision_covers_all_branches() {
        let policy = RefetchPolicy::new(SufficiencyThreshold::new(8), 3);
        assert_eq!(policy.decide(1, Some(&result_of_len(9))), Decision::Accept);
        assert_eq!(policy.decide(1, Some(&result_of_len(3))), Decision::Refetch);
        assert_eq!(policy.decide(2, Some(&result_of_len(3))), Decision::Refetch);
        assert_eq!(policy.decide(3, Some(&result_of_len(3))), Decision::Exhaust);
        assert_eq!(policy.decide(1, None), Decision::Refetch);
    }

    #[test]
    fn max_attempts_is_clamped_to_one() {
        let policy = RefetchPolicy::new(SufficiencyThreshold::new(8), 0);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.decide(1, Some(&result_of_len(0))), Decision::Exhaust);
    }
}
