use tracing::{debug, warn};

use crate::error::FetchError;
use crate::events::EventsResult;
use crate::fetcher::EventFetcher;
use crate::policy::{Decision, RefetchPolicy};

/// Terminal state of one controller run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// The last result met the sufficiency threshold.
    Accepted,
    /// The attempt budget ran out; the last result is a best effort.
    Exhausted,
}

/// Result of one controller run: the final events plus how we got there.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub events: EventsResult,
    pub state: ControllerState,
    /// Total fetch calls performed, including the final one.
    pub attempts: usize,
}

impl FetchOutcome {
    pub fn is_exhausted(&self) -> bool {
        self.state == ControllerState::Exhausted
    }
}

/// Drives fetch / check / refetch-if-insufficient with a finite bound.
///
/// Each retry replaces the previous result rather than merging into it.
/// Exhaustion is a soft degrade, not an error: downstream summarization
/// proceeds on whatever was last collected. A [`FetchError`] aborts the
/// run immediately; retrying failed fetches is the fetcher's own concern.
pub struct ReFetchController {
    policy: RefetchPolicy,
}

impl ReFetchController {
    pub fn new(policy: RefetchPolicy) -> Self {
        Self { policy }
    }

    pub async fn run(&self, fetcher: &dyn EventFetcher) -> Result<FetchOutcome, FetchError> {
        let mut attempts = 0usize;
        loop {
            let result = fetcher.fetch().await?;
            attempts += 1;
            debug!(
                attempt = attempts,
                events = result.len(),
                "fetch attempt completed"
            );

            match self.policy.decide(attempts, Some(&result)) {
                Decision::Accept => {
                    return Ok(FetchOutcome {
                        events: result,
                        state: ControllerState::Accepted,
                        attempts,
                    });
                }
                Decision::Exhaust => {
                    warn!(
                        attempts,
                        events = result.len(),
                        "fetch budget exhausted; continuing with best-effort result"
                    );
                    return Ok(FetchOutcome {
                        events: result,
                        state: ControllerState::Exhausted,
                        attempts,
                    });
                }
                // Superseded result is dropped on the next iteration.
                Decision::Refetch => {}
            }
        }
    }
}
