use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Result of a successful fallback chain run
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackSuccess<T> {
    pub value: T,
    /// Index of the candidate that produced `value`
    pub candidate: usize,
}

impl<T> FallbackSuccess<T> {
    /// Whether an earlier candidate had to be skipped
    pub fn fell_back(&self) -> bool {
        self.candidate > 0
    }
}

/// Try each candidate in order until one succeeds
///
/// Every attempt is bounded by `per_attempt`; a timeout counts as a failure
/// and moves on to the next candidate.
///
/// # Arguments
/// * `operation_name` - Name of the operation for logging
/// * `candidates` - Backends to try, in preference order (must not be empty)
/// * `per_attempt` - Time limit for each attempt
/// * `operation` - Async closure run against one candidate
///
/// # Returns
/// The first success, or the last error if every candidate failed
pub async fn with_fallback<'a, C, T, F, Fut>(
    operation_name: &str,
    candidates: &'a [C],
    per_attempt: Duration,
    mut operation: F,
) -> anyhow::Result<FallbackSuccess<T>>
where
    F: FnMut(&'a C) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut last_error: Option<anyhow::Error> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let result = match timeout(per_attempt, operation(candidate)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("timed out after {:?}", per_attempt)),
        };

        match result {
            Ok(value) => {
                if index > 0 {
                    debug!(
                        "{}: Succeeded on candidate {}/{}",
                        operation_name,
                        index + 1,
                        candidates.len()
                    );
                }
                return Ok(FallbackSuccess {
                    value,
                    candidate: index,
                });
            }
            Err(e) => {
                let remaining = candidates.len() - index - 1;
                if remaining > 0 {
                    warn!(
                        "{}: Candidate {}/{} failed ({}), falling back",
                        operation_name,
                        index + 1,
                        candidates.len(),
                        e
                    );
                } else {
                    warn!(
                        "{}: All {} candidates failed. Last error: {}",
                        operation_name,
                        candidates.len(),
                        e
                    );
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("{}: no candidates configured", operation_name)))
}
