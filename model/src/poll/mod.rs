/*!

Waiting for asynchronous state transitions on a cluster.

Every wait in a lifecycle scenario is expressed as an `evaluate` function that performs one fetch
and reports a [`PollOutcome`]. [`poll`] calls it immediately and then once per interval until it
reports success, reports a terminal failure, or the timeout elapses.

!*/

mod classify;

pub use classify::{classify, Failure, FailureTag};

use log::{debug, info, trace};
use snafu::Snafu;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// What a single evaluation observed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PollOutcome {
    /// Not there yet. The string describes the state that was seen, e.g. `not found`.
    Pending(String),
    Success,
    /// The observed resource reports a failure that will not resolve by waiting.
    Failure { reason: String, message: String },
}

impl PollOutcome {
    pub fn pending<S: Into<String>>(state: S) -> Self {
        Self::Pending(state.into())
    }

    pub fn failure<S1, S2>(reason: S1, message: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::Failure {
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// `Success` if `done`, otherwise `Pending` with the given state.
    pub fn from_bool<S: Into<String>>(done: bool, state: S) -> Self {
        if done {
            Self::Success
        } else {
            Self::pending(state)
        }
    }
}

/// How a poll ended.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PollResult {
    Satisfied {
        attempts: u32,
        elapsed: Duration,
    },
    TimedOut {
        attempts: u32,
        elapsed: Duration,
        last_state: Option<String>,
    },
    TerminalFailure(Failure),
}

impl PollResult {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, PollResult::Satisfied { .. })
    }

    /// Convert into a `Result`, naming the awaited condition in the error.
    pub fn into_result<S: Into<String>>(self, what: S) -> Result<()> {
        match self {
            PollResult::Satisfied { .. } => Ok(()),
            PollResult::TimedOut {
                attempts,
                elapsed,
                last_state,
            } => TimedOutSnafu {
                what,
                attempts,
                elapsed,
                last_state: last_state.unwrap_or_else(|| "never evaluated".to_string()),
            }
            .fail(),
            PollResult::TerminalFailure(failure) => TerminalSnafu { what, failure }.fail(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A poll that did not end in `Satisfied`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum Error {
    #[snafu(display("{} failed. {}", what, failure))]
    Terminal { what: String, failure: Failure },

    #[snafu(display(
        "Timed out waiting for {} after {:?} ({} attempts), last seen state: {}",
        what,
        elapsed,
        attempts,
        last_state
    ))]
    TimedOut {
        what: String,
        attempts: u32,
        elapsed: Duration,
        last_state: String,
    },
}

impl Error {
    /// The classified failure, if the poll ended in a terminal failure.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Error::Terminal { failure, .. } => Some(failure),
            Error::TimedOut { .. } => None,
        }
    }
}

/// The interval and timeout of a wait.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PollSpec {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSpec {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PollSpec {
    /// Used by most waits for resources to appear or become available.
    pub const DEFAULT: PollSpec = PollSpec::from_secs(10, 10 * 60);
    /// Waiting for a new cluster to finish installing.
    pub const PROVISION: PollSpec = PollSpec::from_secs(60, 5400);
    /// Waiting for a `ClusterDeployment` or a cluster namespace to be deleted.
    pub const DELETION: PollSpec = PollSpec::from_secs(60, 3600);
    /// Waiting for a detached `ManagedCluster` to be deleted.
    pub const DETACH: PollSpec = PollSpec::from_secs(1, 60);
    /// Waiting for the hub to import itself as `local-cluster`.
    pub const SELF_IMPORT: PollSpec = PollSpec::from_secs(10, 15 * 60);
    /// Waiting for the metrics of `local-cluster` to show up in Prometheus.
    pub const METRICS: PollSpec = PollSpec::from_secs(10, 60);

    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub const fn from_secs(interval: u64, timeout: u64) -> Self {
        Self::new(Duration::from_secs(interval), Duration::from_secs(timeout))
    }

    /// Run [`poll`] with this interval and timeout, logging progress under the name `what`.
    pub async fn poll<F, Fut>(&self, what: &str, evaluate: F) -> PollResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PollOutcome>,
    {
        info!(
            "Waiting for {} (every {:?}, up to {:?})",
            what, self.interval, self.timeout
        );
        let result = run(what, evaluate, self.interval, self.timeout).await;
        match &result {
            PollResult::Satisfied { attempts, elapsed } => info!(
                "Done waiting for {} after {:?} ({} attempts)",
                what, elapsed, attempts
            ),
            PollResult::TimedOut { elapsed, .. } => {
                info!("Gave up waiting for {} after {:?}", what, elapsed)
            }
            PollResult::TerminalFailure(failure) => {
                info!("Stopped waiting for {}: {}", what, failure)
            }
        }
        result
    }

    /// Like [`PollSpec::poll`] but anything other than `Satisfied` is an error.
    pub async fn wait<F, Fut>(&self, what: &str, evaluate: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PollOutcome>,
    {
        self.poll(what, evaluate).await.into_result(what)
    }
}

/// Call `evaluate` immediately and then every `interval` until it reports `Success`, reports a
/// `Failure`, or `timeout` elapses. An evaluation still running at the deadline is abandoned and
/// the poll times out. A `Failure` is classified and returned without calling `evaluate` again.
pub async fn poll<F, Fut>(evaluate: F, interval: Duration, timeout: Duration) -> PollResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PollOutcome>,
{
    run("condition", evaluate, interval, timeout).await
}

async fn run<F, Fut>(
    what: &str,
    mut evaluate: F,
    interval: Duration,
    timeout: Duration,
) -> PollResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PollOutcome>,
{
    let start = Instant::now();
    let deadline = start + timeout;
    let mut attempts = 0;
    let mut last_state = None;
    loop {
        attempts += 1;
        trace!("{}: attempt {}", what, attempts);
        let outcome = match tokio::time::timeout_at(deadline, evaluate()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!(
                    "{}: attempt {} did not finish before the deadline",
                    what, attempts
                );
                return PollResult::TimedOut {
                    attempts,
                    elapsed: start.elapsed(),
                    last_state,
                };
            }
        };
        match outcome {
            PollOutcome::Success => {
                return PollResult::Satisfied {
                    attempts,
                    elapsed: start.elapsed(),
                }
            }
            PollOutcome::Failure { reason, message } => {
                return PollResult::TerminalFailure(classify(reason, message))
            }
            PollOutcome::Pending(state) => {
                debug!("{}: {}", what, state);
                last_state = Some(state);
            }
        }
        let now = Instant::now();
        if now >= deadline {
            return PollResult::TimedOut {
                attempts,
                elapsed: now - start,
                last_state,
            };
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;

    const SECOND: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn satisfied_after_not_found() {
        let calls = Cell::new(0);
        let result = poll(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n <= 3 {
                        PollOutcome::pending("not found")
                    } else {
                        PollOutcome::Success
                    }
                }
            },
            SECOND,
            10 * SECOND,
        )
        .await;
        assert_eq!(
            result,
            PollResult::Satisfied {
                attempts: 4,
                elapsed: 3 * SECOND
            }
        );
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn always_pending_times_out() {
        let result = poll(
            || async { PollOutcome::pending("Applied=False") },
            SECOND,
            10 * SECOND,
        )
        .await;
        match result {
            PollResult::TimedOut {
                attempts,
                elapsed,
                last_state,
            } => {
                assert_eq!(elapsed, 10 * SECOND);
                assert_eq!(attempts, 11);
                assert_eq!(last_state.as_deref(), Some("Applied=False"));
            }
            other => panic!("expected a timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn interval_does_not_overshoot_the_timeout() {
        let result = poll(
            || async { PollOutcome::pending("waiting") },
            4 * SECOND,
            10 * SECOND,
        )
        .await;
        match result {
            PollResult::TimedOut {
                attempts, elapsed, ..
            } => {
                // Attempts at 0, 4, 8 and a final one at the deadline.
                assert_eq!(attempts, 4);
                assert_eq!(elapsed, 10 * SECOND);
            }
            other => panic!("expected a timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn quota_failure_is_terminal_on_first_call() {
        let calls = Cell::new(0);
        let start = Instant::now();
        let result = poll(
            || {
                calls.set(calls.get() + 1);
                async { PollOutcome::failure("", "more than remaining quota") }
            },
            SECOND,
            Duration::from_secs(3600),
        )
        .await;
        assert_eq!(calls.get(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        match result {
            PollResult::TerminalFailure(failure) => {
                assert_eq!(failure.tag, FailureTag::QuotaLimit)
            }
            other => panic!("expected a terminal failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unrecognized_failure_after_pending() {
        let calls = Cell::new(0);
        let result = poll(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 2 {
                        PollOutcome::pending("installing")
                    } else {
                        PollOutcome::failure("Boom", "something broke")
                    }
                }
            },
            SECOND,
            10 * SECOND,
        )
        .await;
        assert_eq!(calls.get(), 2);
        match result {
            PollResult::TerminalFailure(failure) => {
                assert_eq!(failure.tag, FailureTag::UnknownError);
                assert_eq!(failure.reason, "Boom");
            }
            other => panic!("expected a terminal failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_is_idempotent() {
        for _ in 0..2 {
            let result = poll(|| async { PollOutcome::Success }, SECOND, 10 * SECOND).await;
            assert_eq!(
                result,
                PollResult::Satisfied {
                    attempts: 1,
                    elapsed: Duration::ZERO
                }
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_evaluates_once() {
        let calls = Cell::new(0);
        let result = poll(
            || {
                calls.set(calls.get() + 1);
                async { PollOutcome::pending("not found") }
            },
            SECOND,
            Duration::ZERO,
        )
        .await;
        assert_eq!(calls.get(), 1);
        assert!(matches!(result, PollResult::TimedOut { attempts: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_evaluation_is_abandoned_at_the_deadline() {
        let result = poll(
            || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                PollOutcome::Success
            },
            SECOND,
            5 * SECOND,
        )
        .await;
        match result {
            PollResult::TimedOut {
                attempts,
                elapsed,
                last_state,
            } => {
                assert_eq!(attempts, 1);
                assert_eq!(elapsed, 5 * SECOND);
                assert!(last_state.is_none());
            }
            other => panic!("expected a timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn wait_reports_failure_details() {
        let err = PollSpec::PROVISION
            .wait("cluster install", || async {
                PollOutcome::failure("VcpuLimitExceeded", "out of vCPUs")
            })
            .await
            .unwrap_err();
        let failure = err.failure().unwrap();
        assert_eq!(failure.tag, FailureTag::QuotaLimit);
        let message = err.to_string();
        assert!(message.starts_with("cluster install failed. Tag: [quota limit]"));
        assert!(message.contains("Reason: VcpuLimitExceeded"));
        assert!(message.contains("Error message: out of vCPUs"));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_reports_timeout_details() {
        let err = PollSpec::from_secs(1, 3)
            .wait("namespace deletion", || async {
                PollOutcome::pending("Terminating")
            })
            .await
            .unwrap_err();
        assert!(err.failure().is_none());
        let message = err.to_string();
        assert!(message.contains("namespace deletion"));
        assert!(message.contains("4 attempts"));
        assert!(message.contains("Terminating"));
    }
}
