//! Dashboard submission poller
//!
//! Re-fetches a user's submissions on a fixed interval and diffs the result
//! against the previously held snapshot to detect submissions that finished
//! since the last tick. The diff itself is a pure function so the detection
//! logic is testable without a timer or a database.
//!
//! The snapshot is replaced wholesale after each successful fetch, so a
//! given transition can only be observed once. A failed fetch leaves the
//! prior snapshot in place: a transient read error must not erase pending
//! state or re-fire notifications later.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use reelforge_shared::SubmissionStatus;

use crate::error::ApiError;
use crate::store::{Submission, SubmissionStore};

/// Fixed polling period, matching the dashboard's refresh cadence
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Emitted once per observed completion transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionNotice {
    pub submission_id: Uuid,
    pub product_title: String,
}

/// Read side of the submission store, injectable for tests
pub trait SubmissionReader: Send + Sync {
    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Submission>, ApiError>> + Send;
}

impl SubmissionReader for SubmissionStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Submission>, ApiError> {
        SubmissionStore::list_for_user(self, user_id).await
    }
}

/// Submissions present in both snapshots that moved to completed.
///
/// Ids present in only one snapshot produce nothing: a fresh submission has
/// no prior state to have transitioned from, and a deleted one has no
/// current state to report.
pub fn completed_transitions(
    previous: &[Submission],
    current: &[Submission],
) -> Vec<CompletionNotice> {
    current
        .iter()
        .filter_map(|next| {
            let prev = previous.iter().find(|p| p.id == next.id)?;
            (prev.status != SubmissionStatus::Completed
                && next.status == SubmissionStatus::Completed)
                .then(|| CompletionNotice {
                    submission_id: next.id,
                    product_title: next.product_title.clone(),
                })
        })
        .collect()
}

/// Polls one user's submissions and reports completion transitions
pub struct SubmissionPoller<R> {
    reader: R,
    user_id: Uuid,
    snapshot: Vec<Submission>,
}

impl<R: SubmissionReader> SubmissionPoller<R> {
    pub fn new(reader: R, user_id: Uuid) -> Self {
        Self {
            reader,
            user_id,
            snapshot: Vec::new(),
        }
    }

    /// One fetch-diff-replace cycle
    pub async fn poll_once(&mut self) -> Vec<CompletionNotice> {
        match self.reader.list_for_user(self.user_id).await {
            Ok(current) => {
                let notices = completed_transitions(&self.snapshot, &current);
                self.snapshot = current;
                notices
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %self.user_id,
                    error = %e,
                    "Submission poll failed - keeping previous snapshot"
                );
                Vec::new()
            }
        }
    }
}

impl<R: SubmissionReader + 'static> SubmissionPoller<R> {
    /// Run the poll loop on the given period, pushing notices into `tx`.
    ///
    /// The loop ends when the receiver is dropped; dropping the returned
    /// handle aborts it immediately.
    pub fn spawn(
        reader: R,
        user_id: Uuid,
        period: Duration,
        tx: mpsc::Sender<CompletionNotice>,
    ) -> PollerHandle {
        let mut poller = SubmissionPoller::new(reader, user_id);
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                for notice in poller.poll_once().await {
                    if tx.send(notice).await.is_err() {
                        return;
                    }
                }
            }
        });
        PollerHandle { join }
    }
}

/// Owner of a running poll loop; dropping it cancels the timer
pub struct PollerHandle {
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(&self) {
        self.join.abort();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    fn submission(id: Uuid, title: &str, status: SubmissionStatus) -> Submission {
        let now = OffsetDateTime::now_utc();
        Submission {
            id,
            user_id: Uuid::new_v4(),
            product_title: title.to_string(),
            user_prompt: "prompt".to_string(),
            user_email: "user@example.com".to_string(),
            template_style: "Product Ad".to_string(),
            image_base64: None,
            status,
            video_url: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pending_to_completed_emits_one_notice() {
        let id = Uuid::new_v4();
        let prev = vec![submission(id, "Sneaker Ad", SubmissionStatus::Pending)];
        let next = vec![submission(id, "Sneaker Ad", SubmissionStatus::Completed)];

        let notices = completed_transitions(&prev, &next);
        assert_eq!(
            notices,
            vec![CompletionNotice {
                submission_id: id,
                product_title: "Sneaker Ad".to_string(),
            }]
        );
    }

    #[test]
    fn processing_to_completed_emits_a_notice() {
        let id = Uuid::new_v4();
        let prev = vec![submission(id, "Lamp", SubmissionStatus::Processing)];
        let next = vec![submission(id, "Lamp", SubmissionStatus::Completed)];
        assert_eq!(completed_transitions(&prev, &next).len(), 1);
    }

    #[test]
    fn non_completion_transitions_emit_nothing() {
        let id = Uuid::new_v4();
        let prev = vec![submission(id, "Lamp", SubmissionStatus::Pending)];

        let processing = vec![submission(id, "Lamp", SubmissionStatus::Processing)];
        assert!(completed_transitions(&prev, &processing).is_empty());

        let failed = vec![submission(id, "Lamp", SubmissionStatus::Failed)];
        assert!(completed_transitions(&prev, &failed).is_empty());
    }

    #[test]
    fn already_completed_does_not_refire() {
        let id = Uuid::new_v4();
        let prev = vec![submission(id, "Lamp", SubmissionStatus::Completed)];
        let next = vec![submission(id, "Lamp", SubmissionStatus::Completed)];
        assert!(completed_transitions(&prev, &next).is_empty());
    }

    #[test]
    fn ids_absent_from_either_snapshot_emit_nothing() {
        let completed = vec![submission(
            Uuid::new_v4(),
            "New",
            SubmissionStatus::Completed,
        )];
        // Appeared already-completed: no prior state to transition from
        assert!(completed_transitions(&[], &completed).is_empty());
        // Deleted while pending: nothing to report
        let pending = vec![submission(Uuid::new_v4(), "Gone", SubmissionStatus::Pending)];
        assert!(completed_transitions(&pending, &[]).is_empty());
    }

    /// Reader double yielding a scripted sequence of results
    struct ScriptedReader {
        results: Mutex<VecDeque<Result<Vec<Submission>, ApiError>>>,
    }

    impl ScriptedReader {
        fn new(results: Vec<Result<Vec<Submission>, ApiError>>) -> Self {
            Self {
                results: Mutex::new(results.into_iter().collect()),
            }
        }
    }

    impl SubmissionReader for ScriptedReader {
        async fn list_for_user(&self, _user_id: Uuid) -> Result<Vec<Submission>, ApiError> {
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[tokio::test]
    async fn transition_is_reported_exactly_once_across_polls() {
        let id = Uuid::new_v4();
        let reader = ScriptedReader::new(vec![
            Ok(vec![submission(id, "Lamp", SubmissionStatus::Pending)]),
            Ok(vec![submission(id, "Lamp", SubmissionStatus::Completed)]),
            Ok(vec![submission(id, "Lamp", SubmissionStatus::Completed)]),
        ]);
        let mut poller = SubmissionPoller::new(reader, Uuid::new_v4());

        assert!(poller.poll_once().await.is_empty());
        assert_eq!(poller.poll_once().await.len(), 1);
        assert!(poller.poll_once().await.is_empty());
    }

    #[tokio::test]
    async fn read_failure_preserves_snapshot_and_still_detects_later() {
        let id = Uuid::new_v4();
        let reader = ScriptedReader::new(vec![
            Ok(vec![submission(id, "Lamp", SubmissionStatus::Processing)]),
            Err(ApiError::Database("connection reset".to_string())),
            Ok(vec![submission(id, "Lamp", SubmissionStatus::Completed)]),
        ]);
        let mut poller = SubmissionPoller::new(reader, Uuid::new_v4());

        assert!(poller.poll_once().await.is_empty());
        // The failed poll must not wipe the snapshot...
        assert!(poller.poll_once().await.is_empty());
        // ...so the completion is still detected against the old state
        assert_eq!(poller.poll_once().await.len(), 1);
    }
}
