//! Dashboard aggregator.
//!
//! Holds a single immutable [`DashboardSummary`] behind an `ArcSwapOption`.
//! Every change swaps in a freshly built summary, so a new `Arc` identity
//! always signals a new value.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use carelink_core::models::DashboardSummary;
use carelink_core::{ApiError, ApiResult, Method};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::collection::path_segment;
use crate::executor::RequestExecutor;

pub const DASHBOARD_PATH: &str = "/dashboard";

pub struct DashboardAggregator {
    executor: Arc<RequestExecutor>,
    summary: ArcSwapOption<DashboardSummary>,
    last_error: Mutex<Option<ApiError>>,
    revision: watch::Sender<u64>,
}

impl DashboardAggregator {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            executor,
            summary: ArcSwapOption::empty(),
            last_error: Mutex::new(None),
            revision,
        }
    }

    pub fn summary(&self) -> Option<Arc<DashboardSummary>> {
        self.summary.load_full()
    }

    pub fn last_error(&self) -> Option<ApiError> {
        self.last_error.lock().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Return the held summary, fetching it first if there is none.
    pub async fn load(&self) -> ApiResult<Arc<DashboardSummary>> {
        match self.summary.load_full() {
            Some(summary) => Ok(summary),
            None => self.refresh().await,
        }
    }

    pub async fn refresh(&self) -> ApiResult<Arc<DashboardSummary>> {
        let result = self.executor.get::<DashboardSummary>(DASHBOARD_PATH).await;
        match result {
            Ok(summary) => {
                let summary = Arc::new(summary);
                self.summary.store(Some(summary.clone()));
                *self.last_error.lock() = None;
                self.bump();
                Ok(summary)
            }
            Err(e) => Err(self.record(e)),
        }
    }

    pub async fn mark_task_complete(&self, task_id: &str) -> ApiResult<()> {
        let path = format!("{DASHBOARD_PATH}/tasks/{}/complete", path_segment(task_id));
        self.executor
            .execute_unit(Method::Patch, &path, true)
            .await
            .map_err(|e| self.record(e))?;
        self.patch(|s| s.with_task(task_id, |t| t.with_completed(true)));
        Ok(())
    }

    pub async fn mark_alert_read(&self, alert_id: &str) -> ApiResult<()> {
        let path = format!("{DASHBOARD_PATH}/alerts/{}/read", path_segment(alert_id));
        self.executor
            .execute_unit(Method::Patch, &path, true)
            .await
            .map_err(|e| self.record(e))?;
        self.patch(|s| s.with_alert(alert_id, |a| a.with_read(true)));
        Ok(())
    }

    /// Swap in a rebuilt summary. No-op when nothing is held or the target
    /// sub-record is not part of it.
    fn patch(&self, rebuild: impl Fn(&DashboardSummary) -> Option<DashboardSummary>) {
        let mut changed = false;
        self.summary.rcu(|current| match current.as_deref().and_then(&rebuild) {
            Some(next) => {
                changed = true;
                Some(Arc::new(next))
            }
            None => {
                changed = false;
                current.clone()
            }
        });
        if changed {
            self.bump();
        } else {
            debug!("Dashboard item not held locally, nothing to patch");
        }
    }

    fn record(&self, err: ApiError) -> ApiError {
        warn!(error = %err, "Dashboard request failed");
        *self.last_error.lock() = Some(err.clone());
        self.bump();
        err
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, session_with};
    use carelink_core::ApiErrorKind;
    use serde_json::json;

    fn aggregator(transport: &Arc<MockTransport>) -> DashboardAggregator {
        let executor = RequestExecutor::new(transport.clone(), session_with(transport.clone()));
        DashboardAggregator::new(Arc::new(executor))
    }

    fn summary_body() -> serde_json::Value {
        json!({
            "success": true,
            "data": {
                "stats": { "totalPatients": 40, "newInquiries": 2 },
                "tasks": [
                    { "id": "t-1", "title": "Review intake" },
                    { "id": "t-2", "title": "Sign notes" }
                ],
                "alerts": [ { "id": "a-1", "title": "Lab result" } ]
            }
        })
    }

    #[tokio::test]
    async fn test_load_fetches_once() {
        let transport = MockTransport::new();
        let dash = aggregator(&transport);
        transport.push_json(200, summary_body());

        let first = dash.load().await.unwrap();
        let second = dash.load().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.stats.total_patients, 40);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_mark_task_complete_rebuilds_summary() {
        let transport = MockTransport::new();
        let dash = aggregator(&transport);
        transport.push_json(200, summary_body());
        transport.push_json(200, json!({ "success": true }));

        let before = dash.load().await.unwrap();
        dash.mark_task_complete("t-2").await.unwrap();
        let after = dash.summary().unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.tasks[1].completed);
        assert!(!before.tasks[1].completed);
        assert_eq!(after.tasks[0], before.tasks[0]);
        assert_eq!(after.alerts, before.alerts);

        let requests = transport.requests();
        assert_eq!(requests[1].method, Method::Patch);
        assert_eq!(requests[1].path, "/dashboard/tasks/t-2/complete");
    }

    #[tokio::test]
    async fn test_failed_write_keeps_summary() {
        let transport = MockTransport::new();
        let dash = aggregator(&transport);
        transport.push_json(200, summary_body());
        transport.push_json(503, json!({ "success": false }));

        let before = dash.load().await.unwrap();
        let err = dash.mark_alert_read("a-1").await.unwrap_err();
        let after = dash.summary().unwrap();

        assert_eq!(err.kind(), ApiErrorKind::ServiceUnavailable);
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(dash.last_error().map(|e| e.kind()), Some(ApiErrorKind::ServiceUnavailable));
    }

    #[tokio::test]
    async fn test_mark_alert_read() {
        let transport = MockTransport::new();
        let dash = aggregator(&transport);
        transport.push_json(200, summary_body());
        transport.push_raw(204, Vec::new());

        dash.load().await.unwrap();
        let mut rx = dash.subscribe();
        dash.mark_alert_read("a-1").await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(dash.summary().unwrap().unread_alert_count(), 0);
    }

    #[tokio::test]
    async fn test_task_and_alert_ids_are_encoded() {
        let transport = MockTransport::new();
        let dash = aggregator(&transport);
        transport.push_raw(204, Vec::new());
        transport.push_raw(204, Vec::new());

        dash.mark_task_complete("t/1?x=1").await.unwrap();
        dash.mark_alert_read("../a").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].path, "/dashboard/tasks/t%2F1%3Fx%3D1/complete");
        assert_eq!(requests[1].path, "/dashboard/alerts/..%2Fa/read");
        assert!(requests.iter().all(|r| r.query.is_empty()));
    }
}
