//! End-to-end tests for the aggregation pipeline.
//!
//! These tests drive [`Aggregator`] through scripted and HTTP-backed
//! sources and check the merged feed and its summary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use problems::models::parse_timestamp;
use problems::{
    AggregationConfig, Aggregator, ApiClient, ApiConfig, FetchError, ProblemSource, RawRecord,
    Severity, SourceKind, Task, TaskStatus,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scripted response for one task.
#[derive(Clone)]
enum Reply {
    Records(Vec<Value>),
    Fail,
    /// Sleep before answering with no records
    Hang(Duration),
}

/// Source that replays canned replies per task id and tracks concurrency.
#[derive(Default)]
struct ScriptedSource {
    replies: HashMap<String, Reply>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedSource {
    fn with(mut self, task_id: &str, reply: Reply) -> Self {
        self.replies.insert(task_id.to_string(), reply);
        self
    }

    async fn reply(&self, task_id: &str) -> Result<Vec<RawRecord>, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let reply = self.replies.get(task_id).cloned().unwrap_or(Reply::Records(vec![]));
        let result = match reply {
            Reply::Records(values) => {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(values.into_iter().map(RawRecord::from).collect())
            }
            Reply::Fail => Err(FetchError::Other(format!("{task_id} failed"))),
            Reply::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(vec![])
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl ProblemSource for ScriptedSource {
    async fn fetch_audit_issues(&self, task_id: &str) -> Result<Vec<RawRecord>, FetchError> {
        self.reply(task_id).await
    }

    async fn fetch_agent_findings(&self, task_id: &str) -> Result<Vec<RawRecord>, FetchError> {
        self.reply(task_id).await
    }
}

fn completed(id: &str, created_at: &str) -> Task {
    Task::new(id, TaskStatus::Completed, parse_timestamp(created_at))
}

#[tokio::test(start_paused = true)]
async fn test_audit_and_agent_tasks_merge_into_one_feed() {
    let source = ScriptedSource::default()
        .with(
            "audit-1",
            Reply::Records(vec![json!({
                "id": "issue-1",
                "task_id": "audit-1",
                "created_at": "2024-05-01T10:05:00Z",
                "severity": "medium",
                "title": "Unused variable",
                "file_path": "src/lib.rs",
                "line_number": 4
            })]),
        )
        .with(
            "agent-1",
            Reply::Records(vec![json!({
                "id": "finding-1",
                "task_id": "agent-1",
                "created_at": "2024-05-02T09:00:00Z",
                "severity": "high",
                "title": "src/App.java:66 - Null check missing",
                "file_path": null
            })]),
        );
    let aggregator = Aggregator::new(
        Arc::new(source),
        AggregationConfig::new(20, 5, Duration::from_secs(12)),
    );

    let audit = vec![completed("audit-1", "2024-05-01T10:00:00Z")];
    let agent = vec![completed("agent-1", "2024-05-02T08:00:00Z")];
    let report = aggregator.aggregate(&audit, &agent).await;

    assert_eq!(report.problems.len(), 2);
    let first = &report.problems[0];
    assert_eq!(first.kind, SourceKind::Agent);
    assert_eq!(first.severity, Severity::High);
    assert_eq!(first.file_path.as_deref(), Some("src/App.java"));
    assert_eq!(first.line_start, Some(66));
    assert_eq!(first.line_end, None);
    assert_eq!(first.title, "Null check missing");

    let second = &report.problems[1];
    assert_eq!(second.kind, SourceKind::Audit);
    assert_eq!(second.file_path.as_deref(), Some("src/lib.rs"));
    assert_eq!(second.line_start, Some(4));

    assert_eq!(report.summary.completed_audit_tasks, 1);
    assert_eq!(report.summary.completed_agent_tasks, 1);
    assert!(!report.summary.is_limited);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_runs_are_identical() {
    let mut source = ScriptedSource::default();
    let mut audit = Vec::new();
    let mut agent = Vec::new();
    for i in 0..6 {
        let audit_id = format!("a{i}");
        let agent_id = format!("g{i}");
        let audit_severity = ["low", "high", "critical"][i % 3];
        let agent_severity = ["medium", "LOW"][i % 2];
        source = source
            .with(
                &audit_id,
                Reply::Records(vec![json!({
                    "id": format!("{audit_id}-x"),
                    "created_at": "2024-05-01T00:00:00Z",
                    "severity": audit_severity,
                })]),
            )
            .with(
                &agent_id,
                Reply::Records(vec![json!({
                    "id": format!("{agent_id}-x"),
                    "created_at": "2024-05-01T00:00:00Z",
                    "severity": agent_severity,
                })]),
            );
        audit.push(completed(&audit_id, &format!("2024-04-0{}T00:00:00Z", i + 1)));
        agent.push(completed(&agent_id, &format!("2024-03-0{}T00:00:00Z", i + 1)));
    }
    let aggregator = Aggregator::new(
        Arc::new(source),
        AggregationConfig::new(20, 2, Duration::from_secs(1)),
    );

    let first = aggregator.aggregate(&audit, &agent).await;
    let second = aggregator.aggregate(&audit, &agent).await;

    assert_eq!(first.problems.len(), 12);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test(start_paused = true)]
async fn test_hung_task_times_out_and_others_survive() {
    let source = ScriptedSource::default()
        .with("slow", Reply::Hang(Duration::from_secs(3600)))
        .with("broken", Reply::Fail)
        .with(
            "ok",
            Reply::Records(vec![json!({"id": "i", "created_at": "2024-01-01T00:00:00Z"})]),
        );
    let aggregator = Aggregator::new(
        Arc::new(source),
        AggregationConfig::new(20, 1, Duration::from_millis(500)),
    );

    let audit = vec![
        completed("slow", "2024-01-03T00:00:00Z"),
        completed("broken", "2024-01-02T00:00:00Z"),
        completed("ok", "2024-01-01T00:00:00Z"),
    ];
    let started = tokio::time::Instant::now();
    let report = aggregator.aggregate(&audit, &[]).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(report.problems.len(), 1);
    assert_eq!(report.summary.fetched_audit_tasks, 3);
    assert_eq!(report.summary.failed_audit_tasks, 2);
}

#[tokio::test(start_paused = true)]
async fn test_pools_respect_concurrency_and_run_side_by_side() {
    let mut source = ScriptedSource::default();
    let mut audit = Vec::new();
    let mut agent = Vec::new();
    for i in 0..10 {
        source = source
            .with(&format!("a{i}"), Reply::Hang(Duration::from_millis(100)))
            .with(&format!("g{i}"), Reply::Hang(Duration::from_millis(100)));
        audit.push(completed(&format!("a{i}"), "2024-01-01T00:00:00Z"));
        agent.push(completed(&format!("g{i}"), "2024-01-01T00:00:00Z"));
    }
    let source = Arc::new(source);
    let aggregator = Aggregator::new(
        source.clone(),
        AggregationConfig::new(20, 3, Duration::from_secs(5)),
    );

    let started = tokio::time::Instant::now();
    let report = aggregator.aggregate(&audit, &agent).await;

    // Both pools of width 3 drain 10 tasks each in four 100ms rounds.
    assert_eq!(source.peak.load(Ordering::SeqCst), 6);
    assert!(started.elapsed() < Duration::from_millis(450));
    assert_eq!(report.summary.failed_audit_tasks, 0);
    assert_eq!(report.summary.failed_agent_tasks, 0);
}

#[tokio::test(start_paused = true)]
async fn test_summary_counts_never_exceed_inputs() {
    let statuses = [
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Completed,
        TaskStatus::Pending,
        TaskStatus::Completed,
    ];
    let created_at = parse_timestamp("2024-01-01T00:00:00Z");
    for max_tasks in 0..5 {
        let audit: Vec<Task> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| Task::new(format!("a{i}"), *status, created_at))
            .collect();
        let agent = vec![completed("g0", "2024-01-01T00:00:00Z")];
        let aggregator = Aggregator::new(
            Arc::new(ScriptedSource::default()),
            AggregationConfig::new(max_tasks, 2, Duration::from_secs(1)),
        );

        let summary = aggregator.aggregate(&audit, &agent).await.summary;

        assert!(summary.fetched_audit_tasks <= summary.completed_audit_tasks);
        assert!(summary.completed_audit_tasks <= audit.len());
        assert!(summary.fetched_agent_tasks <= summary.completed_agent_tasks);
        assert_eq!(summary.completed_audit_tasks, 3);
        assert_eq!(
            summary.is_limited,
            summary.completed_audit_tasks > max_tasks || summary.completed_agent_tasks > max_tasks,
            "max_tasks = {max_tasks}"
        );
    }
}

#[tokio::test]
async fn test_pipeline_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/a1/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "i1",
                "created_at": "2024-05-01T00:00:00",
                "severity": "LOW",
                "message": "from message"
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/a2/issues"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/agent-tasks/g1/findings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "f1", "created_at": "2024-05-03T00:00:00"}]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = Arc::new(ApiClient::new(&ApiConfig::new(server.uri())).unwrap());
    let aggregator = Aggregator::new(
        client,
        AggregationConfig::new(20, 2, Duration::from_millis(300)),
    );

    let audit = vec![
        completed("a1", "2024-05-01T00:00:00Z"),
        completed("a2", "2024-04-01T00:00:00Z"),
    ];
    let agent = vec![completed("g1", "2024-05-02T00:00:00Z")];
    let report = aggregator.aggregate(&audit, &agent).await;

    assert_eq!(report.problems.len(), 1);
    assert_eq!(report.problems[0].description.as_deref(), Some("from message"));
    assert_eq!(report.problems[0].task_id, "a1");
    assert_eq!(report.summary.failed_audit_tasks, 1);
    assert_eq!(report.summary.failed_agent_tasks, 1);
}
