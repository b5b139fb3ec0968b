//! Cancellation, last-write-wins and timeouts.

mod common;

use std::time::Duration;

use a2a_cli::config::ClientConfig;
use a2a_cli::error::A2AError;
use a2a_cli::session::{Connection, SessionState, TaskOutcome};
use a2a_cli::sink::{LineCategory, MemorySink};
use common::{artifact, frame, start_agent, status, wait_for_lines, Reply, ScriptedAgent};

#[tokio::test]
async fn cancel_mid_stream_silences_the_sink() {
    let agent = start_agent(ScriptedAgent::streaming(vec![Reply::sse_then_hang(vec![
        frame("status-update", status("t1", "working", false)),
        frame("artifact-update", artifact("t1", "output_delta", "partial")),
    ])]))
    .await;
    let sink = MemorySink::new();
    let mut conn = Connection::new(ClientConfig::default(), sink.clone());
    conn.connect(&agent.base_url).await.unwrap();

    let handle = conn.send_task("long job").await.unwrap();
    wait_for_lines(&sink, 2).await;
    assert_eq!(handle.state(), SessionState::Streaming);

    assert!(handle.cancel());
    let after_cancel = sink.len();
    assert_eq!(handle.state(), SessionState::Cancelled);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sink.len(), after_cancel);

    let lines = sink.lines();
    assert_eq!(
        lines.last().unwrap(),
        &(
            "Task cancelled by user".to_string(),
            Some(LineCategory::Cancelled)
        )
    );
    assert!(!sink.texts().iter().any(|t| t == "partial"));
    assert!(matches!(handle.wait().await, TaskOutcome::Cancelled));

    // A second cancel is a no-op.
    assert!(!handle.cancel());
    assert_eq!(sink.len(), after_cancel);
}

#[tokio::test]
async fn cancel_after_completion_is_a_no_op() {
    let agent = start_agent(ScriptedAgent::streaming(vec![Reply::sse(vec![frame(
        "status-update",
        status("t1", "completed", true),
    )])]))
    .await;
    let sink = MemorySink::new();
    let mut conn = Connection::new(ClientConfig::default(), sink.clone());
    conn.connect(&agent.base_url).await.unwrap();

    let handle = conn.send_task("quick").await.unwrap();
    assert!(handle.wait().await.is_completed());

    let before = sink.len();
    assert!(!conn.cancel_current());
    assert_eq!(sink.len(), before);
    assert_eq!(handle.state(), SessionState::Completed);
}

#[tokio::test]
async fn new_send_cancels_the_previous_one() {
    let agent = start_agent(ScriptedAgent::streaming(vec![
        Reply::sse_then_hang(vec![frame("status-update", status("t1", "working", false))]),
        Reply::sse(vec![frame("status-update", status("t2", "completed", true))]),
    ]))
    .await;
    let sink = MemorySink::new();
    let mut conn = Connection::new(ClientConfig::default(), sink.clone());
    conn.connect(&agent.base_url).await.unwrap();

    let first = conn.send_task("first").await.unwrap();
    wait_for_lines(&sink, 2).await;

    let second = conn.send_task("second").await.unwrap();
    assert_eq!(first.state(), SessionState::Cancelled);
    assert!(second.wait().await.is_completed());

    assert_eq!(
        sink.texts(),
        vec![
            "Task ID: t1",
            "Status: working",
            "Task cancelled by user",
            "Task ID: t2",
            "Status: completed",
        ]
    );
    assert_eq!(agent.requests().len(), 2);
}

#[tokio::test]
async fn stalled_agent_times_out() {
    let agent = start_agent(ScriptedAgent::streaming(vec![Reply::Stall])).await;
    let sink = MemorySink::new();
    let config = ClientConfig {
        task_timeout_secs: 1,
        ..Default::default()
    };
    let mut conn = Connection::new(config, sink.clone());
    conn.connect(&agent.base_url).await.unwrap();

    let handle = conn.send_task("anyone there?").await.unwrap();
    assert_eq!(handle.state(), SessionState::Sending);

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("session should time out on its own");
    assert!(matches!(outcome, TaskOutcome::Failed(A2AError::Timeout(_))));
    assert_eq!(handle.state(), SessionState::Failed);

    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].0.starts_with("Task failed: Timeout"));
    assert_eq!(lines[0].1, Some(LineCategory::Error));
}

#[tokio::test]
async fn silent_stream_times_out_before_first_event() {
    let agent = start_agent(ScriptedAgent::streaming(vec![Reply::sse_then_hang(vec![
        ": keep-alive\n\n".to_string(),
    ])]))
    .await;
    let sink = MemorySink::new();
    let config = ClientConfig {
        task_timeout_secs: 1,
        ..Default::default()
    };
    let mut conn = Connection::new(config, sink.clone());
    conn.connect(&agent.base_url).await.unwrap();

    let outcome = conn.run_task("hello?").await.unwrap();
    assert!(matches!(outcome, TaskOutcome::Failed(A2AError::Timeout(_))));
}

#[tokio::test]
async fn disconnect_cancels_running_send() {
    let agent = start_agent(ScriptedAgent::streaming(vec![Reply::sse_then_hang(vec![
        frame("status-update", status("t1", "working", false)),
    ])]))
    .await;
    let sink = MemorySink::new();
    let mut conn = Connection::new(ClientConfig::default(), sink.clone());
    conn.connect(&agent.base_url).await.unwrap();

    let handle = conn.send_task("work").await.unwrap();
    wait_for_lines(&sink, 2).await;

    assert!(conn.disconnect().await);
    assert_eq!(handle.state(), SessionState::Cancelled);
    assert!(matches!(
        conn.send_task("again").await,
        Err(A2AError::NotConnected)
    ));
}
