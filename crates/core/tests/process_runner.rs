//! Process runner integration tests, driven through real shell children.

#![cfg(unix)]

use std::time::{Duration, Instant};

use droidctl_core::process::{self, ExecutionSpec, ProcessError, StdinScript};

fn sh(script: &str) -> ExecutionSpec {
    ExecutionSpec::new("/bin/sh").args(["-c", script])
}

#[tokio::test]
async fn captures_all_lines_from_both_streams_in_order() {
    let script = r#"
        i=1
        while [ $i -le 20 ]; do
            echo "out $i"
            echo "err $i" >&2
            i=$((i + 1))
        done
    "#;

    let result = process::execute(&sh(script)).await.expect("execute");

    assert!(result.success());
    assert_eq!(result.stdout.len(), 20);
    assert_eq!(result.stderr.len(), 20);
    for (i, line) in result.stdout.iter().enumerate() {
        assert_eq!(line, &format!("out {}", i + 1));
    }
    for (i, line) in result.stderr.iter().enumerate() {
        assert_eq!(line, &format!("err {}", i + 1));
    }
}

#[tokio::test]
async fn large_output_does_not_deadlock() {
    // Well past the OS pipe buffer on both streams; passes only when the
    // drains run concurrently with the wait.
    let script = r#"
        i=1
        while [ $i -le 5000 ]; do
            echo "stdout line $i padding-padding-padding-padding"
            echo "stderr line $i padding-padding-padding-padding" >&2
            i=$((i + 1))
        done
    "#;

    let result = process::execute(&sh(script)).await.expect("execute");

    assert!(result.success());
    assert_eq!(result.stdout.len(), 5000);
    assert_eq!(result.stderr.len(), 5000);
}

#[tokio::test]
async fn nonzero_exit_is_reported_not_an_error() {
    let result = process::execute(&sh("echo failing >&2; exit 3"))
        .await
        .expect("execute");

    assert!(!result.success());
    assert_eq!(result.exit_code, 3);
    assert_eq!(result.stderr, vec!["failing".to_string()]);
}

#[tokio::test]
async fn timeout_kills_the_child_and_returns_no_partial_result() {
    let spec = sh("echo started; sleep 30").timeout(Duration::from_millis(500));

    let start = Instant::now();
    let err = process::execute(&spec).await.expect_err("should time out");
    let elapsed = start.elapsed();

    assert!(matches!(err, ProcessError::Timeout(_)));
    // Bounded margin: the 500ms timeout plus the kill, nowhere near the
    // 30s sleep.
    assert!(elapsed < Duration::from_secs(10), "took {:?}", elapsed);
}

#[tokio::test]
async fn missing_executable_fails_to_spawn() {
    let spec = ExecutionSpec::new("/nonexistent/droidctl-no-such-tool");
    let err = process::execute(&spec).await.expect_err("should not spawn");
    assert!(matches!(err, ProcessError::Spawn { .. }));
}

#[tokio::test]
async fn kill_on_dead_handle_is_a_noop() {
    let spec = sh("exit 0");
    let mut child = process::spawn_detached(&spec).expect("spawn");
    child.wait().await.expect("wait");

    process::kill(&mut child).await.expect("first kill");
    process::kill(&mut child).await.expect("second kill");
}

#[tokio::test]
async fn kill_stops_a_live_process() {
    let mut child = process::spawn_detached(&sh("sleep 30")).expect("spawn");
    assert!(child.id().is_some());

    process::kill(&mut child).await.expect("kill");
    let status = child.try_wait().expect("try_wait");
    assert!(status.is_some());
}

#[tokio::test]
async fn answer_once_feeds_a_single_line() {
    let script = r#"
        read answer
        if [ "$answer" = "no" ]; then
            echo accepted
        else
            echo "unexpected: $answer"
            exit 1
        fi
    "#;
    let spec = sh(script).stdin_script(StdinScript::AnswerOnce("no".to_string()));

    let result = process::execute(&spec).await.expect("execute");

    assert!(result.success());
    assert_eq!(result.stdout, vec!["accepted".to_string()]);
}

#[tokio::test]
async fn repeat_line_survives_a_child_that_stops_reading() {
    // The child consumes two answers and exits; the runner keeps trying
    // up to the limit and must treat the broken pipe as an early stop,
    // not a failure.
    let script = r#"
        read a
        read b
        echo "got $a $b"
    "#;
    let spec = sh(script).stdin_script(StdinScript::RepeatLine {
        line: "y".to_string(),
        times: 1000,
    });

    let result = process::execute(&spec).await.expect("execute");

    assert!(result.success());
    assert_eq!(result.stdout, vec!["got y y".to_string()]);
}

#[tokio::test]
async fn env_overrides_merge_onto_inherited_environment() {
    let spec = sh("echo \"$ANDROID_HOME\"; test -n \"$PATH\" && echo path-present")
        .env("ANDROID_HOME", "/opt/test-sdk");

    let result = process::execute(&spec).await.expect("execute");

    assert!(result.success());
    assert_eq!(
        result.stdout,
        vec!["/opt/test-sdk".to_string(), "path-present".to_string()]
    );
}

#[tokio::test]
async fn working_directory_is_applied() {
    let dir = tempfile::tempdir().expect("tempdir");
    let canonical = dir.path().canonicalize().expect("canonicalize");

    let spec = sh("pwd").current_dir(&canonical);
    let result = process::execute(&spec).await.expect("execute");

    assert_eq!(result.stdout, vec![canonical.display().to_string()]);
}

#[tokio::test]
async fn streaming_forwards_lines_while_capturing() {
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let spec = sh("echo one; echo two >&2; echo three");

    let result = process::execute_streaming(&spec, tx).await.expect("execute");

    assert!(result.success());
    assert_eq!(result.stdout, vec!["one".to_string(), "three".to_string()]);
    assert_eq!(result.stderr, vec!["two".to_string()]);

    let mut forwarded_out = Vec::new();
    let mut forwarded_err = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            process::OutputEvent::Stdout(line) => forwarded_out.push(line),
            process::OutputEvent::Stderr(line) => forwarded_err.push(line),
        }
    }
    assert_eq!(forwarded_out, result.stdout);
    assert_eq!(forwarded_err, result.stderr);
}
