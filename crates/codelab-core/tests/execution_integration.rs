use codelab_core::evaluation::evaluate;
use codelab_core::executors::{CodeExecutor, ExecutionOutcome, LocalProcessExecutor};
use codelab_core::ExecutionConfig;
use futures_util::future::join_all;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Python interpreter for scenario tests, if the host has one.
fn python() -> Option<String> {
    ["python3", "python"]
        .iter()
        .find(|name| which::which(name).is_ok())
        .map(|name| name.to_string())
}

fn executor(interpreter: &str, dir: &TempDir, timeout: Duration) -> LocalProcessExecutor {
    LocalProcessExecutor::new(
        ExecutionConfig::new(interpreter)
            .with_temp_dir(dir.path())
            .with_timeout(timeout),
    )
}

fn assert_no_leftovers(dir: &TempDir) {
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
}

#[cfg(unix)]
#[tokio::test]
async fn test_concurrent_submissions_are_isolated() {
    let dir = TempDir::new().unwrap();
    let executor = executor("sh", &dir, Duration::from_secs(5));

    let submissions: Vec<String> = (0..16)
        .map(|i| format!("sleep 0.1\necho submission-{}\n", i))
        .collect();
    let outputs = join_all(
        submissions
            .iter()
            .map(|code| executor.execute_and_capture(code)),
    )
    .await;

    for (i, output) in outputs.iter().enumerate() {
        assert_eq!(output, &format!("submission-{}\n", i));
    }
    assert_no_leftovers(&dir);
}

#[cfg(unix)]
#[tokio::test]
async fn test_cleanup_holds_for_every_outcome() {
    let dir = TempDir::new().unwrap();
    let fast = executor("sh", &dir, Duration::from_secs(5));
    let slow = executor("sh", &dir, Duration::from_millis(200));
    let broken = executor("/nonexistent/codelab-interpreter", &dir, Duration::from_secs(5));

    assert!(fast.execute("echo ok").await.is_completed());
    assert!(fast.execute("exit 1").await.is_completed());
    assert!(slow.execute("sleep 5").await.is_timed_out());
    assert!(matches!(
        broken.execute("echo ok").await,
        ExecutionOutcome::LaunchFailed { .. }
    ));

    assert_no_leftovers(&dir);
}

#[tokio::test]
async fn test_python_hello_scenario() {
    let Some(python) = python() else {
        eprintln!("skipping: no python interpreter on PATH");
        return;
    };
    let dir = TempDir::new().unwrap();
    let executor = executor(&python, &dir, Duration::from_secs(5));

    let output = executor
        .execute_and_capture("print(\"hello\"); print(\"hello\")")
        .await;

    assert_eq!(output, "hello\nhello\n");
    assert!(evaluate(&output, "hello\nhello"));
    assert_no_leftovers(&dir);
}

#[tokio::test]
async fn test_python_stdout_precedes_stderr() {
    let Some(python) = python() else {
        eprintln!("skipping: no python interpreter on PATH");
        return;
    };
    let dir = TempDir::new().unwrap();
    let executor = executor(&python, &dir, Duration::from_secs(5));

    let code = "import sys\nsys.stderr.write('b'); sys.stderr.flush()\nsys.stdout.write('a')\n";
    let output = executor.execute_and_capture(code).await;

    assert_eq!(output, "ab");
}

#[tokio::test]
async fn test_python_runtime_error_is_reported_as_output() {
    let Some(python) = python() else {
        eprintln!("skipping: no python interpreter on PATH");
        return;
    };
    let dir = TempDir::new().unwrap();
    let executor = executor(&python, &dir, Duration::from_secs(5));

    let outcome = executor.execute("print('before')\nraise ValueError('boom')\n").await;

    assert_ne!(outcome.exit_code(), Some(0));
    let output = codelab_core::executors::classify(&outcome);
    assert!(output.starts_with("before\n"));
    assert!(output.contains("ValueError: boom"));
}

#[tokio::test]
async fn test_python_sleep_scenario_times_out() {
    let Some(python) = python() else {
        eprintln!("skipping: no python interpreter on PATH");
        return;
    };
    let dir = TempDir::new().unwrap();
    let executor = executor(&python, &dir, Duration::from_secs(1));

    let started = Instant::now();
    let output = executor
        .execute_and_capture("import time; time.sleep(10)")
        .await;

    assert_eq!(output, "Error: Execution timed out after 1 seconds");
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_no_leftovers(&dir);
}
