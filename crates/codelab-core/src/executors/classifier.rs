//! Maps an `ExecutionOutcome` to the text returned in the `output` field.

use std::time::Duration;

use super::ExecutionOutcome;

/// Response text for an outcome. Total over every variant.
pub fn classify(outcome: &ExecutionOutcome) -> String {
    match outcome {
        ExecutionOutcome::Completed { stdout, stderr, .. } => {
            let mut output = String::with_capacity(stdout.len() + stderr.len());
            output.push_str(stdout);
            output.push_str(stderr);
            output
        }
        ExecutionOutcome::TimedOut { deadline, .. } => timeout_message(*deadline),
        ExecutionOutcome::LaunchFailed { message } => format!("Error: {}", message),
    }
}

/// `Error: Execution timed out after 5 seconds` for the default deadline.
pub fn timeout_message(deadline: Duration) -> String {
    let seconds = if deadline.subsec_nanos() == 0 {
        deadline.as_secs().to_string()
    } else {
        deadline.as_secs_f64().to_string()
    };
    format!("Error: Execution timed out after {} seconds", seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_concatenates_stdout_then_stderr() {
        let outcome = ExecutionOutcome::Completed {
            stdout: "hello\n".to_string(),
            stderr: "Traceback...\n".to_string(),
            exit_code: Some(1),
        };
        assert_eq!(classify(&outcome), "hello\nTraceback...\n");
    }

    #[test]
    fn test_completed_without_output_is_empty() {
        let outcome = ExecutionOutcome::Completed {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
        };
        assert_eq!(classify(&outcome), "");
    }

    #[test]
    fn test_timeout_ignores_partial_output() {
        let outcome = ExecutionOutcome::TimedOut {
            stdout: "partial".to_string(),
            stderr: String::new(),
            deadline: Duration::from_secs(5),
        };
        assert_eq!(
            classify(&outcome),
            "Error: Execution timed out after 5 seconds"
        );
    }

    #[test]
    fn test_timeout_message_reflects_deadline() {
        assert_eq!(
            timeout_message(Duration::from_secs(10)),
            "Error: Execution timed out after 10 seconds"
        );
        assert_eq!(
            timeout_message(Duration::from_millis(500)),
            "Error: Execution timed out after 0.5 seconds"
        );
    }

    #[test]
    fn test_launch_failure_is_prefixed() {
        let outcome = ExecutionOutcome::LaunchFailed {
            message: "could not launch interpreter 'python': No such file or directory (os error 2)"
                .to_string(),
        };
        assert_eq!(
            classify(&outcome),
            "Error: could not launch interpreter 'python': No such file or directory (os error 2)"
        );
    }
}
