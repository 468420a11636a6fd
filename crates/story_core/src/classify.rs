use crate::orchestrator::AttemptOutcome;

/// Exit code a POSIX shell uses for "command not found".
pub const COMMAND_NOT_FOUND_POSIX: i32 = 127;
/// Exit code `cmd.exe` uses for "is not recognized as a command".
pub const COMMAND_NOT_FOUND_WINDOWS: i32 = 9009;

const MISSING_INTERPRETER_MARKERS: &[&str] = &[
    "not found",
    "not recognized",
    "cannot find the path",
];

const MISSING_DEPENDENCY_MARKERS: &[&str] = &[
    "modulenotfounderror",
    "no module named",
    "dependency missing",
    "error while loading shared libraries",
];

/// Decide whether a failed attempt means the runtime itself is absent,
/// as opposed to the backend running and failing.
pub fn is_interpreter_missing(outcome: &AttemptOutcome) -> bool {
    match outcome {
        AttemptOutcome::LaunchFailed { .. } => true,
        AttemptOutcome::TimedOut { .. } => false,
        AttemptOutcome::Exited { code, stderr, .. } => {
            if *code == COMMAND_NOT_FOUND_POSIX || *code == COMMAND_NOT_FOUND_WINDOWS {
                return true;
            }
            *code != 0 && contains_any(stderr, MISSING_INTERPRETER_MARKERS)
        }
    }
}

/// Remediation text for the common case of a backend whose own
/// dependencies are not installed.
pub fn dependency_hint(stderr: &str, command: &str) -> Option<String> {
    if !contains_any(stderr, MISSING_DEPENDENCY_MARKERS) {
        return None;
    }
    let shown = if command.is_empty() { "<unknown>" } else { command };
    Some(format!(
        "The backend started but a dependency it needs is missing.\n\
         Command attempted: {shown}\n\
         Install the backend's dependencies for that exact interpreter, or set \
         STORY_BACKEND to the full path of an interpreter that already has them."
    ))
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    markers.iter().any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exited(code: i32, stderr: &str) -> AttemptOutcome {
        AttemptOutcome::Exited {
            code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn well_known_exit_codes_are_missing_regardless_of_stderr() {
        assert!(is_interpreter_missing(&exited(127, "")));
        assert!(is_interpreter_missing(&exited(9009, "something unrelated")));
    }

    #[test]
    fn stderr_markers_only_count_on_failure() {
        assert!(is_interpreter_missing(&exited(
            1,
            "'python3' is NOT RECOGNIZED as an internal or external command"
        )));
        assert!(is_interpreter_missing(&exited(
            2,
            "The system cannot find the path specified."
        )));
        assert!(!is_interpreter_missing(&exited(0, "python: not found")));
        assert!(!is_interpreter_missing(&exited(1, "Backend error: boom")));
    }

    #[test]
    fn launch_failure_is_missing_and_timeout_is_not() {
        assert!(is_interpreter_missing(&AttemptOutcome::LaunchFailed {
            message: "No such file or directory (os error 2)".into(),
        }));
        assert!(!is_interpreter_missing(&AttemptOutcome::TimedOut {
            after_secs: 5
        }));
    }

    #[test]
    fn dependency_hint_names_the_command() {
        let hint = dependency_hint("ModuleNotFoundError: No module named 'bs4'", "python3 fetch.py")
            .expect("hint");
        assert!(hint.contains("python3 fetch.py"));
        assert!(hint.contains("STORY_BACKEND"));
        assert_eq!(dependency_hint("Backend error: timeout", "python3"), None);
    }
}
