use std::process::{Command, ExitStatus};

use tracing::{debug, info};

use crate::aws::Credentials;

/// What launching amounted to. Only the top-level caller turns this into
/// actual process termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub exit_code: u8,
    pub diagnostic: Option<String>,
}

impl LaunchOutcome {
    fn success() -> Self {
        Self {
            exit_code: 0,
            diagnostic: None,
        }
    }

    fn failure(diagnostic: String) -> Self {
        Self {
            exit_code: 1,
            diagnostic: Some(diagnostic),
        }
    }
}

/// Shell statements that export the session into the calling shell
pub fn export_statements(credentials: &Credentials) -> [String; 3] {
    [
        format!(
            "AWS_ACCESS_KEY_ID={}; export AWS_ACCESS_KEY_ID;",
            credentials.access_key_id
        ),
        format!(
            "AWS_SECRET_ACCESS_KEY={}; export AWS_SECRET_ACCESS_KEY;",
            credentials.secret_access_key
        ),
        format!(
            "AWS_SESSION_TOKEN={}; export AWS_SESSION_TOKEN",
            credentials.session_token
        ),
    ]
}

/// Run a command with the session credentials layered into its environment.
///
/// An empty command prints export statements instead of spawning, for
/// `eval "$(aws-sudo)"` usage. The child inherits the parent's stdio and its
/// exit code is propagated verbatim; termination by signal maps to exit
/// code 1 with a diagnostic naming the signal.
pub fn launch(command: &[String], credentials: &Credentials) -> LaunchOutcome {
    let Some((program, args)) = command.split_first() else {
        for line in export_statements(credentials) {
            println!("{line}");
        }
        return LaunchOutcome::success();
    };

    info!("Running {} with session credentials", program);

    let status = Command::new(program)
        .args(args)
        .env("AWS_ACCESS_KEY_ID", &credentials.access_key_id)
        .env("AWS_SECRET_ACCESS_KEY", &credentials.secret_access_key)
        .env("AWS_SESSION_TOKEN", &credentials.session_token)
        .status();

    let status = match status {
        Ok(status) => status,
        Err(e) => return LaunchOutcome::failure(format!("Failed to run {program}: {e}")),
    };

    match status.code() {
        Some(code) => {
            debug!("Child exited with code {}", code);
            LaunchOutcome {
                exit_code: code as u8,
                diagnostic: None,
            }
        }
        None => LaunchOutcome::failure(termination_diagnostic(status)),
    }
}

#[cfg(unix)]
fn termination_diagnostic(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(signal) => format!("terminated by {}", signal_name(signal)),
        None => "terminated abnormally".to_string(),
    }
}

#[cfg(not(unix))]
fn termination_diagnostic(_status: ExitStatus) -> String {
    "terminated abnormally".to_string()
}

#[cfg(unix)]
fn signal_name(signal: i32) -> String {
    let name = match signal {
        1 => "SIGHUP",
        2 => "SIGINT",
        3 => "SIGQUIT",
        4 => "SIGILL",
        6 => "SIGABRT",
        8 => "SIGFPE",
        9 => "SIGKILL",
        10 => "SIGUSR1",
        11 => "SIGSEGV",
        12 => "SIGUSR2",
        13 => "SIGPIPE",
        14 => "SIGALRM",
        15 => "SIGTERM",
        _ => return format!("signal {signal}"),
    };

    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            access_key_id: "ASIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
        }
    }

    fn args(command: &[&str]) -> Vec<String> {
        command.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_export_statements_format() {
        let lines = export_statements(&credentials());

        assert_eq!(
            lines,
            [
                "AWS_ACCESS_KEY_ID=ASIATEST; export AWS_ACCESS_KEY_ID;",
                "AWS_SECRET_ACCESS_KEY=secret; export AWS_SECRET_ACCESS_KEY;",
                "AWS_SESSION_TOKEN=token; export AWS_SESSION_TOKEN",
            ]
        );
    }

    #[test]
    fn test_empty_command_never_spawns() {
        let outcome = launch(&[], &credentials());

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.diagnostic, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_child_exit_code_is_propagated() {
        let outcome = launch(&args(&["sh", "-c", "exit 7"]), &credentials());

        assert_eq!(outcome.exit_code, 7);
        assert_eq!(outcome.diagnostic, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_child_sees_credentials_and_parent_environment() {
        // PATH comes from the parent, the AWS variables from the overlay
        let outcome = launch(
            &args(&[
                "sh",
                "-c",
                "test -n \"$PATH\" && test \"$AWS_ACCESS_KEY_ID\" = ASIATEST \
                 && test \"$AWS_SECRET_ACCESS_KEY\" = secret \
                 && test \"$AWS_SESSION_TOKEN\" = token",
            ]),
            &credentials(),
        );

        assert_eq!(outcome.exit_code, 0);
    }

    #[test]
    fn test_spawn_failure_is_exit_code_one() {
        let outcome = launch(&args(&["aws-sudo-no-such-binary"]), &credentials());

        assert_eq!(outcome.exit_code, 1);
        let diagnostic = outcome.diagnostic.unwrap();
        assert!(diagnostic.contains("Failed to run aws-sudo-no-such-binary"));
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_termination_names_the_signal() {
        let outcome = launch(&args(&["sh", "-c", "kill -KILL $$"]), &credentials());

        assert_eq!(outcome.exit_code, 1);
        assert_eq!(
            outcome.diagnostic.as_deref(),
            Some("terminated by SIGKILL")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(9), "SIGKILL");
        assert_eq!(signal_name(15), "SIGTERM");
        assert_eq!(signal_name(64), "signal 64");
    }
}
