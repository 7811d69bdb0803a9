//! Success actions.
//!
//! After a successful cycle the driver arms a fresh cancellation token and
//! hands it here. A command action is spawned in its own process group with
//! inherited stdio and runs without blocking the next cycle; when the token
//! fires (the next cycle's prepare stage), the whole process tree receives
//! a termination request. A callback action is awaited in place and must
//! observe the token itself; cancellation stays cooperative.

use std::sync::Arc;

use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use bindle_config::{ResolvedOptions, SuccessAction};

use crate::error::{BuildError, Result};
use crate::lint::ExitFlag;

/// Run the configured success action.
pub async fn run_success_action(
    action: &SuccessAction,
    options: Arc<ResolvedOptions>,
    token: CancellationToken,
    exit: ExitFlag,
) -> Result<()> {
    match action {
        SuccessAction::Command(command_line) => {
            let child = spawn_shell(command_line, &options)?;
            tokio::spawn(supervise(child, token, exit, command_line.clone()));
            Ok(())
        }
        SuccessAction::Callback(callback) => {
            (callback.0)(options, token)
                .await
                .map_err(|err| BuildError::Hook {
                    hook: "onSuccess",
                    message: err.to_string(),
                })
        }
    }
}

fn spawn_shell(command_line: &str, options: &ResolvedOptions) -> Result<Child> {
    let mut command = if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(command_line);
        command
    } else {
        let mut command = Command::new("sh");
        command.arg("-c").arg(command_line);
        command
    };
    command.current_dir(&options.cwd);
    #[cfg(unix)]
    {
        // own process group, so cancellation can terminate descendants too
        command.process_group(0);
    }

    command.spawn().map_err(|err| BuildError::Spawn {
        command: command_line.to_string(),
        message: err.to_string(),
    })
}

/// Wait for the command or the cancellation signal, whichever comes first.
/// A non-zero exit marks the process exit code; termination failures stay
/// best-effort.
async fn supervise(
    mut child: Child,
    token: CancellationToken,
    exit: ExitFlag,
    command_line: String,
) {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) if !status.success() => {
                exit.set(status.code().unwrap_or(1));
            }
            Ok(_) => {}
            Err(err) => warn!("failed to wait for '{command_line}': {err}"),
        },
        _ = token.cancelled() => {
            debug!("terminating success command: {command_line}");
            terminate_tree(&mut child).await;
        }
    }
}

async fn terminate_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;
        if let Err(err) = killpg(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            debug!("killpg failed: {err}");
        }
    }
    if let Err(err) = child.kill().await {
        debug!("kill failed: {err}");
    }
}
