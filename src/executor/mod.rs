// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! External command execution.
//!
//! The engine only ever hands over a command string and moves on. The
//! [`ShellExecutor`] here is a thin handle: it forwards each string to a
//! background worker thread that spawns the shell and later reaps the child,
//! so the event loop never waits on a process.

mod worker;

use std::{path::PathBuf, sync::mpsc};

use tracing::error;

use worker::ExecutorCommand;

/// Fire-and-forget command runner.
pub(crate) trait CommandExecutor {
    /// Starts `command` and returns immediately. Failures are reported by the
    /// implementation, never to the caller.
    fn execute(&self, command: &str);
}

/// A handle to the shell worker thread.
pub(crate) struct ShellExecutor {
    command_tx: mpsc::Sender<ExecutorCommand>,
}

impl ShellExecutor {
    /// Spawns the worker thread. Commands run as `<shell> -c <command>`.
    pub(crate) fn new(shell: PathBuf) -> Self {
        let (command_tx, command_rx) = mpsc::channel::<ExecutorCommand>();

        worker::spawn_executor_worker(shell, command_rx);

        Self { command_tx }
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command: &str) {
        if self
            .command_tx
            .send(ExecutorCommand::Run(command.to_string()))
            .is_err()
        {
            error!("executor worker is gone, dropping command {command:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        fs,
        thread,
        time::{Duration, Instant},
    };

    fn wait_for(path: &std::path::Path) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if path.exists() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn runs_commands_through_the_shell() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");

        let executor = ShellExecutor::new(PathBuf::from("/bin/sh"));
        executor.execute(&format!("echo pressed > '{}'", marker.display()));

        assert!(wait_for(&marker));
        assert!(fs::read_to_string(&marker).unwrap().starts_with("pressed"));
    }

    #[test]
    fn spawn_failure_does_not_stop_the_worker() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("after");

        let executor = ShellExecutor::new(PathBuf::from("/bin/sh"));
        executor.execute("echo \0unspawnable");
        executor.execute(&format!("touch '{}'", marker.display()));

        assert!(wait_for(&marker));
    }
}
