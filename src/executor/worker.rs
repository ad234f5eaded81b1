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

//! Shell spawning and child reaping.
//!
//! The worker owns every [`Child`] it starts and polls them with `try_wait`,
//! both on a timer and whenever a new command arrives. Children still running
//! when the worker goes away are left alone.

use std::{
    io,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    sync::mpsc::{Receiver, RecvTimeoutError},
    thread,
    time::Duration,
};

use thiserror::Error;
use tracing::{debug, error, warn};

const REAP_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub(crate) enum ExecutorCommand {
    Run(String),
}

#[derive(Debug, Error)]
#[error("failed to spawn `{command}`: {source}")]
pub(crate) struct ExecSpawnError {
    command: String,
    #[source]
    source: io::Error,
}

/// Spawns the executor worker thread.
///
/// # Arguments
///
/// * `shell` - Interpreter used as `<shell> -c <command>`.
/// * `command_rx` - The receiving end of the executor command channel.
pub(crate) fn spawn_executor_worker(shell: PathBuf, command_rx: Receiver<ExecutorCommand>) {
    thread::spawn(move || executor_worker(&shell, command_rx));
}

/// Runs until every sender is dropped.
fn executor_worker(shell: &Path, command_rx: Receiver<ExecutorCommand>) {
    let mut children: Vec<Child> = Vec::new();

    loop {
        match command_rx.recv_timeout(REAP_INTERVAL) {
            Ok(ExecutorCommand::Run(command)) => match spawn_shell(shell, &command) {
                Ok(child) => {
                    debug!("spawned pid {} for {command:?}", child.id());
                    children.push(child);
                }
                Err(e) => error!("{e}"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        reap_finished(&mut children);
    }

    debug!("executor worker stopping with {} child(ren) still running", children.len());
}

fn spawn_shell(shell: &Path, command: &str) -> Result<Child, ExecSpawnError> {
    Command::new(shell)
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .spawn()
        .map_err(|source| ExecSpawnError {
            command: command.to_string(),
            source,
        })
}

/// Drops every child that has exited.
fn reap_finished(children: &mut Vec<Child>) {
    children.retain_mut(|child| match child.try_wait() {
        Ok(Some(status)) => {
            debug!("pid {} exited with {status}", child.id());
            false
        }
        Ok(None) => true,
        Err(e) => {
            warn!("failed to poll pid {}: {e}", child.id());
            false
        }
    });
}
