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

//! Daemonisation.

use std::io;

use anyhow::{Result, bail};

/// Detaches from the controlling terminal with the usual double fork.
///
/// The surviving grandchild runs in a new session with a zero umask, `/` as
/// its working directory and stdio on `/dev/null`. Must be called before any
/// thread is spawned.
///
/// # Errors
///
/// Returns an error if a `fork`, `setsid` or the stdio redirect fails. The
/// intermediate processes exit directly.
pub(crate) fn daemonize() -> Result<()> {
    fork_and_exit_parent()?;

    if unsafe { libc::setsid() } < 0 {
        bail!("setsid failed: {}", io::Error::last_os_error());
    }
    unsafe {
        libc::signal(libc::SIGHUP, libc::SIG_IGN);
    }

    fork_and_exit_parent()?;

    unsafe {
        libc::umask(0);
    }
    std::env::set_current_dir("/")?;
    redirect_stdio()
}

fn fork_and_exit_parent() -> Result<()> {
    match unsafe { libc::fork() } {
        -1 => bail!("fork failed: {}", io::Error::last_os_error()),
        0 => Ok(()),
        _ => unsafe { libc::_exit(libc::EXIT_SUCCESS) },
    }
}

fn redirect_stdio() -> Result<()> {
    let fd = unsafe { libc::open(c"/dev/null".as_ptr(), libc::O_RDWR) };
    if fd < 0 {
        bail!("failed to open /dev/null: {}", io::Error::last_os_error());
    }

    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        if unsafe { libc::dup2(fd, target) } < 0 {
            bail!("failed to redirect fd {target}: {}", io::Error::last_os_error());
        }
    }
    if fd > libc::STDERR_FILENO {
        unsafe {
            libc::close(fd);
        }
    }

    Ok(())
}
