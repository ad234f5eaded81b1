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

//! Logging set-up.
//!
//! Messages go through `tracing`. In the foreground they are printed to
//! stdout; in silent or daemon mode every line is handed to `syslog(3)`.

use std::{
    ffi::{CStr, CString},
    io,
    sync::Once,
};

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

const SYSLOG_IDENT: &CStr = c"buttond";

static OPEN_SYSLOG: Once = Once::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LogTarget {
    Stdout,
    Syslog,
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `verbose`.
pub(crate) fn init_logging(target: LogTarget, verbose: bool) -> Result<()> {
    let default_filter = if verbose { "buttond=debug" } else { "buttond=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match target {
        LogTarget::Stdout => builder.try_init(),
        LogTarget::Syslog => {
            OPEN_SYSLOG.call_once(|| unsafe {
                libc::openlog(SYSLOG_IDENT.as_ptr(), libc::LOG_PID | libc::LOG_CONS, libc::LOG_DAEMON);
            });
            builder
                .with_ansi(false)
                .without_time()
                .with_writer(|| SyslogWriter)
                .try_init()
        }
    }
    .map_err(|e| anyhow!(e))
}

/// Sends each written line to the system log at `LOG_NOTICE`.
struct SyslogWriter;

impl io::Write for SyslogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for line in String::from_utf8_lossy(buf).lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let message = CString::new(line.replace('\0', "")).unwrap_or_default();
            unsafe {
                libc::syslog(libc::LOG_NOTICE, c"%s".as_ptr(), message.as_ptr());
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
