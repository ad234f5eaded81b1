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

//! Application configuration.
//!
//! This module manages the daemon settings file. The button rules live in a
//! separate, line-oriented rule file whose path is configured here.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rules::DEFAULT_MAX_RULES;

const CONFIG_NAME: &str = "buttond";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) version: u32,
    pub(crate) rules_file: PathBuf,
    /// Used when the rule file has no `DEVICE=` line.
    pub(crate) default_device: PathBuf,
    pub(crate) tick_interval_ms: u64,
    pub(crate) shell: PathBuf,
    pub(crate) max_rules: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            rules_file: PathBuf::from("/etc/thingino-button.conf"),
            default_device: PathBuf::from("/dev/input/event0"),
            tick_interval_ms: 10,
            shell: PathBuf::from("/bin/sh"),
            max_rules: DEFAULT_MAX_RULES,
        }
    }
}

impl AppConfig {
    /// Sleep between loop iterations, never zero.
    pub(crate) fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

pub(crate) fn load_config() -> AppConfig {
    confy::load(CONFIG_NAME, None).unwrap_or_else(|e| {
        warn!("using default settings: {e}");
        AppConfig::default()
    })
}
