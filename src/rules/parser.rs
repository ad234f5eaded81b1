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

//! Rule file parsing.
//!
//! The rule file is line oriented:
//!
//! ```text
//! # comment
//! DEVICE=/dev/input/event0
//! KEY_ENTER PRESS  /usr/bin/led on
//! KEY_ENTER TIMED  5 /sbin/reboot
//! KEY_ENTER TIMED  /usr/sbin/factory-reset 10
//! ```
//!
//! A line that fails to parse is reported and skipped; loading carries on
//! with the remaining lines. Only an unreadable file is fatal.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, warn};

use crate::rules::{ActionKind, ActionRule, RuleSet, keys};

const DEVICE_PREFIX: &str = "DEVICE=";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("expected `<KEY_NAME> <ACTION> [THRESHOLD] <COMMAND...>`")]
    Malformed,
    #[error("unknown key name `{0}`")]
    UnknownKey(String),
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("threshold must not be negative (got {0})")]
    NegativeThreshold(f64),
    #[error("`DEVICE=` needs a path")]
    EmptyDevice,
    #[error("maximum number of rules ({0}) reached")]
    TooManyRules(usize),
}

/// Everything a rule file configures.
#[derive(Debug, Default)]
pub(crate) struct RuleFile {
    /// Input device selected with `DEVICE=`, if any.
    pub(crate) device: Option<PathBuf>,
    pub(crate) rules: RuleSet,
}

/// Reads and parses the rule file at `path`.
///
/// # Errors
///
/// Returns an error only if the file cannot be read. Bad lines are logged and
/// skipped.
pub(crate) fn load_rule_file(path: &Path, max_rules: usize) -> Result<RuleFile> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to open rule file {}", path.display()))?;

    Ok(parse_rules(&String::from_utf8_lossy(&bytes), max_rules))
}

/// Parses rule file text, keeping every line that parses.
pub(crate) fn parse_rules(text: &str, max_rules: usize) -> RuleFile {
    let mut file = RuleFile {
        device: None,
        rules: RuleSet::with_limit(max_rules),
    };

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if file.rules.is_full() {
            warn!("line {line_no}: {}, ignoring the rest of the file", ConfigError::TooManyRules(max_rules));
            break;
        }

        if let Some(value) = line.strip_prefix(DEVICE_PREFIX) {
            match value.split_whitespace().next() {
                Some(device) => file.device = Some(PathBuf::from(device)),
                None => warn!("line {line_no}: {}", ConfigError::EmptyDevice),
            }
            continue;
        }

        match parse_rule_line(line).and_then(|rule| {
            let summary = format!(
                "key_code={} action={} command={:?} threshold={}",
                rule.key_code, rule.kind, rule.command, rule.threshold_seconds
            );
            file.rules.push(rule).map(|_| summary)
        }) {
            Ok(summary) => debug!("loaded rule: {summary}"),
            Err(e) => warn!("line {line_no}: skipping `{line}`: {e}"),
        }
    }

    file
}

/// Parses a single `<KEY_NAME> <ACTION> [THRESHOLD] <COMMAND...>` line.
///
/// For the two hold kinds the threshold may also trail the command. Press and
/// release rules take the whole remainder as the command.
pub(crate) fn parse_rule_line(line: &str) -> Result<ActionRule, ConfigError> {
    let (key, rest) = next_token(line).ok_or(ConfigError::Malformed)?;
    let (action, rest) = next_token(rest).ok_or(ConfigError::Malformed)?;

    let key_code = keys::key_code_from_name(key).ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    let kind = ActionKind::from_token(action).ok_or_else(|| ConfigError::UnknownAction(action.to_string()))?;

    let rest = rest.trim();
    if rest.is_empty() {
        return Err(ConfigError::Malformed);
    }

    let (command, threshold) = if kind.uses_threshold() {
        split_threshold(rest)
    } else {
        (rest, None)
    };

    let threshold_seconds = threshold.unwrap_or(0.0);
    if threshold_seconds < 0.0 {
        return Err(ConfigError::NegativeThreshold(threshold_seconds));
    }

    Ok(ActionRule::new(key_code, kind, command).with_threshold(threshold_seconds))
}

/// Splits off the first whitespace-delimited token.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    Some(s.split_once(char::is_whitespace).unwrap_or((s, "")))
}

/// Finds a leading or trailing numeric threshold in `rest`. The command must
/// keep at least one token either way.
fn split_threshold(rest: &str) -> (&str, Option<f64>) {
    if let Some((first, tail)) = next_token(rest) {
        let tail = tail.trim();
        if !tail.is_empty() {
            if let Some(value) = parse_number(first) {
                return (tail, Some(value));
            }
        }
    }

    if let Some((head, last)) = rest.rsplit_once(char::is_whitespace) {
        let head = head.trim_end();
        if !head.is_empty() {
            if let Some(value) = parse_number(last) {
                return (head, Some(value));
            }
        }
    }

    (rest, None)
}

/// Optional sign, then digits with at most one decimal point.
fn parse_number(token: &str) -> Option<f64> {
    let unsigned = token.strip_prefix(['+', '-']).unwrap_or(token);

    let mut digits = 0;
    let mut points = 0;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return None,
        }
    }
    if digits == 0 || points > 1 {
        return None;
    }

    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn commands(file: &RuleFile, key_code: u16) -> Vec<(ActionKind, String, f64)> {
        file.rules
            .rules_for(key_code)
            .map(|(_, r)| (r.kind, r.command.clone(), r.threshold_seconds))
            .collect()
    }

    #[test]
    fn parses_press_and_release() {
        let rule = parse_rule_line("KEY_ENTER PRESS /usr/bin/led on").unwrap();
        assert_eq!(rule.key_code, 28);
        assert_eq!(rule.kind, ActionKind::OnPress);
        assert_eq!(rule.command, "/usr/bin/led on");
        assert_eq!(rule.threshold_seconds, 0.0);
    }

    #[test]
    fn press_keeps_trailing_number_in_command() {
        let rule = parse_rule_line("KEY_1 RELEASE sleep 5").unwrap();
        assert_eq!(rule.command, "sleep 5");
        assert_eq!(rule.threshold_seconds, 0.0);
    }

    #[test]
    fn leading_threshold() {
        let rule = parse_rule_line("KEY_ENTER TIMED 2.5 /sbin/reboot -f").unwrap();
        assert_eq!(rule.kind, ActionKind::OnHoldThreshold);
        assert_eq!(rule.command, "/sbin/reboot -f");
        assert_eq!(rule.threshold_seconds, 2.5);
    }

    #[test]
    fn trailing_threshold() {
        let rule = parse_rule_line("KEY_ENTER TIMED_FIRE /usr/sbin/factory-reset   10").unwrap();
        assert_eq!(rule.kind, ActionKind::OnHoldElapsedAutoFire);
        assert_eq!(rule.command, "/usr/sbin/factory-reset");
        assert_eq!(rule.threshold_seconds, 10.0);
    }

    #[test]
    fn decimal_point_only_forms() {
        assert_eq!(parse_rule_line("KEY_2 TIMED .5 a").unwrap().threshold_seconds, 0.5);
        assert_eq!(parse_rule_line("KEY_2 TIMED a 3.").unwrap().threshold_seconds, 3.0);
    }

    #[test]
    fn lone_number_is_the_command() {
        let rule = parse_rule_line("KEY_2 TIMED 5").unwrap();
        assert_eq!(rule.command, "5");
        assert_eq!(rule.threshold_seconds, 0.0);
    }

    #[test]
    fn hold_rule_without_threshold_defaults_to_zero() {
        let rule = parse_rule_line("KEY_2 TIMED echo hi").unwrap();
        assert_eq!(rule.command, "echo hi");
        assert_eq!(rule.threshold_seconds, 0.0);
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(matches!(parse_rule_line("KEY_ENTER"), Err(ConfigError::Malformed)));
        assert!(matches!(parse_rule_line("KEY_ENTER PRESS"), Err(ConfigError::Malformed)));
        assert!(matches!(parse_rule_line("KEY_NOPE PRESS ls"), Err(ConfigError::UnknownKey(k)) if k == "KEY_NOPE"));
        assert!(matches!(parse_rule_line("KEY_1 HOLD ls"), Err(ConfigError::UnknownAction(a)) if a == "HOLD"));
        assert!(matches!(parse_rule_line("KEY_1 TIMED -1 ls"), Err(ConfigError::NegativeThreshold(_))));
    }

    #[test]
    fn numeric_detection() {
        assert_eq!(parse_number("10"), Some(10.0));
        assert_eq!(parse_number("+1.25"), Some(1.25));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("1e3"), None);
        assert_eq!(parse_number("-"), None);
    }

    #[test]
    fn parse_rules_skips_comments_and_bad_lines() {
        let text = "\
# buttons
DEVICE=/dev/input/event1

KEY_ENTER PRESS echo down
KEY_NOPE PRESS echo never
KEY_ENTER TIMED 1 echo one
KEY_ENTER TIMED echo two 2
garbage
";
        let file = parse_rules(text, 100);

        assert_eq!(file.device, Some(PathBuf::from("/dev/input/event1")));
        assert_eq!(
            commands(&file, 28),
            vec![
                (ActionKind::OnPress, "echo down".to_string(), 0.0),
                (ActionKind::OnHoldThreshold, "echo one".to_string(), 1.0),
                (ActionKind::OnHoldThreshold, "echo two".to_string(), 2.0),
            ]
        );
    }

    #[test]
    fn parse_rules_stops_at_the_limit() {
        let text = "KEY_1 PRESS a\nKEY_2 PRESS b\nKEY_3 PRESS c\nDEVICE=/dev/late\n";
        let file = parse_rules(text, 2);

        assert_eq!(file.rules.len(), 2);
        assert_eq!(file.rules.rules_for(4).count(), 0);
        assert_eq!(file.device, None);
    }

    #[test]
    fn device_after_a_full_table_is_ignored() {
        let text = "KEY_1 PRESS a\nKEY_2 PRESS b\nDEVICE=/dev/late\n";
        let file = parse_rules(text, 2);

        assert_eq!(file.rules.len(), 2);
        assert_eq!(file.device, None);
    }

    #[test]
    fn device_before_the_limit_is_kept() {
        let text = "KEY_1 PRESS a\nDEVICE=/dev/input/event3\nKEY_2 PRESS b\n";
        let file = parse_rules(text, 2);

        assert_eq!(file.rules.len(), 2);
        assert_eq!(file.device, Some(PathBuf::from("/dev/input/event3")));
    }

    #[test]
    fn empty_file_loads_no_rules() {
        let file = parse_rules("", 100);
        assert!(file.rules.is_empty());
        assert!(file.device.is_none());
    }

    #[test]
    fn load_rule_file_reads_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "KEY_5 RELEASE /bin/true").unwrap();

        let file = load_rule_file(tmp.path(), 100).unwrap();
        assert_eq!(commands(&file, 6), vec![(ActionKind::OnRelease, "/bin/true".to_string(), 0.0)]);
    }

    #[test]
    fn load_rule_file_missing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_rule_file(&dir.path().join("absent.conf"), 100).is_err());
    }
}
