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

//! Action rules and the rule table.
//!
//! A rule binds a raw key code to one of four action kinds and a shell
//! command. Rules are loaded once at start-up and never change afterwards;
//! the engine refers to them by [`RuleId`], which is simply the position of
//! the rule in load order.

pub(crate) mod keys;
pub(crate) mod parser;

use std::{collections::HashMap, fmt};

pub(crate) use parser::{ConfigError, load_rule_file};

/// Maximum number of rules accepted when no explicit limit is configured.
pub(crate) const DEFAULT_MAX_RULES: usize = 100;

/// What a rule reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ActionKind {
    /// Fire as soon as the key goes down.
    OnPress,
    /// Fire when the key comes back up, whatever the hold time.
    OnRelease,
    /// On release, fire the rule with the largest threshold not exceeding the
    /// hold time.
    OnHoldThreshold,
    /// Fire once while the key is still held, after the threshold elapses.
    OnHoldElapsedAutoFire,
}

impl ActionKind {
    /// Parses the literal token used in the rule file.
    pub(crate) fn from_token(token: &str) -> Option<Self> {
        match token {
            "PRESS" => Some(Self::OnPress),
            "RELEASE" => Some(Self::OnRelease),
            "TIMED" => Some(Self::OnHoldThreshold),
            "TIMED_FIRE" => Some(Self::OnHoldElapsedAutoFire),
            _ => None,
        }
    }

    pub(crate) fn token(self) -> &'static str {
        match self {
            Self::OnPress => "PRESS",
            Self::OnRelease => "RELEASE",
            Self::OnHoldThreshold => "TIMED",
            Self::OnHoldElapsedAutoFire => "TIMED_FIRE",
        }
    }

    /// Whether the threshold of a rule of this kind means anything.
    pub(crate) fn uses_threshold(self) -> bool {
        matches!(self, Self::OnHoldThreshold | Self::OnHoldElapsedAutoFire)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ActionRule {
    pub(crate) key_code: u16,
    pub(crate) kind: ActionKind,
    pub(crate) command: String,
    /// Seconds; always `>= 0`, and `0` for press/release rules.
    pub(crate) threshold_seconds: f64,
}

impl ActionRule {
    pub(crate) fn new(key_code: u16, kind: ActionKind, command: impl Into<String>) -> Self {
        Self {
            key_code,
            kind,
            command: command.into(),
            threshold_seconds: 0.0,
        }
    }

    pub(crate) fn with_threshold(mut self, seconds: f64) -> Self {
        self.threshold_seconds = seconds;
        self
    }
}

/// Stable handle to a rule inside a [`RuleSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct RuleId(usize);

/// Ordered, append-only table of rules with a per-key index.
///
/// Load order is preserved both globally and per key code, which is what
/// makes the hold-threshold tie-break deterministic.
#[derive(Debug)]
pub(crate) struct RuleSet {
    rules: Vec<ActionRule>,
    by_key: HashMap<u16, Vec<RuleId>>,
    max_rules: usize,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_RULES)
    }
}

impl RuleSet {
    pub(crate) fn with_limit(max_rules: usize) -> Self {
        Self {
            rules: Vec::new(),
            by_key: HashMap::new(),
            max_rules,
        }
    }

    /// Appends a rule, failing once the table is full or when the rule breaks
    /// the non-negative threshold invariant.
    pub(crate) fn push(&mut self, rule: ActionRule) -> Result<RuleId, ConfigError> {
        if self.is_full() {
            return Err(ConfigError::TooManyRules(self.max_rules));
        }
        if rule.threshold_seconds.is_nan() || rule.threshold_seconds < 0.0 {
            return Err(ConfigError::NegativeThreshold(rule.threshold_seconds));
        }

        let id = RuleId(self.rules.len());
        self.by_key.entry(rule.key_code).or_default().push(id);
        self.rules.push(rule);
        Ok(id)
    }

    pub(crate) fn is_full(&self) -> bool {
        self.rules.len() >= self.max_rules
    }

    pub(crate) fn get(&self, id: RuleId) -> &ActionRule {
        &self.rules[id.0]
    }

    /// Rules bound to `key_code`, in load order.
    pub(crate) fn rules_for(&self, key_code: u16) -> impl Iterator<Item = (RuleId, &ActionRule)> {
        self.by_key
            .get(&key_code)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&id| (id, self.get(id)))
    }

    pub(crate) fn len(&self) -> usize {
        self.rules.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_for_preserves_load_order_per_key() {
        let mut rules = RuleSet::default();
        rules.push(ActionRule::new(2, ActionKind::OnPress, "a")).unwrap();
        rules.push(ActionRule::new(3, ActionKind::OnPress, "b")).unwrap();
        rules.push(ActionRule::new(2, ActionKind::OnRelease, "c")).unwrap();

        let commands: Vec<&str> = rules.rules_for(2).map(|(_, r)| r.command.as_str()).collect();
        assert_eq!(commands, vec!["a", "c"]);
    }

    #[test]
    fn unknown_key_has_no_rules() {
        let rules = RuleSet::default();
        assert_eq!(rules.rules_for(28).count(), 0);
    }

    #[test]
    fn push_rejects_rules_past_the_limit() {
        let mut rules = RuleSet::with_limit(1);
        rules.push(ActionRule::new(2, ActionKind::OnPress, "a")).unwrap();

        let err = rules.push(ActionRule::new(2, ActionKind::OnPress, "b")).unwrap_err();
        assert!(matches!(err, ConfigError::TooManyRules(1)));
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn push_rejects_negative_threshold() {
        let mut rules = RuleSet::default();
        let rule = ActionRule::new(2, ActionKind::OnHoldThreshold, "a").with_threshold(-1.0);

        assert!(matches!(rules.push(rule), Err(ConfigError::NegativeThreshold(_))));
        assert!(rules.is_empty());
    }

    #[test]
    fn action_kind_tokens() {
        assert_eq!(ActionKind::from_token("TIMED_FIRE"), Some(ActionKind::OnHoldElapsedAutoFire));
        assert_eq!(ActionKind::from_token("timed"), None);
        assert_eq!(ActionKind::OnHoldThreshold.to_string(), "TIMED");
    }
}
