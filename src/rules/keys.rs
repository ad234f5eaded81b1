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

//! Symbolic key names.
//!
//! The rule file names keys the way `linux/input-event-codes.h` does
//! (`KEY_POWER`, `BTN_0`, ...). `evdev` carries the full table.

use std::str::FromStr;

use evdev::Key;

/// Resolves a key name to its code. Names are case-sensitive.
pub(crate) fn key_code_from_name(name: &str) -> Option<u16> {
    Key::from_str(name).ok().map(|key| key.code())
}

/// Reverse lookup, used when logging events.
pub(crate) fn key_name(code: u16) -> Option<String> {
    let name = format!("{:?}", Key::new(code));
    Key::from_str(&name).is_ok().then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_enter_match_kernel_codes() {
        assert_eq!(key_code_from_name("KEY_1"), Some(2));
        assert_eq!(key_code_from_name("KEY_0"), Some(11));
        assert_eq!(key_code_from_name("KEY_MINUS"), Some(12));
        assert_eq!(key_code_from_name("KEY_ENTER"), Some(28));
    }

    #[test]
    fn embedded_board_buttons_resolve() {
        assert_eq!(key_code_from_name("KEY_POWER"), Some(116));
        assert_eq!(key_code_from_name("KEY_RESTART"), Some(0x198));
        assert_eq!(key_code_from_name("BTN_1"), Some(0x101));
    }

    #[test]
    fn unknown_or_lowercase_names_are_rejected() {
        assert_eq!(key_code_from_name("KEY_NOPE"), None);
        assert_eq!(key_code_from_name("key_enter"), None);
        assert_eq!(key_code_from_name(""), None);
    }

    #[test]
    fn reverse_lookup() {
        assert_eq!(key_name(116).as_deref(), Some("KEY_POWER"));
        assert_eq!(key_name(999), None);
    }
}
