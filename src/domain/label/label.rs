// gmail-lib, a Rust library for Gmail IMAP access.
// Copyright (C) 2022  soywod <clement.douin@posteo.net>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use serde::Serialize;
use std::fmt;

/// Represents a Gmail label, as exposed by the `X-GM-LABELS`
/// extension. Labels are distinct from IMAP flags.
#[derive(Debug, Clone, Eq, Hash, PartialEq, Serialize)]
pub enum Label {
    /// System label, sent by the server with a leading backslash
    /// (`\Inbox`, `\Important`, `\Trash`…). The backslash is not
    /// part of the name.
    System(String),
    /// User defined label.
    Custom(String),
}

impl Label {
    pub fn inbox() -> Self {
        Self::System("Inbox".into())
    }

    pub fn spam() -> Self {
        Self::System("Spam".into())
    }

    pub fn trash() -> Self {
        Self::System("Trash".into())
    }

    pub fn important() -> Self {
        Self::System("Important".into())
    }

    pub fn starred() -> Self {
        Self::System("Starred".into())
    }

    /// Returns the label name without the system backslash.
    pub fn name(&self) -> &str {
        match self {
            Self::System(name) | Self::Custom(name) => name,
        }
    }

    /// Builds the label representation expected by the server.
    pub fn to_imap(&self) -> String {
        self.to_string()
    }
}

impl From<&str> for Label {
    fn from(label: &str) -> Self {
        match label.strip_prefix('\\') {
            Some(name) => Self::System(name.to_owned()),
            None => Self::Custom(label.to_owned()),
        }
    }
}

impl From<String> for Label {
    fn from(label: String) -> Self {
        label.as_str().into()
    }
}

impl From<&String> for Label {
    fn from(label: &String) -> Self {
        label.as_str().into()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System(name) => write!(f, "\\{}", name),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}
