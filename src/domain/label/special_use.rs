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

use std::{convert::TryFrom, fmt};

use crate::search;

/// Represents the special-use mailboxes Gmail exposes through the
/// LIST attributes. Their names depend on the account locale
/// (`[Gmail]/All Mail`, `[Google Mail]/Alle Nachrichten`…), hence
/// the need to localize them.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum SpecialUse {
    Inbox,
    All,
    Drafts,
    Sent,
    Trash,
    Important,
    Junk,
    Flagged,
}

impl SpecialUse {
    /// Returns the LIST attribute identifying the mailbox.
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::Inbox => "\\Inbox",
            Self::All => "\\All",
            Self::Drafts => "\\Drafts",
            Self::Sent => "\\Sent",
            Self::Trash => "\\Trash",
            Self::Important => "\\Important",
            Self::Junk => "\\Junk",
            Self::Flagged => "\\Flagged",
        }
    }

    /// Returns the mailbox name used when the server does not
    /// advertise the attribute.
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::Inbox => "INBOX",
            Self::All => "[Gmail]/All Mail",
            Self::Drafts => "[Gmail]/Drafts",
            Self::Sent => "[Gmail]/Sent Mail",
            Self::Trash => "[Gmail]/Trash",
            Self::Important => "[Gmail]/Important",
            Self::Junk => "[Gmail]/Spam",
            Self::Flagged => "[Gmail]/Starred",
        }
    }

    /// Finds the special use matching the given LIST attribute.
    pub fn from_attribute(attribute: &str) -> Option<Self> {
        [
            Self::Inbox,
            Self::All,
            Self::Drafts,
            Self::Sent,
            Self::Trash,
            Self::Important,
            Self::Junk,
            Self::Flagged,
        ]
        .into_iter()
        .find(|special_use| special_use.attribute().eq_ignore_ascii_case(attribute))
    }
}

impl TryFrom<&str> for SpecialUse {
    type Error = search::Error;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        match name.trim().to_ascii_lowercase().as_str() {
            "inbox" => Ok(Self::Inbox),
            "all" | "all mail" => Ok(Self::All),
            "drafts" => Ok(Self::Drafts),
            "sent" | "sent mail" => Ok(Self::Sent),
            "trash" => Ok(Self::Trash),
            "important" => Ok(Self::Important),
            "junk" | "spam" => Ok(Self::Junk),
            "flagged" | "starred" => Ok(Self::Flagged),
            _ => Err(search::Error::InvalidCriteria(name.to_owned())),
        }
    }
}

impl fmt::Display for SpecialUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.attribute())
    }
}
