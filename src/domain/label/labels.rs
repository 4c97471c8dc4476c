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
use std::{collections::HashSet, fmt, ops};

use crate::Label;

/// Represents the set of labels of a message.
///
/// Gmail never includes the label of the currently selected mailbox
/// in this set: a message fetched from `INBOX` does not carry
/// `\Inbox`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Labels(pub HashSet<Label>);

impl Labels {
    /// Checks if the set contains a label, using its IMAP
    /// representation (`\Inbox`, `Work`…).
    pub fn has<L: Into<Label>>(&self, label: L) -> bool {
        self.contains(&label.into())
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut labels: Vec<String> = self.iter().map(ToString::to_string).collect();
        labels.sort();
        write!(f, "{}", labels.join(", "))
    }
}

impl ops::Deref for Labels {
    type Target = HashSet<Label>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ops::DerefMut for Labels {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<Label> for Labels {
    fn from_iter<T: IntoIterator<Item = Label>>(iter: T) -> Self {
        let mut labels = Labels::default();
        labels.extend(iter);
        labels
    }
}

impl<'a> FromIterator<&'a str> for Labels {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        iter.into_iter().map(Label::from).collect()
    }
}
