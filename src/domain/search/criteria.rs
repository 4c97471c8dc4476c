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

//! Search criteria module.
//!
//! This module turns a search alias and a set of filters into the
//! ordered list of tokens of an IMAP `UID SEARCH` command. Building
//! criteria is pure: nothing here talks to the server, and filter
//! values are not validated (the server rejects malformed ones).

use chrono::NaiveDate;
use std::{borrow::Cow, convert::TryFrom, fmt, result, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid search criteria: {0}")]
    InvalidCriteria(String),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the search aliases. Each alias maps to exactly one
/// IMAP search keyword: `Read` is `Seen` and `Starred` is `Flagged`.
#[derive(Debug, Clone, Copy, Default, Eq, Hash, PartialEq)]
pub enum SearchAlias {
    #[default]
    All,
    Seen,
    Unseen,
    Read,
    Unread,
    Flagged,
    Unflagged,
    Starred,
    Unstarred,
    Deleted,
    Undeleted,
    Draft,
    Undrafted,
}

impl SearchAlias {
    /// Returns the IMAP search keyword of the alias.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Seen | Self::Read => "SEEN",
            Self::Unseen | Self::Unread => "UNSEEN",
            Self::Flagged | Self::Starred => "FLAGGED",
            Self::Unflagged | Self::Unstarred => "UNFLAGGED",
            Self::Deleted => "DELETED",
            Self::Undeleted => "UNDELETED",
            Self::Draft => "DRAFT",
            Self::Undrafted => "UNDRAFT",
        }
    }
}

impl TryFrom<&str> for SearchAlias {
    type Error = Error;

    fn try_from(alias: &str) -> Result<Self> {
        match alias.trim() {
            "all" => Ok(Self::All),
            "seen" => Ok(Self::Seen),
            "unseen" => Ok(Self::Unseen),
            "read" => Ok(Self::Read),
            "unread" => Ok(Self::Unread),
            "flagged" => Ok(Self::Flagged),
            "unflagged" => Ok(Self::Unflagged),
            "starred" => Ok(Self::Starred),
            "unstarred" => Ok(Self::Unstarred),
            "deleted" => Ok(Self::Deleted),
            "undeleted" => Ok(Self::Undeleted),
            "draft" => Ok(Self::Draft),
            "undrafted" => Ok(Self::Undrafted),
            alias => Err(Error::InvalidCriteria(format!("unknown alias {}", alias))),
        }
    }
}

impl FromStr for SearchAlias {
    type Err = Error;

    fn from_str(alias: &str) -> Result<Self> {
        Self::try_from(alias)
    }
}

/// Represents the search filters. Every filter is optional, unset
/// filters do not emit any token.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SearchFilter {
    pub after: Option<NaiveDate>,
    pub before: Option<NaiveDate>,
    pub on: Option<NaiveDate>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub label: Option<String>,
    pub attachment: bool,
    /// Free text search in the body.
    pub search: Option<String>,
    pub body: Option<String>,
    /// UID set, sent verbatim (`1:10`, `4,8`…).
    pub uid: Option<String>,
    /// Raw Gmail search query (`X-GM-RAW`).
    pub gm: Option<String>,
    /// Gmail message identifier (`X-GM-MSGID`).
    pub message_id: Option<u64>,
    /// Raw tokens appended at the end of the query.
    pub query: Vec<String>,
}

impl SearchFilter {
    pub fn after(mut self, date: NaiveDate) -> Self {
        self.after = Some(date);
        self
    }

    pub fn before(mut self, date: NaiveDate) -> Self {
        self.before = Some(date);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.on = Some(date);
        self
    }

    pub fn from<S: ToString>(mut self, from: S) -> Self {
        self.from = Some(from.to_string());
        self
    }

    pub fn to<S: ToString>(mut self, to: S) -> Self {
        self.to = Some(to.to_string());
        self
    }

    pub fn subject<S: ToString>(mut self, subject: S) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn label<S: ToString>(mut self, label: S) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn attachment(mut self, attachment: bool) -> Self {
        self.attachment = attachment;
        self
    }

    pub fn search<S: ToString>(mut self, text: S) -> Self {
        self.search = Some(text.to_string());
        self
    }

    pub fn body<S: ToString>(mut self, text: S) -> Self {
        self.body = Some(text.to_string());
        self
    }

    pub fn uid<S: ToString>(mut self, uid: S) -> Self {
        self.uid = Some(uid.to_string());
        self
    }

    pub fn gm<S: ToString>(mut self, query: S) -> Self {
        self.gm = Some(query.to_string());
        self
    }

    pub fn message_id(mut self, id: u64) -> Self {
        self.message_id = Some(id);
        self
    }

    pub fn query<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.query.extend(tokens.into_iter().map(|token| token.to_string()));
        self
    }
}

/// Represents a search token.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Token {
    /// Search keyword, never quoted.
    Keyword(&'static str),
    /// Caller value, quoted when it is not a plain atom and sent as a
    /// literal when it is not ASCII.
    Value(String),
    /// Raw token, sent verbatim.
    Raw(String),
}

impl Token {
    /// Returns the unquoted content of the token.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Keyword(keyword) => keyword,
            Self::Value(value) | Self::Raw(value) => value,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "{}", keyword),
            Self::Value(value) => write!(f, "{}", to_astring(value)),
            Self::Raw(raw) => write!(f, "{}", raw),
        }
    }
}

/// Represents the ordered list of tokens of a search query.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SearchCriteria(Vec<Token>);

impl SearchCriteria {
    /// Builds the search criteria from the given alias and filters.
    ///
    /// Tokens are emitted in a fixed order: the alias keyword, the
    /// date filters, FROM, TO, SUBJECT, LABEL, HAS attachment, BODY,
    /// UID, X-GM-RAW, X-GM-MSGID and finally the raw query tokens.
    pub fn build(alias: SearchAlias, filter: &SearchFilter) -> Self {
        let mut tokens = vec![Token::Keyword(alias.keyword())];

        let mut push = |keyword: &'static str, value: Token| {
            tokens.push(Token::Keyword(keyword));
            tokens.push(value);
        };

        if let Some(date) = filter.after {
            push("SINCE", Token::Raw(format_date(&date)));
        }
        if let Some(date) = filter.before {
            push("BEFORE", Token::Raw(format_date(&date)));
        }
        if let Some(date) = filter.on {
            push("ON", Token::Raw(format_date(&date)));
        }
        if let Some(ref from) = filter.from {
            push("FROM", Token::Value(from.clone()));
        }
        if let Some(ref to) = filter.to {
            push("TO", Token::Value(to.clone()));
        }
        if let Some(ref subject) = filter.subject {
            push("SUBJECT", Token::Value(subject.clone()));
        }
        if let Some(ref label) = filter.label {
            push("LABEL", Token::Value(label.clone()));
        }
        if filter.attachment {
            push("HAS", Token::Raw("attachment".into()));
        }
        if let Some(ref text) = filter.search {
            push("BODY", Token::Value(text.clone()));
        }
        if let Some(ref text) = filter.body {
            push("BODY", Token::Value(text.clone()));
        }
        if let Some(ref uid) = filter.uid {
            push("UID", Token::Raw(uid.clone()));
        }
        if let Some(ref query) = filter.gm {
            push("X-GM-RAW", Token::Value(query.clone()));
        }
        if let Some(id) = filter.message_id {
            push("X-GM-MSGID", Token::Value(id.to_string()));
        }

        tokens.extend(filter.query.iter().cloned().map(Token::Raw));

        Self(tokens)
    }

    /// Builds the search criteria of the given filters, using the
    /// `all` alias.
    pub fn from_filter(filter: &SearchFilter) -> Self {
        Self::build(SearchAlias::All, filter)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    /// Returns whether a value of the criteria needs the UTF-8
    /// charset.
    pub fn is_utf8(&self) -> bool {
        self.0
            .iter()
            .any(|token| matches!(token, Token::Value(value) if !value.is_ascii()))
    }

    /// Builds the IMAP search query, ready to be sent after `UID
    /// SEARCH`. Non-ASCII values are announced with `CHARSET UTF-8`.
    pub fn to_imap_query(&self) -> String {
        let query = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        if self.is_utf8() {
            format!("CHARSET UTF-8 {}", query)
        } else {
            query
        }
    }
}

impl From<SearchAlias> for SearchCriteria {
    fn from(alias: SearchAlias) -> Self {
        Self::build(alias, &SearchFilter::default())
    }
}

impl From<&SearchFilter> for SearchCriteria {
    fn from(filter: &SearchFilter) -> Self {
        Self::from_filter(filter)
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_imap_query())
    }
}

/// Formats a date the way IMAP search dates are expected
/// (`20-Dec-1988`).
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// Serializes a value as an IMAP astring: atoms are sent as they
/// are, 8-bit or multi-line values as non-synchronizing literals,
/// anything else is quoted.
pub(crate) fn to_astring(value: &str) -> Cow<'_, str> {
    if !value.is_ascii() || value.contains(|c: char| c == '\r' || c == '\n') {
        return Cow::Owned(format!("{{{}+}}\r\n{}", value.len(), value));
    }

    let is_atom = !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_graphic() && !matches!(c, '(' | ')' | '{' | '"' | '\\' | '%' | '*')
        });

    if is_atom {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!(
            "\"{}\"",
            value.replace('\\', "\\\\").replace('"', "\\\"")
        ))
    }
}
