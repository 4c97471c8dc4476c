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

//! Connection module.
//!
//! This module contains the [`Connection`] trait, the transport
//! boundary the client talks to. A connection executes one command
//! at a time on the currently selected mailbox.

use log::warn;
use std::{fmt, result};
use thiserror::Error;
use utf7_imap::{decode_utf7_imap as decode_utf7, encode_utf7_imap as encode_utf7};

use crate::{Attributes, Flag, IdleDone, SearchCriteria, Uid};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot complete idle session: done signal not raised")]
    IdleNotCompletedError,
    #[error("cannot execute command {0}")]
    CommandError(String),

    #[cfg(feature = "imap-backend")]
    #[error(transparent)]
    ImapConnectionError(#[from] crate::connection::imap::Error),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents a mailbox returned by the LIST command.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MailboxInfo {
    /// Represents the UTF-7 encoded mailbox name.
    pub name: String,
    pub delimiter: Option<String>,
    /// Represents the LIST attributes (`\HasNoChildren`, `\All`…).
    pub attributes: Vec<String>,
}

/// Represents the message attributes a fetch can request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchAttribute {
    Uid,
    Envelope,
    /// Full raw message, fetched without setting the `\Seen` flag.
    BodyPeek,
    Flags,
    GmailLabels,
    GmailMessageId,
    GmailThreadId,
}

impl FetchAttribute {
    pub fn to_imap(&self) -> &'static str {
        match self {
            Self::Uid => "UID",
            Self::Envelope => "ENVELOPE",
            Self::BodyPeek => "BODY.PEEK[]",
            Self::Flags => "FLAGS",
            Self::GmailLabels => "X-GM-LABELS",
            Self::GmailMessageId => "X-GM-MSGID",
            Self::GmailThreadId => "X-GM-THRID",
        }
    }

    /// Builds the parenthesized fetch query of the given attributes.
    pub fn to_imap_query(attrs: &[FetchAttribute]) -> String {
        let attrs: Vec<&str> = attrs.iter().map(FetchAttribute::to_imap).collect();
        format!("({})", attrs.join(" "))
    }
}

/// Represents the attribute set fetched for every message, whether
/// it is fetched lazily or in batch.
pub const PREFETCH_ATTRIBUTES: [FetchAttribute; 7] = [
    FetchAttribute::Uid,
    FetchAttribute::Envelope,
    FetchAttribute::BodyPeek,
    FetchAttribute::Flags,
    FetchAttribute::GmailLabels,
    FetchAttribute::GmailMessageId,
    FetchAttribute::GmailThreadId,
];

/// Represents a UID STORE modification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreAction {
    AddFlags(Vec<Flag>),
    RemoveFlags(Vec<Flag>),
    /// Adds labels, given by their UTF-7 encoded IMAP representation.
    AddLabels(Vec<String>),
    RemoveLabels(Vec<String>),
}

impl StoreAction {
    /// Builds the STORE query, for example `+FLAGS (\Seen)` or
    /// `-X-GM-LABELS ("\\Inbox")`.
    pub fn to_imap_query(&self) -> String {
        let flags = |flags: &[Flag]| {
            flags
                .iter()
                .map(Flag::to_imap)
                .collect::<Vec<_>>()
                .join(" ")
        };
        let labels = |labels: &[String]| {
            labels
                .iter()
                .map(|label| quote(label))
                .collect::<Vec<_>>()
                .join(" ")
        };

        match self {
            Self::AddFlags(f) => format!("+FLAGS ({})", flags(f)),
            Self::RemoveFlags(f) => format!("-FLAGS ({})", flags(f)),
            Self::AddLabels(l) => format!("+X-GM-LABELS ({})", labels(l)),
            Self::RemoveLabels(l) => format!("-X-GM-LABELS ({})", labels(l)),
        }
    }
}

impl fmt::Display for StoreAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_imap_query())
    }
}

/// Represents a server push received while idling.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdleEvent {
    /// New message count of the mailbox.
    Exists(u32),
    /// Sequence number of an expunged message.
    Expunge(u32),
    Recent(u32),
}

/// Represents the transport the client runs commands on.
///
/// Mailbox names given to and returned by a connection are UTF-7
/// encoded. Every command but [`Connection::select`],
/// [`Connection::list`], [`Connection::create`],
/// [`Connection::delete`] and [`Connection::logout`] runs on the
/// currently selected mailbox.
pub trait Connection: Send {
    fn select(&mut self, mailbox: &str) -> Result<()>;
    fn list(&mut self) -> Result<Vec<MailboxInfo>>;
    fn create(&mut self, mailbox: &str) -> Result<()>;
    fn delete(&mut self, mailbox: &str) -> Result<()>;

    /// Runs a UID SEARCH. UIDs are returned in server order.
    fn uid_search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>>;

    /// Runs one UID FETCH for the given UIDs.
    fn uid_fetch(&mut self, uids: &[Uid], attrs: &[FetchAttribute]) -> Result<Vec<Attributes>>;

    fn uid_store(&mut self, uid: Uid, action: &StoreAction) -> Result<()>;
    fn expunge(&mut self) -> Result<()>;

    /// Idles on the selected mailbox, passing every server push to
    /// `on_event`, until `done` is raised or its deadline is reached.
    /// At least one IDLE command is issued, even when `done` is
    /// already over. Returns [`Error::IdleNotCompletedError`] when
    /// the session ended before that.
    fn idle(&mut self, done: &IdleDone, on_event: &mut dyn FnMut(IdleEvent)) -> Result<()>;

    fn logout(&mut self) -> Result<()>;
}

/// Encodes a mailbox or label name with the modified UTF-7 of
/// RFC 3501.
pub fn encode_name(name: &str) -> String {
    encode_utf7(name.to_owned())
}

/// Decodes a modified UTF-7 mailbox or label name, as received
/// from the server. Names holding an invalid shift sequence are
/// returned unchanged.
pub fn decode_name(name: &str) -> String {
    if is_modified_utf7(name) {
        decode_utf7(name.to_owned())
    } else {
        warn!("invalid modified utf-7 name {}, keeping it as is", name);
        name.to_owned()
    }
}

const MODIFIED_BASE64: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+,";

/// Checks that every `&...-` shift sequence of the name holds
/// canonical modified base64.
fn is_modified_utf7(name: &str) -> bool {
    let mut rest = name;

    while let Some(start) = rest.find('&') {
        let shifted = &rest[start + 1..];
        let end = match shifted.find('-') {
            Some(end) => end,
            None => return true,
        };
        if !is_modified_base64(&shifted[..end]) {
            return false;
        }
        rest = &shifted[end + 1..];
    }

    true
}

fn is_modified_base64(input: &str) -> bool {
    let sextets: Option<Vec<u8>> = input
        .bytes()
        .map(|byte| MODIFIED_BASE64.iter().position(|&c| c == byte))
        .map(|pos| pos.map(|pos| pos as u8))
        .collect();

    let sextets = match sextets {
        Some(sextets) => sextets,
        None => return false,
    };

    // unused trailing bits must be zero
    match (sextets.len() % 4, sextets.last()) {
        (_, None) => true,
        (1, _) => false,
        (2, Some(last)) => last & 0x0f == 0,
        (3, Some(last)) => last & 0x03 == 0,
        _ => true,
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
