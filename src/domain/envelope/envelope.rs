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

//! Envelope module.
//!
//! This module contains the representation of the message envelope,
//! as returned by the IMAP `ENVELOPE` fetch attribute.

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use std::fmt;

/// Represents an envelope address. Every part is optional, as IMAP
/// servers send `NIL` for the missing ones (group syntax, broken
/// headers…).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Address {
    pub name: Option<String>,
    pub mailbox: Option<String>,
    pub host: Option<String>,
}

impl Address {
    pub fn new<N, M, H>(name: Option<N>, mailbox: M, host: H) -> Self
    where
        N: ToString,
        M: ToString,
        H: ToString,
    {
        Self {
            name: name.map(|name| name.to_string()),
            mailbox: Some(mailbox.to_string()),
            host: Some(host.to_string()),
        }
    }

    /// Returns the `mailbox@host` address.
    pub fn addr(&self) -> Option<String> {
        match (self.mailbox.as_ref(), self.host.as_ref()) {
            (Some(mailbox), Some(host)) => Some(format!("{}@{}", mailbox, host)),
            (Some(mailbox), None) => Some(mailbox.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.as_ref(), self.addr()) {
            (Some(name), Some(addr)) => write!(f, "{} <{}>", name, addr),
            (None, Some(addr)) => write!(f, "{}", addr),
            (Some(name), None) => write!(f, "{}", name),
            (None, None) => Ok(()),
        }
    }
}

/// Represents the message envelope.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Envelope {
    /// Represents the raw Date header.
    pub date: Option<String>,
    pub subject: Option<String>,
    pub from: Vec<Address>,
    pub sender: Vec<Address>,
    pub reply_to: Vec<Address>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub in_reply_to: Option<String>,
    pub message_id: Option<String>,
}

/// Represents the value of an envelope field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EnvelopeField {
    Text(String),
    Addresses(Vec<Address>),
}

impl Envelope {
    /// Parses the Date header into a local date.
    pub fn parsed_date(&self) -> Option<DateTime<Local>> {
        let timestamp = mailparse::dateparse(self.date.as_ref()?).ok()?;
        Local.timestamp_opt(timestamp, 0).earliest()
    }

    /// Gets an envelope field by name. Names are case insensitive,
    /// and dashes are equivalent to underscores (`Reply-To`,
    /// `reply_to`).
    pub fn field(&self, name: &str) -> Option<EnvelopeField> {
        let text = |value: &Option<String>| value.clone().map(EnvelopeField::Text);
        let addrs = |value: &Vec<Address>| Some(EnvelopeField::Addresses(value.clone()));

        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "date" => text(&self.date),
            "subject" => text(&self.subject),
            "from" => addrs(&self.from),
            "sender" => addrs(&self.sender),
            "reply_to" => addrs(&self.reply_to),
            "to" => addrs(&self.to),
            "cc" => addrs(&self.cc),
            "bcc" => addrs(&self.bcc),
            "in_reply_to" => text(&self.in_reply_to),
            "message_id" => text(&self.message_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Address, Envelope, EnvelopeField};

    #[test]
    fn address_display() {
        let addr = Address::new(Some("Alice"), "alice", "localhost");
        assert_eq!("Alice <alice@localhost>", addr.to_string());

        let addr = Address::new(None::<String>, "bob", "localhost");
        assert_eq!("bob@localhost", addr.to_string());
    }

    #[test]
    fn field() {
        let envelope = Envelope {
            subject: Some("Hello".into()),
            reply_to: vec![Address::new(None::<String>, "r", "localhost")],
            ..Envelope::default()
        };

        assert_eq!(
            Some(EnvelopeField::Text("Hello".into())),
            envelope.field("Subject")
        );
        assert_eq!(
            Some(EnvelopeField::Addresses(vec![Address::new(
                None::<String>,
                "r",
                "localhost"
            )])),
            envelope.field("Reply-To")
        );
        assert_eq!(None, envelope.field("message_id"));
        assert_eq!(None, envelope.field("x-mailer"));
    }

    #[test]
    fn parsed_date() {
        let envelope = Envelope {
            date: Some("Tue, 20 Dec 1988 10:00:00 +0000".into()),
            ..Envelope::default()
        };
        let date = envelope.parsed_date().unwrap();
        assert_eq!(598615200, date.timestamp());
    }
}
