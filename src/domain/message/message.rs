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

//! Message module.
//!
//! This module contains the representation of a Gmail message. A
//! message is identified by its UID inside its mailbox, its other
//! attributes are fetched lazily and cached until the next mutation.

use log::debug;
use mailparse::ParsedMail;
use std::fmt;

use crate::{
    client::{Error, Result},
    connection::{encode_name, Connection, StoreAction},
    AttributeCache, Attributes, Envelope, EnvelopeField, Flag, Flags, Label, Labels, Mailbox, Uid,
};

/// Represents the marks applicable to a message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Mark {
    Read,
    Unread,
    Deleted,
    Spam,
    Flag(Flag),
}

impl From<&str> for Mark {
    fn from(mark: &str) -> Self {
        match mark {
            "read" => Self::Read,
            "unread" => Self::Unread,
            "deleted" => Self::Deleted,
            "spam" => Self::Spam,
            flag => Self::Flag(flag.into()),
        }
    }
}

impl From<Flag> for Mark {
    fn from(flag: Flag) -> Self {
        Self::Flag(flag)
    }
}

/// Represents the value of a message field, found either in the
/// envelope or in the headers of the raw message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Field {
    Envelope(EnvelopeField),
    Header(String),
}

pub struct Message<'a, C: Connection> {
    mailbox: Mailbox<'a, C>,
    uid: Uid,
    cache: AttributeCache,
}

impl<'a, C: Connection> Message<'a, C> {
    /// Builds an unfetched message.
    pub fn from_uid(mailbox: Mailbox<'a, C>, uid: Uid) -> Self {
        Self {
            mailbox,
            uid,
            cache: AttributeCache::new(),
        }
    }

    /// Builds a message from already fetched attributes.
    pub fn from_attributes(mailbox: Mailbox<'a, C>, attributes: Attributes) -> Result<Self> {
        let uid = attributes
            .uid
            .ok_or_else(|| Error::MissingAttributeError("UID", mailbox.name().to_owned()))?;

        Ok(Self {
            mailbox,
            uid,
            cache: AttributeCache::with(attributes),
        })
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn mailbox(&self) -> &Mailbox<'a, C> {
        &self.mailbox
    }

    pub fn is_fetched(&self) -> bool {
        self.cache.is_fetched()
    }

    /// Returns the message attributes, fetching them first if they
    /// are not cached.
    pub fn attributes(&mut self) -> Result<&Attributes> {
        let (mailbox, uid) = (&self.mailbox, self.uid);
        self.cache.get_or_try_fetch(|| mailbox.fetch_one(uid))
    }

    /// Returns the Gmail message identifier, stable across
    /// mailboxes.
    pub fn message_id(&mut self) -> Result<u64> {
        let uid = self.uid;
        self.attributes()?
            .message_id
            .ok_or_else(|| Error::MissingAttributeError("X-GM-MSGID", uid.to_string()))
    }

    /// Returns the Gmail thread identifier.
    pub fn thread_id(&mut self) -> Result<u64> {
        let uid = self.uid;
        self.attributes()?
            .thread_id
            .ok_or_else(|| Error::MissingAttributeError("X-GM-THRID", uid.to_string()))
    }

    pub fn envelope(&mut self) -> Result<&Envelope> {
        let uid = self.uid;
        self.attributes()?
            .envelope
            .as_ref()
            .ok_or_else(|| Error::MissingAttributeError("ENVELOPE", uid.to_string()))
    }

    pub fn raw_body(&mut self) -> Result<&[u8]> {
        let uid = self.uid;
        self.attributes()?
            .body
            .as_deref()
            .ok_or_else(|| Error::MissingAttributeError("BODY[]", uid.to_string()))
    }

    /// Parses the raw message.
    pub fn raw_message(&mut self) -> Result<ParsedMail<'_>> {
        let uid = self.uid;
        mailparse::parse_mail(self.raw_body()?).map_err(|err| Error::ParseRawMessageError(err, uid))
    }

    pub fn flags(&mut self) -> Result<&Flags> {
        let uid = self.uid;
        self.attributes()?
            .flags
            .as_ref()
            .ok_or_else(|| Error::MissingAttributeError("FLAGS", uid.to_string()))
    }

    /// Returns the labels of the message. The label of the mailbox
    /// the message was fetched from is never part of them.
    pub fn labels(&mut self) -> Result<&Labels> {
        let uid = self.uid;
        self.attributes()?
            .labels
            .as_ref()
            .ok_or_else(|| Error::MissingAttributeError("X-GM-LABELS", uid.to_string()))
    }

    pub fn is_read(&mut self) -> Result<bool> {
        Ok(self.flags()?.contains(&Flag::Seen))
    }

    pub fn is_starred(&mut self) -> Result<bool> {
        Ok(self.flags()?.contains(&Flag::Flagged))
    }

    /// Looks a field up, first in the envelope, then in the headers
    /// of the raw message.
    pub fn field(&mut self, name: &str) -> Result<Option<Field>> {
        if let Some(field) = self.envelope()?.field(name) {
            return Ok(Some(Field::Envelope(field)));
        }

        let header = {
            use mailparse::MailHeaderMap;
            self.raw_message()?.headers.get_first_value(name)
        };

        Ok(header.map(Field::Header))
    }

    pub fn flag(&mut self, flag: Flag) -> Result<()> {
        self.store(StoreAction::AddFlags(vec![flag]))
    }

    pub fn unflag(&mut self, flag: Flag) -> Result<()> {
        self.store(StoreAction::RemoveFlags(vec![flag]))
    }

    /// Adds a label, given by its IMAP representation (`\Inbox`,
    /// `Work`…).
    pub fn add_label<L: Into<Label>>(&mut self, label: L) -> Result<()> {
        let label = encode_name(&label.into().to_imap());
        self.store(StoreAction::AddLabels(vec![label]))
    }

    pub fn remove_label<L: Into<Label>>(&mut self, label: L) -> Result<()> {
        let label = encode_name(&label.into().to_imap());
        self.store(StoreAction::RemoveLabels(vec![label]))
    }

    pub fn mark_read(&mut self) -> Result<()> {
        self.flag(Flag::Seen)
    }

    pub fn mark_unread(&mut self) -> Result<()> {
        self.unflag(Flag::Seen)
    }

    pub fn star(&mut self) -> Result<()> {
        self.flag(Flag::Flagged)
    }

    pub fn unstar(&mut self) -> Result<()> {
        self.unflag(Flag::Flagged)
    }

    pub fn spam(&mut self) -> Result<()> {
        self.add_label(Label::spam())
    }

    /// Moves the message to the trash.
    pub fn delete(&mut self) -> Result<()> {
        self.add_label(Label::trash())
    }

    pub fn mark<M: Into<Mark>>(&mut self, mark: M) -> Result<()> {
        match mark.into() {
            Mark::Read => self.mark_read(),
            Mark::Unread => self.mark_unread(),
            Mark::Deleted => self.delete(),
            Mark::Spam => self.spam(),
            Mark::Flag(flag) => self.flag(flag),
        }
    }

    /// Removes the message from the inbox. Gmail hides the label of
    /// the selected mailbox, so the message is located in All Mail
    /// first.
    pub fn archive(&mut self) -> Result<()> {
        let message_id = self.message_id()?;
        debug!("archiving message {}", message_id);
        self.mailbox
            .gmail()
            .find(message_id)?
            .remove_label(Label::inbox())?;
        self.cache.invalidate();
        Ok(())
    }

    /// Puts the message back in the inbox.
    pub fn unarchive(&mut self) -> Result<()> {
        let message_id = self.message_id()?;
        debug!("unarchiving message {}", message_id);
        self.mailbox
            .gmail()
            .find(message_id)?
            .add_label(Label::inbox())?;
        self.cache.invalidate();
        Ok(())
    }

    pub fn unspam(&mut self) -> Result<()> {
        self.unarchive()
    }

    pub fn undelete(&mut self) -> Result<()> {
        self.unarchive()
    }

    /// Adds the `target` label. When `from` is given, the message is
    /// located in All Mail and the `from` label is removed there.
    pub fn move_to(&mut self, target: &str, from: Option<&str>) -> Result<()> {
        self.add_label(target)?;

        if let Some(from) = from {
            let message_id = self.message_id()?;
            debug!("removing label {} from message {}", from, message_id);
            self.mailbox.gmail().find(message_id)?.remove_label(from)?;
            self.cache.invalidate();
        }

        Ok(())
    }

    fn store(&mut self, action: StoreAction) -> Result<()> {
        let uid = self.uid;
        debug!("storing {} on message {} of {}", action, uid, self.mailbox);
        self.mailbox
            .with_selected(|conn| conn.uid_store(uid, &action))?;
        self.cache.invalidate();
        Ok(())
    }
}

impl<'a, C: Connection> fmt::Debug for Message<'a, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("mailbox", &self.mailbox.name())
            .field("uid", &self.uid)
            .field("fetched", &self.cache.is_fetched())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::Flag;

    use super::Mark;

    #[test]
    fn mark_from_str() {
        assert_eq!(Mark::Read, Mark::from("read"));
        assert_eq!(Mark::Spam, Mark::from("spam"));
        assert_eq!(Mark::Flag(Flag::Flagged), Mark::from("starred"));
        assert_eq!(Mark::Flag(Flag::custom("$Todo")), Mark::from("$Todo"));
    }
}
