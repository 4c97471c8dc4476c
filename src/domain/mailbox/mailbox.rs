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

//! Mailbox module.
//!
//! This module contains the representation of a Gmail mailbox and
//! its query engine.

use log::{debug, trace};
use std::fmt;

use crate::{
    connection::{encode_name, Connection, PREFETCH_ATTRIBUTES},
    client::{Error, Result},
    Attributes, Gmail, Message, SearchAlias, SearchCriteria, SearchFilter, Uid, Watch,
};

/// Represents the maximum amount of UIDs fetched by one command.
pub const FETCH_CHUNK_SIZE: usize = 100;

/// Represents a mailbox of the client.
///
/// The mailbox is a lightweight handle: it only holds its name and
/// a reference to the client. Selecting the mailbox on the
/// connection happens lazily, before each command.
pub struct Mailbox<'a, C: Connection> {
    gmail: &'a Gmail<C>,
    name: String,
    encoded_name: String,
}

impl<'a, C: Connection> Clone for Mailbox<'a, C> {
    fn clone(&self) -> Self {
        Self {
            gmail: self.gmail,
            name: self.name.clone(),
            encoded_name: self.encoded_name.clone(),
        }
    }
}

impl<'a, C: Connection> Mailbox<'a, C> {
    /// Builds a mailbox from its decoded name (`Envoyés`). The name
    /// sent to the server is encoded in modified UTF-7.
    pub fn new(gmail: &'a Gmail<C>, name: &str) -> Self {
        Self {
            gmail,
            name: name.to_owned(),
            encoded_name: encode_name(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encoded_name(&self) -> &str {
        &self.encoded_name
    }

    pub fn gmail(&self) -> &'a Gmail<C> {
        self.gmail
    }

    /// Runs `f` on the connection, this mailbox being selected.
    pub fn with_selected<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut C) -> crate::connection::Result<T>,
    {
        self.gmail.with_mailbox(&self.encoded_name, f)
    }

    /// Searches the UIDs matching the given alias and filters, in
    /// server order.
    pub fn resolve_uids(&self, alias: SearchAlias, filter: &SearchFilter) -> Result<Vec<Uid>> {
        let criteria = SearchCriteria::build(alias, filter);
        debug!("searching {} with {}", self.name, criteria);

        let uids = self.with_selected(|conn| conn.uid_search(&criteria))?;
        debug!("found {} message(s) in {}", uids.len(), self.name);
        trace!("uids: {:?}", uids);

        Ok(uids)
    }

    /// Searches the messages matching the given alias and filters.
    /// Messages are not fetched.
    pub fn search(&self, alias: SearchAlias, filter: &SearchFilter) -> Result<Vec<Message<'a, C>>> {
        Ok(self
            .resolve_uids(alias, filter)?
            .into_iter()
            .map(|uid| Message::from_uid(self.clone(), uid))
            .collect())
    }

    /// Searches the messages matching the given alias and filters,
    /// then fetches them by chunks of [`FETCH_CHUNK_SIZE`].
    pub fn search_batched(
        &self,
        alias: SearchAlias,
        filter: &SearchFilter,
    ) -> Result<Vec<Message<'a, C>>> {
        let uids = self.resolve_uids(alias, filter)?;
        let mut messages = Vec::with_capacity(uids.len());

        for chunk in uids.chunks(FETCH_CHUNK_SIZE) {
            debug!("fetching {} message(s) from {}", chunk.len(), self.name);
            let fetches = self.with_selected(|conn| conn.uid_fetch(chunk, &PREFETCH_ATTRIBUTES))?;
            for attributes in fetches {
                messages.push(Message::from_attributes(self.clone(), attributes)?);
            }
        }

        Ok(messages)
    }

    /// Counts the messages matching the given alias and filters,
    /// without fetching them.
    pub fn count(&self, alias: SearchAlias, filter: &SearchFilter) -> Result<usize> {
        Ok(self.search(alias, filter)?.len())
    }

    /// Permanently removes the messages flagged as deleted.
    pub fn expunge(&self) -> Result<()> {
        debug!("expunging {}", self.name);
        self.with_selected(|conn| conn.expunge())
    }

    pub fn watch(&self) -> Watch<'a, C> {
        Watch::new(self.clone())
    }

    pub(crate) fn fetch_one(&self, uid: Uid) -> Result<Attributes> {
        debug!("fetching message {} from {}", uid, self.name);
        self.with_selected(|conn| conn.uid_fetch(&[uid], &PREFETCH_ATTRIBUTES))?
            .into_iter()
            .find(|attributes| attributes.uid.map_or(true, |fetched| fetched == uid))
            .ok_or_else(|| Error::MissingAttributeError("UID", uid.to_string()))
    }
}

impl<'a, C: Connection> fmt::Debug for Mailbox<'a, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox").field("name", &self.name).finish()
    }
}

impl<'a, C: Connection> fmt::Display for Mailbox<'a, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
