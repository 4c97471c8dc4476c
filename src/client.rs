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

//! Gmail client module.
//!
//! This module contains the [`Gmail`] client, owner of the one
//! connection every mailbox and message of the client share.

use log::{debug, trace, warn};
use std::{
    collections::HashMap,
    io, result,
    sync::{Mutex, MutexGuard},
};
use thiserror::Error;

use crate::{
    connection::{self, decode_name, Connection},
    search, LabelManager, Mailbox, Message, SearchAlias, SearchFilter, SpecialUse, Uid,
};
#[cfg(feature = "imap-backend")]
use crate::{ImapConfig, ImapConnection};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot lock gmail session: {0}")]
    LockSessionError(String),
    #[error("cannot find email with gmail message id {0}")]
    EmailNotFoundError(u64),
    #[error("cannot find label {0}")]
    NoLabelError(String),
    #[error("cannot get attribute {0} of message {1}")]
    MissingAttributeError(&'static str, String),
    #[error("cannot parse raw message {1}")]
    ParseRawMessageError(#[source] mailparse::MailParseError, Uid),
    #[error("cannot spawn idle timer thread")]
    SpawnIdleTimerError(#[source] io::Error),
    #[error("cannot join idle timer thread")]
    JoinIdleTimerError,

    #[error(transparent)]
    ConnectionError(#[from] connection::Error),
    #[error(transparent)]
    SearchError(#[from] search::Error),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the state attached to the connection: the mailbox
/// currently selected and the localized special-use mailbox names.
pub struct Session<C: Connection> {
    conn: C,
    selected: Option<String>,
    localized: HashMap<SpecialUse, String>,
    listed: bool,
}

impl<C: Connection> Session<C> {
    fn new(conn: C) -> Self {
        Self {
            conn,
            selected: None,
            localized: HashMap::default(),
            listed: false,
        }
    }

    pub fn connection(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Returns the UTF-7 encoded name of the selected mailbox, if
    /// known.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Selects the given UTF-7 encoded mailbox, unless it is already
    /// selected. After a failed selection the selected mailbox is
    /// unknown, so the next call selects again.
    pub fn select(&mut self, mailbox: &str) -> connection::Result<()> {
        if self.selected.as_deref() == Some(mailbox) {
            trace!("mailbox {} already selected", mailbox);
            return Ok(());
        }

        debug!("selecting mailbox {}", mailbox);
        self.selected = None;
        self.conn.select(mailbox)?;
        self.selected = Some(mailbox.to_owned());

        Ok(())
    }

    /// Forgets the selected mailbox if it matches the given one.
    pub fn deselect(&mut self, mailbox: &str) {
        if self.selected.as_deref() == Some(mailbox) {
            self.selected = None;
        }
    }

    /// Finds the name of a special-use mailbox through the LIST
    /// attributes, falling back to the default Gmail name. Names are
    /// listed once, then cached.
    pub fn localize(&mut self, special_use: SpecialUse) -> connection::Result<String> {
        if let Some(name) = self.localized.get(&special_use) {
            return Ok(name.clone());
        }

        if !self.listed {
            debug!("localizing special-use mailboxes");
            for mailbox in self.conn.list()? {
                for attr in &mailbox.attributes {
                    if let Some(special_use) = SpecialUse::from_attribute(attr) {
                        self.localized
                            .entry(special_use)
                            .or_insert_with(|| decode_name(&mailbox.name));
                    }
                }
            }
            self.listed = true;
        }

        let name = self
            .localized
            .entry(special_use)
            .or_insert_with(|| {
                warn!("cannot find mailbox {}, using default name", special_use);
                special_use.default_name().to_owned()
            })
            .clone();
        trace!("localized {}: {}", special_use, name);

        Ok(name)
    }
}

/// Represents the Gmail client.
///
/// The client owns the connection behind a mutex: mailboxes and
/// messages borrow the client and run their commands through
/// [`Gmail::with_mailbox`].
pub struct Gmail<C: Connection> {
    session: Mutex<Session<C>>,
}

impl<C: Connection> Gmail<C> {
    pub fn new(conn: C) -> Self {
        Self {
            session: Mutex::new(Session::new(conn)),
        }
    }

    pub fn session(&self) -> Result<MutexGuard<'_, Session<C>>> {
        self.session
            .lock()
            .map_err(|err| Error::LockSessionError(err.to_string()))
    }

    /// Selects the given UTF-7 encoded mailbox if needed, then runs
    /// `f` on the connection. The connection stays locked until `f`
    /// returns.
    pub fn with_mailbox<T, F>(&self, mailbox: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut C) -> connection::Result<T>,
    {
        let mut session = self.session()?;
        session.select(mailbox)?;
        Ok(f(session.connection())?)
    }

    pub fn mailbox(&self, name: &str) -> Mailbox<'_, C> {
        Mailbox::new(self, name)
    }

    pub fn inbox(&self) -> Mailbox<'_, C> {
        self.mailbox(SpecialUse::Inbox.default_name())
    }

    /// Gets the special-use mailbox, whatever its localized name is.
    pub fn special_mailbox(&self, special_use: SpecialUse) -> Result<Mailbox<'_, C>> {
        let name = self.session()?.localize(special_use)?;
        Ok(self.mailbox(&name))
    }

    pub fn labels(&self) -> LabelManager<'_, C> {
        LabelManager::new(self)
    }

    /// Finds a message by its Gmail message identifier, in the All
    /// Mail mailbox.
    pub fn find(&self, message_id: u64) -> Result<Message<'_, C>> {
        debug!("finding message with gmail id {}", message_id);
        let filter = SearchFilter::default().message_id(message_id);
        self.special_mailbox(SpecialUse::All)?
            .search(SearchAlias::All, &filter)?
            .into_iter()
            .next()
            .ok_or(Error::EmailNotFoundError(message_id))
    }

    pub fn logout(&self) -> Result<()> {
        let mut session = self.session()?;
        debug!("logging out");
        session.selected = None;
        session.conn.logout()?;
        Ok(())
    }
}

#[cfg(feature = "imap-backend")]
impl Gmail<ImapConnection> {
    /// Connects and logs in to the IMAP server of the given config.
    pub fn connect(config: &ImapConfig) -> Result<Self> {
        let conn = ImapConnection::connect(config).map_err(connection::Error::from)?;
        Ok(Self::new(conn))
    }
}
