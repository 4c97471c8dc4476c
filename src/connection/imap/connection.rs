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

//! IMAP connection module.
//!
//! This module contains the [`Connection`] implementation built on
//! top of the `imap` crate.

use imap::{
    extensions::idle::{SetReadTimeout, WaitOutcome},
    types::UnsolicitedResponse,
};
use imap_proto::NameAttribute;
use log::{debug, log_enabled, trace, Level};
use native_tls::{TlsConnector, TlsStream};
use std::{
    io::{self, Read, Write},
    net::TcpStream,
    result,
    time::Duration,
};
use thiserror::Error;

use crate::{
    connection::{
        self,
        imap::{response, ImapConfig},
        Connection, FetchAttribute, IdleEvent, MailboxInfo, StoreAction,
    },
    Attributes, IdleDone, SearchCriteria, Uid,
};

/// Represents the time left to the done signal to be raised once an
/// event has been received.
const IDLE_EVENT_GRACE: Duration = Duration::from_secs(1);

/// Represents the shortest IDLE command sent to the server. A zero
/// read timeout is rejected by the socket.
const MIN_IDLE_SLICE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot create tls connector")]
    CreateTlsConnectorError(#[source] native_tls::Error),
    #[error("cannot connect to imap server")]
    ConnectImapServerError(#[source] imap::Error),
    #[error("cannot login to imap server")]
    LoginImapServerError(#[source] imap::Error),
    #[error("cannot select mailbox {1}")]
    SelectMailboxError(#[source] imap::Error, String),
    #[error("cannot list mailboxes")]
    ListMailboxesError(#[source] imap::Error),
    #[error("cannot create mailbox {1}")]
    CreateMailboxError(#[source] imap::Error, String),
    #[error("cannot delete mailbox {1}")]
    DeleteMailboxError(#[source] imap::Error, String),
    #[error("cannot search messages with query {1}")]
    SearchEmailsError(#[source] imap::Error, String),
    #[error("cannot fetch messages {1}")]
    FetchEmailsError(#[source] imap::Error, String),
    #[error("cannot store {1} on message {2}")]
    StoreError(#[source] imap::Error, String, Uid),
    #[error("cannot expunge mailbox")]
    ExpungeError(#[source] imap::Error),
    #[error("cannot start the idle mode")]
    StartIdleModeError(#[source] imap::Error),
    #[error("cannot logout from imap server")]
    LogoutError(#[source] imap::Error),
    #[error("cannot parse imap response: {0}")]
    ParseResponseError(String),
    #[error("cannot decode envelope of message {1}")]
    DecodeEnvelopeError(#[source] rfc2047_decoder::Error, u32),
}

pub type Result<T> = result::Result<T, Error>;

pub enum ImapSessionStream {
    Tls(TlsStream<TcpStream>),
    Tcp(TcpStream),
}

impl SetReadTimeout for ImapSessionStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> imap::Result<()> {
        match self {
            Self::Tls(stream) => stream.set_read_timeout(timeout),
            Self::Tcp(stream) => stream.set_read_timeout(timeout),
        }
    }
}

impl Read for ImapSessionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tls(stream) => stream.read(buf),
            Self::Tcp(stream) => stream.read(buf),
        }
    }
}

impl Write for ImapSessionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tls(stream) => stream.write(buf),
            Self::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tls(stream) => stream.flush(),
            Self::Tcp(stream) => stream.flush(),
        }
    }
}

pub type ImapSession = imap::Session<ImapSessionStream>;

/// Represents the connection to an IMAP server.
pub struct ImapConnection {
    session: ImapSession,
    idle_poll_interval: Duration,
}

impl ImapConnection {
    /// Connects and logs in to the IMAP server.
    pub fn connect(config: &ImapConfig) -> Result<Self> {
        let builder = TlsConnector::builder()
            .danger_accept_invalid_certs(config.insecure())
            .danger_accept_invalid_hostnames(config.insecure())
            .build()
            .map_err(Error::CreateTlsConnectorError)?;

        let mut client_builder = imap::ClientBuilder::new(&config.host, config.port);
        if config.starttls() {
            client_builder.starttls();
        }

        debug!("connecting to {}:{}", config.host, config.port);
        let client = if config.ssl() {
            client_builder.connect(|domain, tcp| {
                let connector = TlsConnector::connect(&builder, domain, tcp)?;
                Ok(ImapSessionStream::Tls(connector))
            })
        } else {
            client_builder.connect(|_, tcp| Ok(ImapSessionStream::Tcp(tcp)))
        }
        .map_err(Error::ConnectImapServerError)?;

        let login = config.login();
        debug!("logging in as {}", login);
        let mut session = client
            .login(&login, &config.passwd)
            .map_err(|res| Error::LoginImapServerError(res.0))?;
        session.debug = log_enabled!(Level::Trace);

        Ok(Self {
            session,
            idle_poll_interval: config.idle_poll_interval(),
        })
    }

    fn uid_set(uids: &[Uid]) -> String {
        uids.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn name_attribute(attr: &NameAttribute) -> String {
    match attr {
        NameAttribute::NoInferiors => "\\Noinferiors".into(),
        NameAttribute::NoSelect => "\\Noselect".into(),
        NameAttribute::Marked => "\\Marked".into(),
        NameAttribute::Unmarked => "\\Unmarked".into(),
        NameAttribute::All => "\\All".into(),
        NameAttribute::Archive => "\\Archive".into(),
        NameAttribute::Drafts => "\\Drafts".into(),
        NameAttribute::Flagged => "\\Flagged".into(),
        NameAttribute::Junk => "\\Junk".into(),
        NameAttribute::Sent => "\\Sent".into(),
        NameAttribute::Trash => "\\Trash".into(),
        NameAttribute::Extension(attr) if attr.starts_with('\\') => attr.to_string(),
        NameAttribute::Extension(attr) => format!("\\{}", attr),
        attr => format!("{:?}", attr),
    }
}

impl Connection for ImapConnection {
    fn select(&mut self, mailbox: &str) -> connection::Result<()> {
        self.session
            .select(mailbox)
            .map_err(|err| Error::SelectMailboxError(err, mailbox.to_owned()))?;
        Ok(())
    }

    fn list(&mut self) -> connection::Result<Vec<MailboxInfo>> {
        let names = self
            .session
            .list(Some(""), Some("*"))
            .map_err(Error::ListMailboxesError)?;
        let mailboxes: Vec<MailboxInfo> = names
            .iter()
            .map(|name| MailboxInfo {
                name: name.name().to_owned(),
                delimiter: name.delimiter().map(ToOwned::to_owned),
                attributes: name.attributes().iter().map(name_attribute).collect(),
            })
            .collect();
        trace!("imap mailboxes: {:?}", mailboxes);
        Ok(mailboxes)
    }

    fn create(&mut self, mailbox: &str) -> connection::Result<()> {
        self.session
            .create(mailbox)
            .map_err(|err| Error::CreateMailboxError(err, mailbox.to_owned()))?;
        Ok(())
    }

    fn delete(&mut self, mailbox: &str) -> connection::Result<()> {
        self.session
            .delete(mailbox)
            .map_err(|err| Error::DeleteMailboxError(err, mailbox.to_owned()))?;
        Ok(())
    }

    fn uid_search(&mut self, criteria: &SearchCriteria) -> connection::Result<Vec<Uid>> {
        let query = criteria.to_imap_query();
        let data = self
            .session
            .run_command_and_read_response(format!("UID SEARCH {}", query))
            .map_err(|err| Error::SearchEmailsError(err, query.clone()))?;
        Ok(response::parse_search(&data)?)
    }

    fn uid_fetch(
        &mut self,
        uids: &[Uid],
        attrs: &[FetchAttribute],
    ) -> connection::Result<Vec<Attributes>> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }

        let uid_set = Self::uid_set(uids);
        let query = FetchAttribute::to_imap_query(attrs);
        let data = self
            .session
            .run_command_and_read_response(format!("UID FETCH {} {}", uid_set, query))
            .map_err(|err| Error::FetchEmailsError(err, uid_set.clone()))?;
        Ok(response::parse_fetches(&data)?)
    }

    fn uid_store(&mut self, uid: Uid, action: &StoreAction) -> connection::Result<()> {
        let query = action.to_imap_query();
        self.session
            .uid_store(uid.to_string(), &query)
            .map_err(|err| Error::StoreError(err, query.clone(), uid))?;
        Ok(())
    }

    fn expunge(&mut self) -> connection::Result<()> {
        self.session.expunge().map_err(Error::ExpungeError)?;
        Ok(())
    }

    fn idle(
        &mut self,
        done: &IdleDone,
        on_event: &mut dyn FnMut(IdleEvent),
    ) -> connection::Result<()> {
        loop {
            let slice = done
                .remaining()
                .map_or(self.idle_poll_interval, |remaining| {
                    remaining.min(self.idle_poll_interval)
                })
                .max(MIN_IDLE_SLICE);
            trace!("idling for {:?}", slice);

            let outcome = self
                .session
                .idle()
                .timeout(slice)
                .keepalive(false)
                .wait_while(|response| {
                    let event = match response {
                        UnsolicitedResponse::Exists(count) => IdleEvent::Exists(count),
                        UnsolicitedResponse::Expunge(seq) => IdleEvent::Expunge(seq),
                        UnsolicitedResponse::Recent(count) => IdleEvent::Recent(count),
                        response => {
                            trace!("skipping idle response {:?}", response);
                            return true;
                        }
                    };
                    on_event(event);
                    done.wait_timeout(IDLE_EVENT_GRACE);
                    !done.is_done()
                })
                .map_err(Error::StartIdleModeError)?;

            match outcome {
                WaitOutcome::TimedOut => trace!("idle command timed out"),
                WaitOutcome::MailboxChanged => trace!("idle command stopped on mailbox change"),
            }

            if done.is_done() {
                break;
            }
        }

        Ok(())
    }

    fn logout(&mut self) -> connection::Result<()> {
        self.session.logout().map_err(Error::LogoutError)?;
        Ok(())
    }
}
