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

//! Watch module.
//!
//! This module contains the blocking change notifier of a mailbox,
//! built on IMAP IDLE. Every IDLE session is bounded by a timer
//! thread, so sessions are renewed before the server drops them.

use log::{debug, trace, warn};
use std::{
    ops::ControlFlow,
    sync::{Arc, Condvar, Mutex, PoisonError},
    thread,
    time::Duration,
};

use crate::{
    client::{Error, Result},
    connection::{self, Connection, IdleDone, IdleEvent},
    Mailbox,
};

/// Represents the default duration of an IDLE session, a bit less
/// than the 30 minutes after which servers may drop idle clients.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(29 * 60);

/// Represents the watch configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WatchConfig {
    /// Represents the maximum duration of one IDLE session.
    pub idle_timeout: Option<Duration>,
}

impl WatchConfig {
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT)
    }
}

/// Represents the completion state shared by the listener and the
/// timer thread of one IDLE session.
#[derive(Default)]
struct Completion {
    complete: Mutex<bool>,
    cvar: Condvar,
}

impl Completion {
    fn complete(&self) {
        *self.complete.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cvar.notify_all();
    }

    /// Blocks until the session completes or the timeout expires.
    fn wait_timeout(&self, timeout: Duration) {
        let complete = self.complete.lock().unwrap_or_else(PoisonError::into_inner);
        let _complete = self
            .cvar
            .wait_timeout_while(complete, timeout, |complete| !*complete)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

/// Represents the new mail watcher of a mailbox.
pub struct Watch<'a, C: Connection> {
    mailbox: Mailbox<'a, C>,
    config: WatchConfig,
}

impl<'a, C: Connection> Watch<'a, C> {
    pub fn new(mailbox: Mailbox<'a, C>) -> Self {
        Self {
            mailbox,
            config: WatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = Some(timeout);
        self
    }

    pub fn mailbox(&self) -> &Mailbox<'a, C> {
        &self.mailbox
    }

    /// Blocks until the server pushes an `EXISTS` response, renewing
    /// the IDLE session every time it times out.
    pub fn next_event(&self) -> Result<IdleEvent> {
        loop {
            match self.idle_session() {
                Ok(Some(event)) => return Ok(event),
                Ok(None) => {
                    debug!("idle session timed out, renewing it");
                }
                Err(Error::ConnectionError(connection::Error::IdleNotCompletedError)) => {
                    warn!("idle session ended before completion, restarting it");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Waits for new mail once, then calls `f` with the event. The
    /// connection is available again when `f` runs, so `f` may use
    /// the mailbox.
    pub fn wait_once<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(IdleEvent) -> T,
    {
        let event = self.next_event()?;
        Ok(f(event))
    }

    /// Waits for new mail until `f` breaks, then returns the break
    /// value.
    pub fn wait<B, F>(&self, mut f: F) -> Result<B>
    where
        F: FnMut(IdleEvent) -> ControlFlow<B>,
    {
        loop {
            if let ControlFlow::Break(value) = self.wait_once(&mut f)? {
                return Ok(value);
            }
        }
    }

    /// Runs one IDLE session. Returns the `EXISTS` event that
    /// completed it, or `None` when the timer ended it.
    fn idle_session(&self) -> Result<Option<IdleEvent>> {
        let timeout = self.config.idle_timeout();
        let completion = Arc::new(Completion::default());
        let done = IdleDone::with_timeout(timeout);

        let timer = {
            let completion = completion.clone();
            let done = done.clone();
            thread::Builder::new()
                .name("gmail-idle-timer".into())
                .spawn(move || {
                    completion.wait_timeout(timeout);
                    trace!("raising idle done signal");
                    done.signal();
                })
                .map_err(Error::SpawnIdleTimerError)?
        };

        debug!("starting idle session on {} for {:?}", self.mailbox, timeout);
        let mut exists = None;
        let res = self.mailbox.with_selected(|conn| {
            conn.idle(&done, &mut |event| {
                trace!("idle event: {:?}", event);
                if let IdleEvent::Exists(_) = event {
                    exists.get_or_insert(event);
                    completion.complete();
                }
            })
        });

        completion.complete();
        timer.join().map_err(|_| Error::JoinIdleTimerError)?;
        res?;

        Ok(exists)
    }
}
