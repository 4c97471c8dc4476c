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

use std::{
    sync::{Arc, Condvar, Mutex, PoisonError},
    time::{Duration, Instant},
};

/// Represents the signal ending an idle session. It is raised by the
/// watch timer thread and observed by the connection, which then
/// sends `DONE` and gives the session back.
///
/// The signal may carry the deadline at which it is expected to be
/// raised, so connections that cannot be woken up while blocked on
/// the server can bound their wait.
#[derive(Clone, Debug, Default)]
pub struct IdleDone {
    signal: Arc<(Mutex<bool>, Condvar)>,
    deadline: Option<Instant>,
}

impl IdleDone {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a signal expected to be raised after the given
    /// timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            ..Self::default()
        }
    }

    pub fn signal(&self) {
        let (lock, cvar) = &*self.signal;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_signaled(&self) -> bool {
        let (lock, _) = &*self.signal;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the time left before the deadline, if any.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns whether the session should end: the signal is raised
    /// or the deadline is reached.
    pub fn is_done(&self) -> bool {
        self.is_signaled() || self.remaining() == Some(Duration::ZERO)
    }

    /// Blocks until the signal is raised or the timeout expires.
    /// Returns whether the signal was raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.signal;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |signaled| !*signaled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}
