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

pub mod client;
pub use client::{Error, Gmail, Result, Session};

pub mod connection;
pub use connection::{Connection, IdleDone, IdleEvent};
#[cfg(feature = "imap-backend")]
pub use connection::{ImapConfig, ImapConnection};

pub mod domain;
pub use domain::*;

/// Represents the unique identifier of a message inside a mailbox.
pub type Uid = u32;
