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

//! IMAP connection config module.
//!
//! This module contains the representation of the IMAP connection
//! configuration.

use std::time::Duration;

pub const GMAIL_HOST: &str = "imap.gmail.com";
pub const GMAIL_PORT: u16 = 993;
pub const GMAIL_DOMAIN: &str = "gmail.com";

/// Represents the IMAP connection configuration.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct ImapConfig {
    /// Represents the IMAP server host.
    pub host: String,
    /// Represents the IMAP server port.
    pub port: u16,
    /// Enables SSL.
    pub ssl: Option<bool>,
    /// Enables StartTLS.
    pub starttls: Option<bool>,
    /// Trusts any certificate.
    pub insecure: Option<bool>,
    /// Represents the IMAP server login.
    pub login: String,
    /// Represents the IMAP server password.
    pub passwd: String,
    /// Represents the maximum duration, in seconds, of one IDLE
    /// command sent to the server.
    pub idle_poll_interval: Option<u64>,
}

impl ImapConfig {
    /// Builds the configuration of the Gmail IMAP server.
    pub fn gmail<L, P>(login: L, passwd: P) -> Self
    where
        L: ToString,
        P: ToString,
    {
        Self {
            host: GMAIL_HOST.into(),
            port: GMAIL_PORT,
            ssl: Some(true),
            login: login.to_string(),
            passwd: passwd.to_string(),
            ..Self::default()
        }
    }

    /// Gets the login, completed with the Gmail domain when it is a
    /// plain username.
    pub fn login(&self) -> String {
        if self.login.contains('@') {
            self.login.clone()
        } else {
            format!("{}@{}", self.login, GMAIL_DOMAIN)
        }
    }

    /// Gets the SSL IMAP option.
    pub fn ssl(&self) -> bool {
        self.ssl.unwrap_or(true)
    }

    /// Gets the StartTLS IMAP option.
    pub fn starttls(&self) -> bool {
        self.starttls.unwrap_or_default()
    }

    /// Gets the insecure IMAP option.
    pub fn insecure(&self) -> bool {
        self.insecure.unwrap_or_default()
    }

    pub fn idle_poll_interval(&self) -> Duration {
        Duration::from_secs(self.idle_poll_interval.unwrap_or(60))
    }
}
