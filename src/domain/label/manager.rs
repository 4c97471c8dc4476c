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

//! Label manager module.
//!
//! Gmail exposes labels as IMAP mailboxes: listing, creating and
//! deleting labels goes through the mailbox commands.

use log::{debug, trace};

use crate::{
    client::{Error, Result},
    connection::{decode_name, encode_name, Connection},
    Gmail, SpecialUse,
};

pub struct LabelManager<'a, C: Connection> {
    gmail: &'a Gmail<C>,
}

impl<'a, C: Connection> LabelManager<'a, C> {
    pub fn new(gmail: &'a Gmail<C>) -> Self {
        Self { gmail }
    }

    /// Lists the decoded names of all the labels, system mailboxes
    /// included.
    pub fn all(&self) -> Result<Vec<String>> {
        let mut session = self.gmail.session()?;
        let labels: Vec<String> = session
            .connection()
            .list()?
            .iter()
            .map(|mailbox| decode_name(&mailbox.name))
            .collect();
        trace!("labels: {:?}", labels);
        Ok(labels)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.all()?.iter().any(|label| label == name))
    }

    pub fn create(&self, name: &str) -> Result<()> {
        debug!("creating label {}", name);
        let mut session = self.gmail.session()?;
        session.connection().create(&encode_name(name))?;
        Ok(())
    }

    /// Deletes a label. Fails with [`Error::NoLabelError`] when the
    /// label does not exist.
    pub fn delete(&self, name: &str) -> Result<()> {
        if !self.exists(name)? {
            return Err(Error::NoLabelError(name.to_owned()));
        }

        debug!("deleting label {}", name);
        let encoded_name = encode_name(name);
        let mut session = self.gmail.session()?;
        session.deselect(&encoded_name);
        session.connection().delete(&encoded_name)?;
        Ok(())
    }

    /// Returns the localized name of a special-use mailbox.
    pub fn localize(&self, special_use: SpecialUse) -> Result<String> {
        Ok(self.gmail.session()?.localize(special_use)?)
    }
}
