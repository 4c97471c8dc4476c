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

//! Message attributes module.
//!
//! This module contains the attribute set fetched for a message and
//! the cache holding it between two mutations.

use crate::{Envelope, Flags, Labels, Uid};

/// Represents the attributes of a message returned by one fetch.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Attributes {
    pub uid: Option<Uid>,
    /// Represents the Gmail message identifier (`X-GM-MSGID`).
    pub message_id: Option<u64>,
    /// Represents the Gmail thread identifier (`X-GM-THRID`).
    pub thread_id: Option<u64>,
    pub envelope: Option<Envelope>,
    /// Represents the full raw message (`BODY[]`).
    pub body: Option<Vec<u8>>,
    pub flags: Option<Flags>,
    pub labels: Option<Labels>,
}

/// Represents the lazy attribute cache of a message.
///
/// The cache is either empty or holds one whole attribute set: it is
/// filled at once by a single fetch, and dropped at once on
/// invalidation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttributeCache {
    attributes: Option<Attributes>,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cache already holding the given attributes.
    pub fn with(attributes: Attributes) -> Self {
        Self {
            attributes: Some(attributes),
        }
    }

    pub fn is_fetched(&self) -> bool {
        self.attributes.is_some()
    }

    pub fn get(&self) -> Option<&Attributes> {
        self.attributes.as_ref()
    }

    /// Returns the cached attributes, running `fetch` first if the
    /// cache is empty. A failed fetch leaves the cache empty.
    pub fn get_or_try_fetch<F, E>(&mut self, fetch: F) -> Result<&Attributes, E>
    where
        F: FnOnce() -> Result<Attributes, E>,
    {
        match self.attributes.take() {
            Some(attributes) => Ok(&*self.attributes.insert(attributes)),
            None => Ok(&*self.attributes.insert(fetch()?)),
        }
    }

    pub fn invalidate(&mut self) {
        self.attributes = None;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::{AttributeCache, Attributes};

    #[test]
    fn fetch_once() {
        let count = Cell::new(0);
        let fetch = || -> Result<Attributes, ()> {
            count.set(count.get() + 1);
            Ok(Attributes {
                uid: Some(42),
                ..Attributes::default()
            })
        };

        let mut cache = AttributeCache::new();
        assert!(!cache.is_fetched());
        assert_eq!(Some(42), cache.get_or_try_fetch(fetch).unwrap().uid);
        assert_eq!(Some(42), cache.get_or_try_fetch(fetch).unwrap().uid);
        assert_eq!(1, count.get());

        cache.invalidate();
        assert!(cache.get().is_none());
        cache.get_or_try_fetch(fetch).unwrap();
        assert_eq!(2, count.get());
    }

    #[test]
    fn failed_fetch() {
        let mut cache = AttributeCache::new();
        let res = cache.get_or_try_fetch(|| Err::<Attributes, _>("network down"));
        assert_eq!(Err("network down"), res.map(|_| ()));
        assert!(!cache.is_fetched());
    }
}
