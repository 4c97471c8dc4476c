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

//! IMAP response module.
//!
//! This module parses the raw responses of the commands the `imap`
//! crate does not expose with the Gmail extensions (ordered UID
//! SEARCH, UID FETCH of the Gmail attributes).

use imap_proto::{
    parser::parse_response, Address as ImapAddress, AttributeValue, Envelope as ImapEnvelope,
    MailboxDatum, Response,
};
use log::{debug, trace, warn};
use std::borrow::Cow;

use crate::{
    connection::{
        decode_name,
        imap::{Error, Result},
    },
    Address, Attributes, Envelope, Flag, Label, Uid,
};

/// Parses the raw responses one by one.
fn for_each_response<F>(data: &[u8], mut f: F) -> Result<()>
where
    F: FnMut(Response) -> Result<()>,
{
    let mut rest = data;

    while !rest.is_empty() {
        let (next, response) = parse_response(rest)
            .map_err(|err| Error::ParseResponseError(format!("{:?}", err)))?;
        f(response)?;
        rest = next;
    }

    Ok(())
}

/// Parses the UIDs of a UID SEARCH response, in server order.
pub fn parse_search(data: &[u8]) -> Result<Vec<Uid>> {
    let mut uids = Vec::new();

    for_each_response(data, |response| {
        match response {
            Response::MailboxData(MailboxDatum::Search(ids)) => uids.extend(ids),
            response => trace!("skipping search response {:?}", response),
        };
        Ok(())
    })?;

    Ok(uids)
}

/// Parses the attributes of a UID FETCH response. Responses without
/// UID are unsolicited updates of the server and are skipped.
pub fn parse_fetches(data: &[u8]) -> Result<Vec<Attributes>> {
    let mut fetches = Vec::new();

    for_each_response(data, |response| {
        match response {
            Response::Fetch(seq, attrs) => {
                let mut attributes = Attributes::default();

                for attr in attrs {
                    match attr {
                        AttributeValue::Uid(uid) => attributes.uid = Some(uid),
                        AttributeValue::GmailMsgId(id) => attributes.message_id = Some(id),
                        AttributeValue::GmailThrId(id) => attributes.thread_id = Some(id),
                        AttributeValue::Envelope(envelope) => {
                            attributes.envelope = Some(from_imap_envelope(&envelope, seq)?)
                        }
                        AttributeValue::BodySection { data, .. } | AttributeValue::Rfc822(data) => {
                            attributes.body = data.map(Cow::into_owned)
                        }
                        AttributeValue::Flags(flags) => {
                            attributes.flags =
                                Some(flags.iter().map(|flag| Flag::from_imap(flag)).collect())
                        }
                        AttributeValue::GmailLabels(labels) => {
                            attributes.labels =
                                Some(labels.iter().map(|label| to_label(label)).collect())
                        }
                        attr => trace!("skipping fetch attribute {:?}", attr),
                    }
                }

                if attributes.uid.is_some() {
                    fetches.push(attributes);
                } else {
                    debug!("skipping unsolicited fetch response {}", seq);
                }
            }
            response => warn!("skipping unexpected fetch response {:?}", response),
        };
        Ok(())
    })?;

    Ok(fetches)
}

/// Builds a label from its raw representation, decoding the custom
/// ones.
pub fn to_label(label: &str) -> Label {
    match label.strip_prefix('\\') {
        Some(_) => Label::from(label),
        None => Label::from(decode_name(label)),
    }
}

fn decode(input: &Cow<[u8]>, seq: u32) -> Result<String> {
    rfc2047_decoder::Decoder::new()
        .skip_encoded_word_length(true)
        .decode(input)
        .map_err(|err| Error::DecodeEnvelopeError(err, seq))
}

fn decode_opt(input: &Option<Cow<[u8]>>, seq: u32) -> Result<Option<String>> {
    input.as_ref().map(|input| decode(input, seq)).transpose()
}

fn from_imap_addresses(addrs: &Option<Vec<ImapAddress>>, seq: u32) -> Result<Vec<Address>> {
    addrs
        .iter()
        .flatten()
        .map(|addr| {
            Ok(Address {
                name: decode_opt(&addr.name, seq)?,
                mailbox: decode_opt(&addr.mailbox, seq)?,
                host: decode_opt(&addr.host, seq)?,
            })
        })
        .collect()
}

fn from_imap_envelope(envelope: &ImapEnvelope, seq: u32) -> Result<Envelope> {
    Ok(Envelope {
        date: decode_opt(&envelope.date, seq)?,
        subject: decode_opt(&envelope.subject, seq)?,
        from: from_imap_addresses(&envelope.from, seq)?,
        sender: from_imap_addresses(&envelope.sender, seq)?,
        reply_to: from_imap_addresses(&envelope.reply_to, seq)?,
        to: from_imap_addresses(&envelope.to, seq)?,
        cc: from_imap_addresses(&envelope.cc, seq)?,
        bcc: from_imap_addresses(&envelope.bcc, seq)?,
        in_reply_to: decode_opt(&envelope.in_reply_to, seq)?,
        message_id: decode_opt(&envelope.message_id, seq)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::{Address, Flag, Label};

    use super::*;

    #[test]
    fn search_order() {
        let data = b"* SEARCH 3 1 2\r\n";
        assert_eq!(vec![3, 1, 2], parse_search(data).unwrap());
    }

    #[test]
    fn empty_search() {
        let data = b"* SEARCH\r\n";
        assert!(parse_search(data).unwrap().is_empty());
    }

    #[test]
    fn fetch() {
        let data = concat!(
            "* 1 FETCH (UID 42 X-GM-MSGID 1278455344230334865 X-GM-THRID 1266894439832287888 ",
            "X-GM-LABELS (Work Travel) FLAGS (\\Seen) ",
            "ENVELOPE (\"Tue, 20 Dec 1988 10:00:00 +0000\" \"=?utf-8?q?Hello_w=C3=B6rld?=\" ",
            "((\"Alice\" NIL \"alice\" \"localhost\")) NIL NIL ",
            "((NIL NIL \"bob\" \"localhost\")) NIL NIL NIL \"<id@localhost>\") ",
            "BODY[] {11}\r\nSubject: x\n)\r\n",
        );

        let fetches = parse_fetches(data.as_bytes()).unwrap();
        assert_eq!(1, fetches.len());

        let attrs = &fetches[0];
        assert_eq!(Some(42), attrs.uid);
        assert_eq!(Some(1278455344230334865), attrs.message_id);
        assert_eq!(Some(1266894439832287888), attrs.thread_id);
        assert_eq!(Some(b"Subject: x\n".to_vec()), attrs.body);

        let flags = attrs.flags.as_ref().unwrap();
        assert!(flags.contains(&Flag::Seen));

        let labels = attrs.labels.as_ref().unwrap();
        assert!(labels.has("Work"));
        assert!(labels.has("Travel"));

        let envelope = attrs.envelope.as_ref().unwrap();
        assert_eq!(Some("Hello wörld"), envelope.subject.as_deref());
        assert_eq!(Some("<id@localhost>"), envelope.message_id.as_deref());
        assert_eq!(
            vec![Address::new(Some("Alice"), "alice", "localhost")],
            envelope.from
        );
        assert_eq!(
            vec![Address::new(None::<String>, "bob", "localhost")],
            envelope.to
        );
    }

    #[test]
    fn fetch_gmail_order() {
        let data = concat!(
            "* 7 FETCH (X-GM-THRID 1266894439832287888 X-GM-MSGID 1278455344230334865 ",
            "X-GM-LABELS (\\Important \\Inbox \"Muy Importante\") UID 42 ",
            "BODY[HEADER] {24}\r\nSubject: (X-GM-MSGID 1)\n)\r\n",
        );

        let fetches = parse_fetches(data.as_bytes()).unwrap();
        assert_eq!(1, fetches.len());

        let attrs = &fetches[0];
        assert_eq!(Some(42), attrs.uid);
        assert_eq!(Some(1278455344230334865), attrs.message_id);
        assert_eq!(Some(1266894439832287888), attrs.thread_id);
        assert_eq!(Some(b"Subject: (X-GM-MSGID 1)\n".to_vec()), attrs.body);

        let labels = attrs.labels.as_ref().unwrap();
        assert!(labels.has(Label::important()));
        assert!(labels.has(Label::inbox()));
        assert!(labels.has("Muy Importante"));
    }

    #[test]
    fn unsolicited_fetch() {
        let data = concat!(
            "* 1 FETCH (UID 10 X-GM-MSGID 100 FLAGS ())\r\n",
            "* 3 FETCH (FLAGS (\\Seen))\r\n",
            "* 2 FETCH (UID 11 X-GM-MSGID 101 FLAGS (\\Flagged))\r\n",
        );

        let fetches = parse_fetches(data.as_bytes()).unwrap();
        let uids: Vec<_> = fetches.iter().map(|attrs| attrs.uid).collect();
        assert_eq!(vec![Some(10), Some(11)], uids);
        assert_eq!(Some(101), fetches[1].message_id);
    }

    #[test]
    fn label() {
        assert_eq!(Label::inbox(), to_label("\\Inbox"));
        assert_eq!(Label::Custom("Envoyés".into()), to_label("Envoy&AOk-s"));
    }
}
