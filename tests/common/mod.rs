//! Simulated Gmail connection shared by the integration tests.
//!
//! Messages are global to the account, like in Gmail: a message
//! belongs to a mailbox when it carries the matching label, and has
//! the same UID everywhere.

#![allow(dead_code)]

use log::LevelFilter;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use gmail_lib::{
    connection::{self, decode_name, FetchAttribute, MailboxInfo, StoreAction},
    Address, Attributes, Connection, Envelope, Flag, Flags, IdleDone, IdleEvent, Label, Labels,
    SearchCriteria, Token, Uid,
};

pub const ALL_MAIL: &str = "[Gmail]/All Mail";

pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(LevelFilter::Debug)
        .try_init();
}

#[derive(Clone, Debug)]
pub struct MockMessage {
    pub uid: Uid,
    pub message_id: u64,
    pub thread_id: u64,
    pub subject: String,
    pub flags: Flags,
    pub labels: Labels,
}

impl MockMessage {
    pub fn new(uid: Uid, subject: &str) -> Self {
        Self {
            uid,
            message_id: 1000 + uid as u64,
            thread_id: 5000 + uid as u64,
            subject: subject.to_owned(),
            flags: Flags::default(),
            labels: Labels::default(),
        }
    }

    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.insert(flag);
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.labels.insert(Label::from(label));
        self
    }

    fn body(&self) -> Vec<u8> {
        format!(
            "From: alice@localhost\r\nSubject: {}\r\nX-Mailer: mock\r\n\r\nHello!\r\n",
            self.subject
        )
        .into_bytes()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Select(String),
    List,
    Create(String),
    Delete(String),
    Search(String, String),
    Fetch(String, Vec<Uid>),
    Store(String, Uid, String),
    Expunge(String),
    Idle(String),
    Logout,
}

/// Represents the behaviour of the simulated server during one idle
/// session.
#[derive(Clone, Copy, Debug)]
pub enum IdleStep {
    /// Pushes nothing.
    Silent,
    /// Pushes the event once the session started.
    Push(IdleEvent),
    /// Ends the session right away.
    NotCompleted,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub messages: Vec<MockMessage>,
    pub mailboxes: Vec<MailboxInfo>,
    pub selected: Option<String>,
    pub commands: Vec<Command>,
    pub idle_steps: VecDeque<IdleStep>,
}

/// Represents the label a mailbox stands for. All Mail stands for
/// none, as it contains every message.
fn mailbox_label(mailbox: &str) -> Option<Label> {
    match mailbox {
        ALL_MAIL => None,
        "INBOX" => Some(Label::inbox()),
        "[Gmail]/Trash" => Some(Label::trash()),
        "[Gmail]/Spam" => Some(Label::spam()),
        "[Gmail]/Starred" => Some(Label::starred()),
        mailbox => Some(Label::from(decode_name(mailbox))),
    }
}

impl MockState {
    fn selected(&self) -> connection::Result<String> {
        self.selected
            .clone()
            .ok_or_else(|| connection::Error::CommandError("no mailbox selected".into()))
    }

    fn in_selected(&self) -> connection::Result<Vec<&MockMessage>> {
        let label = mailbox_label(&self.selected()?);
        Ok(self
            .messages
            .iter()
            .filter(|msg| label.as_ref().map_or(true, |label| msg.labels.contains(label)))
            .collect())
    }

    fn matches(msg: &MockMessage, tokens: &[Token]) -> bool {
        let mut tokens = tokens.iter().map(Token::as_str);
        let mut matches = true;

        while let Some(token) = tokens.next() {
            matches &= match token {
                "SEEN" => msg.flags.contains(&Flag::Seen),
                "UNSEEN" => !msg.flags.contains(&Flag::Seen),
                "FLAGGED" => msg.flags.contains(&Flag::Flagged),
                "UNFLAGGED" => !msg.flags.contains(&Flag::Flagged),
                "SUBJECT" => tokens
                    .next()
                    .map_or(false, |subject| msg.subject.contains(subject)),
                "X-GM-MSGID" => tokens
                    .next()
                    .map_or(false, |id| id == msg.message_id.to_string()),
                _ => true,
            };
        }

        matches
    }
}

#[derive(Clone, Debug)]
pub struct MockConnection(pub Arc<Mutex<MockState>>);

impl Default for MockConnection {
    fn default() -> Self {
        Self::with_mailboxes([
            ("INBOX", vec![]),
            (ALL_MAIL, vec!["\\HasNoChildren", "\\All"]),
            ("[Gmail]/Trash", vec!["\\HasNoChildren", "\\Trash"]),
            ("[Gmail]/Spam", vec!["\\HasNoChildren", "\\Junk"]),
        ])
    }
}

impl MockConnection {
    pub fn with_mailboxes<'a, I>(mailboxes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Vec<&'a str>)>,
    {
        let mailboxes = mailboxes
            .into_iter()
            .map(|(name, attributes)| MailboxInfo {
                name: name.to_owned(),
                delimiter: Some("/".into()),
                attributes: attributes.into_iter().map(ToOwned::to_owned).collect(),
            })
            .collect();

        Self(Arc::new(Mutex::new(MockState {
            mailboxes,
            ..MockState::default()
        })))
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.0.lock().unwrap()
    }

    pub fn add_mailbox(&self, name: &str) {
        self.state().mailboxes.push(MailboxInfo {
            name: name.to_owned(),
            delimiter: Some("/".into()),
            attributes: vec!["\\HasNoChildren".into()],
        });
    }

    pub fn add_message(&self, message: MockMessage) {
        self.state().messages.push(message);
    }

    pub fn message(&self, uid: Uid) -> MockMessage {
        self.state()
            .messages
            .iter()
            .find(|msg| msg.uid == uid)
            .cloned()
            .unwrap()
    }

    pub fn push_idle_steps<I: IntoIterator<Item = IdleStep>>(&self, steps: I) {
        self.state().idle_steps.extend(steps);
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state().commands.clear();
    }

    pub fn fetches(&self) -> Vec<Vec<Uid>> {
        self.commands()
            .into_iter()
            .filter_map(|cmd| match cmd {
                Command::Fetch(_, uids) => Some(uids),
                _ => None,
            })
            .collect()
    }

    pub fn stores(&self) -> Vec<(String, Uid, String)> {
        self.commands()
            .into_iter()
            .filter_map(|cmd| match cmd {
                Command::Store(mailbox, uid, query) => Some((mailbox, uid, query)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: fn(&Command) -> bool) -> usize {
        self.commands().iter().filter(|cmd| matches(cmd)).count()
    }
}

impl Connection for MockConnection {
    fn select(&mut self, mailbox: &str) -> connection::Result<()> {
        let mut state = self.state();
        state.commands.push(Command::Select(mailbox.to_owned()));

        if !state.mailboxes.iter().any(|mbox| mbox.name == mailbox) {
            state.selected = None;
            return Err(connection::Error::CommandError(format!(
                "mailbox {} does not exist",
                mailbox
            )));
        }

        state.selected = Some(mailbox.to_owned());
        Ok(())
    }

    fn list(&mut self) -> connection::Result<Vec<MailboxInfo>> {
        let mut state = self.state();
        state.commands.push(Command::List);
        Ok(state.mailboxes.clone())
    }

    fn create(&mut self, mailbox: &str) -> connection::Result<()> {
        let mut state = self.state();
        state.commands.push(Command::Create(mailbox.to_owned()));
        state.mailboxes.push(MailboxInfo {
            name: mailbox.to_owned(),
            delimiter: Some("/".into()),
            attributes: vec!["\\HasNoChildren".into()],
        });
        Ok(())
    }

    fn delete(&mut self, mailbox: &str) -> connection::Result<()> {
        let mut state = self.state();
        state.commands.push(Command::Delete(mailbox.to_owned()));
        state.mailboxes.retain(|mbox| mbox.name != mailbox);
        if state.selected.as_deref() == Some(mailbox) {
            state.selected = None;
        }
        Ok(())
    }

    fn uid_search(&mut self, criteria: &SearchCriteria) -> connection::Result<Vec<Uid>> {
        let mut state = self.state();
        let selected = state.selected()?;
        state
            .commands
            .push(Command::Search(selected, criteria.to_imap_query()));

        Ok(state
            .in_selected()?
            .into_iter()
            .filter(|msg| MockState::matches(msg, criteria.tokens()))
            .map(|msg| msg.uid)
            .collect())
    }

    fn uid_fetch(
        &mut self,
        uids: &[Uid],
        attrs: &[FetchAttribute],
    ) -> connection::Result<Vec<Attributes>> {
        assert_eq!(gmail_lib::connection::PREFETCH_ATTRIBUTES.as_slice(), attrs);

        let mut state = self.state();
        let selected = state.selected()?;
        state
            .commands
            .push(Command::Fetch(selected.clone(), uids.to_vec()));

        let hidden = mailbox_label(&selected);
        let messages = state.in_selected()?;

        Ok(uids
            .iter()
            .filter_map(|uid| messages.iter().find(|msg| msg.uid == *uid))
            .map(|msg| Attributes {
                uid: Some(msg.uid),
                message_id: Some(msg.message_id),
                thread_id: Some(msg.thread_id),
                envelope: Some(Envelope {
                    subject: Some(msg.subject.clone()),
                    from: vec![Address::new(None::<String>, "alice", "localhost")],
                    message_id: Some(format!("<{}@localhost>", msg.uid)),
                    ..Envelope::default()
                }),
                body: Some(msg.body()),
                flags: Some(msg.flags.clone()),
                labels: Some(
                    msg.labels
                        .iter()
                        .filter(|label| Some(*label) != hidden.as_ref())
                        .cloned()
                        .collect(),
                ),
            })
            .collect())
    }

    fn uid_store(&mut self, uid: Uid, action: &StoreAction) -> connection::Result<()> {
        let mut state = self.state();
        let selected = state.selected()?;
        state
            .commands
            .push(Command::Store(selected, uid, action.to_imap_query()));

        let msg = state
            .messages
            .iter_mut()
            .find(|msg| msg.uid == uid)
            .ok_or_else(|| connection::Error::CommandError(format!("no message {}", uid)))?;

        match action {
            StoreAction::AddFlags(flags) => msg.flags.extend(flags.iter().cloned()),
            StoreAction::RemoveFlags(flags) => flags.iter().for_each(|flag| {
                msg.flags.remove(flag);
            }),
            StoreAction::AddLabels(labels) => msg
                .labels
                .extend(labels.iter().map(|label| Label::from(decode_name(label)))),
            StoreAction::RemoveLabels(labels) => labels.iter().for_each(|label| {
                msg.labels.remove(&Label::from(decode_name(label)));
            }),
        }

        Ok(())
    }

    fn expunge(&mut self) -> connection::Result<()> {
        let mut state = self.state();
        let selected = state.selected()?;
        state.commands.push(Command::Expunge(selected));
        state
            .messages
            .retain(|msg| !msg.flags.contains(&Flag::Deleted));
        Ok(())
    }

    fn idle(&mut self, done: &IdleDone, on_event: &mut dyn FnMut(IdleEvent)) -> connection::Result<()> {
        let step = {
            let mut state = self.state();
            let selected = state.selected()?;
            state.commands.push(Command::Idle(selected));
            state.idle_steps.pop_front()
        };

        match step {
            None => Err(connection::Error::CommandError("no more idle steps".into())),
            Some(IdleStep::NotCompleted) => Err(connection::Error::IdleNotCompletedError),
            Some(step) => {
                if let IdleStep::Push(event) = step {
                    on_event(event);
                }
                if done.wait_timeout(Duration::from_secs(5)) {
                    Ok(())
                } else {
                    Err(connection::Error::IdleNotCompletedError)
                }
            }
        }
    }

    fn logout(&mut self) -> connection::Result<()> {
        let mut state = self.state();
        state.commands.push(Command::Logout);
        state.selected = None;
        Ok(())
    }
}
