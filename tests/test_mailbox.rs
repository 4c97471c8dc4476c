mod common;

use gmail_lib::{Error, Flag, Gmail, SearchAlias, SearchFilter, SpecialUse};

use common::{init_logger, Command, MockConnection, MockMessage, ALL_MAIL};

fn setup() -> (MockConnection, Gmail<MockConnection>) {
    init_logger();
    let conn = MockConnection::default();
    let gmail = Gmail::new(conn.clone());
    (conn, gmail)
}

#[test]
fn test_search_does_not_fetch() {
    let (conn, gmail) = setup();
    conn.add_message(MockMessage::new(3, "third").label("\\Inbox"));
    conn.add_message(MockMessage::new(1, "first").label("\\Inbox"));
    conn.add_message(MockMessage::new(2, "second").label("\\Inbox"));
    conn.add_message(MockMessage::new(4, "archived"));

    let messages = gmail
        .inbox()
        .search(SearchAlias::All, &SearchFilter::default())
        .unwrap();

    // server order is kept
    let uids: Vec<_> = messages.iter().map(|msg| msg.uid()).collect();
    assert_eq!(vec![3, 1, 2], uids);
    assert!(messages.iter().all(|msg| !msg.is_fetched()));
    assert!(conn.fetches().is_empty());
    assert_eq!(
        vec![
            Command::Select("INBOX".into()),
            Command::Search("INBOX".into(), "ALL".into())
        ],
        conn.commands()
    );
}

#[test]
fn test_search_criteria() {
    let (conn, gmail) = setup();

    gmail
        .inbox()
        .search(
            SearchAlias::Unread,
            &SearchFilter::default().from("x@y.com").subject("Hello world"),
        )
        .unwrap();

    assert_eq!(
        Some(Command::Search(
            "INBOX".into(),
            "UNSEEN FROM x@y.com SUBJECT \"Hello world\"".into()
        )),
        conn.commands().pop()
    );
}

#[test]
fn test_select_once() {
    let (conn, gmail) = setup();
    let inbox = gmail.inbox();

    inbox.search(SearchAlias::All, &SearchFilter::default()).unwrap();
    inbox.search(SearchAlias::Seen, &SearchFilter::default()).unwrap();
    assert_eq!(1, conn.count(|cmd| matches!(cmd, Command::Select(_))));

    gmail
        .mailbox(ALL_MAIL)
        .search(SearchAlias::All, &SearchFilter::default())
        .unwrap();
    inbox.search(SearchAlias::All, &SearchFilter::default()).unwrap();
    assert_eq!(3, conn.count(|cmd| matches!(cmd, Command::Select(_))));
}

#[test]
fn test_failed_select() {
    let (conn, gmail) = setup();
    let unknown = gmail.mailbox("Unknown");

    assert!(unknown
        .search(SearchAlias::All, &SearchFilter::default())
        .is_err());
    assert!(gmail.session().unwrap().selected().is_none());

    gmail.labels().create("Unknown").unwrap();
    assert!(unknown
        .search(SearchAlias::All, &SearchFilter::default())
        .is_ok());
    assert_eq!(2, conn.count(|cmd| matches!(cmd, Command::Select(_))));
}

#[test]
fn test_search_batched() {
    let (conn, gmail) = setup();
    for uid in (1..=250).rev() {
        conn.add_message(MockMessage::new(uid, "batch").label("\\Inbox"));
    }

    let mut messages = gmail
        .inbox()
        .search_batched(SearchAlias::All, &SearchFilter::default())
        .unwrap();

    let chunks: Vec<usize> = conn.fetches().iter().map(Vec::len).collect();
    assert_eq!(vec![100, 100, 50], chunks);

    let uids: Vec<_> = messages.iter().map(|msg| msg.uid()).collect();
    assert_eq!((1..=250).rev().collect::<Vec<_>>(), uids);
    assert!(messages.iter().all(|msg| msg.is_fetched()));

    // batched messages are already cached
    let subject = messages[0].envelope().unwrap().subject.clone();
    assert_eq!(Some("batch".to_owned()), subject);
    assert_eq!(3, conn.fetches().len());
}

#[test]
fn test_search_batched_empty() {
    let (conn, gmail) = setup();

    let messages = gmail
        .inbox()
        .search_batched(SearchAlias::All, &SearchFilter::default())
        .unwrap();

    assert!(messages.is_empty());
    assert!(conn.fetches().is_empty());
}

#[test]
fn test_count() {
    let (conn, gmail) = setup();
    conn.add_message(MockMessage::new(1, "read").label("\\Inbox").flag(Flag::Seen));
    conn.add_message(MockMessage::new(2, "unread").label("\\Inbox"));
    conn.add_message(MockMessage::new(3, "unread").label("\\Inbox"));

    let inbox = gmail.inbox();
    let filter = SearchFilter::default();

    assert_eq!(3, inbox.count(SearchAlias::All, &filter).unwrap());
    assert_eq!(2, inbox.count(SearchAlias::Unread, &filter).unwrap());
    assert_eq!(
        inbox.search(SearchAlias::Read, &filter).unwrap().len(),
        inbox.count(SearchAlias::Read, &filter).unwrap()
    );
    assert_eq!(0, gmail.mailbox("[Gmail]/Trash").count(SearchAlias::All, &filter).unwrap());
    assert!(conn.fetches().is_empty());
}

#[test]
fn test_expunge() {
    let (conn, gmail) = setup();
    conn.add_message(MockMessage::new(1, "deleted").label("\\Inbox").flag(Flag::Deleted));
    conn.add_message(MockMessage::new(2, "kept").label("\\Inbox"));

    gmail.inbox().expunge().unwrap();

    assert_eq!(
        Some(Command::Expunge("INBOX".into())),
        conn.commands().pop()
    );
    assert_eq!(
        1,
        gmail
            .inbox()
            .count(SearchAlias::All, &SearchFilter::default())
            .unwrap()
    );
}

#[test]
fn test_mailbox_names() {
    let (_conn, gmail) = setup();

    let mailbox = gmail.mailbox("Envoyés");
    assert_eq!("Envoyés", mailbox.name());
    assert_eq!("Envoy&AOk-s", mailbox.encoded_name());

    let mailbox = gmail.mailbox("Q&A-Notes");
    assert_eq!("Q&A-Notes", mailbox.name());
    assert_eq!("Q&-A-Notes", mailbox.encoded_name());

    assert_eq!("INBOX", gmail.inbox().name());
}

#[test]
fn test_find() {
    let (conn, gmail) = setup();
    conn.add_message(MockMessage::new(7, "archived"));
    conn.add_message(MockMessage::new(8, "inbox").label("\\Inbox"));

    let message = gmail.find(1008).unwrap();
    assert_eq!(8, message.uid());
    assert_eq!(ALL_MAIL, message.mailbox().name());

    assert!(matches!(
        gmail.find(4242),
        Err(Error::EmailNotFoundError(4242))
    ));
}

#[test]
fn test_labels() {
    let (conn, gmail) = setup();
    let labels = gmail.labels();

    assert!(!labels.exists("Envoyés").unwrap());
    labels.create("Envoyés").unwrap();
    assert!(labels.exists("Envoyés").unwrap());
    assert!(labels.all().unwrap().contains(&"Envoyés".to_owned()));
    assert!(conn
        .commands()
        .contains(&Command::Create("Envoy&AOk-s".into())));

    gmail
        .mailbox("Envoyés")
        .search(SearchAlias::All, &SearchFilter::default())
        .unwrap();
    labels.delete("Envoyés").unwrap();
    assert!(!labels.exists("Envoyés").unwrap());
    assert!(gmail.session().unwrap().selected().is_none());

    assert!(matches!(
        labels.delete("Envoyés"),
        Err(Error::NoLabelError(name)) if name == "Envoyés"
    ));
}

#[test]
fn test_localize() {
    init_logger();
    let conn = MockConnection::with_mailboxes([
        ("INBOX", vec![]),
        ("[Google Mail]/Alle Nachrichten", vec!["\\All"]),
        ("[Google Mail]/Papierkorb", vec!["\\Trash"]),
    ]);
    let gmail = Gmail::new(conn.clone());

    assert_eq!(
        "[Google Mail]/Alle Nachrichten",
        gmail.labels().localize(SpecialUse::All).unwrap()
    );
    assert_eq!(
        "[Google Mail]/Papierkorb",
        gmail.special_mailbox(SpecialUse::Trash).unwrap().name()
    );
    assert_eq!("INBOX", gmail.labels().localize(SpecialUse::Inbox).unwrap());
    assert_eq!(
        "[Gmail]/Drafts",
        gmail.labels().localize(SpecialUse::Drafts).unwrap()
    );

    // names are listed once
    assert_eq!(1, conn.count(|cmd| matches!(cmd, Command::List)));
}

#[test]
fn test_logout() {
    let (conn, gmail) = setup();
    gmail
        .inbox()
        .search(SearchAlias::All, &SearchFilter::default())
        .unwrap();

    gmail.logout().unwrap();

    assert_eq!(Some(Command::Logout), conn.commands().pop());
    assert!(gmail.session().unwrap().selected().is_none());
}
