//! Chat Session Tests
//!
//! Event-level behavior of a whole session against a recording link.

use pretty_assertions::assert_eq;
use test_case::test_case;

use workspace_chat::application::services::{ChatSession, ChatUpdate, ConnectionState};
use workspace_chat::domain::entities::{LinkEvent, MessageKind, PaginationCursor};

use crate::common::{connected, frame, history, live, session, TestConnector, ENDPOINT};

fn ids(session: &ChatSession<TestConnector>) -> Vec<i64> {
    session.messages().iter().map(|m| m.id).collect()
}

/// Workspace w1, user 42: own live message, then the final history page.
#[test]
fn test_live_then_final_history_page() {
    let (mut session, outbox) = session();
    session.handle_event(connected(1));

    session.handle_event(live("sub-1-0", 1, 42, "hi"));
    assert_eq!(ids(&session), vec![1]);
    assert_eq!(session.views()[0].kind, MessageKind::Send);

    session.handle_event(history("sub-1-1", &[0], true, 0));
    assert_eq!(ids(&session), vec![0, 1]);
    assert_eq!(session.cursor(), PaginationCursor::new(0, true));

    outbox.clear();
    assert!(!session.request_history(0));
    assert!(!session.request_history(17));
    assert!(!session.request_older());
    assert!(outbox.publishes().is_empty());
}

#[test]
fn test_ready_subscribes_both_feeds_and_requests_newest_page() {
    let (mut session, outbox) = session();
    assert_eq!(
        session.handle_event(connected(1)),
        ChatUpdate::Ready { session: 1 }
    );
    assert_eq!(
        outbox.subscriptions(),
        vec![
            ("sub-1-0".to_string(), "/topic/message/w1".to_string()),
            ("sub-1-1".to_string(), "/user/topic/history".to_string()),
        ]
    );
    assert_eq!(outbox.history_requests(), vec![r#"{"lastMsgId":0}"#]);
}

#[test]
fn test_live_feed_keeps_arrival_order() {
    let (mut session, _) = session();
    session.handle_event(connected(1));

    // Arrival order wins over id order.
    for id in [10, 12, 11, 13] {
        session.handle_event(live("sub-1-0", id, 7, "m"));
    }
    assert_eq!(ids(&session), vec![10, 12, 11, 13]);
}

#[test]
fn test_history_pages_prepend_in_given_order() {
    let (mut session, _) = session();
    session.handle_event(connected(1));
    session.handle_event(live("sub-1-0", 20, 7, "live"));

    session.handle_event(history("sub-1-1", &[17, 18, 19], false, 17));
    assert_eq!(ids(&session), vec![17, 18, 19, 20]);

    session.handle_event(history("sub-1-1", &[15, 16], false, 15));
    assert_eq!(ids(&session), vec![15, 16, 17, 18, 19, 20]);
    assert_eq!(session.cursor(), PaginationCursor::new(15, false));
}

#[test]
fn test_request_older_follows_cursor_until_end() {
    let (mut session, outbox) = session();
    session.handle_event(connected(1));
    session.handle_event(history("sub-1-1", &[8, 9], false, 8));
    outbox.clear();

    assert!(session.request_older());
    assert_eq!(outbox.history_requests(), vec![r#"{"lastMsgId":8}"#]);

    session.handle_event(history("sub-1-1", &[7], true, 7));
    outbox.clear();
    assert!(!session.request_older());
    assert!(outbox.publishes().is_empty());
}

#[test_case("" ; "empty")]
#[test_case("  " ; "two spaces")]
#[test_case("   " ; "three spaces")]
fn test_blank_send_emits_nothing(content: &str) {
    let (mut session, outbox) = session();
    session.handle_event(connected(1));
    session.handle_event(live("sub-1-0", 1, 7, "hello"));
    outbox.clear();

    assert!(!session.send_text(content));
    assert!(outbox.publishes().is_empty());
    assert_eq!(ids(&session), vec![1]);
    assert_eq!(session.input(), content);
}

#[test]
fn test_send_publishes_without_local_echo() {
    let (mut session, outbox) = session();
    session.handle_event(connected(1));
    outbox.clear();

    assert!(session.send_text("hello"));
    assert_eq!(
        outbox.publishes(),
        vec![(
            "/app/message/w1".to_string(),
            r#"{"content":"hello"}"#.to_string()
        )]
    );
    assert_eq!(session.input(), "");
    assert!(session.store().is_empty());

    // The authoritative copy arrives through the live feed.
    session.handle_event(live("sub-1-0", 3, 42, "hello"));
    assert_eq!(session.views()[0].kind, MessageKind::Send);
}

#[test]
fn test_reconnect_resubscribes_and_drops_stale_frames() {
    let (mut session, outbox) = session();
    session.handle_event(connected(1));
    session.handle_event(live("sub-1-0", 1, 7, "before"));

    assert_eq!(
        session.handle_event(LinkEvent::Closed {
            reason: "socket reset".into()
        }),
        ChatUpdate::Lost
    );
    assert_eq!(session.state(), ConnectionState::Reconnecting);
    assert!(!session.send_text("while down"));

    outbox.clear();
    assert_eq!(
        session.handle_event(connected(2)),
        ChatUpdate::Ready { session: 2 }
    );
    assert_eq!(
        outbox.subscriptions(),
        vec![
            ("sub-2-0".to_string(), "/topic/message/w1".to_string()),
            ("sub-2-1".to_string(), "/user/topic/history".to_string()),
        ]
    );
    assert_eq!(outbox.history_requests(), vec![r#"{"lastMsgId":0}"#]);

    // Resync: the newest page is reloaded from scratch.
    assert!(session.store().is_empty());
    assert_eq!(session.cursor(), PaginationCursor::default());

    assert_eq!(
        session.handle_event(live("sub-1-0", 2, 7, "stale")),
        ChatUpdate::Ignored
    );
    assert_eq!(
        session.handle_event(live("sub-2-0", 2, 7, "fresh")),
        ChatUpdate::Appended { message_id: 2 }
    );
    assert_eq!(ids(&session), vec![2]);
}

#[test]
fn test_reconnect_after_end_requests_history_again() {
    let (mut session, outbox) = session();
    session.handle_event(connected(1));
    session.handle_event(history("sub-1-1", &[], true, 0));

    session.handle_event(LinkEvent::Closed {
        reason: "gone".into(),
    });
    outbox.clear();
    session.handle_event(connected(2));
    assert_eq!(outbox.history_requests(), vec![r#"{"lastMsgId":0}"#]);
}

#[test]
fn test_bad_frame_does_not_stop_the_stream() {
    let (mut session, _) = session();
    session.handle_event(connected(1));

    session.handle_event(live("sub-1-0", 1, 7, "one"));
    assert_eq!(
        session.handle_event(frame("sub-1-0", r#"{"body":{"content":"no sender"}}"#.into())),
        ChatUpdate::Dropped
    );
    assert_eq!(
        session.handle_event(frame("sub-1-1", "{".into())),
        ChatUpdate::Dropped
    );
    session.handle_event(live("sub-1-0", 2, 7, "two"));

    assert_eq!(ids(&session), vec![1, 2]);
    assert_eq!(session.cursor(), PaginationCursor::default());
}

#[test]
fn test_broker_error_is_not_fatal() {
    let (mut session, _) = session();
    session.handle_event(connected(1));
    assert_eq!(
        session.handle_event(LinkEvent::BrokerError {
            message: "access denied".into(),
            body: String::new(),
        }),
        ChatUpdate::Ignored
    );
    assert_eq!(session.state(), ConnectionState::Connected);
    session.handle_event(live("sub-1-0", 1, 7, "still here"));
    assert_eq!(ids(&session), vec![1]);
}

#[test]
fn test_teardown_is_final() {
    let (mut session, outbox) = session();
    session.handle_event(connected(1));
    session.teardown();
    outbox.clear();

    assert_eq!(
        session.handle_event(live("sub-1-0", 1, 7, "late")),
        ChatUpdate::Ignored
    );
    assert!(!session.request_history(0));
    assert!(!session.send_text("late"));
    assert!(session.store().is_empty());
    assert!(outbox.publishes().is_empty());
    assert!(session.connect(ENDPOINT).is_err());
}
