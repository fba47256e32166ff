use queue_core::{projector::region, Surface, UserIntent};
use shared::{
    domain::{SessionContext, UserId},
    protocol::{Instructor, QueueEvent},
};
use tokio::net::TcpListener;

use super::*;

fn instructor_engine() -> ReconciliationEngine {
    ReconciliationEngine::new(SessionContext::instructor(UserId(3)), Surface::default())
        .expect("engine")
}

#[tokio::test]
async fn unreachable_push_server_leaves_a_message_and_no_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let mut engine = instructor_engine();
    let connection = connect_or_degrade(&mut engine, &format!("http://{addr}"), QueueId(5))
        .await
        .expect("degrades");

    assert!(connection.is_none());
    let messages = engine.surface().region_text(region::MESSAGES);
    assert!(messages.starts_with(LIVE_UPDATES), "messages: {messages}");
    assert!(!engine.surface().controls().loading);
}

#[test]
fn events_are_dispatched_and_keep_the_loop_going() {
    let mut engine = instructor_engine();
    let event = QueueEvent::InstructorOnline(Instructor {
        id: UserId(3),
        name: "Ada".to_string(),
        avatar_url: "https://example.test/ada.png".to_string(),
    });

    let flow = apply_message(&mut engine, Some(TransportMessage::Event(event))).expect("applied");

    assert_eq!(flow, Flow::Continue);
    assert_eq!(engine.derived().am_i_online, Some(true));
    assert!(engine.surface().region_text(region::INSTRUCTORS).contains("Ada"));
}

#[test]
fn undecodable_frames_surface_as_messages() {
    let mut engine = instructor_engine();

    let flow = apply_message(
        &mut engine,
        Some(TransportMessage::Error("invalid queue event: eof".to_string())),
    )
    .expect("applied");

    assert_eq!(flow, Flow::Continue);
    assert!(engine
        .surface()
        .render_text()
        .contains("invalid queue event: eof"));
}

#[test]
fn closed_channel_disconnects_without_ending_the_session() {
    let mut engine = instructor_engine();

    assert_eq!(
        apply_message(&mut engine, Some(TransportMessage::Closed)).expect("closed"),
        Flow::Disconnected
    );
    assert_eq!(
        apply_message(&mut engine, None).expect("dropped"),
        Flow::Disconnected
    );
    assert_eq!(engine.surface().region_nodes(region::MESSAGES).len(), 2);
}

#[tokio::test]
async fn actions_without_a_connection_report_and_reenable_the_page() {
    let mut engine = instructor_engine();
    let action = engine.prepare(UserIntent::ToggleStatus).expect("allowed");
    assert!(engine.surface().controls().loading);

    let sent = send_action(&mut engine, None, action).await.expect("reported");

    assert!(!sent);
    assert!(!engine.surface().controls().loading);
    assert!(engine
        .surface()
        .region_text(region::MESSAGES)
        .contains("Action failed: live updates are off"));
}
