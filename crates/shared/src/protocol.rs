use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{RequestId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub name: String,
    pub email: String,
    pub avatar_url: String,
}

/// One pending help request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub requester_id: UserId,
    pub requester: Requester,
    pub location: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// An online instructor. `id` is the instructor's user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub id: UserId,
    pub name: String,
    pub avatar_url: String,
}

/// Messages delivered by the push channel for a single queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum QueueEvent {
    RequestCreated(Request),
    RequestRemoved { id: RequestId },
    InstructorOnline(Instructor),
    InstructorOffline { id: UserId },
}

impl QueueEvent {
    pub fn name(&self) -> &'static str {
        match self {
            QueueEvent::RequestCreated(_) => "request_created",
            QueueEvent::RequestRemoved { .. } => "request_removed",
            QueueEvent::InstructorOnline(_) => "instructor_online",
            QueueEvent::InstructorOffline { .. } => "instructor_offline",
        }
    }
}

/// Actions sent upstream over the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum QueueAction {
    CreateRequest {
        location: String,
        description: String,
    },
    UpdateRequest {
        id: RequestId,
        location: String,
        description: String,
    },
    CancelRequest {
        id: RequestId,
    },
    QueuePop,
    InstructorStatusToggle {
        online: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_request_created_from_wire_shape() {
        let raw = r#"{
            "kind": "RequestCreated",
            "payload": {
                "id": 41,
                "requester_id": 7,
                "requester": {
                    "name": "Mary Smith",
                    "email": "marysmith@umich.edu",
                    "avatar_url": "https://example.test/mary.png"
                },
                "location": "BBB 1670",
                "description": "segfault in part 2",
                "created_at": "2026-02-02T15:04:05.000Z"
            }
        }"#;

        let event: QueueEvent = serde_json::from_str(raw).expect("decode");
        let QueueEvent::RequestCreated(request) = event else {
            panic!("unexpected variant");
        };
        assert_eq!(request.id, RequestId(41));
        assert_eq!(request.requester_id, UserId(7));
        assert_eq!(request.requester.email, "marysmith@umich.edu");
    }

    #[test]
    fn removal_payload_carries_only_the_id() {
        let event: QueueEvent =
            serde_json::from_str(r#"{"kind":"InstructorOffline","payload":{"id":3}}"#)
                .expect("decode");
        assert_eq!(event, QueueEvent::InstructorOffline { id: UserId(3) });
    }

    #[test]
    fn actions_use_snake_case_tags() {
        let encoded = serde_json::to_value(QueueAction::InstructorStatusToggle { online: true })
            .expect("encode");
        assert_eq!(
            encoded,
            serde_json::json!({"action": "instructor_status_toggle", "data": {"online": true}})
        );

        let encoded = serde_json::to_value(QueueAction::QueuePop).expect("encode");
        assert_eq!(encoded, serde_json::json!({"action": "queue_pop"}));
    }
}
