use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(RequestId);
id_newtype!(QueueId);

/// Identity of the viewer, resolved before the first reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub current_user_id: UserId,
    pub current_user_is_instructor: bool,
}

impl SessionContext {
    pub fn student(current_user_id: UserId) -> Self {
        Self {
            current_user_id,
            current_user_is_instructor: false,
        }
    }

    pub fn instructor(current_user_id: UserId) -> Self {
        Self {
            current_user_id,
            current_user_is_instructor: true,
        }
    }
}
