//! Pure computations over the entity stores. Recomputed from scratch on every
//! reconciliation pass; nothing here is patched incrementally.

use shared::{
    domain::{RequestId, SessionContext, UserId},
    protocol::{Instructor, Request},
};

use crate::store::{Entity, EntityStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedState {
    pub request_count: usize,
    pub my_request: Option<RequestId>,
    /// `None` for non-instructor viewers.
    pub am_i_online: Option<bool>,
    pub queue_pop_enabled: bool,
}

impl DerivedState {
    pub fn compute(
        requests: &EntityStore<Request>,
        instructors: &EntityStore<Instructor>,
        session: &SessionContext,
    ) -> Self {
        let request_count = request_count(requests);
        let my_request = my_request(requests, session.current_user_id).map(|request| request.id);
        let am_i_online = session
            .current_user_is_instructor
            .then(|| am_i_online(instructors, session.current_user_id));

        Self {
            request_count,
            my_request,
            am_i_online,
            queue_pop_enabled: request_count > 0,
        }
    }
}

pub fn request_count(requests: &EntityStore<Request>) -> usize {
    requests.all().filter(|request| request.is_countable()).count()
}

/// The viewer's own request. Duplicates resolve to the most recently inserted
/// one.
pub fn my_request(requests: &EntityStore<Request>, current_user_id: UserId) -> Option<&Request> {
    requests
        .all()
        .rev()
        .find(|request| request.requester_id == current_user_id)
}

/// Outstanding requests owned by `current_user_id`; more than one is an anomaly.
pub fn own_request_count(requests: &EntityStore<Request>, current_user_id: UserId) -> usize {
    requests
        .all()
        .filter(|request| request.requester_id == current_user_id)
        .count()
}

pub fn am_i_online(instructors: &EntityStore<Instructor>, current_user_id: UserId) -> bool {
    instructors.contains(current_user_id)
}

#[cfg(test)]
#[path = "tests/derive_tests.rs"]
mod tests;
