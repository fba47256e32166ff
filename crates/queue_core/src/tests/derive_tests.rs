use super::*;
use crate::fixtures::{instructor, request};

#[test]
fn count_matches_number_of_requests() {
    let mut requests = EntityStore::new();
    assert_eq!(request_count(&requests), 0);

    for id in 1..=7 {
        requests.insert(request(id, 100 + id));
    }
    requests.insert(request(3, 103));
    assert_eq!(request_count(&requests), 7);

    requests.remove(RequestId(4));
    assert_eq!(request_count(&requests), 6);
}

#[test]
fn my_request_picks_most_recent_of_duplicates() {
    let mut requests = EntityStore::new();
    requests.insert(request(1, 7));
    requests.insert(request(2, 8));
    requests.insert(request(3, 7));

    let mine = my_request(&requests, UserId(7)).expect("own request");
    assert_eq!(mine.id, RequestId(3));

    // Deterministic across repeated calls.
    let again = my_request(&requests, UserId(7)).expect("own request");
    assert_eq!(again.id, RequestId(3));
}

#[test]
fn own_request_count_sees_every_duplicate() {
    let mut requests = EntityStore::new();
    assert_eq!(own_request_count(&requests, UserId(7)), 0);

    requests.insert(request(1, 7));
    requests.insert(request(2, 8));
    requests.insert(request(3, 7));
    requests.insert(request(1, 7));
    assert_eq!(own_request_count(&requests, UserId(7)), 2);
    assert_eq!(own_request_count(&requests, UserId(8)), 1);
}

#[test]
fn my_request_is_none_without_a_match() {
    let mut requests = EntityStore::new();
    requests.insert(request(1, 7));
    assert!(my_request(&requests, UserId(9)).is_none());
}

#[test]
fn presence_is_store_membership() {
    let mut instructors = EntityStore::new();
    assert!(!am_i_online(&instructors, UserId(3)));

    instructors.insert(instructor(3));
    assert!(am_i_online(&instructors, UserId(3)));

    instructors.remove(UserId(3));
    assert!(!am_i_online(&instructors, UserId(3)));
}

#[test]
fn derived_state_is_role_dependent() {
    let mut requests = EntityStore::new();
    let mut instructors = EntityStore::new();
    requests.insert(request(1, 3));
    instructors.insert(instructor(3));

    let as_student = DerivedState::compute(&requests, &instructors, &SessionContext::student(UserId(3)));
    assert_eq!(as_student.my_request, Some(RequestId(1)));
    assert_eq!(as_student.am_i_online, None);
    assert!(as_student.queue_pop_enabled);

    let as_instructor =
        DerivedState::compute(&requests, &instructors, &SessionContext::instructor(UserId(3)));
    assert_eq!(as_instructor.my_request, Some(RequestId(1)));
    assert_eq!(as_instructor.am_i_online, Some(true));
    assert_eq!(as_instructor.request_count, 1);
}
