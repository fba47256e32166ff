//! The reconciliation engine: every mutation updates the entity stores, then a
//! single idempotent pass brings the presentation surface back in line with
//! them.

use shared::{
    domain::{RequestId, SessionContext, UserId},
    protocol::{Instructor, QueueAction, QueueEvent, Request},
};
use tracing::{debug, info, warn};

use crate::{
    derive::{my_request, own_request_count, DerivedState},
    error::SyncError,
    projector::{
        region, template, Binding, EntityRef, ProjectionMode, Surface, INSTRUCTOR_FLAG,
    },
    store::EntityStore,
};

/// Something the viewer asked for from the page controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    SubmitRequest { location: String, description: String },
    UpdateMyRequest { location: String, description: String },
    CancelMyRequest,
    PopQueue,
    ToggleStatus,
}

pub struct ReconciliationEngine {
    session: SessionContext,
    requests: EntityStore<Request>,
    instructors: EntityStore<Instructor>,
    surface: Surface,
}

impl ReconciliationEngine {
    /// Validates the surface's assets and runs the first pass.
    pub fn new(session: SessionContext, surface: Surface) -> Result<Self, SyncError> {
        surface.validate()?;
        let mut engine = Self {
            session,
            requests: EntityStore::new(),
            instructors: EntityStore::new(),
            surface,
        };
        engine.refresh()?;
        Ok(engine)
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn requests(&self) -> &EntityStore<Request> {
        &self.requests
    }

    pub fn derived(&self) -> DerivedState {
        DerivedState::compute(&self.requests, &self.instructors, &self.session)
    }

    pub fn dispatch(&mut self, event: QueueEvent) -> Result<(), SyncError> {
        debug!(event = event.name(), "queue: dispatching event");
        match event {
            QueueEvent::RequestCreated(request) => self.on_request_created(request),
            QueueEvent::RequestRemoved { id } => self.on_request_removed(id),
            QueueEvent::InstructorOnline(instructor) => self.on_instructor_online(instructor),
            QueueEvent::InstructorOffline { id } => self.on_instructor_offline(id),
        }
    }

    pub fn on_request_created(&mut self, request: Request) -> Result<(), SyncError> {
        self.requests.insert(request.clone());

        // The first real row displaces the empty placeholder.
        let mode = if self.surface.countable_rows(region::REQUESTS) > 0 {
            ProjectionMode::Append
        } else {
            ProjectionMode::Replace
        };
        let binding = Binding::request(&request)
            .with_flag(INSTRUCTOR_FLAG, self.session.current_user_is_instructor);
        let projected = self
            .surface
            .project(template::REQUEST, region::REQUESTS, mode, binding);

        // Re-creating an older own request must not steal the panel from the
        // newest one.
        let current = self.session.current_user_id;
        let projected = projected.and_then(|_| {
            if request.requester_id != current {
                return Ok(());
            }
            let owned = own_request_count(&self.requests, current);
            if owned > 1 {
                let anomaly = SyncError::DuplicateOwnRequest {
                    requester_id: current,
                    count: owned,
                };
                warn!(
                    requester_id = current.0,
                    request_id = request.id.0,
                    "{anomaly}; showing the most recent one"
                );
            }
            match my_request(&self.requests, current).cloned() {
                Some(mine) => self.project_my_request(&mine),
                None => Ok(()),
            }
        });

        self.finish(projected)
    }

    pub fn on_request_removed(&mut self, id: RequestId) -> Result<(), SyncError> {
        let removed = self.requests.remove(id);
        if removed.is_none() {
            warn!(request_id = id.0, "queue: removal for unknown request");
        }
        self.surface.delete_by_id(EntityRef::Request(id));

        // Another own request may still be outstanding; show that one instead.
        let mut projected = Ok(());
        if removed.is_some_and(|request| request.requester_id == self.session.current_user_id) {
            if let Some(next) = my_request(&self.requests, self.session.current_user_id).cloned() {
                projected = self.project_my_request(&next);
            }
        }

        self.finish(projected)
    }

    pub fn on_instructor_online(&mut self, instructor: Instructor) -> Result<(), SyncError> {
        self.instructors.insert(instructor.clone());
        let projected = self
            .surface
            .project(
                template::INSTRUCTOR,
                region::INSTRUCTORS,
                ProjectionMode::Append,
                Binding::instructor(&instructor),
            )
            .map(|_| ());

        self.finish(projected)
    }

    pub fn on_instructor_offline(&mut self, id: UserId) -> Result<(), SyncError> {
        if self.instructors.remove(id).is_none() {
            warn!(instructor_id = id.0, "queue: offline event for unknown instructor");
        }
        self.surface.delete_by_id(EntityRef::Instructor(id));
        self.refresh()
    }

    /// Re-runs the reconciliation pass without mutating the stores.
    pub fn refresh(&mut self) -> Result<(), SyncError> {
        let result = self.fixup();
        self.surface.enable_page();
        result
    }

    pub fn show_message(&mut self, header: &str, text: &str) -> Result<(), SyncError> {
        self.surface
            .project(
                template::MESSAGE,
                region::MESSAGES,
                ProjectionMode::Append,
                Binding::message(header, text),
            )
            .map(|_| ())
    }

    pub fn disable_page(&mut self) {
        self.surface.disable_page();
    }

    /// Turns an intent into the action to send upstream, or `None` when the
    /// current state does not allow it. An accepted intent leaves the page
    /// disabled until the echoed event is reconciled.
    pub fn prepare(&mut self, intent: UserIntent) -> Option<QueueAction> {
        let derived = self.derived();
        let is_instructor = self.session.current_user_is_instructor;

        let action = match intent {
            UserIntent::SubmitRequest {
                location,
                description,
            } if !is_instructor && derived.my_request.is_none() => {
                Some(QueueAction::CreateRequest {
                    location,
                    description,
                })
            }
            UserIntent::UpdateMyRequest {
                location,
                description,
            } => derived.my_request.map(|id| QueueAction::UpdateRequest {
                id,
                location,
                description,
            }),
            UserIntent::CancelMyRequest => derived
                .my_request
                .map(|id| QueueAction::CancelRequest { id }),
            UserIntent::PopQueue if is_instructor && derived.queue_pop_enabled => {
                Some(QueueAction::QueuePop)
            }
            UserIntent::ToggleStatus if is_instructor => {
                Some(QueueAction::InstructorStatusToggle {
                    online: !derived.am_i_online.unwrap_or(false),
                })
            }
            _ => None,
        };

        match &action {
            Some(action) => {
                info!(?action, "queue: sending action");
                self.surface.disable_page();
            }
            None => debug!("queue: intent not applicable in current state"),
        }
        action
    }

    fn project_my_request(&mut self, request: &Request) -> Result<(), SyncError> {
        self.surface
            .project(
                template::MY_REQUEST,
                region::ACTION_CONTENT,
                ProjectionMode::Replace,
                Binding::my_request(request),
            )
            .map(|_| ())
    }

    /// Runs the pass even when the handler's own projection failed, so the
    /// page is always left enabled; the first error wins.
    fn finish(&mut self, projected: Result<(), SyncError>) -> Result<(), SyncError> {
        let reconciled = self.refresh();
        projected.and(reconciled)
    }

    fn fixup(&mut self) -> Result<(), SyncError> {
        let derived = self.derived();

        if derived.request_count == 0 {
            self.surface.project(
                template::EMPTY,
                region::REQUESTS,
                ProjectionMode::Replace,
                Binding::placeholder(),
            )?;
        }

        self.surface
            .set_text(region::REQUESTS_COUNT, derived.request_count.to_string())?;

        if self.session.current_user_is_instructor {
            self.surface.project(
                template::INSTRUCTOR_FORM,
                region::ACTION_CONTENT,
                ProjectionMode::Replace,
                Binding::none(),
            )?;
            self.surface
                .set_instructor_status(derived.am_i_online.unwrap_or(false));
        } else if derived.my_request.is_none() {
            self.surface.project(
                template::HELP_REQUEST_FORM,
                region::ACTION_CONTENT,
                ProjectionMode::Replace,
                Binding::none(),
            )?;
        }

        self.surface.toggle_queue_pop(derived.queue_pop_enabled);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
