use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::workflows::withdrawals::domain::{
    Application, ApplicationId, BlockingReason, Booking, BookingId, PlacementApplication,
    PlacementApplicationId, PlacementRequest, PlacementRequestId, SpaceBooking, SpaceBookingId,
    UserRef, WithdrawableEntity, WithdrawableState, WithdrawalContext, WithdrawalTriggeredBy,
};
use crate::workflows::withdrawals::providers::{
    ApplicationStatusProvider, ApplicationWithdrawals, BookingCancellations,
    BookingStatusProvider, PlacementApplicationStatusProvider, PlacementApplicationWithdrawals,
    PlacementRequestStatusProvider, PlacementRequestWithdrawals, ProviderError,
    SpaceBookingCancellations, SpaceBookingStatusProvider, WithdrawalError,
};
use crate::workflows::withdrawals::tree::{WithdrawableTree, WithdrawableTreeNode};

pub(super) fn user() -> UserRef {
    UserRef {
        id: "u-1".to_string(),
        delius_username: "JSMITH".to_string(),
    }
}

pub(super) fn user_context(application_id: &str) -> WithdrawalContext {
    WithdrawalContext {
        triggered_by: WithdrawalTriggeredBy::User(user()),
        triggering_entity: WithdrawableEntity::Application(ApplicationId(
            application_id.to_string(),
        )),
    }
}

pub(super) fn seed_job_context(application_id: &str) -> WithdrawalContext {
    WithdrawalContext {
        triggered_by: WithdrawalTriggeredBy::SeedJob,
        triggering_entity: WithdrawableEntity::Application(ApplicationId(
            application_id.to_string(),
        )),
    }
}

pub(super) fn application(id: &str) -> Application {
    Application {
        id: ApplicationId(id.to_string()),
        crn: format!("X{}", id.to_uppercase()),
        submitted_at: Some(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
                .single()
                .expect("valid timestamp"),
        ),
    }
}

pub(super) fn placement_request(id: &str, application_id: &str) -> PlacementRequest {
    PlacementRequest {
        id: PlacementRequestId(id.to_string()),
        application_id: ApplicationId(application_id.to_string()),
        expected_arrival: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
        duration_days: 84,
    }
}

pub(super) fn placement_application(id: &str, application_id: &str) -> PlacementApplication {
    PlacementApplication {
        id: PlacementApplicationId(id.to_string()),
        application_id: ApplicationId(application_id.to_string()),
        submitted_at: Some(
            Utc.with_ymd_and_hms(2025, 7, 15, 14, 30, 0)
                .single()
                .expect("valid timestamp"),
        ),
    }
}

pub(super) fn booking(id: &str, application_id: &str) -> Booking {
    Booking {
        id: BookingId(id.to_string()),
        application_id: ApplicationId(application_id.to_string()),
        arrival_date: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
        departure_date: NaiveDate::from_ymd_opt(2025, 11, 24).expect("valid date"),
    }
}

pub(super) fn space_booking(id: &str, application_id: &str) -> SpaceBooking {
    SpaceBooking {
        id: SpaceBookingId(id.to_string()),
        application_id: ApplicationId(application_id.to_string()),
        canonical_arrival_date: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
        canonical_departure_date: NaiveDate::from_ymd_opt(2025, 11, 24).expect("valid date"),
    }
}

// --- WithdrawableState shorthands ------------------------------------------

pub(super) fn live() -> WithdrawableState {
    WithdrawableState {
        withdrawn: false,
        withdrawable: true,
        user_may_directly_withdraw: false,
        blocking_reason: None,
    }
}

pub(super) fn live_directly() -> WithdrawableState {
    WithdrawableState {
        user_may_directly_withdraw: true,
        ..live()
    }
}

pub(super) fn withdrawn() -> WithdrawableState {
    WithdrawableState {
        withdrawn: true,
        withdrawable: false,
        user_may_directly_withdraw: false,
        blocking_reason: None,
    }
}

pub(super) fn unwithdrawable() -> WithdrawableState {
    WithdrawableState {
        withdrawn: false,
        withdrawable: false,
        user_may_directly_withdraw: false,
        blocking_reason: None,
    }
}

pub(super) fn blocking(reason: BlockingReason) -> WithdrawableState {
    WithdrawableState {
        blocking_reason: Some(reason),
        ..live()
    }
}

// --- Hand-built tree nodes --------------------------------------------------

pub(super) fn tree(root: WithdrawableTreeNode) -> WithdrawableTree {
    WithdrawableTree { root }
}

pub(super) fn app_node(
    application_id: &str,
    status: WithdrawableState,
    children: Vec<WithdrawableTreeNode>,
) -> WithdrawableTreeNode {
    WithdrawableTreeNode {
        application_id: ApplicationId(application_id.to_string()),
        entity: WithdrawableEntity::Application(ApplicationId(application_id.to_string())),
        status,
        automatic: false,
        children,
    }
}

pub(super) fn pa_node(
    id: &str,
    application_id: &str,
    status: WithdrawableState,
    children: Vec<WithdrawableTreeNode>,
) -> WithdrawableTreeNode {
    WithdrawableTreeNode {
        application_id: ApplicationId(application_id.to_string()),
        entity: WithdrawableEntity::PlacementApplication(PlacementApplicationId(id.to_string())),
        status,
        automatic: false,
        children,
    }
}

pub(super) fn pr_node(
    id: &str,
    application_id: &str,
    status: WithdrawableState,
    automatic: bool,
    children: Vec<WithdrawableTreeNode>,
) -> WithdrawableTreeNode {
    WithdrawableTreeNode {
        application_id: ApplicationId(application_id.to_string()),
        entity: WithdrawableEntity::PlacementRequest(PlacementRequestId(id.to_string())),
        status,
        automatic,
        children,
    }
}

pub(super) fn booking_node(
    id: &str,
    application_id: &str,
    status: WithdrawableState,
) -> WithdrawableTreeNode {
    WithdrawableTreeNode {
        application_id: ApplicationId(application_id.to_string()),
        entity: WithdrawableEntity::Booking(BookingId(id.to_string())),
        status,
        automatic: false,
        children: Vec::new(),
    }
}

pub(super) fn space_node(
    id: &str,
    application_id: &str,
    status: WithdrawableState,
) -> WithdrawableTreeNode {
    WithdrawableTreeNode {
        application_id: ApplicationId(application_id.to_string()),
        entity: WithdrawableEntity::SpaceBooking(SpaceBookingId(id.to_string())),
        status,
        automatic: false,
        children: Vec::new(),
    }
}

// --- In-memory status providers ---------------------------------------------

/// World of entities and per-entity states backing all five status-provider
/// seams, so builder and service specs can run without real services.
#[derive(Default)]
pub(super) struct MemoryWorld {
    pub(super) initial_placement_requests: Vec<PlacementRequest>,
    pub(super) placement_applications: Vec<PlacementApplication>,
    pub(super) requests_by_placement_application: HashMap<String, Vec<PlacementRequest>>,
    pub(super) bookings_by_request: HashMap<String, Vec<Booking>>,
    pub(super) space_bookings_by_request: HashMap<String, Vec<SpaceBooking>>,
    pub(super) states: HashMap<String, WithdrawableState>,
    pub(super) unavailable_states: HashSet<String>,
}

impl MemoryWorld {
    pub(super) fn set_state(&mut self, id: &str, state: WithdrawableState) {
        self.states.insert(id.to_string(), state);
    }

    fn state_of(&self, id: &str) -> Result<WithdrawableState, ProviderError> {
        if self.unavailable_states.contains(id) {
            return Err(ProviderError::Unavailable(format!(
                "status store down for {id}"
            )));
        }
        self.states
            .get(id)
            .copied()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }
}

impl ApplicationStatusProvider for MemoryWorld {
    fn withdrawable_state(
        &self,
        application: &Application,
        _user: &UserRef,
    ) -> Result<WithdrawableState, ProviderError> {
        self.state_of(&application.id.0)
    }

    fn placement_requests_for_initial_dates(
        &self,
        _application: &Application,
    ) -> Result<Vec<PlacementRequest>, ProviderError> {
        Ok(self.initial_placement_requests.clone())
    }
}

impl PlacementApplicationStatusProvider for MemoryWorld {
    fn withdrawable_state(
        &self,
        placement_application: &PlacementApplication,
        _user: &UserRef,
    ) -> Result<WithdrawableState, ProviderError> {
        self.state_of(&placement_application.id.0)
    }

    fn submitted_non_reallocated(
        &self,
        _application: &Application,
    ) -> Result<Vec<PlacementApplication>, ProviderError> {
        Ok(self.placement_applications.clone())
    }

    fn placement_requests(
        &self,
        placement_application: &PlacementApplication,
    ) -> Result<Vec<PlacementRequest>, ProviderError> {
        Ok(self
            .requests_by_placement_application
            .get(&placement_application.id.0)
            .cloned()
            .unwrap_or_default())
    }
}

impl PlacementRequestStatusProvider for MemoryWorld {
    fn withdrawable_state(
        &self,
        placement_request: &PlacementRequest,
        _user: &UserRef,
    ) -> Result<WithdrawableState, ProviderError> {
        self.state_of(&placement_request.id.0)
    }

    fn bookings(
        &self,
        placement_request: &PlacementRequest,
    ) -> Result<Vec<Booking>, ProviderError> {
        Ok(self
            .bookings_by_request
            .get(&placement_request.id.0)
            .cloned()
            .unwrap_or_default())
    }

    fn space_bookings(
        &self,
        placement_request: &PlacementRequest,
    ) -> Result<Vec<SpaceBooking>, ProviderError> {
        Ok(self
            .space_bookings_by_request
            .get(&placement_request.id.0)
            .cloned()
            .unwrap_or_default())
    }
}

impl BookingStatusProvider for MemoryWorld {
    fn withdrawable_state(
        &self,
        booking: &Booking,
        _user: &UserRef,
    ) -> Result<WithdrawableState, ProviderError> {
        self.state_of(&booking.id.0)
    }
}

impl SpaceBookingStatusProvider for MemoryWorld {
    fn withdrawable_state(
        &self,
        space_booking: &SpaceBooking,
        _user: &UserRef,
    ) -> Result<WithdrawableState, ProviderError> {
        self.state_of(&space_booking.id.0)
    }
}

/// The documented worked example: one initial placement request that cannot
/// be withdrawn (with a live space booking), one already-withdrawn placement
/// application whose request carries a withdrawn and a live space booking,
/// and one fully withdrawable placement application.
pub(super) fn scenario_world() -> MemoryWorld {
    let mut world = MemoryWorld::default();

    world.initial_placement_requests = vec![placement_request("pr1", "a1")];
    world.placement_applications = vec![
        placement_application("pa1", "a1"),
        placement_application("pa2", "a1"),
    ];
    world
        .requests_by_placement_application
        .insert("pa1".to_string(), vec![placement_request("pr2", "a1")]);
    world
        .space_bookings_by_request
        .insert("pr1".to_string(), vec![space_booking("sb1", "a1")]);
    world.space_bookings_by_request.insert(
        "pr2".to_string(),
        vec![space_booking("sb2", "a1"), space_booking("sb3", "a1")],
    );

    world.set_state("a1", live_directly());
    world.set_state("pr1", unwithdrawable());
    world.set_state("sb1", live());
    world.set_state("pa1", withdrawn());
    world.set_state("pr2", withdrawn());
    world.set_state("sb2", withdrawn());
    world.set_state("sb3", live());
    world.set_state("pa2", live_directly());

    world
}

/// The documented worked example as an already-built tree, matching what the
/// builder produces from [`scenario_world`].
pub(super) fn scenario_tree() -> WithdrawableTree {
    tree(app_node(
        "a1",
        live_directly(),
        vec![
            pr_node(
                "pr1",
                "a1",
                unwithdrawable(),
                true,
                vec![space_node("sb1", "a1", live())],
            ),
            pa_node(
                "pa1",
                "a1",
                withdrawn(),
                vec![pr_node(
                    "pr2",
                    "a1",
                    withdrawn(),
                    false,
                    vec![
                        space_node("sb2", "a1", withdrawn()),
                        space_node("sb3", "a1", live()),
                    ],
                )],
            ),
            pa_node("pa2", "a1", live_directly(), vec![]),
        ],
    ))
}

// --- Recording withdrawal collaborators -------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum DispatchCall {
    Application(String),
    PlacementApplication(String),
    PlacementRequest(String),
    BookingCancellation { id: String, note: String },
    SpaceBookingCancellation { id: String, note: String },
}

/// Implements every withdrawal-dispatch seam, recording calls and contexts
/// and failing for configured entity ids.
#[derive(Default)]
pub(super) struct RecordingWithdrawals {
    calls: Mutex<Vec<DispatchCall>>,
    contexts: Mutex<Vec<WithdrawalContext>>,
    fail_ids: HashSet<String>,
}

impl RecordingWithdrawals {
    pub(super) fn failing(ids: &[&str]) -> Self {
        Self {
            fail_ids: ids.iter().map(|id| id.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> Vec<DispatchCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(super) fn contexts(&self) -> Vec<WithdrawalContext> {
        self.contexts.lock().expect("contexts lock").clone()
    }

    fn record(
        &self,
        call: DispatchCall,
        context: &WithdrawalContext,
        id: &str,
    ) -> Result<(), WithdrawalError> {
        self.calls.lock().expect("calls lock").push(call);
        self.contexts
            .lock()
            .expect("contexts lock")
            .push(context.clone());
        if self.fail_ids.contains(id) {
            Err(WithdrawalError::General(format!(
                "downstream failure for {id}"
            )))
        } else {
            Ok(())
        }
    }
}

impl ApplicationWithdrawals for RecordingWithdrawals {
    fn withdraw(
        &self,
        id: &ApplicationId,
        context: &WithdrawalContext,
    ) -> Result<(), WithdrawalError> {
        self.record(DispatchCall::Application(id.0.clone()), context, &id.0)
    }
}

impl PlacementApplicationWithdrawals for RecordingWithdrawals {
    fn withdraw(
        &self,
        id: &PlacementApplicationId,
        context: &WithdrawalContext,
    ) -> Result<(), WithdrawalError> {
        self.record(
            DispatchCall::PlacementApplication(id.0.clone()),
            context,
            &id.0,
        )
    }
}

impl PlacementRequestWithdrawals for RecordingWithdrawals {
    fn withdraw(
        &self,
        id: &PlacementRequestId,
        context: &WithdrawalContext,
    ) -> Result<(), WithdrawalError> {
        // Placement-request withdrawal must be attributable to a real user.
        if context.user().is_none() {
            return Err(WithdrawalError::UnsupportedTrigger);
        }
        self.record(DispatchCall::PlacementRequest(id.0.clone()), context, &id.0)
    }
}

impl BookingCancellations for RecordingWithdrawals {
    fn create_cancellation(
        &self,
        id: &BookingId,
        note: &str,
        context: &WithdrawalContext,
    ) -> Result<(), WithdrawalError> {
        self.record(
            DispatchCall::BookingCancellation {
                id: id.0.clone(),
                note: note.to_string(),
            },
            context,
            &id.0,
        )
    }
}

impl SpaceBookingCancellations for RecordingWithdrawals {
    fn create_cancellation(
        &self,
        id: &SpaceBookingId,
        note: &str,
        context: &WithdrawalContext,
    ) -> Result<(), WithdrawalError> {
        self.record(
            DispatchCall::SpaceBookingCancellation {
                id: id.0.clone(),
                note: note.to_string(),
            },
            context,
            &id.0,
        )
    }
}
