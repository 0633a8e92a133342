use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for Approved Premises applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for placement requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementRequestId(pub String);

/// Identifier wrapper for placement applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementApplicationId(pub String);

/// Identifier wrapper for legacy bookings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

/// Identifier wrapper for space bookings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceBookingId(pub String);

/// The acting user a withdrawal is evaluated and attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub delius_username: String,
}

/// Snapshot of an application as the tree builder needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub crn: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// A request for placement, either raised from the application's initial
/// dates or from a later placement application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub id: PlacementRequestId,
    pub application_id: ApplicationId,
    pub expected_arrival: NaiveDate,
    pub duration_days: u32,
}

/// A submitted request for additional placement dates on an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementApplication {
    pub id: PlacementApplicationId,
    pub application_id: ApplicationId,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Legacy booking record attached to a placement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub application_id: ApplicationId,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
}

/// Current-generation booking record attached to a placement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceBooking {
    pub id: SpaceBookingId,
    pub application_id: ApplicationId,
    pub canonical_arrival_date: NaiveDate,
    pub canonical_departure_date: NaiveDate,
}

/// The entity kinds that can appear in a withdrawable tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawableEntityType {
    Application,
    PlacementRequest,
    PlacementApplication,
    Booking,
    SpaceBooking,
}

impl WithdrawableEntityType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Application => "Application",
            Self::PlacementRequest => "PlacementRequest",
            Self::PlacementApplication => "PlacementApplication",
            Self::Booking => "Booking",
            Self::SpaceBooking => "SpaceBooking",
        }
    }
}

/// An entity reference pairing the kind with its typed identifier, so the
/// cascade can dispatch by exhaustive match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum WithdrawableEntity {
    Application(ApplicationId),
    PlacementRequest(PlacementRequestId),
    PlacementApplication(PlacementApplicationId),
    Booking(BookingId),
    SpaceBooking(SpaceBookingId),
}

impl WithdrawableEntity {
    pub const fn entity_type(&self) -> WithdrawableEntityType {
        match self {
            Self::Application(_) => WithdrawableEntityType::Application,
            Self::PlacementRequest(_) => WithdrawableEntityType::PlacementRequest,
            Self::PlacementApplication(_) => WithdrawableEntityType::PlacementApplication,
            Self::Booking(_) => WithdrawableEntityType::Booking,
            Self::SpaceBooking(_) => WithdrawableEntityType::SpaceBooking,
        }
    }

    pub fn entity_id(&self) -> &str {
        match self {
            Self::Application(id) => &id.0,
            Self::PlacementRequest(id) => &id.0,
            Self::PlacementApplication(id) => &id.0,
            Self::Booking(id) => &id.0,
            Self::SpaceBooking(id) => &id.0,
        }
    }
}

/// A condition on an entity that prevents cascade withdrawal of itself and
/// every ancestor on its branch. The tree core treats reasons opaquely;
/// only the labels and notes here know what each one means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingReason {
    ArrivalRecordedInCas1,
    ArrivalRecordedInDelius,
}

impl BlockingReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ArrivalRecordedInCas1 => "ArrivalRecordedInCas1",
            Self::ArrivalRecordedInDelius => "ArrivalRecordedInDelius",
        }
    }

    pub const fn note(self) -> &'static str {
        match self {
            Self::ArrivalRecordedInCas1 => {
                "1 or more placements cannot be withdrawn as they have an arrival"
            }
            Self::ArrivalRecordedInDelius => {
                "1 or more placements cannot be withdrawn as they have an arrival recorded in Delius"
            }
        }
    }
}

/// Withdrawability of a single entity, as reported by its owning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawableState {
    /// The entity is already withdrawn.
    pub withdrawn: bool,
    /// The entity's state currently permits withdrawal, permissions aside.
    pub withdrawable: bool,
    /// The acting user may withdraw this entity directly, not merely as a
    /// cascade side effect.
    pub user_may_directly_withdraw: bool,
    pub blocking_reason: Option<BlockingReason>,
}

impl WithdrawableState {
    /// Ancestors of an entity in this state must not be cascade-withdrawn.
    pub const fn blocks_ancestor_withdrawals(&self) -> bool {
        self.blocking_reason.is_some()
    }
}

/// The actor a withdrawal is attributed to. Some downstream operations
/// require a concrete user and reject seed-job or system triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WithdrawalTriggeredBy {
    User(UserRef),
    SeedJob,
    System,
}

/// Carried unchanged through every cascaded operation so downstream services
/// can tell a direct request from a cascade and attribute both to the same
/// triggering actor and entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalContext {
    pub triggered_by: WithdrawalTriggeredBy,
    pub triggering_entity: WithdrawableEntity,
}

impl WithdrawalContext {
    pub fn user(&self) -> Option<&UserRef> {
        match &self.triggered_by {
            WithdrawalTriggeredBy::User(user) => Some(user),
            WithdrawalTriggeredBy::SeedJob | WithdrawalTriggeredBy::System => None,
        }
    }
}
