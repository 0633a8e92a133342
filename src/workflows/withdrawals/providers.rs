use super::domain::{
    Application, ApplicationId, Booking, BookingId, PlacementApplication, PlacementApplicationId,
    PlacementRequest, PlacementRequestId, SpaceBooking, SpaceBookingId, UserRef, WithdrawableState,
    WithdrawalContext,
};

/// Failure from a status-provider query. Any provider error aborts tree
/// construction; there are no partial trees.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("entity not found: {0}")]
    NotFound(String),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Status queries owned by the application service.
pub trait ApplicationStatusProvider: Send + Sync {
    fn withdrawable_state(
        &self,
        application: &Application,
        user: &UserRef,
    ) -> Result<WithdrawableState, ProviderError>;

    /// Placement requests raised for the application's initial requested
    /// dates, i.e. not tied to any later placement application.
    fn placement_requests_for_initial_dates(
        &self,
        application: &Application,
    ) -> Result<Vec<PlacementRequest>, ProviderError>;
}

/// Status queries owned by the placement-application service.
pub trait PlacementApplicationStatusProvider: Send + Sync {
    fn withdrawable_state(
        &self,
        placement_application: &PlacementApplication,
        user: &UserRef,
    ) -> Result<WithdrawableState, ProviderError>;

    /// Submitted, non-reallocated placement applications for an application.
    fn submitted_non_reallocated(
        &self,
        application: &Application,
    ) -> Result<Vec<PlacementApplication>, ProviderError>;

    fn placement_requests(
        &self,
        placement_application: &PlacementApplication,
    ) -> Result<Vec<PlacementRequest>, ProviderError>;
}

/// Status queries owned by the placement-request service.
pub trait PlacementRequestStatusProvider: Send + Sync {
    fn withdrawable_state(
        &self,
        placement_request: &PlacementRequest,
        user: &UserRef,
    ) -> Result<WithdrawableState, ProviderError>;

    fn bookings(
        &self,
        placement_request: &PlacementRequest,
    ) -> Result<Vec<Booking>, ProviderError>;

    /// Space bookings of the currently active placement only. Transfer
    /// chains produce further space bookings that are not tree children.
    fn space_bookings(
        &self,
        placement_request: &PlacementRequest,
    ) -> Result<Vec<SpaceBooking>, ProviderError>;
}

/// Status queries owned by the legacy booking service.
pub trait BookingStatusProvider: Send + Sync {
    fn withdrawable_state(
        &self,
        booking: &Booking,
        user: &UserRef,
    ) -> Result<WithdrawableState, ProviderError>;
}

/// Status queries owned by the space-booking service.
pub trait SpaceBookingStatusProvider: Send + Sync {
    fn withdrawable_state(
        &self,
        space_booking: &SpaceBooking,
        user: &UserRef,
    ) -> Result<WithdrawableState, ProviderError>;
}

/// Failure of a single dispatched withdrawal. These are recoverable at the
/// cascade level: they are logged and accumulated, never aborting the walk.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum WithdrawalError {
    #[error("user is not authorised to withdraw this entity")]
    Unauthorised,
    #[error("this withdrawal must be triggered by a concrete user")]
    UnsupportedTrigger,
    #[error("withdrawal rejected: {0}")]
    Validation(String),
    #[error("{0}")]
    General(String),
}

/// Root-application withdrawal, invoked by the service facade before any
/// descendants are cascaded. The cascade itself never targets applications.
pub trait ApplicationWithdrawals: Send + Sync {
    fn withdraw(
        &self,
        id: &ApplicationId,
        context: &WithdrawalContext,
    ) -> Result<(), WithdrawalError>;
}

pub trait PlacementApplicationWithdrawals: Send + Sync {
    fn withdraw(
        &self,
        id: &PlacementApplicationId,
        context: &WithdrawalContext,
    ) -> Result<(), WithdrawalError>;
}

pub trait PlacementRequestWithdrawals: Send + Sync {
    fn withdraw(
        &self,
        id: &PlacementRequestId,
        context: &WithdrawalContext,
    ) -> Result<(), WithdrawalError>;
}

pub trait BookingCancellations: Send + Sync {
    fn create_cancellation(
        &self,
        id: &BookingId,
        note: &str,
        context: &WithdrawalContext,
    ) -> Result<(), WithdrawalError>;
}

pub trait SpaceBookingCancellations: Send + Sync {
    fn create_cancellation(
        &self,
        id: &SpaceBookingId,
        note: &str,
        context: &WithdrawalContext,
    ) -> Result<(), WithdrawalError>;
}
