//! Withdrawable-tree construction and cascade withdrawal for Approved
//! Premises applications.
//!
//! The tree is a read-only snapshot of everything depending on one
//! application; the cascade walks it top-down and withdraws every eligible
//! descendant through the owning services' collaborators, leaving blocked
//! branches in place.

pub mod builder;
pub mod domain;
pub mod operations;
pub mod providers;
pub mod service;
pub mod tree;

#[cfg(test)]
mod tests;

pub use builder::WithdrawableTreeBuilder;
pub use domain::{
    Application, ApplicationId, BlockingReason, Booking, BookingId, PlacementApplication,
    PlacementApplicationId, PlacementRequest, PlacementRequestId, SpaceBooking, SpaceBookingId,
    UserRef, WithdrawableEntity, WithdrawableEntityType, WithdrawableState, WithdrawalContext,
    WithdrawalTriggeredBy,
};
pub use operations::{
    CascadeError, CascadeReport, SkipReason, WithdrawableTreeOperations, AUTO_WITHDRAWAL_NOTE,
    MAX_CASCADE_DESCENDANTS,
};
pub use providers::{ProviderError, WithdrawalError};
pub use service::{ApplicationWithdrawalOutcome, WithdrawalService, WithdrawalServiceError};
pub use tree::{WithdrawableTree, WithdrawableTreeNode};
