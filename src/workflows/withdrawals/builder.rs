use std::sync::Arc;

use super::domain::{
    Application, PlacementApplication, PlacementRequest, UserRef, WithdrawableEntity,
};
use super::providers::{
    ApplicationStatusProvider, BookingStatusProvider, PlacementApplicationStatusProvider,
    PlacementRequestStatusProvider, ProviderError, SpaceBookingStatusProvider,
};
use super::tree::{WithdrawableTree, WithdrawableTreeNode};

/// Assembles the full withdrawable tree for an application by querying each
/// entity's status provider. Pure read; a tree is a point-in-time snapshot.
pub struct WithdrawableTreeBuilder {
    applications: Arc<dyn ApplicationStatusProvider>,
    placement_applications: Arc<dyn PlacementApplicationStatusProvider>,
    placement_requests: Arc<dyn PlacementRequestStatusProvider>,
    bookings: Arc<dyn BookingStatusProvider>,
    space_bookings: Arc<dyn SpaceBookingStatusProvider>,
}

impl WithdrawableTreeBuilder {
    pub fn new(
        applications: Arc<dyn ApplicationStatusProvider>,
        placement_applications: Arc<dyn PlacementApplicationStatusProvider>,
        placement_requests: Arc<dyn PlacementRequestStatusProvider>,
        bookings: Arc<dyn BookingStatusProvider>,
        space_bookings: Arc<dyn SpaceBookingStatusProvider>,
    ) -> Self {
        Self {
            applications,
            placement_applications,
            placement_requests,
            bookings,
            space_bookings,
        }
    }

    /// Build the tree rooted at `application` as seen by `user`.
    ///
    /// Child order is a contract: placement requests for the application's
    /// initial dates first (provider order), then submitted non-reallocated
    /// placement applications (provider order), each carrying its own
    /// placement requests in list order, each carrying its bookings and then
    /// space bookings in list order. Any provider error aborts the build.
    pub fn tree_for_app(
        &self,
        application: &Application,
        user: &UserRef,
    ) -> Result<WithdrawableTree, ProviderError> {
        let status = self.applications.withdrawable_state(application, user)?;

        let mut children = Vec::new();
        for placement_request in self
            .applications
            .placement_requests_for_initial_dates(application)?
        {
            children.push(self.placement_request_node(&placement_request, user, true)?);
        }
        for placement_application in self
            .placement_applications
            .submitted_non_reallocated(application)?
        {
            children.push(self.placement_application_node(&placement_application, user)?);
        }

        Ok(WithdrawableTree {
            root: WithdrawableTreeNode {
                application_id: application.id.clone(),
                entity: WithdrawableEntity::Application(application.id.clone()),
                status,
                automatic: false,
                children,
            },
        })
    }

    fn placement_application_node(
        &self,
        placement_application: &PlacementApplication,
        user: &UserRef,
    ) -> Result<WithdrawableTreeNode, ProviderError> {
        let status = self
            .placement_applications
            .withdrawable_state(placement_application, user)?;

        let mut children = Vec::new();
        for placement_request in self
            .placement_applications
            .placement_requests(placement_application)?
        {
            children.push(self.placement_request_node(&placement_request, user, false)?);
        }

        Ok(WithdrawableTreeNode {
            application_id: placement_application.application_id.clone(),
            entity: WithdrawableEntity::PlacementApplication(placement_application.id.clone()),
            status,
            automatic: false,
            children,
        })
    }

    fn placement_request_node(
        &self,
        placement_request: &PlacementRequest,
        user: &UserRef,
        automatic: bool,
    ) -> Result<WithdrawableTreeNode, ProviderError> {
        let status = self
            .placement_requests
            .withdrawable_state(placement_request, user)?;

        let mut children = Vec::new();
        for booking in self.placement_requests.bookings(placement_request)? {
            let status = self.bookings.withdrawable_state(&booking, user)?;
            children.push(WithdrawableTreeNode {
                application_id: booking.application_id.clone(),
                entity: WithdrawableEntity::Booking(booking.id.clone()),
                status,
                automatic: false,
                children: Vec::new(),
            });
        }
        for space_booking in self.placement_requests.space_bookings(placement_request)? {
            let status = self.space_bookings.withdrawable_state(&space_booking, user)?;
            children.push(WithdrawableTreeNode {
                application_id: space_booking.application_id.clone(),
                entity: WithdrawableEntity::SpaceBooking(space_booking.id.clone()),
                status,
                automatic: false,
                children: Vec::new(),
            });
        }

        Ok(WithdrawableTreeNode {
            application_id: placement_request.application_id.clone(),
            entity: WithdrawableEntity::PlacementRequest(placement_request.id.clone()),
            status,
            automatic,
            children,
        })
    }
}
