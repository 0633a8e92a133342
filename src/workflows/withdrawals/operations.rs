use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{ApplicationId, WithdrawableEntity, WithdrawableEntityType, WithdrawalContext};
use super::providers::{
    BookingCancellations, PlacementApplicationWithdrawals, PlacementRequestWithdrawals,
    SpaceBookingCancellations, WithdrawalError,
};
use super::tree::{WithdrawableTree, WithdrawableTreeNode};

/// Ceiling on descendants a single cascade may touch. A tree larger than
/// this indicates malformed data, not a legitimate withdrawal.
pub const MAX_CASCADE_DESCENDANTS: usize = 100;

/// Note recorded on booking cancellations created by the cascade.
pub const AUTO_WITHDRAWAL_NOTE: &str = "Automatically withdrawn as Application was withdrawn";

/// A descendant owned by a different application than the tree's root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignNode {
    pub entity_type: WithdrawableEntityType,
    pub entity_id: String,
    pub application_id: ApplicationId,
}

impl fmt::Display for ForeignNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) owned by application {}",
            self.entity_type.label(),
            self.entity_id,
            self.application_id
        )
    }
}

/// Fatal pre-check failures. Nothing is dispatched when these are raised.
#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    #[error(
        "tree for application {root} contains nodes owned by other applications: [{}]",
        render_foreign(.offenders)
    )]
    ForeignNodes {
        root: ApplicationId,
        offenders: Vec<ForeignNode>,
    },
    #[error("refusing to cascade {count} descendants of application {root}: limit is {limit}")]
    TooManyDescendants {
        root: ApplicationId,
        count: usize,
        limit: usize,
    },
}

fn render_foreign(offenders: &[ForeignNode]) -> String {
    offenders
        .iter()
        .map(ForeignNode::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why a node was left in place by the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyWithdrawn,
    /// The node itself carries a blocking reason and must survive so the
    /// block stays visible and actionable.
    Blocking,
    BlockedAncestor,
    BlockingDescendant,
    NotWithdrawable,
    /// Application nodes are withdrawn by their own caller, never cascaded.
    NotACascadeTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedNode {
    pub entity: WithdrawableEntity,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedNode {
    pub entity: WithdrawableEntity,
    pub error: WithdrawalError,
}

/// What a cascade actually did. A blocked or partially failed cascade still
/// completes; callers inspect this report rather than an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CascadeReport {
    pub withdrawn: Vec<WithdrawableEntity>,
    pub skipped: Vec<SkippedNode>,
    pub failed: Vec<FailedNode>,
}

/// Skip decision for a single node, as a pure function of the node and the
/// running ancestor-blocked flag carried down the walk.
pub fn cascade_skip_reason(
    node: &WithdrawableTreeNode,
    ancestor_blocked: bool,
) -> Option<SkipReason> {
    if node.status.withdrawn {
        return Some(SkipReason::AlreadyWithdrawn);
    }
    if node.is_blocking() {
        return Some(SkipReason::Blocking);
    }
    if ancestor_blocked {
        return Some(SkipReason::BlockedAncestor);
    }
    if node.has_blocking_descendant() {
        return Some(SkipReason::BlockingDescendant);
    }
    if !node.status.withdrawable {
        return Some(SkipReason::NotWithdrawable);
    }
    None
}

/// Walks a built tree and withdraws every eligible descendant of the root,
/// dispatching to the entity-specific withdrawal collaborators.
pub struct WithdrawableTreeOperations {
    placement_applications: Arc<dyn PlacementApplicationWithdrawals>,
    placement_requests: Arc<dyn PlacementRequestWithdrawals>,
    bookings: Arc<dyn BookingCancellations>,
    space_bookings: Arc<dyn SpaceBookingCancellations>,
}

impl WithdrawableTreeOperations {
    pub fn new(
        placement_applications: Arc<dyn PlacementApplicationWithdrawals>,
        placement_requests: Arc<dyn PlacementRequestWithdrawals>,
        bookings: Arc<dyn BookingCancellations>,
        space_bookings: Arc<dyn SpaceBookingCancellations>,
    ) -> Self {
        Self {
            placement_applications,
            placement_requests,
            bookings,
            space_bookings,
        }
    }

    /// Cascade-withdraw every eligible node below the root. The root itself
    /// is withdrawn by its own caller before this runs.
    ///
    /// Fails fast, before any dispatch, on cross-application nodes or on
    /// trees above [`MAX_CASCADE_DESCENDANTS`]. After that the walk is
    /// best-effort: a failed dispatch is logged, recorded in the report,
    /// and the remaining nodes are still attempted.
    pub fn withdraw_descendants_of_root_node(
        &self,
        tree: &WithdrawableTree,
        context: &WithdrawalContext,
    ) -> Result<CascadeReport, CascadeError> {
        let root = &tree.root;

        let offenders: Vec<ForeignNode> = root
            .nodes()
            .into_iter()
            .filter(|node| node.application_id != root.application_id)
            .map(|node| ForeignNode {
                entity_type: node.entity.entity_type(),
                entity_id: node.entity.entity_id().to_string(),
                application_id: node.application_id.clone(),
            })
            .collect();
        if !offenders.is_empty() {
            return Err(CascadeError::ForeignNodes {
                root: root.application_id.clone(),
                offenders,
            });
        }

        let count = root.descendant_count();
        if count > MAX_CASCADE_DESCENDANTS {
            return Err(CascadeError::TooManyDescendants {
                root: root.application_id.clone(),
                count,
                limit: MAX_CASCADE_DESCENDANTS,
            });
        }

        let mut report = CascadeReport::default();
        for child in &root.children {
            self.visit(child, root, root.is_blocking(), context, &mut report);
        }

        info!(
            application_id = %root.application_id,
            withdrawn = report.withdrawn.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "withdrawal cascade complete"
        );

        Ok(report)
    }

    fn visit(
        &self,
        node: &WithdrawableTreeNode,
        root: &WithdrawableTreeNode,
        ancestor_blocked: bool,
        context: &WithdrawalContext,
        report: &mut CascadeReport,
    ) {
        if let Some(reason) = cascade_skip_reason(node, ancestor_blocked) {
            report.skipped.push(SkippedNode {
                entity: node.entity.clone(),
                reason,
            });
            if reason == SkipReason::NotWithdrawable {
                // Children of an entity that cannot be withdrawn are not
                // cascade targets either.
                return;
            }
            let ancestor_blocked = ancestor_blocked || node.is_blocking();
            for child in &node.children {
                self.visit(child, root, ancestor_blocked, context, report);
            }
            return;
        }

        let result = match &node.entity {
            WithdrawableEntity::Application(_) => {
                warn!(
                    application_id = %root.application_id,
                    entity_id = node.entity.entity_id(),
                    "unexpected application descendant; application nodes are never cascade targets"
                );
                report.skipped.push(SkippedNode {
                    entity: node.entity.clone(),
                    reason: SkipReason::NotACascadeTarget,
                });
                None
            }
            WithdrawableEntity::PlacementApplication(id) => {
                Some(self.placement_applications.withdraw(id, context))
            }
            WithdrawableEntity::PlacementRequest(id) => {
                Some(self.placement_requests.withdraw(id, context))
            }
            WithdrawableEntity::Booking(id) => {
                Some(self.bookings.create_cancellation(id, AUTO_WITHDRAWAL_NOTE, context))
            }
            WithdrawableEntity::SpaceBooking(id) => Some(self.space_bookings.create_cancellation(
                id,
                AUTO_WITHDRAWAL_NOTE,
                context,
            )),
        };

        match result {
            Some(Ok(())) => {
                info!(
                    entity_type = node.entity.entity_type().label(),
                    entity_id = node.entity.entity_id(),
                    application_id = %root.application_id,
                    "withdrew descendant"
                );
                report.withdrawn.push(node.entity.clone());
            }
            Some(Err(error)) => {
                error!(
                    entity_type = node.entity.entity_type().label(),
                    entity_id = node.entity.entity_id(),
                    application_id = %root.application_id,
                    %error,
                    "failed to withdraw descendant; continuing cascade"
                );
                report.failed.push(FailedNode {
                    entity: node.entity.clone(),
                    error,
                });
            }
            None => {}
        }

        for child in &node.children {
            self.visit(child, root, ancestor_blocked, context, report);
        }
    }
}
