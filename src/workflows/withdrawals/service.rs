use std::sync::Arc;

use tracing::info;

use crate::config::WithdrawalConfig;

use super::builder::WithdrawableTreeBuilder;
use super::domain::{
    Application, UserRef, WithdrawableEntity, WithdrawalContext, WithdrawalTriggeredBy,
};
use super::operations::{CascadeError, CascadeReport, WithdrawableTreeOperations};
use super::providers::{ApplicationWithdrawals, ProviderError, WithdrawalError};

/// Error raised by the withdrawal service facade.
#[derive(Debug, thiserror::Error)]
pub enum WithdrawalServiceError {
    #[error("user may not directly withdraw this application")]
    Unauthorised,
    #[error("application is not in a withdrawable state")]
    NotWithdrawable,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Cascade(#[from] CascadeError),
    #[error("failed to withdraw application: {0}")]
    RootWithdrawal(#[from] WithdrawalError),
}

/// What a completed withdrawal request did, including why the application
/// may not be fully withdrawn (blocked branches stay in place).
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationWithdrawalOutcome {
    /// The application was withdrawn before this request; nothing was done.
    pub already_withdrawn: bool,
    /// A blocking condition exists somewhere in the tree.
    pub blocked: bool,
    pub notes: Vec<&'static str>,
    pub report: CascadeReport,
}

/// Facade composing the tree builder, the cascade walk, and the root
/// application's own withdrawal collaborator.
pub struct WithdrawalService {
    builder: WithdrawableTreeBuilder,
    operations: WithdrawableTreeOperations,
    applications: Arc<dyn ApplicationWithdrawals>,
    config: WithdrawalConfig,
}

impl WithdrawalService {
    pub fn new(
        builder: WithdrawableTreeBuilder,
        operations: WithdrawableTreeOperations,
        applications: Arc<dyn ApplicationWithdrawals>,
        config: WithdrawalConfig,
    ) -> Self {
        Self {
            builder,
            operations,
            applications,
            config,
        }
    }

    /// Entities in the application's tree the acting user may withdraw
    /// directly, in traversal order.
    pub fn withdrawable_entities(
        &self,
        application: &Application,
        user: &UserRef,
    ) -> Result<Vec<WithdrawableEntity>, ProviderError> {
        let tree = self.builder.tree_for_app(application, user)?;
        Ok(tree
            .root
            .nodes()
            .into_iter()
            .filter(|node| {
                !node.status.withdrawn
                    && node.status.withdrawable
                    && node.status.user_may_directly_withdraw
            })
            .map(|node| node.entity.clone())
            .collect())
    }

    /// Withdraw an application and cascade to its descendants.
    ///
    /// The root is withdrawn first; the cascade then runs best-effort over
    /// the snapshot taken before the root withdrawal. Re-running on an
    /// already withdrawn application is a no-op outcome, not an error.
    pub fn withdraw_application(
        &self,
        application: &Application,
        user: &UserRef,
    ) -> Result<ApplicationWithdrawalOutcome, WithdrawalServiceError> {
        let tree = self.builder.tree_for_app(application, user)?;

        if tree.root.status.withdrawn {
            return Ok(ApplicationWithdrawalOutcome {
                already_withdrawn: true,
                blocked: tree.is_blocked(),
                notes: tree.notes(),
                report: CascadeReport::default(),
            });
        }
        if !tree.root.status.withdrawable {
            return Err(WithdrawalServiceError::NotWithdrawable);
        }
        if !tree.root.status.user_may_directly_withdraw {
            return Err(WithdrawalServiceError::Unauthorised);
        }

        if self.config.log_trees {
            info!(
                application_id = %application.id,
                "withdrawable tree:\n{}",
                tree.render(true)
            );
        }

        let context = WithdrawalContext {
            triggered_by: WithdrawalTriggeredBy::User(user.clone()),
            triggering_entity: WithdrawableEntity::Application(application.id.clone()),
        };

        self.applications.withdraw(&application.id, &context)?;
        let report = self
            .operations
            .withdraw_descendants_of_root_node(&tree, &context)?;

        Ok(ApplicationWithdrawalOutcome {
            already_withdrawn: false,
            blocked: tree.is_blocked(),
            notes: tree.notes(),
            report,
        })
    }
}
