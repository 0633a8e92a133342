use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, BlockingReason, WithdrawableEntity, WithdrawableState};

/// A node in the withdrawable tree. Immutable once built; owns its children,
/// and child order is the traversal and render order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawableTreeNode {
    /// The application this node belongs to. Every node in a tree rooted at
    /// application A must carry A here; the cascade refuses anything else.
    pub application_id: ApplicationId,
    pub entity: WithdrawableEntity,
    pub status: WithdrawableState,
    /// Set on placement requests raised from the application's initial
    /// requested dates rather than a user-submitted placement application.
    pub automatic: bool,
    pub children: Vec<WithdrawableTreeNode>,
}

impl WithdrawableTreeNode {
    pub fn is_blocking(&self) -> bool {
        self.status.blocks_ancestor_withdrawals()
    }

    /// True when any strict descendant carries a blocking reason.
    pub fn has_blocking_descendant(&self) -> bool {
        self.children
            .iter()
            .any(|child| child.is_blocking() || child.has_blocking_descendant())
    }

    /// Number of strict descendants.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Pre-order traversal, including this node.
    pub fn nodes(&self) -> Vec<&WithdrawableTreeNode> {
        let mut out = Vec::new();
        self.collect_nodes(&mut out);
        out
    }

    fn collect_nodes<'a>(&'a self, out: &mut Vec<&'a WithdrawableTreeNode>) {
        out.push(self);
        for child in &self.children {
            child.collect_nodes(out);
        }
    }

    fn collect_blocking_reasons(&self, out: &mut Vec<BlockingReason>) {
        if let Some(reason) = self.status.blocking_reason {
            if !out.contains(&reason) {
                out.push(reason);
            }
        }
        for child in &self.children {
            child.collect_blocking_reasons(out);
        }
    }

    fn render_into(&self, out: &mut String, depth: usize, include_ids: bool) {
        for _ in 0..depth {
            out.push_str("---> ");
        }
        out.push_str(self.entity.entity_type().label());
        out.push('(');
        if include_ids {
            out.push_str(self.entity.entity_id());
        }
        out.push(')');
        if self.automatic {
            out.push_str(" automatic");
        }
        out.push_str(&format!(
            ", withdrawn:{}, withdrawable:{}, mayDirectlyWithdraw:{}",
            yes_no(self.status.withdrawn),
            yes_no(self.status.withdrawable),
            yes_no(self.status.user_may_directly_withdraw),
        ));
        if let Some(reason) = self.status.blocking_reason {
            out.push_str(&format!(", BLOCKING - {}", reason.label()));
        } else if self.has_blocking_descendant() {
            out.push_str(", BLOCKED");
        }
        out.push('\n');

        for child in &self.children {
            child.render_into(out, depth + 1, include_ids);
        }
    }
}

/// The consistency tree for one application, built fresh for each withdrawal
/// request and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawableTree {
    pub root: WithdrawableTreeNode,
}

impl WithdrawableTree {
    /// True when any node in the tree carries a blocking reason.
    pub fn is_blocked(&self) -> bool {
        self.root.is_blocking() || self.root.has_blocking_descendant()
    }

    /// Nodes carrying a blocking reason, in traversal order.
    pub fn blocking_nodes(&self) -> Vec<&WithdrawableTreeNode> {
        self.root
            .nodes()
            .into_iter()
            .filter(|node| node.is_blocking())
            .collect()
    }

    /// Distinct blocking reasons found anywhere in the tree, traversal order.
    pub fn blocking_reasons(&self) -> Vec<BlockingReason> {
        let mut out = Vec::new();
        self.root.collect_blocking_reasons(&mut out);
        out
    }

    /// One human-readable note per distinct blocking reason.
    pub fn notes(&self) -> Vec<&'static str> {
        self.blocking_reasons()
            .into_iter()
            .map(BlockingReason::note)
            .collect()
    }

    /// Deterministic diagnostic rendering: one line per node, indented by
    /// `"---> "` per depth level, followed by a `Notes:` line when any
    /// blocking condition exists in the tree.
    pub fn render(&self, include_ids: bool) -> String {
        let mut out = String::new();
        self.root.render_into(&mut out, 0, include_ids);

        let notes = self.notes();
        if !notes.is_empty() {
            out.push_str(&format!("Notes: [{}]\n", notes.join(", ")));
        }

        out
    }
}

const fn yes_no(value: bool) -> char {
    if value {
        'Y'
    } else {
        'N'
    }
}
