//! Newick rendering of a branch arena.
//!
//! Grammar:
//!
//! ```text
//! tree    := node ";"
//! node    := [ "(" node { "," node } ")" ] label ":" length
//! label   := "s" id      (species)
//!          | ""          (internal branch)
//! ```
//!
//! The length of a branch is its end date minus its creation date; branches
//! that are still open are measured up to `now`. The walk is iterative, so
//! very deep trees render without recursion.

use speciation_types::{BranchId, Date};

use crate::branch::{BranchArena, NodeKind};

enum Visit {
    Enter(BranchId),
    Exit(BranchId),
    Comma,
}

/// Render the subtree rooted at `start`, without the trailing `;`.
///
/// An unknown `start` renders as the empty string.
pub fn render_subtree<P>(arena: &BranchArena<P>, start: BranchId, now: Date) -> String {
    let mut out = String::new();
    let mut stack = vec![Visit::Enter(start)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(id) => {
                let Some(branch) = arena.get(id) else {
                    continue;
                };
                stack.push(Visit::Exit(id));
                if branch.is_leaf() {
                    continue;
                }
                out.push('(');
                for (i, &child) in branch.children().iter().rev().enumerate() {
                    if i > 0 {
                        stack.push(Visit::Comma);
                    }
                    stack.push(Visit::Enter(child));
                }
            }
            Visit::Comma => out.push(','),
            Visit::Exit(id) => {
                let Some(branch) = arena.get(id) else {
                    continue;
                };
                if !branch.is_leaf() {
                    out.push(')');
                }
                if let NodeKind::Species(species) = branch.kind() {
                    out.push_str(&species.name());
                }
                out.push(':');
                out.push_str(&branch.length(now).to_string());
            }
        }
    }

    out
}

/// Render the whole tree, terminated with `;`.
pub fn render<P>(arena: &BranchArena<P>, now: Date) -> String {
    let mut out = render_subtree(arena, arena.root(), now);
    out.push(';');
    out
}
