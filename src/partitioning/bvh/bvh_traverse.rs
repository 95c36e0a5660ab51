use super::{Bvh, BvhNode};
use smallvec::SmallVec;

const TRAVERSAL_STACK_SIZE: usize = 32;

/// Controls the execution flow of [`Bvh::traverse`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraversalAction {
    /// The traversal will continue on the children of the tested node.
    Continue,
    /// The traversal will skip all descendants of the tested node.
    Prune,
    /// The traversal will exit immediately.
    EarlyExit,
}

impl Bvh {
    #[inline(always)]
    pub(crate) fn traversal_stack() -> SmallVec<[u32; TRAVERSAL_STACK_SIZE]> {
        Default::default()
    }

    /// Traverses the subtree rooted at `root` in depth-first order.
    ///
    /// `check_node` is called on every visited node with its index, and decides whether the
    /// traversal continues into that node’s children, skips them, or stops altogether. The
    /// left child is always visited before the right child.
    ///
    /// Nothing is visited if `root` doesn’t exist (for example on a BVH that was never built).
    pub fn traverse(
        &self,
        root: u32,
        mut check_node: impl FnMut(u32, &BvhNode) -> TraversalAction,
    ) {
        if root as usize >= self.nodes.len() {
            return;
        }

        let mut stack = Self::traversal_stack();
        stack.push(root);

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];

            match check_node(id, node) {
                TraversalAction::Continue => {
                    if let Some([left, right]) = node.children() {
                        stack.push(right);
                        stack.push(left);
                    }
                }
                TraversalAction::Prune => {}
                TraversalAction::EarlyExit => return,
            }
        }
    }

    /// Iterates, in depth-first order, through the indices of the leaves of the subtree
    /// rooted at `root`.
    pub fn leaves(&self, root: u32) -> impl Iterator<Item = u32> + '_ {
        let mut stack = Self::traversal_stack();
        if (root as usize) < self.nodes.len() {
            stack.push(root);
        }

        core::iter::from_fn(move || {
            while let Some(id) = stack.pop() {
                match self.nodes[id as usize].children() {
                    Some([left, right]) => {
                        stack.push(right);
                        stack.push(left);
                    }
                    None => return Some(id),
                }
            }

            None
        })
    }
}
