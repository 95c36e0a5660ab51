use super::{Bvh, PrimitiveSet};
use crate::bounding_volume::BoundingVolume;

impl Bvh {
    /// Panics if the tree isn’t well-formed.
    ///
    /// The tree is well-formed if it is topologically correct (child indices are all valid, no
    /// node is reachable twice), geometrically correct (each node’s AABB encloses its own
    /// primitives and both of its children), and if every primitive of `primitives` is owned
    /// by exactly one node of the subtree matching its transparency.
    ///
    /// Returns the number of leaves reachable from the two roots.
    pub fn assert_well_formed(&self, primitives: &PrimitiveSet) -> usize {
        assert_eq!(self.primitive_order.len(), primitives.len());

        if self.nodes.is_empty() {
            assert!(self.primitive_order.is_empty());
            return 0;
        }

        assert!(self.nodes.len() >= 2, "Both roots must exist.");
        assert!(!self.nodes[Self::OPAQUE_ROOT as usize].is_transparent());
        assert!(self.nodes[Self::TRANSPARENT_ROOT as usize].is_transparent());

        let mut owned = vec![false; self.primitive_order.len()];
        for &prim in &self.primitive_order {
            assert!(!owned[prim as usize], "Primitive {} ordered twice.", prim);
            owned[prim as usize] = true;
        }
        owned.fill(false);

        let mut visited = vec![false; self.nodes.len()];
        let mut leaf_count = 0;

        for (root, expected) in [
            (Self::OPAQUE_ROOT, 0..self.first_transparent),
            (Self::TRANSPARENT_ROOT, self.first_transparent..self.primitive_order.len()),
        ] {
            assert_eq!(self.subtree_range(root), expected);
            let mut stack = vec![root];

            while let Some(id) = stack.pop() {
                if visited[id as usize] {
                    panic!("Detected loop. Node {} visited twice.", id);
                }
                visited[id as usize] = true;

                let node = &self.nodes[id as usize];
                let aabb = node.aabb();

                for pos in node.primitive_range() {
                    let prim = self.primitive_order[pos];
                    assert!(!owned[pos], "Position {} owned by two nodes.", pos);
                    owned[pos] = true;
                    assert_eq!(primitives.is_transparent(prim), node.is_transparent());
                    assert!(aabb.contains(primitives.aabb(prim)));
                }

                match node.children() {
                    Some([left, right]) => {
                        assert!(left > id && (right as usize) < self.nodes.len());
                        let left_node = &self.nodes[left as usize];
                        let right_node = &self.nodes[right as usize];

                        assert_eq!(left_node.is_transparent(), node.is_transparent());
                        assert_eq!(right_node.is_transparent(), node.is_transparent());
                        assert!(aabb.contains(&left_node.aabb()));
                        assert!(aabb.contains(&right_node.aabb()));
                        assert_eq!(left_node.prim_start as usize, node.primitive_range().end);
                        assert_eq!(
                            right_node.prim_start as usize,
                            self.subtree_range(left).end
                        );

                        stack.push(right);
                        stack.push(left);
                    }
                    None => {
                        leaf_count += 1;
                        let is_root = id == Self::OPAQUE_ROOT || id == Self::TRANSPARENT_ROOT;
                        assert!(is_root || node.primitive_count() > 0, "Empty leaf {}.", id);
                    }
                }
            }
        }

        assert!(
            owned.iter().all(|owned| *owned),
            "Some primitives are not owned by any node."
        );

        leaf_count
    }
}
