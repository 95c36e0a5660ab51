use na::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use vista3d::bounding_volume::{Aabb, BoundingVolume};
use vista3d::partitioning::{
    transparency_from_materials, Bvh, BvhBuildOptions, PrimitiveSet, TraversalAction,
};

fn random_boxes(rng: &mut oorandom::Rand32, len: usize) -> Vec<Aabb> {
    (0..len)
        .map(|_| {
            let center = Point3::new(
                rng.rand_float() * 50.0,
                rng.rand_float() * 50.0,
                rng.rand_float() * 50.0,
            );
            Aabb::from_half_extents(center, Vector3::from_fn(|_, _| rng.rand_float() + 0.01))
        })
        .collect()
}

#[test]
fn subtrees_cover_disjoint_bounded_ranges() {
    let mut rng = oorandom::Rand32::new(2024);

    for len in [0, 1, 2, 16, 1000] {
        let boxes = random_boxes(&mut rng, len);
        let materials: Vec<u32> = (0..len).map(|_| rng.rand_range(0..5)).collect();
        let transparent = transparency_from_materials(&materials, |material| material >= 3);
        let primitives = PrimitiveSet::new(&boxes).with_transparency(&transparent);
        let options = BvhBuildOptions {
            frags_per_leaf_node: 2,
            frags_per_leaf_node_transparent: 4,
            ..BvhBuildOptions::default()
        };
        let bvh = Bvh::build(&primitives, &options);
        let _ = bvh.assert_well_formed(&primitives);

        for (id, node) in bvh.nodes().iter().enumerate() {
            let range = bvh.subtree_range(id as u32);

            if let Some([left, right]) = node.children() {
                let left_range = bvh.subtree_range(left);
                let right_range = bvh.subtree_range(right);
                assert_eq!(range.start, node.primitive_range().start);
                assert_eq!(left_range.start, node.primitive_range().end);
                assert_eq!(left_range.end, right_range.start);
                assert_eq!(right_range.end, range.end);
            } else {
                assert_eq!(range, node.primitive_range());
            }

            for &prim in &bvh.primitive_order()[range] {
                assert!(node.aabb().contains(&boxes[prim as usize]));
                assert_eq!(transparent[prim as usize], node.is_transparent());
            }
        }
    }
}

#[test]
fn transparent_primitives_keep_their_relative_order() {
    let mut rng = oorandom::Rand32::new(77);
    let boxes = random_boxes(&mut rng, 64);
    let mut transparent = vec![false; 64];
    for flag in transparent.iter_mut().take(20) {
        *flag = true;
    }
    transparent.shuffle(&mut StdRng::seed_from_u64(77));

    let primitives = PrimitiveSet::new(&boxes).with_transparency(&transparent);
    let options = BvhBuildOptions {
        frags_per_leaf_node_transparent: 64,
        ..BvhBuildOptions::default()
    };
    let bvh = Bvh::build(&primitives, &options);

    assert_eq!(bvh.first_transparent(), 44);
    let transparent_order = &bvh.primitive_order()[44..];
    assert!(transparent_order.windows(2).all(|w| w[0] < w[1]));
    assert!(bvh.node(Bvh::TRANSPARENT_ROOT).is_leaf());
}

#[test]
fn weak_device_trees_have_smaller_leaves() {
    let mut rng = oorandom::Rand32::new(5);
    let boxes = random_boxes(&mut rng, 2000);
    let primitives = PrimitiveSet::new(&boxes);

    let regular = Bvh::build(&primitives, &BvhBuildOptions::default());
    let weak = Bvh::build(&primitives, &BvhBuildOptions::for_weak_device());

    let mut largest_leaf = 0;
    weak.traverse(Bvh::OPAQUE_ROOT, |id, node| {
        if node.is_leaf() {
            largest_leaf = largest_leaf.max(weak.primitives_of(id).len());
        }
        TraversalAction::Continue
    });

    assert!(largest_leaf <= 16);
    assert!(weak.leaf_count() > regular.leaf_count());
}
