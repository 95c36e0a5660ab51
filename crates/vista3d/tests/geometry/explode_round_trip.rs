use na::{Translation3, Vector3};
use vista3d::bounding_volume::Aabb;
use vista3d::partitioning::{BvhBuildOptions, PrimitiveSet};
use vista3d::render::{BvhModel, Fragments, RenderModel, RenderScene, SimpleInstanceTree};

fn unit_box_at(x: f32) -> Aabb {
    Aabb::from_array([x, 0.0, 0.0, x + 1.0, 1.0, 1.0])
}

/// Two parts on each side of the origin, each made of two single-fragment sub-parts.
fn assembly(id: u32, with_tree: bool) -> BvhModel {
    let mut fragments = Fragments::new();
    for (db_id, x) in [2.0, 4.0, -3.0, -5.0].into_iter().enumerate() {
        let _ = fragments.push(unit_box_at(x), db_id as u32, 12, false);
    }
    let model = BvhModel::new(id, fragments, BvhBuildOptions::default());

    if !with_tree {
        return model;
    }

    let mut tree = SimpleInstanceTree::new();
    for part in 0..2 {
        let node = tree.add_node(SimpleInstanceTree::ROOT);
        for sub_part in 0..2 {
            let leaf = tree.add_node(node);
            tree.add_fragment(leaf, part * 2 + sub_part);
        }
    }
    model.with_instance_tree(tree)
}

fn offsets(scene: &RenderScene, id: u32) -> Vec<Vector3<f32>> {
    let model = scene.model(id).unwrap().downcast_ref::<BvhModel>().unwrap();
    (0..4).map(|f| model.fragments().anim_offset(f)).collect()
}

#[test]
fn hierarchical_explode_round_trip() {
    let mut scene = RenderScene::new();
    scene.add_model(Box::new(assembly(1, true))).unwrap();

    scene.explode(1.0);
    let full = offsets(&scene, 1);
    assert!(full[0].x > 0.0 && full[1].x > full[0].x);
    assert!(full[2].x < 0.0 && full[3].x < full[2].x);
    assert!(scene.update(0.0));

    // The cutoff level fades in continuously.
    scene.explode(1.0e-3);
    assert!(offsets(&scene, 1).iter().all(|offset| offset.norm() < 1.0e-3));

    scene.explode(0.0);
    assert!(offsets(&scene, 1).iter().all(|offset| *offset == Vector3::zeros()));
    assert!(!scene.update(1.0));
}

#[test]
fn flat_explode_round_trip() {
    let mut scene = RenderScene::new();
    scene.add_model(Box::new(assembly(7, false))).unwrap();
    let bounds = scene.visible_bounds(false);

    scene.explode(0.5);
    let half = offsets(&scene, 7);
    assert_relative_eq!(half[0], Vector3::new(1.25, 0.0, 0.0));
    assert!(scene.visible_bounds(false).volume() > bounds.volume());

    // Out-of-range scales are clamped.
    scene.explode(3.0);
    assert_relative_eq!(offsets(&scene, 7)[0], Vector3::new(2.5, 0.0, 0.0));

    scene.explode(0.0);
    assert!(offsets(&scene, 7).iter().all(|offset| *offset == Vector3::zeros()));
    assert_eq!(scene.visible_bounds(false), bounds);
}

#[test]
fn placement_rebuilds_the_tree() {
    let mut model = assembly(3, true);
    let before = model.visible_bounds(true);
    model.set_placement(&Translation3::new(10.0, 0.0, -2.0));

    let after = model.visible_bounds(true);
    assert_relative_eq!(after, before.translated(&Vector3::new(10.0, 0.0, -2.0)));
    assert_eq!(model.bvh().root_aabb(), after);

    let primitives = PrimitiveSet::new(model.fragments().aabbs());
    let _ = model.bvh().assert_well_formed(&primitives);
}
