use na::{Point3, Vector3};
use vista3d::bounding_volume::Aabb;
use vista3d::partitioning::BvhBuildOptions;
use vista3d::query::Ray;
use vista3d::render::{BvhModel, Fragments, RenderScene};

/// A row of unit cubes along +x, starting at `start`, every other one transparent.
fn row(id: u32, start: f32, count: u32) -> BvhModel {
    let mut fragments = Fragments::new();
    for i in 0..count {
        let x = start + i as f32 * 2.0;
        let aabb = Aabb::from_array([x, -0.5, -0.5, x + 1.0, 0.5, 0.5]);
        let _ = fragments.push(aabb, 100 * id + i, 1, i % 2 == 0);
    }
    let options = BvhBuildOptions {
        frags_per_leaf_node: 2,
        frags_per_leaf_node_transparent: 2,
        ..BvhBuildOptions::default()
    };
    BvhModel::new(id, fragments, options)
}

#[test]
fn closest_hit_across_models() {
    let mut scene = RenderScene::new();
    let ray = Ray::new(Point3::origin(), Vector3::x());
    assert!(scene.ray_intersect(&ray, false, None, None).is_none());

    scene.add_model(Box::new(row(1, 20.0, 10))).unwrap();
    scene.add_model(Box::new(row(2, 10.0, 10))).unwrap();
    scene.add_model(Box::new(row(3, 1.0, 10).with_2d(true))).unwrap();

    let hit = scene.ray_intersect(&ray, false, None, None).unwrap();
    assert_eq!((hit.model_id, hit.fragment, hit.db_id), (2, 0, 200));
    assert_relative_eq!(hit.distance, 10.0);
    assert_relative_eq!(hit.point, Point3::new(10.0, 0.0, 0.0));

    let hit = scene.ray_intersect(&ray, true, None, None).unwrap();
    assert_eq!((hit.model_id, hit.fragment), (2, 1));
    assert_relative_eq!(hit.distance, 12.0);

    let hit = scene.ray_intersect(&ray, false, Some(&[105, 205][..]), None).unwrap();
    assert_eq!(hit.db_id, 205);

    let hit = scene.ray_intersect(&ray, false, None, Some(&[1, 3][..])).unwrap();
    assert_eq!(hit.model_id, 1);
    assert_relative_eq!(hit.distance, 20.0);
}

#[test]
fn two_dimensional_models_are_never_hit() {
    let mut scene = RenderScene::new();
    scene.add_model(Box::new(row(1, 1.0, 4).with_2d(true))).unwrap();
    scene.add_model(Box::new(row(2, 5.0, 4).with_2d(true))).unwrap();

    let ray = Ray::new(Point3::origin(), Vector3::x());
    assert!(scene.ray_intersect(&ray, false, None, None).is_none());
}

#[test]
fn exploded_fragments_are_hit_where_they_are_drawn() {
    let mut scene = RenderScene::new();
    scene.add_model(Box::new(row(1, 10.0, 5))).unwrap();

    // The row spans [10, 19]: the first cube moves 4 units toward the ray origin.
    scene.explode(1.0);
    let ray = Ray::new(Point3::origin(), Vector3::x());
    let hit = scene.ray_intersect(&ray, false, None, None).unwrap();
    assert_eq!(hit.fragment, 0);
    assert_relative_eq!(hit.distance, 6.0);
}
