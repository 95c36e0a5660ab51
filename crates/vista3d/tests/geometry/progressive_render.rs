use na::{Point3, Vector3};
use std::cell::Cell;
use std::rc::Rc;
use vista3d::bounding_volume::Aabb;
use vista3d::partitioning::BvhBuildOptions;
use vista3d::render::{
    BvhModel, Camera, DrawMode, FrameClock, Fragments, RenderBatch, RenderModel, RenderScene,
};

#[derive(Clone, Default)]
struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
    fn advance(&self, ms: f64) {
        self.0.set(self.0.get() + ms);
    }
}

impl FrameClock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

fn grid_model(id: u32, side: usize) -> BvhModel {
    let mut fragments = Fragments::new();

    for i in 0..side {
        for j in 0..side {
            let min = Point3::new(i as f32 * 2.0, j as f32 * 2.0, 0.0);
            let aabb = Aabb::new(min, min + Vector3::repeat(1.0));
            let _ = fragments.push(aabb, (i * side + j) as u32, 100, false);
        }
    }

    let options = BvhBuildOptions {
        frags_per_leaf_node: 1,
        // Keep the polygon counts from folding whole subtrees into single leaves.
        max_polys_per_node: 0,
        ..BvhBuildOptions::default()
    };
    BvhModel::new(id, fragments, options)
}

fn camera() -> Camera {
    Camera::look_at(
        Point3::new(15.0, 15.0, 60.0),
        Point3::new(15.0, 15.0, 0.0),
        Vector3::y(),
        1.2,
        1.0,
        0.1,
        1000.0,
    )
    .unwrap()
}

#[test]
fn begin_frame_count_is_stable_while_moving() {
    let clock = ManualClock::default();
    let mut scene = RenderScene::with_clock(clock.clone());
    scene.add_model(Box::new(grid_model(1, 16))).unwrap();
    let camera = camera();
    let mut cost = 1.0;

    let render = |scene: &mut RenderScene<ManualClock>, cost: f64| {
        let mut drawn = 0;
        let _ = scene.render_some(
            |_, _| {
                clock.advance(cost);
                drawn += 1;
            },
            10.0,
        );
        drawn
    };

    // Stationary first frame: purely time-budgeted.
    scene.reset(&camera, DrawMode::Normal, false);
    let first = render(&mut scene, cost);
    assert_eq!(first, 10);

    // The camera keeps moving and batches became slower: the count doesn't change.
    cost = 3.0;
    for _ in 0..6 {
        scene.reset(&camera, DrawMode::Normal, true);
        assert_eq!(render(&mut scene, cost), first);
    }

    // Let the last traversal complete.
    let mut calls = 0;
    while !scene.is_done() {
        let _ = render(&mut scene, cost);
        calls += 1;
        assert!(calls < 1000, "the traversal never completed");
    }
    assert!(calls > 1);

    // Back to time budgeting, with the slower averages.
    scene.reset(&camera, DrawMode::Normal, false);
    assert_eq!(render(&mut scene, cost), 4);
}

#[test]
fn traversals_terminate_and_draw_everything() {
    let clock = ManualClock::default();
    let mut scene = RenderScene::with_clock(clock.clone());
    scene.add_model(Box::new(grid_model(1, 8))).unwrap();
    scene.add_model(Box::new(grid_model(2, 5))).unwrap();
    scene.reset(&camera(), DrawMode::Normal, false);

    let mut drawn = Vec::new();
    let mut calls = 0;
    while !scene.is_done() {
        let _ = scene.render_some(
            |model, batch| {
                clock.advance(0.5);
                let model = model.downcast_ref::<BvhModel>().unwrap();
                assert!(model.batch(batch).avg_frame_time().is_none());
                drawn.extend(
                    model
                        .batch_fragments(batch)
                        .iter()
                        .map(|f| (model.bvh().primitive_count(), *f)),
                );
            },
            4.0,
        );
        calls += 1;
        assert!(calls <= 64 + 25);
    }

    assert_eq!(drawn.len(), 64 + 25);
    drawn.sort_unstable();
    drawn.dedup();
    assert_eq!(drawn.len(), 64 + 25);

    // Once done, nothing else is drawn.
    let remaining = scene.render_some(|_, _| panic!("nothing left to draw"), 4.0);
    assert_eq!(remaining, 4.0);
    assert!(scene.is_done());
}

#[test]
fn hidden_traversals_are_immediately_done() {
    let mut scene = RenderScene::with_clock(ManualClock::default());
    scene.add_model(Box::new(grid_model(1, 4))).unwrap();
    scene.reset(&camera(), DrawMode::Hidden, false);
    assert!(scene.is_done());
    assert_eq!(scene.frame_stamp(), 1);
}
