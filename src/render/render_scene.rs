use super::batch::record_frame_time;
use super::{
    explode, BatchId, Camera, DrawMode, FrameClock, InstantClock, ModelId, PagingStatus, RayHit,
    RenderModel,
};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::Real;
use crate::query::Ray;

/// Errors raised when registering or unregistering models.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum SceneError {
    /// A model with the same id is already registered.
    #[error("a model with the id {0} is already registered.")]
    DuplicateModel(ModelId),
    /// No model with this id is registered.
    #[error("no model with the id {0} is registered.")]
    UnknownModel(ModelId),
}

/// Drives the batch iterators of several models under a per-call time budget.
///
/// A traversal starts with [`RenderScene::reset`] and is advanced by repeated calls to
/// [`RenderScene::render_some`] until [`RenderScene::is_done`]. Each step draws the most
/// important pending batch across all models.
///
/// While the camera keeps moving, traversals are reset before they can complete. The first
/// step of such a traversal draws exactly as many batches as the first step of the previous
/// one, ignoring the time budget, so the number of objects on screen doesn’t flicker. This
/// rule is dropped as soon as a traversal gets past its first step.
pub struct RenderScene<C: FrameClock = InstantClock> {
    models: Vec<Box<dyn RenderModel>>,
    candidates: Vec<Option<BatchId>>,
    clock: C,
    frame_stamp: u64,
    steps: u32,
    done: bool,
    needs_render: bool,
    previous_interrupted: bool,
    begin_frame_batch_count: Option<usize>,
    stabilizing: bool,
}

impl Default for RenderScene<InstantClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScene<InstantClock> {
    /// An empty scene measuring draw times with the system clock.
    pub fn new() -> Self {
        Self::with_clock(InstantClock::default())
    }
}

impl<C: FrameClock> RenderScene<C> {
    /// An empty scene measuring draw times with `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            models: Vec::new(),
            candidates: Vec::new(),
            clock,
            frame_stamp: 0,
            steps: 0,
            done: true,
            needs_render: false,
            previous_interrupted: false,
            begin_frame_batch_count: None,
            stabilizing: false,
        }
    }

    /// Registers a model.
    ///
    /// The model takes part in traversals starting with the next [`RenderScene::reset`].
    pub fn add_model(&mut self, model: Box<dyn RenderModel>) -> Result<(), SceneError> {
        let id = model.model_id();
        if self.models.iter().any(|m| m.model_id() == id) {
            return Err(SceneError::DuplicateModel(id));
        }

        self.models.push(model);
        self.candidates.push(None);
        Ok(())
    }

    /// Unregisters the model with the given id and returns it.
    pub fn remove_model(&mut self, id: ModelId) -> Result<Box<dyn RenderModel>, SceneError> {
        let index = self
            .models
            .iter()
            .position(|m| m.model_id() == id)
            .ok_or(SceneError::UnknownModel(id))?;

        let _ = self.candidates.remove(index);
        Ok(self.models.remove(index))
    }

    /// The registered models, in registration order.
    pub fn models(&self) -> impl ExactSizeIterator<Item = &dyn RenderModel> {
        self.models.iter().map(|m| &**m)
    }

    /// The model with the given id.
    pub fn model(&self, id: ModelId) -> Option<&dyn RenderModel> {
        self.models().find(|m| m.model_id() == id)
    }

    /// Is no model registered?
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Has the current traversal drawn every batch?
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Should [`RenderScene::render_some`] be called again even without new input?
    pub fn needs_render(&self) -> bool {
        self.needs_render
    }

    /// Clears the flag returned by [`RenderScene::needs_render`].
    pub fn reset_needs_render(&mut self) {
        self.needs_render = false;
    }

    /// The number of traversals started so far.
    pub fn frame_stamp(&self) -> u64 {
        self.frame_stamp
    }

    /// Starts a new traversal.
    ///
    /// Every batch obtained during the previous traversal must be considered invalid.
    pub fn reset(&mut self, camera: &Camera, draw_mode: DrawMode, moved: bool) {
        let frustum = camera.frustum();

        for (model, candidate) in self.models.iter_mut().zip(self.candidates.iter_mut()) {
            model.reset_iterator(camera, &frustum, draw_mode, moved);
            *candidate = model.next_batch();
        }

        self.frame_stamp += 1;
        self.previous_interrupted = self.steps <= 1;
        self.steps = 0;
        self.done = self.candidates.iter().all(Option::is_none);
    }

    /// Draws batches, most important first, until the time budget is spent.
    ///
    /// `draw` is called once per batch with its model and id. The average draw time of
    /// each batch is subtracted from `time_budget_ms`, and the remaining budget is returned.
    pub fn render_some(
        &mut self,
        mut draw: impl FnMut(&dyn RenderModel, BatchId),
        time_budget_ms: f64,
    ) -> f64 {
        let is_begin_frame = self.steps == 0;
        self.steps += 1;

        let forced_count = if is_begin_frame && self.previous_interrupted {
            self.begin_frame_batch_count
        } else {
            None
        };

        if is_begin_frame && forced_count.is_some() != self.stabilizing {
            self.stabilizing = forced_count.is_some();
            match forced_count {
                Some(count) => log::debug!(
                    "Previous traversal was interrupted: drawing exactly {} batches.",
                    count
                ),
                None => log::debug!("Back to time-budgeted drawing."),
            }
        }

        let mut remaining = time_budget_ms;
        let mut drawn = 0;

        loop {
            match forced_count {
                Some(count) if drawn >= count => break,
                None if remaining <= 0.0 => break,
                _ => {}
            }

            let Some(index) = self.most_important_candidate() else {
                self.done = true;
                break;
            };
            let Some(batch) = self.candidates[index].take() else {
                break;
            };

            let model = &mut self.models[index];
            let start = self.clock.now_ms();
            draw(&**model, batch);
            let delta = self.clock.now_ms() - start;

            self.candidates[index] = model.next_batch();
            remaining -= record_frame_time(model.batch_mut(batch), delta);
            drawn += 1;
        }

        if self.candidates.iter().all(Option::is_none) {
            self.done = true;
        }

        if is_begin_frame && drawn > 0 {
            self.begin_frame_batch_count = Some(drawn);
        }

        for model in &mut self.models {
            if model.frame_update_paging(is_begin_frame) == PagingStatus::Failed {
                log::debug!("Paging failed for model {}.", model.model_id());
                self.needs_render = true;
            }
        }

        log::trace!(
            "Frame {} step {}: drew {} batches, {:.3}ms left.",
            self.frame_stamp,
            self.steps,
            drawn,
            remaining
        );

        remaining
    }

    /// The index of the model with the most important pending batch.
    ///
    /// Ties are resolved toward the earliest registered model.
    fn most_important_candidate(&self) -> Option<usize> {
        let mut best: Option<(usize, Real)> = None;

        for (index, (model, candidate)) in self.models.iter().zip(&self.candidates).enumerate() {
            let Some(batch) = candidate else {
                continue;
            };

            let importance = model.batch(*batch).render_importance();
            if best.map_or(true, |(_, best_importance)| importance > best_importance) {
                best = Some((index, importance));
            }
        }

        best.map(|(index, _)| index)
    }

    /// The union of the visible bounds of every model.
    ///
    /// Returns the empty box if no model is registered.
    pub fn visible_bounds(&self, include_ghosted: bool) -> Aabb {
        if let [model] = &self.models[..] {
            return model.visible_bounds(include_ghosted);
        }

        self.models
            .iter()
            .fold(Aabb::new_invalid(), |acc, model| {
                acc.merged(&model.visible_bounds(include_ghosted))
            })
    }

    /// The closest hit between `ray` and the 3-D models.
    ///
    /// If `model_ids` is given, only these models are tested. If `db_ids` is given, only
    /// fragments with one of these database ids are tested.
    pub fn ray_intersect(
        &self,
        ray: &Ray,
        ignore_transparent: bool,
        db_ids: Option<&[u32]>,
        model_ids: Option<&[ModelId]>,
    ) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;

        for model in &self.models {
            if model.is_2d() || model_ids.is_some_and(|ids| !ids.contains(&model.model_id())) {
                continue;
            }

            if let Some(hit) = model.ray_intersect(ray, ignore_transparent, db_ids) {
                if best.map_or(true, |best| hit.distance < best.distance) {
                    best = Some(hit);
                }
            }
        }

        best
    }

    /// Explodes every model by `scale`. See [`explode`].
    pub fn explode(&mut self, scale: Real) {
        for model in &mut self.models {
            if let Some(targets) = model.explode_targets() {
                explode(targets, scale);
            }
        }
    }

    /// Advances every model’s animations to `timestamp`.
    ///
    /// Returns `true` if any model must be redrawn.
    pub fn update(&mut self, timestamp: f64) -> bool {
        self.models
            .iter_mut()
            .fold(false, |changed, model| model.update(timestamp) || changed)
    }
}
