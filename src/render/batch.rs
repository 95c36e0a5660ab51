use crate::math::Real;
use downcast_rs::{impl_downcast, DowncastSync};

/// Identifies a batch within the model that produced it.
pub type BatchId = u32;

/// Weight of the newest measurement in the moving average of a batch draw time.
pub const FRAME_TIME_SMOOTHING: f64 = 0.2;

/// A schedulable unit of draw work.
///
/// Batches are opaque to the scheduler: it only reads their importance and maintains
/// their average draw time. Use the downcasting methods to recover the concrete type in
/// a draw callback.
pub trait RenderBatch: DowncastSync {
    /// The scheduling priority of this batch. Higher is drawn sooner.
    fn render_importance(&self) -> Real;

    /// The moving average of this batch’s draw time, in milliseconds.
    ///
    /// `None` if the batch was never drawn.
    fn avg_frame_time(&self) -> Option<f64>;

    /// Sets the moving average of this batch’s draw time, in milliseconds.
    fn set_avg_frame_time(&mut self, time_ms: f64);
}

impl_downcast!(sync RenderBatch);

/// Folds a new draw-time measurement into the moving average of `batch`.
///
/// The first measurement seeds the average. Returns the updated average.
pub(crate) fn record_frame_time(batch: &mut dyn RenderBatch, delta_ms: f64) -> f64 {
    let avg = match batch.avg_frame_time() {
        Some(avg) => (1.0 - FRAME_TIME_SMOOTHING) * avg + FRAME_TIME_SMOOTHING * delta_ms,
        None => delta_ms,
    };
    batch.set_avg_frame_time(avg);
    avg
}
