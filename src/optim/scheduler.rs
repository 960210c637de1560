/// A learning-rate schedule driven by the host training loop.
///
/// The host calls [`SchedulerAlgorithm::step`] once per optimizer step (or per epoch),
/// strictly in increasing step order, and persists [`SchedulerAlgorithm::last_step`]
/// across checkpoints.
pub trait SchedulerAlgorithm {
    /// Learning rate at `step`, without touching any state.
    fn lr_at(&self, step: i64) -> f64;
    /// Move to `step`, or to the step after the last one when `None`, and apply the new
    /// learning rate.
    fn step(&mut self, step: Option<i64>) -> f64;
    fn last_step(&self) -> i64;
}
