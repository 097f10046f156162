//! Checking on spawned tasks from synchronous code.

use futures::FutureExt;
use tokio::task::{JoinError, JoinHandle};

/// Result of polling a task slot
#[derive(Debug)]
pub enum PollResult<T> {
    /// The slot is empty
    NoTask,
    Pending,
    /// The task finished and the slot was cleared
    Complete(Result<T, JoinError>),
}

/// Poll an optional task handle without blocking.
///
/// A finished task is taken out of the slot and its result returned; a
/// running task is left in place.
pub fn poll_task<T>(task: &mut Option<JoinHandle<T>>) -> PollResult<T> {
    match task.as_ref() {
        None => return PollResult::NoTask,
        Some(handle) if !handle.is_finished() => return PollResult::Pending,
        Some(_) => {}
    }

    let Some(mut handle) = task.take() else {
        return PollResult::NoTask;
    };
    match (&mut handle).now_or_never() {
        Some(result) => PollResult::Complete(result),
        None => {
            tracing::warn!("Task not ready despite is_finished()");
            *task = Some(handle);
            PollResult::Pending
        }
    }
}

/// Wait for the task in the slot to finish, clearing the slot.
pub async fn join_task<T>(task: &mut Option<JoinHandle<T>>) -> Option<Result<T, JoinError>> {
    let handle = task.take()?;
    Some(handle.await)
}
