//! Injectable "run on next tick" primitive.
//!
//! The composition driver never runs a pass from inside a signal write; it
//! hands a task to a [`Scheduler`] instead. Tests use [`ImmediateScheduler`]
//! or [`QueueScheduler`]; an event loop uses [`TokioScheduler`] with a
//! [`TaskLoop`] draining the queue.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError};

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Accepts tasks to run later on the same thread.
pub trait Scheduler {
    fn schedule(&self, task: Task);
}

// ---------------------------------------------------------------------------
// ImmediateScheduler
// ---------------------------------------------------------------------------

/// Runs every task synchronously inside `schedule`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, task: Task) {
        task();
    }
}

// ---------------------------------------------------------------------------
// QueueScheduler
// ---------------------------------------------------------------------------

/// FIFO queue drained by hand. Clones share the queue.
#[derive(Clone, Default)]
pub struct QueueScheduler {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl QueueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run tasks until the queue is empty, including tasks queued while
    /// running. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        // Pop one at a time: tasks may schedule more.
        loop {
            let Some(task) = self.queue.borrow_mut().pop_front() else {
                return ran;
            };
            task();
            ran += 1;
        }
    }
}

impl Scheduler for QueueScheduler {
    fn schedule(&self, task: Task) {
        self.queue.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for QueueScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tokio
// ---------------------------------------------------------------------------

/// Sends tasks to a [`TaskLoop`] over an unbounded channel.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<Task>,
}

/// Receiving side of a [`TokioScheduler`]. Tasks are `!Send`, so the loop
/// runs on the thread that owns the tree (a current-thread runtime or a
/// `LocalSet`).
#[derive(Debug)]
pub struct TaskLoop {
    rx: mpsc::UnboundedReceiver<Task>,
}

/// Create a connected scheduler and loop.
pub fn task_loop() -> (TokioScheduler, TaskLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TokioScheduler { tx }, TaskLoop { rx })
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, task: Task) {
        if self.tx.send(task).is_err() {
            log::warn!("task loop closed; dropping scheduled task");
        }
    }
}

impl TaskLoop {
    /// Run tasks as they arrive until every scheduler is dropped.
    pub async fn run(&mut self) {
        while let Some(task) = self.rx.recv().await {
            task();
        }
    }

    /// Run whatever is queued right now without waiting. Returns how many
    /// tasks ran.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Drain the queue once per `period` (a frame clock) until every
    /// scheduler is dropped and the queue is empty.
    pub async fn run_paced(&mut self, period: Duration) {
        let mut frames = tokio::time::interval(period);
        loop {
            frames.tick().await;
            loop {
                match self.rx.try_recv() {
                    Ok(task) => task(),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
        }
    }
}
