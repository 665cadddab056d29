//! Reactive state: signals, effects, memos, observers and schedulers.
//!
//! Leptos-style fine-grained reactivity on a thread-local runtime.
//!
//! - [`create_signal`]: a read/write signal pair.
//! - [`create_effect`]: auto-tracking side effect.
//! - [`create_memo`]: cached derived computation.
//! - [`create_observer`] + [`track`]: change notification without re-running.
//! - [`batch`]: coalesce writes into one notification pass.
//! - [`Scheduler`]: where deferred work (composition passes) runs.

pub mod effect;
pub mod scheduler;
pub mod signal;

pub use effect::{batch, create_effect, create_effect_with_id, create_memo, dispose_effect, EffectId};
pub use scheduler::{task_loop, ImmediateScheduler, QueueScheduler, Scheduler, Task, TaskLoop, TokioScheduler};
pub use signal::{create_observer, create_signal, track, untrack, ReadSignal, SignalId, WriteSignal};
