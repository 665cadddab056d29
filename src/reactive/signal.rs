//! Signals, effects and observers on a thread-local runtime.
//!
//! Fine-grained reactive primitives: signals store values, effects re-run
//! when a signal they read changes, and observers are told that something
//! they read changed without being re-run. Single-threaded and synchronous.
//!
//! Observers are how the composition driver watches state: [`track`] runs the
//! view under an observer so every signal read becomes a dependency, and a
//! later write calls the observer's `on_change`, which only *schedules* the
//! next pass.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Identifies a signal inside the runtime.
    pub struct SignalId;

    /// Identifies an effect or observer inside the runtime.
    pub struct EffectId;
}

// ---------------------------------------------------------------------------
// Runtime internals
// ---------------------------------------------------------------------------

struct SignalSlot {
    value: Box<dyn Any>,
    subscribers: HashSet<EffectId>,
}

enum Callback {
    /// Re-run with tracking on every change. `None` while running.
    Effect(Option<Box<dyn FnMut()>>),
    /// Called untracked on every change; dependencies come from [`track`].
    Observer(Rc<dyn Fn()>),
}

struct Reaction {
    callback: Callback,
    sources: HashSet<SignalId>,
}

struct Runtime {
    signals: SlotMap<SignalId, SignalSlot>,
    reactions: SlotMap<EffectId, Reaction>,
    /// Reaction whose reads are being recorded.
    tracking: Option<EffectId>,
    batch_depth: usize,
    /// Notifications deferred by a batch or by a running flush.
    pending: Vec<EffectId>,
    flushing: bool,
}

impl Runtime {
    fn new() -> Self {
        Self {
            signals: SlotMap::with_key(),
            reactions: SlotMap::with_key(),
            tracking: None,
            batch_depth: 0,
            pending: Vec::new(),
            flushing: false,
        }
    }

    fn unsubscribe(&mut self, eid: EffectId) {
        let Some(reaction) = self.reactions.get_mut(eid) else {
            return;
        };
        for sid in reaction.sources.drain() {
            if let Some(signal) = self.signals.get_mut(sid) {
                signal.subscribers.remove(&eid);
            }
        }
    }
}

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

// ---------------------------------------------------------------------------
// Signal creation
// ---------------------------------------------------------------------------

/// Create a reactive signal with the given initial value.
///
/// Reading the returned [`ReadSignal`] inside an effect or a [`track`] call
/// subscribes the running reaction to later writes.
pub fn create_signal<T: 'static>(initial: T) -> (ReadSignal<T>, WriteSignal<T>) {
    let id = RUNTIME.with(|rt| {
        rt.borrow_mut().signals.insert(SignalSlot {
            value: Box::new(initial),
            subscribers: HashSet::new(),
        })
    });

    (
        ReadSignal {
            id,
            _marker: PhantomData,
        },
        WriteSignal {
            id,
            _marker: PhantomData,
        },
    )
}

// ---------------------------------------------------------------------------
// ReadSignal
// ---------------------------------------------------------------------------

/// Read half of a signal. `Copy`: only stores an id.
pub struct ReadSignal<T: 'static> {
    id: SignalId,
    _marker: PhantomData<T>,
}

impl<T: 'static> Copy for ReadSignal<T> {}
impl<T: 'static> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadSignal").field("id", &self.id).finish()
    }
}

impl<T: 'static> ReadSignal<T> {
    /// Read the current value, subscribing the running reaction (if any).
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Read by reference. Still subscribes the running reaction.
    ///
    /// `f` runs while the runtime is borrowed, so it must not read or write
    /// other signals.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        RUNTIME.with(|rt| {
            {
                let mut rt = rt.borrow_mut();
                if let Some(eid) = rt.tracking {
                    rt.signals[self.id].subscribers.insert(eid);
                    if let Some(reaction) = rt.reactions.get_mut(eid) {
                        reaction.sources.insert(self.id);
                    }
                }
            }
            let rt = rt.borrow();
            f(downcast(&*rt.signals[self.id].value))
        })
    }

    /// Read without subscribing anything.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        RUNTIME.with(|rt| downcast::<T>(&*rt.borrow().signals[self.id].value).clone())
    }
}

fn downcast<T: 'static>(value: &dyn Any) -> &T {
    value.downcast_ref::<T>().expect("signal type mismatch")
}

// ---------------------------------------------------------------------------
// WriteSignal
// ---------------------------------------------------------------------------

/// Write half of a signal. `Copy`: only stores an id.
pub struct WriteSignal<T: 'static> {
    id: SignalId,
    _marker: PhantomData<T>,
}

impl<T: 'static> Copy for WriteSignal<T> {}
impl<T: 'static> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> fmt::Debug for WriteSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSignal").field("id", &self.id).finish()
    }
}

impl<T: 'static> WriteSignal<T> {
    /// Overwrite the value and notify subscribers.
    pub fn set(&self, value: T) {
        let subs = RUNTIME.with(|rt| {
            let mut rt = rt.borrow_mut();
            let slot = &mut rt.signals[self.id];
            slot.value = Box::new(value);
            slot.subscribers.iter().copied().collect::<Vec<_>>()
        });
        notify(subs);
    }

    /// Overwrite the value only if it differs; returns whether it did.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        let same = RUNTIME.with(|rt| *downcast::<T>(&*rt.borrow().signals[self.id].value) == value);
        if !same {
            self.set(value);
        }
        !same
    }

    /// Mutate the value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let subs = RUNTIME.with(|rt| {
            let mut rt = rt.borrow_mut();
            let slot = &mut rt.signals[self.id];
            f(slot
                .value
                .downcast_mut::<T>()
                .expect("signal type mismatch"));
            slot.subscribers.iter().copied().collect::<Vec<_>>()
        });
        notify(subs);
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Create a side effect that re-runs whenever a signal it read changes.
///
/// The closure runs once immediately to establish its subscriptions.
pub fn create_effect(f: impl FnMut() + 'static) {
    create_effect_with_id(f);
}

/// Like [`create_effect`], returning the id for [`dispose_effect`].
pub fn create_effect_with_id(f: impl FnMut() + 'static) -> EffectId {
    let eid = insert_reaction(Callback::Effect(Some(Box::new(f))));
    run_reaction(eid);
    eid
}

/// Create a cached derived value.
///
/// The returned signal only notifies its own subscribers when the computed
/// value actually changes.
pub fn create_memo<T: Clone + PartialEq + 'static>(
    mut f: impl FnMut() -> T + 'static,
) -> ReadSignal<T> {
    // Evaluated untracked so an enclosing effect does not pick up f's reads.
    let (read, write) = create_signal(untrack(&mut f));
    create_effect(move || {
        write.set_if_changed(f());
    });
    read
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

/// Create an observer: `on_change` is called (untracked) whenever a signal
/// read during the observer's last [`track`] call is written.
///
/// Nothing is tracked until the first [`track`].
pub fn create_observer(on_change: impl Fn() + 'static) -> EffectId {
    insert_reaction(Callback::Observer(Rc::new(on_change)))
}

/// Run `f`, replacing `observer`'s dependencies with the signals `f` reads.
///
/// A disposed observer records nothing.
pub fn track<R>(observer: EffectId, f: impl FnOnce() -> R) -> R {
    let live = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        rt.unsubscribe(observer);
        rt.reactions.contains_key(observer)
    });
    let prev = set_tracking(live.then_some(observer));
    let out = f();
    set_tracking(prev);
    out
}

/// Run `f` without recording any signal reads.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let prev = set_tracking(None);
    let out = f();
    set_tracking(prev);
    out
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Group signal writes so each affected reaction runs once at the end.
///
/// Nested batches flush when the outermost one returns.
pub fn batch(f: impl FnOnce()) {
    RUNTIME.with(|rt| rt.borrow_mut().batch_depth += 1);

    f();

    let pending = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        rt.batch_depth -= 1;
        if rt.batch_depth > 0 {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        rt.pending.drain(..).filter(|id| seen.insert(*id)).collect()
    });
    notify(pending);
}

// ---------------------------------------------------------------------------
// Dispose
// ---------------------------------------------------------------------------

/// Drop an effect or observer. Idempotent.
pub fn dispose_effect(eid: EffectId) {
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        rt.unsubscribe(eid);
        rt.reactions.remove(eid);
    });
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn insert_reaction(callback: Callback) -> EffectId {
    RUNTIME.with(|rt| {
        rt.borrow_mut().reactions.insert(Reaction {
            callback,
            sources: HashSet::new(),
        })
    })
}

fn set_tracking(eid: Option<EffectId>) -> Option<EffectId> {
    RUNTIME.with(|rt| std::mem::replace(&mut rt.borrow_mut().tracking, eid))
}

enum Job {
    Effect(Box<dyn FnMut()>),
    Observer(Rc<dyn Fn()>),
}

/// Run one reaction. An effect re-tracks from scratch; an observer's
/// callback runs untracked and keeps its dependencies.
fn run_reaction(eid: EffectId) {
    let job = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let job = match &mut rt.reactions.get_mut(eid)?.callback {
            // Already running: the flush loop will not recurse into it.
            Callback::Effect(slot) => Job::Effect(slot.take()?),
            Callback::Observer(f) => Job::Observer(f.clone()),
        };
        if matches!(job, Job::Effect(_)) {
            rt.unsubscribe(eid);
        }
        Some(job)
    });

    match job {
        Some(Job::Effect(mut cb)) => {
            let prev = set_tracking(Some(eid));
            cb();
            set_tracking(prev);
            RUNTIME.with(|rt| {
                if let Some(reaction) = rt.borrow_mut().reactions.get_mut(eid) {
                    if let Callback::Effect(slot) = &mut reaction.callback {
                        *slot = Some(cb);
                    }
                }
            });
        }
        Some(Job::Observer(on_change)) => untrack(|| on_change()),
        None => {}
    }
}

/// Run `subs`, then anything they trigger, until quiet.
fn notify(subs: Vec<EffectId>) {
    if subs.is_empty() {
        return;
    }

    let early = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let rt = &mut *rt;
        if rt.batch_depth > 0 {
            rt.pending.extend(subs.iter().copied());
            return Some(Vec::new());
        }
        if !rt.flushing {
            rt.flushing = true;
            return None;
        }
        // Mid-flush: effects wait for the running loop, observers hear about
        // the write now so a scheduler can tell it apart from a fresh one.
        let mut observers = Vec::new();
        for &eid in &subs {
            match rt.reactions.get(eid).map(|r| &r.callback) {
                Some(Callback::Observer(f)) => observers.push(f.clone()),
                Some(Callback::Effect(_)) => rt.pending.push(eid),
                None => {}
            }
        }
        Some(observers)
    });
    if let Some(observers) = early {
        for on_change in observers {
            untrack(|| on_change());
        }
        return;
    }

    let mut queue = subs;
    while !queue.is_empty() {
        for eid in std::mem::take(&mut queue) {
            run_reaction(eid);
        }
        RUNTIME.with(|rt| queue.append(&mut rt.borrow_mut().pending));
    }

    RUNTIME.with(|rt| rt.borrow_mut().flushing = false);
}

// ---------------------------------------------------------------------------
// Test helper: reset the thread-local runtime between tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) fn reset_runtime() {
    RUNTIME.with(|rt| {
        *rt.borrow_mut() = Runtime::new();
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
