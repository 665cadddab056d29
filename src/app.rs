//! App: the composition driver.
//!
//! [`App`] owns a [`Tree`], a view function and a [`Scheduler`]. The view is
//! run under a reactive observer, so any signal it reads becomes a
//! dependency. Writing such a signal does not recompose immediately; it asks
//! the scheduler for one pass, and further writes before that pass runs are
//! coalesced into it.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::compose::{reconcile, ComposeError, PassReport, View};
use crate::context::ComposeContext;
use crate::dom::Tree;
use crate::reactive::{create_observer, dispose_effect, track, EffectId, ImmediateScheduler, Scheduler};
use crate::render::{Backend, StringBackend};

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Configuration for an [`App`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Label used in log lines.
    pub name: Option<String>,
    /// Most consecutive passes triggered by writes made during a pass.
    pub max_rerun_depth: usize,
    /// Record every structural operation in the tree's op log.
    pub record_ops: bool,
    /// Keep lifecycle events for [`Tree::drain_lifecycle_events`].
    pub record_lifecycle: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: None,
            max_rerun_depth: 16,
            record_ops: false,
            record_lifecycle: false,
        }
    }
}

impl AppConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log label (builder).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the rerun bound (builder).
    pub fn with_max_rerun_depth(mut self, depth: usize) -> Self {
        self.max_rerun_depth = depth;
        self
    }

    /// Enable the op log (builder).
    pub fn with_record_ops(mut self, record: bool) -> Self {
        self.record_ops = record;
        self
    }

    /// Enable lifecycle event recording (builder).
    pub fn with_record_lifecycle(mut self, record: bool) -> Self {
        self.record_lifecycle = record;
        self
    }
}

// ---------------------------------------------------------------------------
// Driver state
// ---------------------------------------------------------------------------

type ViewFn = Box<dyn FnMut() -> Vec<View>>;

struct Inner<B: Backend> {
    config: AppConfig,
    tree: RefCell<Tree<B>>,
    view: RefCell<ViewFn>,
    scheduler: Box<dyn Scheduler>,
    observer: Cell<Option<EffectId>>,
    /// A task for the next pass is queued.
    scheduled: Cell<bool>,
    in_pass: Cell<bool>,
    /// A dependency changed while a pass was running.
    rerun: Cell<bool>,
    rerun_depth: Cell<usize>,
    passes: Cell<u64>,
    last_report: Cell<PassReport>,
    last_error: RefCell<Option<ComposeError>>,
}

impl<B: Backend + 'static> Inner<B> {
    fn label(&self) -> &str {
        self.config.name.as_deref().unwrap_or("app")
    }

    /// Ask for a pass on the next tick.
    fn request(self: &Rc<Self>) {
        if self.in_pass.get() {
            self.rerun.set(true);
            return;
        }
        if self.scheduled.replace(true) {
            log::trace!("{}: pass already scheduled, coalesced", self.label());
            return;
        }
        let weak = Rc::downgrade(self);
        self.scheduler.schedule(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.run_scheduled();
            }
        }));
    }

    fn run_scheduled(self: &Rc<Self>) {
        self.scheduled.set(false);
        if let Err(err) = self.run_pass() {
            log::error!("{}: scheduled pass failed: {err}", self.label());
        }
    }

    fn run_pass(self: &Rc<Self>) -> Result<PassReport, ComposeError> {
        let result = self.pass_once();
        if !self.rerun.replace(false) {
            self.rerun_depth.set(0);
            return result;
        }
        let depth = self.rerun_depth.get() + 1;
        if depth > self.config.max_rerun_depth {
            log::warn!(
                "{}: state still changing after {} follow-up passes, giving up",
                self.label(),
                self.config.max_rerun_depth
            );
            self.rerun_depth.set(0);
        } else {
            self.rerun_depth.set(depth);
            self.request();
        }
        result
    }

    fn pass_once(&self) -> Result<PassReport, ComposeError> {
        self.in_pass.set(true);
        let views = {
            let mut view = self.view.borrow_mut();
            match self.observer.get() {
                Some(observer) => track(observer, || view()),
                None => view(),
            }
        };
        let result = {
            let mut tree = self.tree.borrow_mut();
            let root = tree.root();
            let result = reconcile(&mut tree, root, &views);
            tree.end_cycle();
            result
        };
        self.in_pass.set(false);
        self.passes.set(self.passes.get() + 1);

        match &result {
            Ok(report) => {
                log::debug!(
                    "{}: pass {} inserted={} removed={} moved={} props={}",
                    self.label(),
                    self.passes.get(),
                    report.inserted,
                    report.removed,
                    report.moved,
                    report.property_updates
                );
                self.last_report.set(*report);
                self.last_error.replace(None);
            }
            Err(err) => {
                self.last_error.replace(Some(err.clone()));
            }
        }
        result
    }
}

impl<B: Backend> Drop for Inner<B> {
    fn drop(&mut self) {
        if let Some(observer) = self.observer.take() {
            dispose_effect(observer);
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// A composed tree kept in step with reactive state.
pub struct App<B: Backend + 'static = StringBackend> {
    inner: Rc<Inner<B>>,
}

impl App<StringBackend> {
    /// String backend, immediate scheduling, default config.
    pub fn headless(view: impl FnMut() -> Vec<View> + 'static) -> Result<Self, ComposeError> {
        Self::new(
            AppConfig::default(),
            Tree::headless(ComposeContext::new()),
            ImmediateScheduler,
            view,
        )
    }
}

impl<B: Backend + 'static> App<B> {
    /// Build the app and run the first pass synchronously.
    pub fn new(
        config: AppConfig,
        mut tree: Tree<B>,
        scheduler: impl Scheduler + 'static,
        view: impl FnMut() -> Vec<View> + 'static,
    ) -> Result<Self, ComposeError> {
        tree.record_ops(config.record_ops);
        tree.record_lifecycle(config.record_lifecycle);
        let inner = Rc::new(Inner {
            config,
            tree: RefCell::new(tree),
            view: RefCell::new(Box::new(view)),
            scheduler: Box::new(scheduler),
            observer: Cell::new(None),
            scheduled: Cell::new(false),
            in_pass: Cell::new(false),
            rerun: Cell::new(false),
            rerun_depth: Cell::new(0),
            passes: Cell::new(0),
            last_report: Cell::new(PassReport::default()),
            last_error: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        inner.observer.set(Some(create_observer(move || {
            if let Some(inner) = weak.upgrade() {
                inner.request();
            }
        })));

        log::debug!("{}: initial pass", inner.label());
        inner.run_pass()?;
        Ok(Self { inner })
    }

    /// Run a pass now, regardless of scheduling.
    pub fn recompose(&self) -> Result<PassReport, ComposeError> {
        self.inner.run_pass()
    }

    /// Ask for a pass on the scheduler, as a dependency change would.
    pub fn request(&self) {
        self.inner.request();
    }

    /// Number of passes run so far, including the initial one.
    pub fn passes(&self) -> u64 {
        self.inner.passes.get()
    }

    /// Whether a pass is queued on the scheduler.
    pub fn is_scheduled(&self) -> bool {
        self.inner.scheduled.get()
    }

    /// Report of the last successful pass.
    pub fn last_report(&self) -> PassReport {
        self.inner.last_report.get()
    }

    /// Error of the last pass, if it failed.
    pub fn last_error(&self) -> Option<ComposeError> {
        self.inner.last_error.borrow().clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Borrow the tree.
    ///
    /// # Panics
    ///
    /// Panics if called while a pass is mutating the tree.
    pub fn tree(&self) -> Ref<'_, Tree<B>> {
        self.inner.tree.borrow()
    }

    /// Borrow the tree mutably, e.g. for direct property writes.
    ///
    /// # Panics
    ///
    /// Panics if the tree is already borrowed.
    pub fn tree_mut(&self) -> RefMut<'_, Tree<B>> {
        self.inner.tree.borrow_mut()
    }

    pub fn with_tree<R>(&self, f: impl FnOnce(&Tree<B>) -> R) -> R {
        f(&self.tree())
    }

    pub fn with_tree_mut<R>(&self, f: impl FnOnce(&mut Tree<B>) -> R) -> R {
        f(&mut self.tree_mut())
    }

    /// Serialize the composed tree.
    pub fn render_to_string(&self) -> String {
        self.tree().render_root()
    }
}

impl<B: Backend + 'static> fmt::Debug for App<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.inner.config.name)
            .field("passes", &self.inner.passes.get())
            .field("scheduled", &self.inner.scheduled.get())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
