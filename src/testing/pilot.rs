//! Pilot: step-by-step driving of an app over an in-memory host.
//!
//! The `Pilot` builds an [`App`] on a [`LiveBackend`] over a [`MemoryHost`]
//! with a [`QueueScheduler`], so a test decides when scheduled passes run and
//! can compare the logical tree with the mirrored host tree at any point.

use crate::app::{App, AppConfig};
use crate::compose::{ComposeError, View};
use crate::context::ComposeContext;
use crate::dom::Tree;
use crate::reactive::QueueScheduler;
use crate::render::{LiveBackend, MemoryHost};

use super::snapshot;

/// The backend a [`Pilot`] drives.
pub type PilotBackend = LiveBackend<MemoryHost>;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless app driver for testing.
///
/// # Examples
///
/// ```ignore
/// use trellis::reactive::create_signal;
/// use trellis::testing::Pilot;
/// use trellis::View;
///
/// let (count, set_count) = create_signal(0);
/// let pilot = Pilot::new(move || vec![View::text(count.get().to_string())])?;
/// set_count.set(1);
/// assert_eq!(pilot.tick(), 1);
/// assert_eq!(pilot.render(), "1");
/// ```
pub struct Pilot {
    app: App<PilotBackend>,
    scheduler: QueueScheduler,
}

impl Pilot {
    /// Build with the default config. The initial pass runs immediately.
    pub fn new(view: impl FnMut() -> Vec<View> + 'static) -> Result<Self, ComposeError> {
        Self::with_config(AppConfig::default(), view)
    }

    pub fn with_config(
        config: AppConfig,
        view: impl FnMut() -> Vec<View> + 'static,
    ) -> Result<Self, ComposeError> {
        let host = MemoryHost::new();
        let root = host.root();
        let tree = Tree::new(ComposeContext::new(), LiveBackend::new(host, root));
        let scheduler = QueueScheduler::new();
        let app = App::new(config, tree, scheduler.clone(), view)?;
        Ok(Self { app, scheduler })
    }

    /// Run every queued task, including follow-ups they queue. Returns how
    /// many ran.
    pub fn tick(&self) -> usize {
        self.scheduler.run_pending()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn app(&self) -> &App<PilotBackend> {
        &self.app
    }

    /// Markup of the logical tree.
    pub fn render(&self) -> String {
        self.app.with_tree(snapshot::render_to_string)
    }

    /// Markup of the mirrored host tree.
    pub fn host_markup(&self) -> String {
        self.app.with_tree(|tree| {
            let backend = tree.backend();
            backend.host().serialize(backend.root_handle())
        })
    }

    pub fn outline(&self) -> String {
        self.app.with_tree(snapshot::outline)
    }

    /// Assert that every logical node's children map, in order, onto its
    /// host node's children, and that both trees serialize the same.
    ///
    /// # Panics
    ///
    /// Panics on the first node whose host children differ.
    pub fn assert_in_sync(&self) {
        self.app.with_tree(|tree| {
            let backend = tree.backend();
            let host = backend.host();
            for id in tree.walk_depth_first(tree.root()) {
                let handle = backend
                    .handle_of(id)
                    .unwrap_or_else(|| panic!("node {id:?} has no host handle"));
                let expected: Vec<_> = tree
                    .children(id)
                    .iter()
                    .map(|&child| backend.handle_of(child))
                    .collect::<Option<_>>()
                    .unwrap_or_else(|| panic!("a child of {id:?} has no host handle"));
                assert_eq!(
                    host.children(handle),
                    expected.as_slice(),
                    "host children of {id:?} are out of order"
                );
            }
            assert_eq!(
                host.serialize(backend.root_handle()),
                tree.render_root(),
                "host markup differs from the logical tree"
            );
        });
    }
}
