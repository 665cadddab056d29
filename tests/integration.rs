//! Integration tests: exercise trellis subsystems together through the
//! public API.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use trellis::component::{Component, Element, LifecycleContext, LifecycleEvent};
use trellis::dom::{OpRecord, StructuralOp};
use trellis::props::{PropertyDef, PropertyError, PropertyStore, ValueKind};
use trellis::reactive::{create_signal, task_loop, ReadSignal};
use trellis::testing::{outline, Pilot};
use trellis::{
    reconcile, App, AppConfig, ComposeContext, ComposeError, LiveBackend, MemoryHost, Tree, Value,
    View,
};

type Journal = Rc<RefCell<Vec<String>>>;

fn live_tree() -> Tree<LiveBackend<MemoryHost>> {
    let host = MemoryHost::new();
    let root = host.root();
    Tree::new(ComposeContext::new(), LiveBackend::new(host, root))
}

fn host_markup(tree: &Tree<LiveBackend<MemoryHost>>) -> String {
    let backend = tree.backend();
    backend.host().serialize(backend.root_handle())
}

// ── Components ──────────────────────────────────────────────────────

/// Heading with a managed `title` whose callbacks write to a journal.
struct Heading {
    journal: Journal,
}

impl Component for Heading {
    fn tag(&self) -> &str {
        "h1"
    }

    fn define_properties(&self, props: &mut PropertyStore) -> Result<(), PropertyError> {
        let notify = self.journal.clone();
        let update = self.journal.clone();
        props.define(
            "title",
            PropertyDef::new(ValueKind::Str)
                .managed()
                .with_initial("x")
                .on_notify(move |v| notify.borrow_mut().push(format!("notify:{}", v.unwrap())))
                .on_update(move |v| update.borrow_mut().push(format!("update:{}", v.unwrap()))),
        )
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Records attach and detach as `+name` / `-name`.
struct Probe {
    name: String,
    journal: Journal,
}

impl Component for Probe {
    fn tag(&self) -> &str {
        "x-probe"
    }

    fn on_insert(&mut self, _cx: &LifecycleContext<'_>) {
        self.journal.borrow_mut().push(format!("+{}", self.name));
    }

    fn on_remove(&mut self, _cx: &LifecycleContext<'_>) {
        self.journal.borrow_mut().push(format!("-{}", self.name));
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn probe(name: &'static str, journal: &Journal) -> View {
    let journal = journal.clone();
    View::component(move || Probe {
        name: name.to_owned(),
        journal: journal.clone(),
    })
    .key(name)
}

// ── Structural operations ───────────────────────────────────────────

#[test]
fn structural_scenario_keeps_host_in_step() {
    let mut tree = live_tree();
    let root = tree.root();
    let a = tree.create(Element::new("a")).unwrap();
    let b = tree.create(Element::new("b")).unwrap();
    let c = tree.create(Element::new("c")).unwrap();

    tree.insert(root, 0, a);
    tree.insert(root, 1, b);
    tree.insert(root, 1, c);
    assert_eq!(tree.children(root), &[a, c, b]);
    assert_eq!(host_markup(&tree), "<a></a><c></c><b></b>");

    tree.move_range(root, 2, 0, 1);
    assert_eq!(tree.children(root), &[b, a, c]);
    assert_eq!(host_markup(&tree), "<b></b><a></a><c></c>");

    tree.remove_range(root, 1, 1);
    assert_eq!(tree.children(root), &[b, c]);
    assert_eq!(tree.parent(a), None);
    assert_eq!(host_markup(&tree), "<b></b><c></c>");

    tree.clear_all(root);
    assert!(tree.children(root).is_empty());
    assert_eq!(tree.parent(b), None);
    assert_eq!(tree.parent(c), None);
    assert_eq!(host_markup(&tree), "");
    assert_eq!(tree.backend().host().live_count(), 1);
}

#[test]
fn managed_property_scenario() {
    let journal = Journal::default();
    let mut tree = live_tree();
    let root = tree.root();
    let h = tree
        .create(Heading {
            journal: journal.clone(),
        })
        .unwrap();
    tree.insert(root, 0, h);

    assert_eq!(tree.set_property(h, "title", Some("x".into())), Ok(false));
    assert!(journal.borrow().is_empty());

    assert_eq!(tree.set_property(h, "title", Some("y".into())), Ok(true));
    assert_eq!(*journal.borrow(), ["notify:y", "update:y"]);

    assert_eq!(tree.apply_managed_update(h, "title", Some("z".into())), Ok(false));
    assert_eq!(tree.property(h, "title"), Some(&Value::from("y")));
    assert_eq!(host_markup(&tree), r#"<h1 title="y"></h1>"#);

    tree.end_cycle();
    assert_eq!(tree.apply_managed_update(h, "title", Some("z".into())), Ok(true));
    assert_eq!(host_markup(&tree), r#"<h1 title="z"></h1>"#);
}

// ── Reconciliation and lifecycle ────────────────────────────────────

#[test]
fn keyed_components_keep_their_instances() {
    let journal = Journal::default();
    let mut tree = live_tree();
    let root = tree.root();

    let views = |names: &[&'static str]| -> Vec<View> {
        names.iter().map(|&n| probe(n, &journal)).collect()
    };

    reconcile(&mut tree, root, &views(&["a", "b", "c"])).unwrap();
    assert_eq!(*journal.borrow(), ["+a", "+b", "+c"]);
    journal.borrow_mut().clear();

    let report = reconcile(&mut tree, root, &views(&["c", "a", "b"])).unwrap();
    assert_eq!(report.moved, 1);
    assert!(journal.borrow().is_empty());

    reconcile(&mut tree, root, &views(&["c", "b"])).unwrap();
    assert_eq!(*journal.borrow(), ["-a"]);
    assert_eq!(
        host_markup(&tree),
        "<x-probe></x-probe><x-probe></x-probe>"
    );
}

#[test]
fn removing_a_subtree_emits_removed_for_each_node() {
    let mut tree = live_tree();
    tree.record_lifecycle(true);
    let root = tree.root();
    let list = |with_nested: bool| {
        let mut views = vec![View::element("header").key("h")];
        if with_nested {
            views.push(
                View::element("section")
                    .key("s")
                    .children([View::element("p").child(View::text("one"))]),
            );
        }
        views
    };

    reconcile(&mut tree, root, &list(true)).unwrap();
    tree.drain_lifecycle_events();

    reconcile(&mut tree, root, &list(false)).unwrap();
    let removed = tree
        .drain_lifecycle_events()
        .into_iter()
        .filter(|e| matches!(e, LifecycleEvent::Removed { .. }))
        .count();
    assert_eq!(removed, 3);
    assert_eq!(tree.render_root(), "<header></header>");
    assert_eq!(tree.len(), 2);
}

#[test]
fn op_log_records_a_single_move_for_rotation() {
    let (order, set_order) = create_signal(vec![1, 2, 3]);
    let pilot = Pilot::with_config(AppConfig::new().with_record_ops(true), move || {
        order.with(|o| o.iter().map(|&k| View::element("li").key(k)).collect())
    })
    .unwrap();
    let root = pilot.app().with_tree(|t| t.root());
    pilot.app().tree_mut().take_ops();

    set_order.set(vec![3, 1, 2]);
    pilot.tick();

    assert_eq!(
        pilot.app().tree_mut().take_ops(),
        vec![OpRecord {
            parent: root,
            op: StructuralOp::MoveRange {
                from: 2,
                to: 0,
                count: 1
            },
        }]
    );
    pilot.assert_in_sync();
}

// ── Todo list ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Todo {
    id: u32,
    title: &'static str,
    done: bool,
}

fn todo(id: u32, title: &'static str) -> Todo {
    Todo {
        id,
        title,
        done: false,
    }
}

fn todo_view(todos: ReadSignal<Vec<Todo>>) -> impl FnMut() -> Vec<View> {
    move || {
        let items: Vec<View> = todos.with(|todos| {
            todos
                .iter()
                .map(|t| {
                    let li = View::element("li").key(t.id);
                    let li = if t.done { li.class("done") } else { li };
                    li.child(View::text(t.title))
                })
                .collect()
        });
        let remaining = todos.with(|t| t.iter().filter(|t| !t.done).count());
        vec![
            View::element("ul").class("todo-list").children(items),
            View::element("footer").child(View::text(format!("{remaining} left"))),
        ]
    }
}

#[test]
fn todo_list_session() {
    let (todos, set_todos) = create_signal(vec![todo(1, "milk"), todo(2, "bread"), todo(3, "eggs")]);
    let pilot = Pilot::new(todo_view(todos)).unwrap();
    pilot.assert_in_sync();

    // Complete one item: a class and a text change, no structure.
    set_todos.update(|t| t[1].done = true);
    assert_eq!(pilot.tick(), 1);
    let report = pilot.app().last_report();
    assert_eq!(report.structural_ops(), 0);
    assert_eq!(report.property_updates, 2);
    pilot.assert_in_sync();

    // Add, then reorder and delete in one batch of writes.
    set_todos.update(|t| t.push(todo(4, "jam")));
    set_todos.update(|t| {
        t.retain(|t| t.id != 1);
        t.swap(0, 2);
    });
    assert_eq!(pilot.pending(), 1);
    pilot.tick();
    pilot.assert_in_sync();

    insta::assert_snapshot!(
        pilot.render(),
        @r#"<ul class="todo-list"><li>jam</li><li>eggs</li><li class="done">bread</li></ul><footer>2 left</footer>"#
    );
    insta::assert_snapshot!(pilot.outline(), @r#"
    #root #1
      ul #2
        li key=4 #11
          "jam" #12
        li key=3 #7
          "eggs" #8
        li key=2 #5
          "bread" #6
      footer #9
        "2 left" #10
    "#);
    assert_eq!(pilot.app().passes(), 3);
}

// ── App drivers ─────────────────────────────────────────────────────

#[test]
fn tokio_task_loop_drives_passes() {
    let (count, set_count) = create_signal(1);
    let (scheduler, mut frames) = task_loop();
    let app = App::new(
        AppConfig::new().with_name("counter"),
        Tree::headless(ComposeContext::new()),
        scheduler,
        move || vec![View::element("p").child(View::text(count.get().to_string()))],
    )
    .unwrap();

    set_count.set(2);
    set_count.set(3);
    assert!(app.is_scheduled());
    assert_eq!(frames.run_until_idle(), 1);
    assert_eq!(app.render_to_string(), "<p>3</p>");
    assert_eq!(app.passes(), 2);
    assert!(!app.is_scheduled());
}

#[test]
fn failed_pass_is_reported_and_recovers() {
    let (bad, set_bad) = create_signal(false);
    let pilot = Pilot::new(move || {
        let title = if bad.get() { Value::Int(3) } else { Value::from("ok") };
        vec![View::element("h1").prop("title", title)]
    })
    .unwrap();

    set_bad.set(true);
    pilot.tick();
    let err = pilot.app().last_error().expect("pass should fail");
    let ComposeError::Property { source, .. } = err;
    assert_eq!(
        source,
        PropertyError::TypeMismatch {
            name: "title".into(),
            expected: ValueKind::Str,
            found: ValueKind::Int,
        }
    );
    assert_eq!(pilot.render(), r#"<h1 title="ok"></h1>"#);

    set_bad.set(false);
    pilot.tick();
    assert!(pilot.app().last_error().is_none());
    pilot.assert_in_sync();
}

#[test]
fn headless_app_renders_nested_markup() {
    let app = App::headless(|| {
        vec![View::element("nav").children([
            View::element("a").prop("href", "/").child(View::text("home")),
            View::element("br"),
            View::element("a").prop("href", "/about").visible(false),
        ])]
    })
    .unwrap();
    assert_eq!(
        app.render_to_string(),
        r#"<nav><a href="/">home</a><br><a href="/about" hidden></a></nav>"#
    );
    assert_eq!(app.with_tree(outline).lines().count(), 6);
}

// ── Backend equivalence ─────────────────────────────────────────────

fn list(items: &[(u8, bool)]) -> Vec<View> {
    items
        .iter()
        .map(|&(k, flag)| {
            View::element("li")
                .key(u32::from(k))
                .prop("data-flag", flag)
                .visible(k % 3 != 0)
                .child(View::text(k.to_string()))
        })
        .collect()
}

proptest! {
    #[test]
    fn string_and_live_backends_converge(
        steps in prop::collection::vec(
            prop::collection::vec((0u8..10, any::<bool>()), 0..8),
            1..6,
        ),
    ) {
        let mut string = Tree::headless(ComposeContext::new());
        let mut live = live_tree();
        let (sroot, lroot) = (string.root(), live.root());

        for step in &steps {
            let views = list(step);
            reconcile(&mut string, sroot, &views).unwrap();
            reconcile(&mut live, lroot, &views).unwrap();
            let rendered = live.render_root();
            prop_assert_eq!(live.render_root(), rendered.clone());
            prop_assert_eq!(string.render_root(), string.render_root());
            prop_assert_eq!(string.render_root(), rendered.clone());
            prop_assert_eq!(host_markup(&live), rendered);
        }

        let mut fresh = Tree::headless(ComposeContext::new());
        let froot = fresh.root();
        reconcile(&mut fresh, froot, &list(steps.last().unwrap())).unwrap();
        prop_assert_eq!(fresh.render_root(), string.render_root());
    }
}
