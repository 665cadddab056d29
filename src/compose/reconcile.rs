//! Reconciliation: turn a list of views into structural operations.
//!
//! For each parent the old children are matched against the new views,
//! then the child list is edited with the four tree operations:
//!
//! 1. Match. Keyed views match an old child with the same kind and key;
//!    unkeyed views take the first unused old child of the same kind.
//! 2. Remove. Unmatched old children go, in contiguous `remove_range` runs
//!    from the back.
//! 3. Place. Retained children on a longest increasing subsequence of their
//!    old positions stay put. Walking the views backwards, every other
//!    retained child is moved, and every new child inserted, directly
//!    before the node placed after it.
//! 4. Update. Retained children get their changed declarations re-applied
//!    through `apply_managed_update` and are reconciled recursively. New
//!    children are fully built (properties and subtree) before insertion.

use std::collections::{HashMap, VecDeque};

use super::error::ComposeError;
use super::view::View;
use crate::dom::node::{Key, KindId, NodeId};
use crate::dom::tree::Tree;
use crate::props::{PropertyDef, PropertyError};
use crate::render::Backend;

/// What a pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Children inserted (each with its whole subtree).
    pub inserted: usize,
    /// Children removed (each with its whole subtree).
    pub removed: usize,
    /// Single-child moves issued.
    pub moved: usize,
    /// Property values that changed.
    pub property_updates: usize,
}

impl PassReport {
    /// Number of structural operations the pass issued.
    pub fn structural_ops(&self) -> usize {
        self.inserted + self.removed + self.moved
    }

    pub fn is_empty(&self) -> bool {
        self.structural_ops() == 0 && self.property_updates == 0
    }
}

/// Make the children of `parent` match `views`.
pub fn reconcile<B: Backend>(
    tree: &mut Tree<B>,
    parent: NodeId,
    views: &[View],
) -> Result<PassReport, ComposeError> {
    let mut pass = Pass {
        tree,
        report: PassReport::default(),
    };
    pass.children(parent, views)?;
    Ok(pass.report)
}

struct Pass<'t, B: Backend> {
    tree: &'t mut Tree<B>,
    report: PassReport,
}

impl<B: Backend> Pass<'_, B> {
    fn children(&mut self, parent: NodeId, views: &[View]) -> Result<(), ComposeError> {
        let old = self.tree.children(parent).to_vec();
        let matched = self.match_children(&old, views);

        // ── Remove ──────────────────────────────────────────────────
        let mut kept = vec![false; old.len()];
        for &i in matched.iter().flatten() {
            kept[i] = true;
        }
        let mut end = old.len();
        while end > 0 {
            if kept[end - 1] {
                end -= 1;
                continue;
            }
            let mut start = end - 1;
            while start > 0 && !kept[start - 1] {
                start -= 1;
            }
            self.tree.remove_range(parent, start, end - start);
            self.report.removed += end - start;
            end = start;
        }

        // Rank of each surviving old child among the survivors.
        let mut rank = vec![0; old.len()];
        let mut next = 0;
        for (i, &k) in kept.iter().enumerate() {
            if k {
                rank[i] = next;
                next += 1;
            }
        }

        // ── Place ───────────────────────────────────────────────────
        let retained: Vec<usize> = (0..views.len()).filter(|&j| matched[j].is_some()).collect();
        let ranks: Vec<usize> = retained
            .iter()
            .filter_map(|&j| matched[j].map(|i| rank[i]))
            .collect();
        let mut stable = vec![false; views.len()];
        for k in longest_increasing_subsequence(&ranks) {
            stable[retained[k]] = true;
        }

        let mut placed = vec![None; views.len()];
        let mut anchor: Option<NodeId> = None;
        for j in (0..views.len()).rev() {
            let target = self.anchor_index(parent, anchor);
            let id = match matched[j] {
                Some(i) => {
                    let id = old[i];
                    if !stable[j] {
                        let from = self.index_of(parent, id);
                        if from + 1 != target {
                            self.tree.move_range(parent, from, target, 1);
                            self.report.moved += 1;
                        }
                    }
                    id
                }
                None => {
                    let id = self.build(&views[j])?;
                    self.tree.insert(parent, target, id);
                    self.report.inserted += 1;
                    id
                }
            };
            placed[j] = Some((id, matched[j].is_some()));
            anchor = Some(id);
        }

        // ── Update ──────────────────────────────────────────────────
        for (view, slot) in views.iter().zip(placed) {
            if let Some((id, true)) = slot {
                self.update(id, view)?;
                self.children(id, &view.children)?;
            }
        }
        Ok(())
    }

    /// For each view, the index of the old child it reuses.
    fn match_children(&self, old: &[NodeId], views: &[View]) -> Vec<Option<usize>> {
        let mut keyed: HashMap<(&KindId, &Key), usize> = HashMap::new();
        let mut unkeyed: HashMap<&KindId, VecDeque<usize>> = HashMap::new();
        for (i, &id) in old.iter().enumerate() {
            let data = &self.tree.nodes[id];
            match &data.key {
                Some(key) => {
                    keyed.entry((&data.kind, key)).or_insert(i);
                }
                None => unkeyed.entry(&data.kind).or_default().push_back(i),
            }
        }
        views
            .iter()
            .map(|view| match &view.key {
                Some(key) => keyed.remove(&(&view.kind, key)),
                None => unkeyed.get_mut(&view.kind).and_then(VecDeque::pop_front),
            })
            .collect()
    }

    fn anchor_index(&self, parent: NodeId, anchor: Option<NodeId>) -> usize {
        match anchor {
            Some(id) => self.index_of(parent, id),
            None => self.tree.child_count(parent),
        }
    }

    fn index_of(&self, parent: NodeId, id: NodeId) -> usize {
        self.tree
            .children(parent)
            .iter()
            .position(|&c| c == id)
            .expect("placed node is a child of the reconciled parent")
    }

    /// Create a detached node for `view` with its properties and subtree.
    fn build(&mut self, view: &View) -> Result<NodeId, ComposeError> {
        let component = (view.factory)();
        let id = self
            .tree
            .create_node(component, view.kind.clone(), view.key.clone())
            .map_err(|source| ComposeError::Property {
                node: self.tree.context().issued(),
                source,
            })?;
        if let Err(err) = self.fill(id, view) {
            self.tree.discard(id);
            return Err(err);
        }
        Ok(id)
    }

    fn fill(&mut self, id: NodeId, view: &View) -> Result<(), ComposeError> {
        self.update(id, view)?;
        for (index, child) in view.children.iter().enumerate() {
            let child = self.build(child)?;
            self.tree.insert(id, index, child);
        }
        Ok(())
    }

    /// Re-apply the declarations of `view` that changed since the last pass.
    fn update(&mut self, id: NodeId, view: &View) -> Result<(), ComposeError> {
        let uid = self.tree.nodes[id].uid;
        let fail = |source: PropertyError| ComposeError::Property { node: uid, source };

        for (name, value) in &view.props {
            let data = &self.tree.nodes[id];
            if data.declared.get(name) == Some(value) {
                continue;
            }
            if !data.props.is_defined(name) {
                if let Some(v) = value {
                    self.tree
                        .define_property(id, name, PropertyDef::new(v.kind()).managed())
                        .map_err(fail)?;
                }
            }
            if self.tree.nodes[id].props.is_defined(name)
                && self
                    .tree
                    .apply_managed_update(id, name, value.clone())
                    .map_err(fail)?
            {
                self.report.property_updates += 1;
            }
            self.tree.nodes[id].declared.insert(name.clone(), value.clone());
        }

        let dropped: Vec<String> = self.tree.nodes[id]
            .declared
            .keys()
            .filter(|name| view.declared(name).is_none())
            .cloned()
            .collect();
        for name in dropped {
            self.tree.nodes[id].declared.remove(&name);
            if self.tree.nodes[id].props.is_defined(&name)
                && self.tree.apply_managed_update(id, &name, None).map_err(fail)?
            {
                self.report.property_updates += 1;
            }
        }

        let data = &mut self.tree.nodes[id];
        if data.declared_visible != Some(view.visible) {
            data.declared_visible = Some(view.visible);
            self.tree.set_visible(id, view.visible);
        }
        Ok(())
    }
}

/// Indices into `seq` of one longest strictly increasing subsequence.
fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    // tails[k]: index of the smallest tail of an increasing run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];
    for (i, &x) in seq.iter().enumerate() {
        let pos = tails.partition_point(|&t| seq[t] < x);
        if pos > 0 {
            prev[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }
    let mut out = Vec::with_capacity(tails.len());
    let mut cur = tails.last().copied();
    while let Some(i) = cur {
        out.push(i);
        cur = prev[i];
    }
    out.reverse();
    out
}

// ===========================================================================
// Tests
// ===========================================================================
