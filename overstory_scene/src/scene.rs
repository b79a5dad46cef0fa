// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene storage and operations: skeleton, children replacement, hit testing, outputs.

use alloc::boxed::Box;
use alloc::{vec, vec::Vec};
use core::fmt;

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::content::Content;
use crate::types::{HitTarget, Layer, NodeFlags, NodeId, OutputId};

/// Why [`Scene::replace_children`] rejected a proposed children list.
///
/// Rejection leaves the current children exactly as they were.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplaceError {
    /// The proposal would add, drop, or reorder structure nodes.
    ///
    /// The structure nodes in a children list form an ordered sub-sequence
    /// owned by the scene itself; a proposal must carry exactly that
    /// sub-sequence, in the same relative order.
    StructureMismatch,
    /// The named node appears more than once in the proposal.
    DuplicateChild(NodeId),
    /// The named node is already a child of a different parent.
    ///
    /// A node has at most one parent; detach it there first.
    AlreadyParented(NodeId),
    /// The named node has been destroyed.
    StaleChild(NodeId),
    /// Attaching the named node would make the target its own descendant.
    WouldCycle(NodeId),
}

impl fmt::Display for ReplaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StructureMismatch => {
                write!(f, "proposed children do not preserve the structure sub-sequence")
            }
            Self::DuplicateChild(id) => {
                write!(f, "proposed children contain {id:?} more than once")
            }
            Self::AlreadyParented(id) => {
                write!(f, "{id:?} is already a child of a different parent")
            }
            Self::StaleChild(id) => write!(f, "{id:?} refers to a destroyed node"),
            Self::WouldCycle(id) => {
                write!(f, "attaching {id:?} would create a cycle")
            }
        }
    }
}

impl core::error::Error for ReplaceError {}

#[derive(Debug)]
enum NodeKind {
    /// Plain ordered container: collaborator groups and the per-output
    /// static/dynamic pair.
    Inner,
    /// Per-output container inside a layer, owning the static/dynamic pair.
    Output {
        dynamic_container: NodeId,
        static_container: NodeId,
        limit: Option<Rect>,
    },
    /// One stacking layer, tracking which child serves each output.
    Layer { outputs: HashMap<OutputId, NodeId> },
    /// Externally supplied hit-testable content.
    Leaf { content: Box<dyn Content> },
}

#[derive(Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    structure: bool,
    flags: NodeFlags,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Node {
    fn new(generation: u32, structure: bool, kind: NodeKind) -> Self {
        Self {
            generation,
            parent: None,
            structure,
            flags: NodeFlags::empty(),
            children: Vec::new(),
            kind,
        }
    }
}

/// The scene graph of a compositor: stacking order and hit-test order in one
/// tree.
///
/// A scene is built once with its permanent skeleton in place: a root, one
/// node per [`Layer`] stacked Overlay down to Background, and (as outputs
/// arrive) one node per output inside every layer, each holding a dynamic
/// container stacked above a static one. Collaborators hang their own
/// containers ([`Scene::create_group`]) and content ([`Scene::create_leaf`])
/// off that skeleton and rearrange them with [`Scene::replace_children`],
/// which refuses any proposal that would disturb the skeleton itself.
///
/// Children are ordered topmost first throughout, so a front-to-back
/// traversal of the tree is the stacking order, and
/// [`Scene::find_node_at`] is a first-match search in that same order.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use overstory_scene::{Layer, OutputId, Scene, SurfaceId, SurfaceRegion};
///
/// let mut scene = Scene::new();
/// let output_node = scene.handle_output_added(Layer::Workspace, OutputId(1));
/// let windows = scene.dynamic_container(output_node).unwrap();
///
/// // Attach a window on top of the workspace content of that output.
/// let win = scene.create_leaf(Box::new(SurfaceRegion::new(
///     Rect::new(10.0, 10.0, 410.0, 310.0),
///     SurfaceId(42),
/// )));
/// let mut list = scene.children(windows).to_vec();
/// list.insert(0, win);
/// scene.replace_children(windows, list)?;
///
/// let hit = scene.find_node_at(Point::new(50.0, 50.0)).unwrap();
/// assert_eq!(hit.node, win);
/// assert_eq!(hit.surface, Some(SurfaceId(42)));
/// # Ok::<(), overstory_scene::ReplaceError>(())
/// ```
pub struct Scene {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
    layers: [NodeId; Layer::COUNT],
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene with its root and the six layer nodes in place.
    ///
    /// The skeleton built here is permanent: the root and layer nodes live as
    /// long as the scene, and no public operation can detach or reorder them.
    pub fn new() -> Self {
        // Generation 0 is never allocated, so these placeholders are not live;
        // both fields are overwritten below.
        let mut scene = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::new(0, 0),
            layers: [NodeId::new(0, 0); Layer::COUNT],
        };
        scene.root = scene.alloc(true, NodeKind::Inner);
        let mut top_down = Vec::with_capacity(Layer::COUNT);
        for layer in Layer::ALL.iter().rev() {
            let id = scene.alloc(
                true,
                NodeKind::Layer {
                    outputs: HashMap::new(),
                },
            );
            scene.layers[layer.index()] = id;
            top_down.push(id);
        }
        scene.replace_children_unchecked(scene.root, top_down);
        scene
    }

    /// The root node; always live.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The structure node of `layer`; always live.
    pub fn layer(&self, layer: Layer) -> NodeId {
        self.layers[layer.index()]
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// An identifier is live if its slot exists and its generation matches the
    /// current generation stored in that slot. Identifiers of destroyed nodes
    /// are stale forever, even if the slot is reused.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Whether `id` is a structure node: the root, a layer node, a per-output
    /// node, or a static/dynamic container.
    ///
    /// Structure nodes are created and destroyed only by the scene itself.
    /// Returns `false` for stale identifiers.
    pub fn is_structure(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.structure)
    }

    /// The parent of a node, or `None` for the root, detached nodes, and
    /// stale identifiers.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// The children of a node, topmost first.
    ///
    /// Empty for leaves and stale identifiers.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// The flags of a node if the identifier is live.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node(id).map(|n| n.flags)
    }

    /// Update node flags. Stale identifiers are ignored.
    ///
    /// Flags may be set on any node, including structure nodes: disabling a
    /// per-output node is how a collaborator takes that output's layer over.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(n) = self.node_mut(id) {
            n.flags = flags;
        }
    }

    /// The content of a leaf, if `id` is a live leaf.
    pub fn content(&self, id: NodeId) -> Option<&dyn Content> {
        match &self.node(id)?.kind {
            NodeKind::Leaf { content } => Some(content.as_ref()),
            _ => None,
        }
    }

    /// Replace the content of a leaf.
    ///
    /// This is how collaborators track moves and resizes: swap in content
    /// with the new region. Stacking is untouched.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or not a leaf.
    pub fn set_content(&mut self, id: NodeId, content: Box<dyn Content>) {
        let Some(node) = self.node_mut(id) else {
            panic!("set_content: {id:?} refers to a destroyed node");
        };
        match &mut node.kind {
            NodeKind::Leaf { content: slot } => *slot = content,
            _ => panic!("set_content: {id:?} is not a leaf"),
        }
    }

    /// Create a detached plain container for collaborator use.
    ///
    /// Attach it by including it in a [`Scene::replace_children`] proposal on
    /// the intended parent.
    pub fn create_group(&mut self) -> NodeId {
        self.alloc(false, NodeKind::Inner)
    }

    /// Create a detached leaf carrying `content`.
    pub fn create_leaf(&mut self, content: Box<dyn Content>) -> NodeId {
        self.alloc(false, NodeKind::Leaf { content })
    }

    /// Destroy a node and its whole subtree.
    ///
    /// The subtree is detached from its parent, every node in it is
    /// destroyed, and leaf content is released. All identifiers into the
    /// subtree become stale. Stale `id`s are ignored, so destroying twice is
    /// safe.
    ///
    /// # Panics
    ///
    /// Panics if `id` is a structure node; those live as long as the scene
    /// (or, for per-output nodes, until their output is removed).
    pub fn remove(&mut self, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        assert!(!node.structure, "cannot remove a structure node: {id:?}");
        let parent = node.parent;
        if let Some(parent) = parent
            && let Some(p) = self.node_mut(parent)
        {
            p.children.retain(|c| *c != id);
        }
        self.remove_subtree(id);
    }

    /// Replace the children of a container with a new ordered list.
    ///
    /// This is the one structural mutation collaborators have, and it covers
    /// everything: attaching, detaching, restacking. The list is topmost
    /// first. On success, children absent from the proposal are detached
    /// (still alive; re-attach them elsewhere or destroy them with
    /// [`Scene::remove`]), every proposed child's parent becomes `id`, and
    /// the stored list becomes exactly the proposal.
    ///
    /// Raising a node to the top of its siblings is the usual dance:
    ///
    /// ```rust
    /// # use overstory_scene::{ReplaceError, Scene};
    /// # let mut scene = Scene::new();
    /// # let parent = scene.create_group();
    /// # let node = scene.create_group();
    /// # scene.replace_children(parent, vec![node])?;
    /// let mut list = scene.children(parent).to_vec();
    /// list.retain(|&n| n != node);
    /// list.insert(0, node);
    /// scene.replace_children(parent, list)?;
    /// # Ok::<(), ReplaceError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Any [`ReplaceError`] leaves the children exactly as they were:
    ///
    /// - [`ReplaceError::StaleChild`]: a proposed child has been destroyed.
    /// - [`ReplaceError::DuplicateChild`]: a node appears twice.
    /// - [`ReplaceError::StructureMismatch`]: the proposal's structure nodes
    ///   are not the current ones, in the current relative order. Collaborator
    ///   nodes may be added, dropped, and reordered around them freely.
    /// - [`ReplaceError::AlreadyParented`]: a proposed child is attached to a
    ///   different parent.
    /// - [`ReplaceError::WouldCycle`]: a proposed child is the target or one
    ///   of its ancestors.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or refers to a leaf; the target being a live
    /// container is the caller's contract.
    pub fn replace_children(
        &mut self,
        id: NodeId,
        new_children: Vec<NodeId>,
    ) -> Result<(), ReplaceError> {
        let Some(node) = self.node(id) else {
            panic!("replace_children: {id:?} refers to a destroyed node");
        };
        assert!(
            !matches!(node.kind, NodeKind::Leaf { .. }),
            "replace_children: {id:?} is a leaf, not a container"
        );

        for (i, &child) in new_children.iter().enumerate() {
            if !self.is_alive(child) {
                return Err(ReplaceError::StaleChild(child));
            }
            if new_children[..i].contains(&child) {
                return Err(ReplaceError::DuplicateChild(child));
            }
        }
        if self.structure_of(&new_children) != self.structure_of(&node.children) {
            return Err(ReplaceError::StructureMismatch);
        }
        for &child in &new_children {
            if let Some(parent) = self.parent(child)
                && parent != id
            {
                return Err(ReplaceError::AlreadyParented(child));
            }
            if child == id || self.is_ancestor_of(child, id) {
                return Err(ReplaceError::WouldCycle(child));
            }
        }

        self.replace_children_unchecked(id, new_children);
        Ok(())
    }

    /// Find the topmost node claiming `at`, searching the whole scene.
    ///
    /// Layers are searched Overlay down to Background; within every container
    /// children are searched topmost first; the first leaf whose content
    /// claims the point wins and nothing below it is consulted. Points
    /// claimed by nothing (including NaN points) yield `None`.
    pub fn find_node_at(&self, at: Point) -> Option<HitTarget> {
        self.find_node_at_in(self.root, at)
    }

    /// Find the topmost node claiming `at` within one subtree.
    ///
    /// The same search as [`Scene::find_node_at`], restricted to `subtree`.
    /// Stale identifiers yield `None`.
    pub fn find_node_at_in(&self, subtree: NodeId, at: Point) -> Option<HitTarget> {
        let node = self.node(subtree)?;
        if node.flags.contains(NodeFlags::DISABLED) {
            return None;
        }
        match &node.kind {
            NodeKind::Leaf { content } => content.contains(at).then(|| HitTarget {
                node: subtree,
                surface: content.surface_at(at),
            }),
            NodeKind::Output {
                limit: Some(limit), ..
            } if !limit.contains(at) => None,
            _ => node
                .children
                .iter()
                .find_map(|&child| self.find_node_at_in(child, at)),
        }
    }

    /// Ensure `layer` has a per-output node for `output`, returning it.
    ///
    /// The first call for an output builds the node with its two containers
    /// and stacks it below the layer's existing children. Calling again for
    /// an output already present returns the existing node unchanged, so
    /// repeated announcements are harmless.
    pub fn handle_output_added(&mut self, layer: Layer, output: OutputId) -> NodeId {
        if let Some(existing) = self.node_for_output(layer, output) {
            return existing;
        }
        let layer_id = self.layers[layer.index()];
        let static_container = self.alloc(true, NodeKind::Inner);
        let dynamic_container = self.alloc(true, NodeKind::Inner);
        let output_node = self.alloc(
            true,
            NodeKind::Output {
                dynamic_container,
                static_container,
                limit: None,
            },
        );
        // Workspace-driven content must stack above, and win input over,
        // content pinned to the output, so the dynamic container goes first.
        self.replace_children_unchecked(output_node, vec![dynamic_container, static_container]);

        let mut children = self.children(layer_id).to_vec();
        children.push(output_node);
        self.replace_children_unchecked(layer_id, children);

        if let Some(node) = self.node_mut(layer_id)
            && let NodeKind::Layer { outputs } = &mut node.kind
        {
            outputs.insert(output, output_node);
        }
        output_node
    }

    /// Drop `layer`'s node for `output`, destroying everything stacked in it.
    ///
    /// Collaborator content left inside the per-output containers is
    /// destroyed with them; identifiers into that subtree become stale.
    /// Outputs the layer does not know are ignored, so removal is safe to
    /// repeat.
    pub fn handle_output_removed(&mut self, layer: Layer, output: OutputId) {
        let layer_id = self.layers[layer.index()];
        let removed = match self.node_mut(layer_id) {
            Some(node) => match &mut node.kind {
                NodeKind::Layer { outputs } => outputs.remove(&output),
                _ => None,
            },
            None => None,
        };
        let Some(output_node) = removed else {
            return;
        };
        let mut children = self.children(layer_id).to_vec();
        children.retain(|&c| c != output_node);
        self.replace_children_unchecked(layer_id, children);
        self.remove_subtree(output_node);
    }

    /// The per-output node of `layer` for `output`.
    ///
    /// `None` for outputs the layer has not been told about; that is an
    /// expected state, not an error.
    pub fn node_for_output(&self, layer: Layer, output: OutputId) -> Option<NodeId> {
        match &self.node(self.layers[layer.index()])?.kind {
            NodeKind::Layer { outputs } => outputs.get(&output).copied(),
            _ => None,
        }
    }

    /// The container for content pinned to an output (wallpapers, panels),
    /// stacked below the dynamic one. `None` if `id` is not a live per-output
    /// node.
    pub fn static_container(&self, id: NodeId) -> Option<NodeId> {
        match &self.node(id)?.kind {
            NodeKind::Output {
                static_container, ..
            } => Some(*static_container),
            _ => None,
        }
    }

    /// The container for workspace-driven content (windows), stacked above
    /// the static one. `None` if `id` is not a live per-output node.
    pub fn dynamic_container(&self, id: NodeId) -> Option<NodeId> {
        match &self.node(id)?.kind {
            NodeKind::Output {
                dynamic_container, ..
            } => Some(*dynamic_container),
            _ => None,
        }
    }

    /// The hit-test limit region of a per-output node, if one is set.
    pub fn limit_region(&self, id: NodeId) -> Option<Rect> {
        match &self.node(id)?.kind {
            NodeKind::Output { limit, .. } => *limit,
            _ => None,
        }
    }

    /// Set or clear the hit-test limit region of a per-output node.
    ///
    /// With a region set, hit tests do not descend into the node for points
    /// outside it. Output layout code uses this to confine each per-output
    /// subtree to its output's extents, no matter how far the content inside
    /// reaches.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or not a per-output node.
    pub fn set_limit_region(&mut self, id: NodeId, region: Option<Rect>) {
        let Some(node) = self.node_mut(id) else {
            panic!("set_limit_region: {id:?} refers to a destroyed node");
        };
        match &mut node.kind {
            NodeKind::Output { limit, .. } => *limit = region,
            _ => panic!("set_limit_region: {id:?} is not an output node"),
        }
    }

    // --- internals ---

    fn node(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        (n.generation == id.1).then_some(n)
    }

    fn alloc(&mut self, structure: bool, kind: NodeKind) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, structure, kind));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, structure, kind)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// The ordered structure sub-sequence of a children list.
    fn structure_of(&self, list: &[NodeId]) -> SmallVec<[NodeId; 8]> {
        list.iter()
            .copied()
            .filter(|&n| self.is_structure(n))
            .collect()
    }

    /// Whether `maybe_ancestor` is on the parent chain of `id`.
    fn is_ancestor_of(&self, maybe_ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(n) = current {
            if n == maybe_ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Swap in a children list without validating the structure sub-sequence.
    ///
    /// Scene-internal only: this is the path that builds and maintains the
    /// skeleton. Callers guarantee the list is live, duplicate-free, and
    /// acyclic.
    fn replace_children_unchecked(&mut self, id: NodeId, new_children: Vec<NodeId>) {
        let old = self.children(id).to_vec();
        for &dropped in old.iter().filter(|c| !new_children.contains(c)) {
            if let Some(n) = self.node_mut(dropped) {
                n.parent = None;
            }
        }
        for &child in &new_children {
            if let Some(n) = self.node_mut(child) {
                n.parent = Some(id);
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.children = new_children;
        }
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let children = core::mem::take(&mut node.children);
        for child in children {
            self.remove_subtree(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }
}
