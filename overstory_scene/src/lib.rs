// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Scene: the retained scene graph of a window compositor.
//!
//! One tree is simultaneously the stacking order and the input routing order:
//! walking it front to back visits exactly what is stacked above what, and the
//! first node claiming a point is the input target. The tree owns no pixels,
//! computes no layout, and applies no transforms; it orders content that
//! collaborators (window management, shell components, grab owners) describe
//! to it.
//!
//! - Six fixed stacking layers ([`Layer`]), wallpaper to lock screen.
//! - A per-output node inside every layer as outputs come and go, each with a
//!   dynamic container stacked above a static one.
//! - Collaborator content behind one trait ([`Content`]), attached as leaves.
//! - Skeleton protection: [`Scene::replace_children`] lets collaborators
//!   restack freely but refuses any proposal disturbing the scene's own
//!   structure nodes.
//!
//! ## How the tree is shaped
//!
//! The levels, top of the stack first within each list:
//!
//! 1. The root, an ordinary container with a fixed children list.
//! 2. The six layer nodes, Overlay down to Background.
//! 3. Inside each layer, one node per output, plus any containers
//!    collaborators add beside them (content spanning all outputs of a
//!    layer, for example).
//! 4. Inside each per-output node, the dynamic container above the static
//!    container. Static holds content pinned to the output (wallpapers,
//!    docks, panels); dynamic holds content driven by workspace logic
//!    (windows). A collaborator keeping a window above the rest of its
//!    workspace inserts a container between the two.
//! 5. Below that, collaborator groups and leaves, arbitrarily deep.
//!
//! Levels 1, 2, 3 (the per-output nodes), and 4 are *structure nodes*: the
//! scene creates them, the scene destroys them, and
//! [`Scene::replace_children`] guarantees collaborators cannot detach or
//! reorder them, only stack things around them.
//!
//! ## Hit testing
//!
//! [`Scene::find_node_at`] searches depth first, children topmost first, and
//! stops at the first leaf whose [`Content`] claims the point, so a match
//! anywhere in an upper subtree shadows everything below. Per-output nodes
//! can be confined to their output's extents with
//! [`Scene::set_limit_region`], and any subtree can be taken out of the
//! search with [`NodeFlags::DISABLED`]. Disabling is also the supported way
//! for a collaborator to take a whole per-output node over (custom
//! renderers), and input-only leaves in [`Layer::Overlay`] are how grabs
//! claim input without naming a surface.
//!
//! ## API overview
//!
//! - [`Scene`]: the arena owning every node; all operations live here.
//! - [`NodeId`]: generational handle; stale handles are harmless.
//! - [`Layer`]: the six fixed layers, bottom to top.
//! - [`Content`] / [`SurfaceRegion`]: leaf content and the simplest impl.
//! - [`HitTarget`] / [`SurfaceId`] / [`OutputId`]: query results and the
//!   opaque identifiers they carry.
//! - [`ReplaceError`]: why a children proposal was refused.
//!
//! Key operations:
//! - [`Scene::new`] builds the permanent skeleton.
//! - [`Scene::create_group`] / [`Scene::create_leaf`] /
//!   [`Scene::remove`] manage collaborator nodes.
//! - [`Scene::replace_children`] is the one structural mutation:
//!   attach, detach, restack.
//! - [`Scene::find_node_at`] / [`Scene::find_node_at_in`] hit test.
//! - [`Scene::handle_output_added`] / [`Scene::handle_output_removed`] /
//!   [`Scene::node_for_output`] track outputs per layer.
//! - [`Scene::static_container`] / [`Scene::dynamic_container`] /
//!   [`Scene::set_limit_region`] work with per-output nodes.
//!
//! All of this is single-threaded by design; a compositor core mutates the
//! scene from its event loop and nothing here blocks or does I/O.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod content;
mod scene;
mod types;

pub use content::{Content, SurfaceRegion};
pub use scene::{ReplaceError, Scene};
pub use types::{HitTarget, Layer, NodeFlags, NodeId, OutputId, SurfaceId};
