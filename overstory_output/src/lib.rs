// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Output: output layout bookkeeping on top of the scene.
//!
//! An [`OutputLayout`] owns the set of enabled outputs (displays) and their
//! geometry in the shared scene coordinate space. It drives the scene's
//! per-output nodes so nothing else has to: enabling an output creates its
//! node in **every** layer and confines each one to the output's extents;
//! disabling destroys them; reconfiguring keeps the confinement in step with
//! the new geometry.
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use overstory_output::OutputLayout;
//! use overstory_scene::{Layer, OutputId, Scene};
//!
//! let mut scene = Scene::new();
//! let mut layout = OutputLayout::new();
//!
//! let left = OutputId(1);
//! let right = OutputId(2);
//! layout.enable_output(&mut scene, left, Rect::new(0.0, 0.0, 1920.0, 1080.0));
//! layout.enable_output(&mut scene, right, Rect::new(1920.0, 0.0, 3840.0, 1080.0));
//!
//! // Every layer now has a node for each output.
//! assert!(scene.node_for_output(Layer::Workspace, left).is_some());
//! assert!(scene.node_for_output(Layer::Overlay, right).is_some());
//! assert_eq!(layout.output_at(Point::new(2000.0, 500.0)), Some(right));
//! ```
//!
//! ## Announcements
//!
//! The layout announces changes on its three public [`Signal`] fields:
//! [`OutputLayout::output_added`], [`OutputLayout::output_removed`], and
//! [`OutputLayout::output_reconfigured`]. Emission happens after the scene
//! mutation completes, so listeners observe a consistent tree. Listeners do
//! not receive scene access (the caller still holds the `&mut Scene`); a
//! collaborator wanting to populate a fresh output records the announcement
//! and acts when control returns to it.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use overstory_scene::{Layer, OutputId, Scene};
use overstory_signal::Signal;

/// Announcement: an output was enabled and its scene nodes exist.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputAdded {
    /// The enabled output.
    pub output: OutputId,
    /// Its extents in scene coordinates.
    pub geometry: Rect,
}

/// Announcement: an output was disabled and its scene nodes are gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputRemoved {
    /// The disabled output.
    pub output: OutputId,
}

/// Announcement: an enabled output's geometry changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputReconfigured {
    /// The reconfigured output.
    pub output: OutputId,
    /// Extents before the change.
    pub old_geometry: Rect,
    /// Extents after the change.
    pub geometry: Rect,
}

/// The set of enabled outputs and their arrangement in scene coordinates.
///
/// All scene mutation goes through an explicitly passed [`Scene`]; the
/// layout holds no reference of its own, so scene and layout compose like
/// any other pieces of compositor state.
#[derive(Debug, Default)]
pub struct OutputLayout {
    outputs: HashMap<OutputId, Rect>,
    /// Announced after an output is enabled.
    pub output_added: Signal<OutputAdded>,
    /// Announced after an output is disabled.
    pub output_removed: Signal<OutputRemoved>,
    /// Announced after an output's geometry changed.
    pub output_reconfigured: Signal<OutputReconfigured>,
}

impl OutputLayout {
    /// Create a layout with no outputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable `output` with `geometry`, building its scene nodes.
    ///
    /// Every layer receives a per-output node confined to `geometry`.
    /// Announces on [`OutputLayout::output_added`] once the scene is
    /// consistent. Returns `false`, changing nothing, if the output is
    /// already enabled.
    pub fn enable_output(&mut self, scene: &mut Scene, output: OutputId, geometry: Rect) -> bool {
        if self.outputs.contains_key(&output) {
            return false;
        }
        for layer in Layer::ALL {
            let node = scene.handle_output_added(layer, output);
            scene.set_limit_region(node, Some(geometry));
        }
        self.outputs.insert(output, geometry);
        self.output_added.emit(&mut OutputAdded { output, geometry });
        true
    }

    /// Disable `output`, destroying its scene nodes in every layer.
    ///
    /// Content that collaborators stacked into those nodes is destroyed
    /// with them. Announces on [`OutputLayout::output_removed`]. Returns
    /// `false` if the output was not enabled.
    pub fn disable_output(&mut self, scene: &mut Scene, output: OutputId) -> bool {
        if self.outputs.remove(&output).is_none() {
            return false;
        }
        for layer in Layer::ALL {
            scene.handle_output_removed(layer, output);
        }
        self.output_removed.emit(&mut OutputRemoved { output });
        true
    }

    /// Move or resize an enabled output to `geometry`.
    ///
    /// Updates the limit region of its node in every layer and announces on
    /// [`OutputLayout::output_reconfigured`]. Returns `false` if the output
    /// is not enabled or the geometry is unchanged.
    pub fn reconfigure_output(
        &mut self,
        scene: &mut Scene,
        output: OutputId,
        geometry: Rect,
    ) -> bool {
        let Some(slot) = self.outputs.get_mut(&output) else {
            return false;
        };
        let old_geometry = *slot;
        if old_geometry == geometry {
            return false;
        }
        *slot = geometry;
        for layer in Layer::ALL {
            if let Some(node) = scene.node_for_output(layer, output) {
                scene.set_limit_region(node, Some(geometry));
            }
        }
        self.output_reconfigured.emit(&mut OutputReconfigured {
            output,
            old_geometry,
            geometry,
        });
        true
    }

    /// Whether `output` is enabled.
    pub fn is_enabled(&self, output: OutputId) -> bool {
        self.outputs.contains_key(&output)
    }

    /// The extents of an enabled output.
    pub fn geometry(&self, output: OutputId) -> Option<Rect> {
        self.outputs.get(&output).copied()
    }

    /// Number of enabled outputs.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Enabled outputs with their extents, in no particular order.
    pub fn outputs(&self) -> impl Iterator<Item = (OutputId, Rect)> + '_ {
        self.outputs.iter().map(|(&id, &geometry)| (id, geometry))
    }

    /// The enabled output containing `at`, if any.
    ///
    /// Extents are half-open on their right and bottom edges, so outputs
    /// tiled edge to edge never both claim a boundary point. If extents
    /// overlap, which output is returned is unspecified.
    pub fn output_at(&self, at: Point) -> Option<OutputId> {
        self.outputs
            .iter()
            .find(|(_, geometry)| geometry.contains(at))
            .map(|(&id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use overstory_scene::{SurfaceId, SurfaceRegion};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        Rect::new(x0, y0, x1, y1)
    }

    #[test]
    fn enable_populates_every_layer() {
        let mut scene = Scene::new();
        let mut layout = OutputLayout::new();
        let output = OutputId(1);
        let geometry = rect(0.0, 0.0, 1024.0, 768.0);

        assert!(layout.enable_output(&mut scene, output, geometry));
        assert!(layout.is_enabled(output));
        assert_eq!(layout.geometry(output), Some(geometry));
        assert_eq!(layout.output_count(), 1);
        for layer in Layer::ALL {
            let node = scene.node_for_output(layer, output).unwrap();
            assert_eq!(scene.limit_region(node), Some(geometry));
        }
    }

    #[test]
    fn enable_twice_changes_nothing() {
        let mut scene = Scene::new();
        let mut layout = OutputLayout::new();
        let output = OutputId(1);
        let announcements = Rc::new(RefCell::new(0_u32));

        let count = Rc::clone(&announcements);
        let _watch = layout.output_added.connect(move |_e: &mut OutputAdded| {
            *count.borrow_mut() += 1;
        });

        assert!(layout.enable_output(&mut scene, output, rect(0.0, 0.0, 100.0, 100.0)));
        assert!(!layout.enable_output(&mut scene, output, rect(0.0, 0.0, 200.0, 200.0)));
        assert_eq!(*announcements.borrow(), 1);
        assert_eq!(
            layout.geometry(output),
            Some(rect(0.0, 0.0, 100.0, 100.0)),
            "the second geometry must not stick"
        );
    }

    #[test]
    fn disable_round_trip() {
        let mut scene = Scene::new();
        let mut layout = OutputLayout::new();
        let output = OutputId(4);

        layout.enable_output(&mut scene, output, rect(0.0, 0.0, 800.0, 600.0));
        assert!(layout.disable_output(&mut scene, output));
        assert!(!layout.is_enabled(output));
        assert_eq!(layout.output_count(), 0);
        for layer in Layer::ALL {
            assert_eq!(scene.node_for_output(layer, output), None);
        }

        assert!(!layout.disable_output(&mut scene, output), "already gone");
    }

    #[test]
    fn reconfigure_updates_every_limit_region() {
        let mut scene = Scene::new();
        let mut layout = OutputLayout::new();
        let output = OutputId(2);
        let before = rect(0.0, 0.0, 1024.0, 768.0);
        let after = rect(0.0, 0.0, 1920.0, 1080.0);

        layout.enable_output(&mut scene, output, before);
        assert!(layout.reconfigure_output(&mut scene, output, after));
        assert_eq!(layout.geometry(output), Some(after));
        for layer in Layer::ALL {
            let node = scene.node_for_output(layer, output).unwrap();
            assert_eq!(scene.limit_region(node), Some(after));
        }

        assert!(!layout.reconfigure_output(&mut scene, output, after), "unchanged geometry");
        assert!(
            !layout.reconfigure_output(&mut scene, OutputId(99), after),
            "unknown output"
        );
    }

    #[test]
    fn announcements_carry_payloads() {
        let mut scene = Scene::new();
        let mut layout = OutputLayout::new();
        let output = OutputId(7);
        let log: Rc<RefCell<Vec<(&'static str, OutputId)>>> = Rc::new(RefCell::new(Vec::new()));

        let l1 = Rc::clone(&log);
        let _a = layout
            .output_added
            .connect(move |e: &mut OutputAdded| l1.borrow_mut().push(("added", e.output)));
        let l2 = Rc::clone(&log);
        let _b = layout
            .output_removed
            .connect(move |e: &mut OutputRemoved| l2.borrow_mut().push(("removed", e.output)));
        let seen = Rc::new(RefCell::new(None));
        let s2 = Rc::clone(&seen);
        let _c = layout
            .output_reconfigured
            .connect(move |e: &mut OutputReconfigured| *s2.borrow_mut() = Some(*e));

        layout.enable_output(&mut scene, output, rect(0.0, 0.0, 100.0, 100.0));
        layout.reconfigure_output(&mut scene, output, rect(50.0, 0.0, 150.0, 100.0));
        layout.disable_output(&mut scene, output);

        assert_eq!(
            log.borrow().as_slice(),
            &[("added", output), ("removed", output)]
        );
        let reconf = seen.borrow().unwrap();
        assert_eq!(reconf.old_geometry, rect(0.0, 0.0, 100.0, 100.0));
        assert_eq!(reconf.geometry, rect(50.0, 0.0, 150.0, 100.0));
    }

    #[test]
    fn output_at_uses_half_open_extents() {
        let mut scene = Scene::new();
        let mut layout = OutputLayout::new();
        let left = OutputId(1);
        let right = OutputId(2);
        layout.enable_output(&mut scene, left, rect(0.0, 0.0, 1920.0, 1080.0));
        layout.enable_output(&mut scene, right, rect(1920.0, 0.0, 3840.0, 1080.0));

        assert_eq!(layout.output_at(Point::new(100.0, 100.0)), Some(left));
        assert_eq!(
            layout.output_at(Point::new(1920.0, 100.0)),
            Some(right),
            "the shared edge belongs to the right output only"
        );
        assert_eq!(layout.output_at(Point::new(-1.0, 0.0)), None);
        assert_eq!(layout.output_at(Point::new(5000.0, 100.0)), None);
    }

    #[test]
    fn confinement_keeps_input_on_the_right_output() {
        let mut scene = Scene::new();
        let mut layout = OutputLayout::new();
        let left = OutputId(1);
        let right = OutputId(2);
        layout.enable_output(&mut scene, left, rect(0.0, 0.0, 1000.0, 1000.0));
        layout.enable_output(&mut scene, right, rect(1000.0, 0.0, 2000.0, 1000.0));

        // A window on the left output whose region spills onto the right.
        let left_node = scene.node_for_output(Layer::Workspace, left).unwrap();
        let dc = scene.dynamic_container(left_node).unwrap();
        let win = scene.create_leaf(Box::new(SurfaceRegion::new(
            rect(500.0, 0.0, 1500.0, 500.0),
            SurfaceId(1),
        )));
        let mut list = scene.children(dc).to_vec();
        list.insert(0, win);
        scene.replace_children(dc, list).unwrap();

        let hit = scene.find_node_at(Point::new(600.0, 100.0)).unwrap();
        assert_eq!(hit.node, win);
        assert_eq!(
            scene.find_node_at(Point::new(1400.0, 100.0)),
            None,
            "the spillover is confined to the left output"
        );
    }

    #[test]
    fn enable_is_consistent_after_direct_scene_use() {
        let mut scene = Scene::new();
        let mut layout = OutputLayout::new();
        let output = OutputId(3);
        // Someone already told one layer about the output.
        let early = scene.handle_output_added(Layer::Workspace, output);

        layout.enable_output(&mut scene, output, rect(0.0, 0.0, 640.0, 480.0));
        assert_eq!(scene.node_for_output(Layer::Workspace, output), Some(early));
        for layer in Layer::ALL {
            let node = scene.node_for_output(layer, output).unwrap();
            assert_eq!(scene.limit_region(node), Some(rect(0.0, 0.0, 640.0, 480.0)));
        }
    }
}
