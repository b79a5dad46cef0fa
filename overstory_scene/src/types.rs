// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene graph: node identifiers, layers, flags, and hit results.

/// Identifier for a node in the scene (generational).
///
/// Identifiers are cheap to copy and remain valid until the node they refer to
/// is destroyed. A stale identifier is harmless: queries return `None`/empty
/// for it and [`Scene::is_alive`](crate::Scene::is_alive) reports `false`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of an output (a display) as assigned by the backend.
///
/// The scene treats these as opaque: it never allocates them and never
/// interprets their value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct OutputId(pub u32);

/// Identifier of a content surface as assigned by the content provider.
///
/// Leaves report these from hit tests so that input routing can address the
/// surface without the scene knowing anything else about it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SurfaceId(pub u64);

/// The fixed stacking layers of the scene, bottom to top.
///
/// Every scene has exactly one node per layer, created up front and never
/// added, removed, or reordered. The derived ordering follows stacking:
/// `Layer::Background < Layer::Overlay`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum Layer {
    /// Wallpapers and other bottommost content.
    Background = 0,
    /// Shell surfaces stacked below windows, for example docks.
    Bottom = 1,
    /// Regular windows, arranged by workspace logic.
    Workspace = 2,
    /// Shell surfaces stacked above windows, for example panels and bars.
    Top = 3,
    /// Windows that position themselves: override-redirect windows, drag icons.
    Unmanaged = 4,
    /// Topmost content: lock screens, input grabs.
    Overlay = 5,
}

impl Layer {
    /// Number of layers in a scene.
    pub const COUNT: usize = 6;

    /// All layers in stacking order, bottom to top.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Background,
        Self::Bottom,
        Self::Workspace,
        Self::Top,
        Self::Unmanaged,
        Self::Overlay,
    ];

    /// Index of this layer, `0` for [`Layer::Background`] through `5` for
    /// [`Layer::Overlay`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

bitflags::bitflags! {
    /// Node flags controlling participation in scene queries.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// The node and its whole subtree are skipped by hit tests.
        ///
        /// Disabling a per-output node of a layer is how a collaborator takes
        /// an output over (for example to draw that layer itself); disabling
        /// an individual subtree hides it from input without detaching it.
        const DISABLED = 0b0000_0001;
    }
}

/// Result of a hit test: the topmost node claiming the point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HitTarget {
    /// The node that claimed the point.
    pub node: NodeId,
    /// The surface to route input to, if the node has one.
    ///
    /// Input-only nodes (grabs) claim points without naming a surface.
    pub surface: Option<SurfaceId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_order_is_bottom_to_top() {
        assert!(Layer::Background < Layer::Bottom);
        assert!(Layer::Bottom < Layer::Workspace);
        assert!(Layer::Workspace < Layer::Top);
        assert!(Layer::Top < Layer::Unmanaged);
        assert!(Layer::Unmanaged < Layer::Overlay);
    }

    #[test]
    fn layer_all_matches_indices() {
        assert_eq!(Layer::ALL.len(), Layer::COUNT);
        for (i, layer) in Layer::ALL.iter().enumerate() {
            assert_eq!(layer.index(), i);
        }
    }

    #[test]
    fn default_flags_are_empty() {
        assert_eq!(NodeFlags::default(), NodeFlags::empty());
    }
}
