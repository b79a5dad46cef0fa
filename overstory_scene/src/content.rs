// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The leaf extension point: externally supplied, hit-testable content.

use kurbo::{Point, Rect};

use crate::types::SurfaceId;

/// Hit-testable content carried by a leaf node.
///
/// Collaborators (window managers, shell components, grab owners) implement
/// this to describe where their content accepts input. All coordinates are
/// scene coordinates; the scene applies no transforms of its own.
///
/// [`Content::contains`] is the input-region test. [`Content::surface_at`]
/// optionally names the surface input should be routed to; the default
/// returns `None`, which is exactly what an input-only node (a grab) wants:
/// it claims the point, and the input pipeline sees no surface to deliver to.
pub trait Content: core::fmt::Debug {
    /// Whether this content accepts input at `at`.
    fn contains(&self, at: Point) -> bool;

    /// The surface input at `at` should be routed to, if any.
    ///
    /// Only consulted for points where [`Content::contains`] returned `true`.
    fn surface_at(&self, at: Point) -> Option<SurfaceId> {
        let _ = at;
        None
    }
}

/// The simplest useful [`Content`]: one rectangle mapping to one surface.
///
/// The rectangle is half-open on its right and bottom edges (following
/// [`Rect::contains`]), so regions tiled edge to edge never both claim a
/// boundary point.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceRegion {
    /// Where the surface accepts input, in scene coordinates.
    pub region: Rect,
    /// The surface input is routed to.
    pub surface: SurfaceId,
}

impl SurfaceRegion {
    /// Create a region mapping `region` to `surface`.
    pub const fn new(region: Rect, surface: SurfaceId) -> Self {
        Self { region, surface }
    }
}

impl Content for SurfaceRegion {
    fn contains(&self, at: Point) -> bool {
        self.region.contains(at)
    }

    fn surface_at(&self, at: Point) -> Option<SurfaceId> {
        self.region.contains(at).then_some(self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_region_reports_its_surface() {
        let r = SurfaceRegion::new(Rect::new(0.0, 0.0, 100.0, 50.0), SurfaceId(7));
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert_eq!(r.surface_at(Point::new(10.0, 10.0)), Some(SurfaceId(7)));
        assert!(!r.contains(Point::new(150.0, 10.0)));
        assert_eq!(r.surface_at(Point::new(150.0, 10.0)), None);
    }

    #[test]
    fn surface_region_edges_are_half_open() {
        let r = SurfaceRegion::new(Rect::new(0.0, 0.0, 100.0, 50.0), SurfaceId(7));
        assert!(r.contains(Point::new(0.0, 0.0)), "top-left edge is inside");
        assert!(!r.contains(Point::new(100.0, 10.0)), "right edge is outside");
        assert!(!r.contains(Point::new(10.0, 50.0)), "bottom edge is outside");
    }

    #[test]
    fn input_only_content_has_no_surface() {
        #[derive(Debug)]
        struct Grab;

        impl Content for Grab {
            fn contains(&self, _at: Point) -> bool {
                true
            }
        }

        let g = Grab;
        assert!(g.contains(Point::new(3.0, 4.0)));
        assert_eq!(g.surface_at(Point::new(3.0, 4.0)), None);
    }
}
