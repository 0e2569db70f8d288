//! Viewport transform, fitting and camera animation
//!
//! This module contains pure calculation logic that can be unit tested
//! without any rendering surface. Screen coordinates are obtained from world
//! coordinates as `screen = world * scale + translate`.

use serde::{Deserialize, Serialize};

use crate::config::ViewportConfig;
use crate::simulation::LayoutPosition;

/// Scale and translation applied to world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    /// Convert world coordinates to screen coordinates
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale + self.translate_x,
            y * self.scale + self.translate_y,
        )
    }

    /// Convert screen coordinates to world coordinates
    pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.translate_x) / self.scale,
            (sy - self.translate_y) / self.scale,
        )
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create an empty bounding box
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Bounding box of a set of points
    pub fn of_points(points: &[LayoutPosition]) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.include_point(p.x, p.y);
        }
        bb
    }

    /// Check if the bounding box is empty
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Empty, flat in either axis, or not finite
    pub fn is_degenerate(&self) -> bool {
        self.is_empty()
            || !(self.width() > 0.0 && self.height() > 0.0)
            || !(self.width().is_finite() && self.height().is_finite())
    }

    /// Expand the bounding box to include a point
    pub fn include_point(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// Expand the bounding box to include a circle
    pub fn include_circle(&mut self, x: f64, y: f64, radius: f64) {
        self.min_x = self.min_x.min(x - radius);
        self.max_x = self.max_x.max(x + radius);
        self.min_y = self.min_y.min(y - radius);
        self.max_y = self.max_y.max(y + radius);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.min_y + self.max_y) / 2.0
    }
}

/// Computes the transform that frames all nodes inside the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFitter {
    pub padding: f64,
    pub max_zoom: f64,
    /// Fit node circles rather than just their centers
    pub include_radius: bool,
}

impl ViewportFitter {
    pub fn from_config(config: &ViewportConfig) -> Self {
        Self {
            padding: config.fit_padding,
            max_zoom: config.fit_max_zoom,
            include_radius: config.fit_include_radius,
        }
    }

    /// Transform fitting `positions` (with optional `radii`) into the viewport
    ///
    /// Returns `None` when the positions span zero width or height (including
    /// the single-node and empty cases) or when no finite positive scale
    /// exists; callers keep their previous transform in that case.
    pub fn fit(
        &self,
        positions: &[LayoutPosition],
        radii: &[f64],
        width: f64,
        height: f64,
    ) -> Option<ViewTransform> {
        let points = BoundingBox::of_points(positions);
        if points.is_degenerate() {
            return None;
        }

        let bounds = if self.include_radius {
            let mut bb = points;
            for (p, r) in positions.iter().zip(radii) {
                bb.include_circle(p.x, p.y, *r);
            }
            bb
        } else {
            points
        };

        self.fit_bounds(&bounds, width, height)
    }

    /// Transform fitting an explicit bounding box into the viewport
    pub fn fit_bounds(&self, bounds: &BoundingBox, width: f64, height: f64) -> Option<ViewTransform> {
        if bounds.is_degenerate() {
            return None;
        }

        // Calculate the available area (with padding)
        let available_width = width - 2.0 * self.padding;
        let available_height = height - 2.0 * self.padding;

        let scale = (available_width / bounds.width())
            .min(available_height / bounds.height())
            .min(self.max_zoom);
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }

        Some(ViewTransform {
            translate_x: width / 2.0 - scale * bounds.center_x(),
            translate_y: height / 2.0 - scale * bounds.center_y(),
            scale,
        })
    }
}

/// Camera state for 2D view transformations
#[derive(Debug, Clone)]
pub struct Viewport {
    /// Canvas width in pixels
    pub width: f64,
    /// Canvas height in pixels
    pub height: f64,
    /// Transform currently applied
    pub transform: ViewTransform,
    /// Target transform for smooth animation
    pub target: ViewTransform,
    /// Whether we're currently animating
    pub is_animating: bool,
    min_zoom: f64,
    max_zoom: f64,
    lerp: f64,
    fitter: ViewportFitter,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: &ViewportConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            transform: ViewTransform::IDENTITY,
            target: ViewTransform::IDENTITY,
            is_animating: false,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            lerp: config.animation_lerp,
            fitter: ViewportFitter::from_config(config),
        }
    }

    /// Convert world coordinates to screen coordinates
    pub fn world_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.apply(x, y)
    }

    /// Convert screen coordinates to world coordinates
    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        self.transform.invert(sx, sy)
    }

    pub fn scale(&self) -> f64 {
        self.transform.scale
    }

    /// Update animation state (call each frame)
    /// Returns true if still animating
    pub fn update_animation(&mut self) -> bool {
        if !self.is_animating {
            return false;
        }

        let t = &mut self.transform;
        let target = self.target;
        t.scale += (target.scale - t.scale) * self.lerp;
        t.translate_x += (target.translate_x - t.translate_x) * self.lerp;
        t.translate_y += (target.translate_y - t.translate_y) * self.lerp;

        let scale_diff = (target.scale - t.scale).abs();
        let tx_diff = (target.translate_x - t.translate_x).abs();
        let ty_diff = (target.translate_y - t.translate_y).abs();

        if scale_diff < 0.001 && tx_diff < 0.1 && ty_diff < 0.1 {
            // Snap to final values
            self.transform = target;
            self.is_animating = false;
        }

        self.is_animating
    }

    /// Pan the view by delta pixels; node positions are untouched
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.transform.translate_x += dx;
        self.transform.translate_y += dy;
        // Also update target to prevent animation fighting
        self.stop_animation();
    }

    /// Zoom by `factor`, keeping the world point under the pointer fixed
    pub fn zoom_at(&mut self, factor: f64, pointer_x: f64, pointer_y: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let old = self.transform.scale;
        let new = (old * factor).clamp(self.min_zoom, self.max_zoom);
        let ratio = new / old;

        self.transform.translate_x = pointer_x - (pointer_x - self.transform.translate_x) * ratio;
        self.transform.translate_y = pointer_y - (pointer_y - self.transform.translate_y) * ratio;
        self.transform.scale = new;
        self.stop_animation();
    }

    /// Reset view to identity
    pub fn reset_view(&mut self) {
        self.transform = ViewTransform::IDENTITY;
        self.target = ViewTransform::IDENTITY;
        self.is_animating = false;
    }

    /// Animate toward a transform framing the given nodes
    ///
    /// Returns false (leaving the view unchanged) when fitting is degenerate.
    pub fn fit_to(&mut self, positions: &[LayoutPosition], radii: &[f64]) -> bool {
        match self.fitter.fit(positions, radii, self.width, self.height) {
            Some(target) => {
                self.target = target;
                self.is_animating = true;
                true
            }
            None => false,
        }
    }

    /// Jump straight to the current target
    pub fn snap(&mut self) {
        self.transform = self.target;
        self.is_animating = false;
    }

    /// Resize the canvas dimensions
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn stop_animation(&mut self) {
        self.target = self.transform;
        self.is_animating = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> LayoutPosition {
        LayoutPosition::new(x, y)
    }

    fn fitter(padding: f64) -> ViewportFitter {
        ViewportFitter {
            padding,
            max_zoom: 10.0,
            include_radius: false,
        }
    }

    // ========== ViewTransform Tests ==========

    #[test]
    fn apply_and_invert_roundtrip() {
        let t = ViewTransform {
            translate_x: 25.0,
            translate_y: -15.0,
            scale: 1.5,
        };
        let (sx, sy) = t.apply(100.0, -50.0);
        let (x, y) = t.invert(sx, sy);
        assert!((x - 100.0).abs() < 1e-9);
        assert!((y + 50.0).abs() < 1e-9);
    }

    // ========== ViewportFitter Tests ==========

    #[test]
    fn fit_calculates_correct_scale() {
        let t = fitter(0.0)
            .fit(&[p(-100.0, -50.0), p(100.0, 50.0)], &[], 800.0, 600.0)
            .unwrap();
        // Box is 200x100, canvas is 800x600: min(4, 6) = 4
        assert_eq!(t.scale, 4.0);
    }

    #[test]
    fn fit_centers_box_midpoint() {
        let t = fitter(0.0)
            .fit(&[p(0.0, 0.0), p(200.0, 100.0)], &[], 800.0, 600.0)
            .unwrap();
        let (cx, cy) = t.apply(100.0, 50.0);
        assert_eq!(cx, 400.0);
        assert_eq!(cy, 300.0);
    }

    #[test]
    fn fit_with_padding() {
        let t = fitter(50.0)
            .fit(&[p(-100.0, -50.0), p(100.0, 50.0)], &[], 800.0, 600.0)
            .unwrap();
        // Available area is 700x500: min(3.5, 5) = 3.5
        assert_eq!(t.scale, 3.5);
    }

    #[test]
    fn fit_respects_max_zoom() {
        let f = ViewportFitter {
            padding: 40.0,
            max_zoom: 1.2,
            include_radius: false,
        };
        let t = f.fit(&[p(0.0, 0.0), p(10.0, 10.0)], &[], 900.0, 600.0).unwrap();
        assert_eq!(t.scale, 1.2);
    }

    #[test]
    fn fitted_points_stay_inside_padding() {
        let positions = [
            p(-320.0, 12.0),
            p(55.5, -410.0),
            p(700.0, 90.0),
            p(10.0, 260.0),
            p(-3.0, -3.0),
        ];
        let (w, h, pad) = (900.0, 600.0, 40.0);
        let f = ViewportFitter {
            padding: pad,
            max_zoom: 1.2,
            include_radius: false,
        };
        let t = f.fit(&positions, &[], w, h).unwrap();
        for pos in &positions {
            let (sx, sy) = t.apply(pos.x, pos.y);
            assert!(sx >= pad - 1e-9 && sx <= w - pad + 1e-9, "x {sx} escapes");
            assert!(sy >= pad - 1e-9 && sy <= h - pad + 1e-9, "y {sy} escapes");
        }
    }

    #[test]
    fn fit_including_radius_keeps_circles_inside() {
        let positions = [p(0.0, 0.0), p(100.0, 40.0)];
        let radii = [10.0, 20.0];
        let f = ViewportFitter {
            padding: 10.0,
            max_zoom: 100.0,
            include_radius: true,
        };
        let t = f.fit(&positions, &radii, 400.0, 300.0).unwrap();
        for (pos, r) in positions.iter().zip(radii) {
            let (sx, sy) = t.apply(pos.x, pos.y);
            let sr = r * t.scale;
            assert!(sx - sr >= 10.0 - 1e-9 && sx + sr <= 390.0 + 1e-9);
            assert!(sy - sr >= 10.0 - 1e-9 && sy + sr <= 290.0 + 1e-9);
        }
    }

    #[test]
    fn single_node_is_degenerate() {
        assert!(fitter(40.0).fit(&[p(5.0, 5.0)], &[8.0], 800.0, 600.0).is_none());
    }

    #[test]
    fn collinear_nodes_are_degenerate() {
        let positions = [p(0.0, 5.0), p(100.0, 5.0)];
        assert!(fitter(0.0).fit(&positions, &[], 800.0, 600.0).is_none());
    }

    #[test]
    fn empty_positions_are_degenerate() {
        assert!(fitter(0.0).fit(&[], &[], 800.0, 600.0).is_none());
    }

    #[test]
    fn padding_larger_than_viewport_skips_fit() {
        let positions = [p(0.0, 0.0), p(10.0, 10.0)];
        assert!(fitter(500.0).fit(&positions, &[], 800.0, 600.0).is_none());
    }

    // ========== Viewport Tests ==========

    #[test]
    fn viewport_default_values() {
        let vp = Viewport::default();
        assert_eq!(vp.transform, ViewTransform::IDENTITY);
        assert!(!vp.is_animating);
    }

    #[test]
    fn pan_translates_without_scaling() {
        let mut vp = Viewport::default();
        vp.transform.scale = 2.0;
        vp.pan(100.0, 50.0);
        assert_eq!(vp.transform.translate_x, 100.0);
        assert_eq!(vp.transform.translate_y, 50.0);
        assert_eq!(vp.transform.scale, 2.0);
    }

    #[test]
    fn zoom_keeps_pointer_fixed() {
        let mut vp = Viewport::default();
        vp.pan(30.0, -20.0);
        let before = vp.screen_to_world(300.0, 200.0);

        vp.zoom_at(2.0, 300.0, 200.0);

        let after = vp.screen_to_world(300.0, 200.0);
        assert_eq!(vp.scale(), 2.0);
        assert!((before.0 - after.0).abs() < 1e-9);
        assert!((before.1 - after.1).abs() < 1e-9);
    }

    #[test]
    fn zoom_clamps_to_bounds() {
        let mut vp = Viewport::default();
        vp.zoom_at(0.01, 0.0, 0.0);
        assert_eq!(vp.scale(), 0.15);
        vp.zoom_at(1000.0, 0.0, 0.0);
        assert_eq!(vp.scale(), 5.0);
    }

    #[test]
    fn reset_view_restores_identity() {
        let mut vp = Viewport::default();
        vp.pan(100.0, 50.0);
        vp.zoom_at(2.0, 0.0, 0.0);
        vp.is_animating = true;

        vp.reset_view();

        assert_eq!(vp.transform, ViewTransform::IDENTITY);
        assert!(!vp.is_animating);
    }

    #[test]
    fn animation_interpolates_towards_target() {
        let mut vp = Viewport::default();
        vp.target = ViewTransform {
            translate_x: 100.0,
            translate_y: 0.0,
            scale: 2.0,
        };
        vp.is_animating = true;

        for _ in 0..10 {
            vp.update_animation();
        }

        assert!(vp.scale() > 1.0 && vp.scale() < 2.0);
        assert!(vp.transform.translate_x > 0.0 && vp.transform.translate_x < 100.0);
    }

    #[test]
    fn animation_completes_and_snaps() {
        let mut vp = Viewport::default();
        let target = ViewTransform {
            translate_x: 100.0,
            translate_y: 50.0,
            scale: 2.0,
        };
        vp.target = target;
        vp.is_animating = true;

        for _ in 0..200 {
            if !vp.update_animation() {
                break;
            }
        }

        assert_eq!(vp.transform, target);
        assert!(!vp.is_animating);
    }

    #[test]
    fn degenerate_fit_keeps_previous_transform() {
        let mut vp = Viewport::default();
        vp.pan(12.0, 34.0);
        let before = vp.transform;

        assert!(!vp.fit_to(&[p(1.0, 1.0)], &[5.0]));

        assert_eq!(vp.transform, before);
        assert_eq!(vp.target, before);
        assert!(!vp.is_animating);
    }

    #[test]
    fn fit_to_starts_animation() {
        let mut vp = Viewport::default();
        assert!(vp.fit_to(&[p(0.0, 0.0), p(300.0, 200.0)], &[5.0, 5.0]));
        assert!(vp.is_animating);
        vp.snap();
        assert!(!vp.is_animating);
        assert_eq!(vp.transform, vp.target);
    }

    #[test]
    fn pan_cancels_running_animation() {
        let mut vp = Viewport::default();
        vp.fit_to(&[p(0.0, 0.0), p(300.0, 200.0)], &[5.0, 5.0]);
        vp.pan(1.0, 1.0);
        assert!(!vp.is_animating);
        assert_eq!(vp.target, vp.transform);
    }

    // ========== BoundingBox Tests ==========

    #[test]
    fn bounding_box_empty() {
        let bb = BoundingBox::empty();
        assert!(bb.is_empty());
        assert!(bb.is_degenerate());
    }

    #[test]
    fn bounding_box_include_point() {
        let mut bb = BoundingBox::empty();
        bb.include_point(10.0, 20.0);
        bb.include_point(-5.0, 30.0);

        assert!(!bb.is_empty());
        assert_eq!(bb.min_x, -5.0);
        assert_eq!(bb.max_x, 10.0);
        assert_eq!(bb.min_y, 20.0);
        assert_eq!(bb.max_y, 30.0);
    }

    #[test]
    fn bounding_box_include_circle() {
        let mut bb = BoundingBox::empty();
        bb.include_circle(0.0, 0.0, 10.0);

        assert_eq!(bb.min_x, -10.0);
        assert_eq!(bb.max_x, 10.0);
        assert_eq!(bb.min_y, -10.0);
        assert_eq!(bb.max_y, 10.0);
    }

    #[test]
    fn bounding_box_dimensions() {
        let bb = BoundingBox {
            min_x: 0.0,
            max_x: 100.0,
            min_y: 0.0,
            max_y: 50.0,
        };

        assert_eq!(bb.width(), 100.0);
        assert_eq!(bb.height(), 50.0);
        assert_eq!(bb.center_x(), 50.0);
        assert_eq!(bb.center_y(), 25.0);
    }
}
