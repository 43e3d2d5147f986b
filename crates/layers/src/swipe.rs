use scene::engine::{ClipRect, PaintContext, ViewportSize};

/// Clips a layer's paint to the left part of the viewport.
///
/// The fraction is a percentage of the viewport width; unset, zero or NaN
/// disables clipping.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct SwipeClip {
    fraction: Option<f64>,
}

impl SwipeClip {
    pub fn new(fraction: Option<f64>) -> Self {
        Self { fraction }
    }

    pub fn fraction(&self) -> Option<f64> {
        self.fraction
    }

    /// Stores a new fraction. Returns `true` if it differs from the old one.
    pub fn set_fraction(&mut self, fraction: Option<f64>) -> bool {
        if self.fraction == fraction {
            return false;
        }
        self.fraction = fraction;
        true
    }

    pub fn is_active(&self) -> bool {
        self.fraction.is_some_and(|f| f != 0.0 && !f.is_nan())
    }

    /// Clip rectangle for a canvas of `size`, anchored at the left edge.
    pub fn clip_rect(&self, size: ViewportSize) -> Option<ClipRect> {
        if !self.is_active() {
            return None;
        }
        let fraction = self.fraction?.clamp(0.0, 100.0);
        Some(ClipRect {
            x: 0.0,
            y: 0.0,
            width: size.width * (fraction / 100.0),
            height: size.height,
        })
    }

    /// Saves graphics state, then clips if active. Pair with [`Self::post_paint`].
    pub fn pre_paint(&self, ctx: &mut dyn PaintContext) {
        ctx.save();
        if let Some(rect) = self.clip_rect(ctx.canvas_size()) {
            ctx.clip_rect(rect);
        }
    }

    pub fn post_paint(&self, ctx: &mut dyn PaintContext) {
        ctx.restore();
    }
}
