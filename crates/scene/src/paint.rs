use crate::engine::{ClipRect, PaintContext, ViewportSize};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PaintOp {
    Save,
    Restore,
    Clip(ClipRect),
}

/// Paint context that records graphics-state calls instead of drawing.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    size: ViewportSize,
    ops: Vec<PaintOp>,
    depth: usize,
}

impl RecordingCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: ViewportSize::new(width, height),
            ops: Vec::new(),
            depth: 0,
        }
    }

    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    /// Current save depth; zero when every save has been restored.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn clips(&self) -> Vec<ClipRect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Clip(rect) => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.depth = 0;
    }
}

impl PaintContext for RecordingCanvas {
    fn canvas_size(&self) -> ViewportSize {
        self.size
    }

    fn save(&mut self) {
        self.depth += 1;
        self.ops.push(PaintOp::Save);
    }

    fn restore(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.ops.push(PaintOp::Restore);
    }

    fn clip_rect(&mut self, rect: ClipRect) {
        self.ops.push(PaintOp::Clip(rect));
    }
}
