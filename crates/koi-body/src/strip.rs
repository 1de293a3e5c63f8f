//! Triangle-strip sink for ribbon geometry.
//!
//! Bodies and pond outlines do not talk to a GPU. They push points into a
//! [`StripSink`]: `cut` starts a new strip, `append` extends the current
//! one. [`StripBatch`] collects any number of strips into one vertex and
//! index buffer, separated by primitive-restart indices, so a whole pond
//! can be drawn with a single call.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Index value that restarts a triangle strip.
pub const RESTART_INDEX: u32 = u32::MAX;

/// Receiver for triangle-strip geometry.
pub trait StripSink {
    /// Start a new strip at `position`.
    fn cut(&mut self, position: Vec2, uv: Vec2);

    /// Append one vertex to the current strip.
    fn append(&mut self, position: Vec2, uv: Vec2);
}

/// One strip vertex as laid out in the vertex buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct StripVertex {
    /// World-space position.
    pub position: [f32; 2],
    /// Texture coordinate.
    pub uv: [f32; 2],
}

impl StripVertex {
    fn new(position: Vec2, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
        }
    }
}

/// Batched strips for a single draw call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StripBatch {
    vertices: Vec<StripVertex>,
    indices: Vec<u32>,
    strips: usize,
}

impl StripBatch {
    /// An empty batch.
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            strips: 0,
        }
    }

    /// Drop all geometry but keep the allocations for the next frame.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.strips = 0;
    }

    /// Vertices in submission order.
    pub fn vertices(&self) -> &[StripVertex] {
        &self.vertices
    }

    /// Strip indices, with [`RESTART_INDEX`] between strips.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex data ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data ready for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Number of strips started since the last clear.
    pub const fn strip_count(&self) -> usize {
        self.strips
    }

    /// Whether nothing was submitted since the last clear.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn push(&mut self, position: Vec2, uv: Vec2) {
        let index = u32::try_from(self.vertices.len()).unwrap_or(RESTART_INDEX);
        self.vertices.push(StripVertex::new(position, uv));
        self.indices.push(index);
    }
}

impl StripSink for StripBatch {
    fn cut(&mut self, position: Vec2, uv: Vec2) {
        if self.strips > 0 {
            self.indices.push(RESTART_INDEX);
        }
        self.strips = self.strips.saturating_add(1);
        self.push(position, uv);
    }

    fn append(&mut self, position: Vec2, uv: Vec2) {
        self.push(position, uv);
    }
}
