//! The vertex pipeline: orchestrates primitive decomposition, transform,
//! lighting, texgen, clipping, perspective divide, viewport mapping, back-
//! face culling and triangle setup, handing finished records to an
//! [`IRenderer`].
//!
//! Grounded line-for-line on `VertexPipeline.cpp`'s `drawObj`/`drawTriangle`/
//! `drawTriangleArray` (see `DESIGN.md`): the chunked buffer walk with a
//! two-vertex overlap, the per-draw-mode index rules, and the viewport's
//! `0.25` depth-encoding factor all come from there rather than from a
//! generic textbook pipeline.

use crate::clip::{clip_triangle, CLIP_CAP};
use crate::lighting::LightingState;
use crate::math::{Mat44, Vec2, Vec3, Vec4};
use crate::raster::{self, ScreenRect, SetupInput};
use crate::renderer::IRenderer;
use crate::texgen::TexGenState;

/// Vertices are processed in chunks of this size, with [`VERTEX_OVERLAP`]
/// vertices repeated at each chunk boundary so strips and fans spanning the
/// boundary still decompose correctly.
pub const VERTEX_BUFFER_SIZE: usize = 32;
/// TRIANGLE_STRIP/QUAD_STRIP need the previous two vertices to start a new
/// triangle; TRIANGLE_FAN needs vertex 0, which chunking handles separately.
pub const VERTEX_OVERLAP: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
    TriangleStrip,
    TriangleFan,
    QuadStrip,
}

impl TryFrom<u8> for DrawMode {
    type Error = crate::error::DriverError;

    /// Validates a wire-level draw-mode byte, e.g. one an application
    /// passed across an FFI boundary rather than constructed in Rust.
    fn try_from(mode: u8) -> Result<Self, Self::Error> {
        match mode {
            0 => Ok(DrawMode::Triangles),
            1 => Ok(DrawMode::TriangleStrip),
            2 => Ok(DrawMode::TriangleFan),
            3 => Ok(DrawMode::QuadStrip),
            _ => Err(crate::error::DriverError::InvalidPrimitive { mode }),
        }
    }
}

/// The screen-space orientation a triangle must have to survive culling —
/// the opposite orientation is discarded. Matches the reference
/// `VertexPipeline`'s `m_cullMode`, which names the kept face rather than
/// the discarded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullFace {
    Front,
    Back,
}

/// A clip-space triangle with its per-vertex attributes, the unit of work
/// the clipper and triangle setup operate on.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Vec4,
    pub v1: Vec4,
    pub v2: Vec4,
    pub st0: Vec2,
    pub st1: Vec2,
    pub st2: Vec2,
    pub color0: Vec4,
    pub color1: Vec4,
    pub color2: Vec4,
}

/// An application-supplied draw descriptor: enable flags, a fallback
/// constant color, and attribute fetch by index.
pub trait RenderObj {
    fn draw_mode(&self) -> DrawMode;
    fn count(&self) -> usize;

    fn vertex_array_enabled(&self) -> bool;
    fn color_array_enabled(&self) -> bool;
    fn normal_array_enabled(&self) -> bool;
    fn tex_coord_array_enabled(&self) -> bool;

    /// Used in place of a fetched color when `color_array_enabled()` is
    /// `false`.
    fn vertex_color(&self) -> Vec4;

    /// Maps an element position `[0, count)` to an attribute-array index;
    /// for non-indexed draws this is the identity function.
    fn get_index(&self, element: usize) -> u32;

    fn vertex(&self, index: u32) -> Vec3;
    fn normal(&self, index: u32) -> Vec3;
    fn tex_coord(&self, index: u32) -> Vec2;
    fn color(&self, index: u32) -> Vec4;
}

struct VertexChunk {
    vertex: [Vec3; VERTEX_BUFFER_SIZE + VERTEX_OVERLAP],
    normal: [Vec3; VERTEX_BUFFER_SIZE + VERTEX_OVERLAP],
    tex: [Vec2; VERTEX_BUFFER_SIZE + VERTEX_OVERLAP],
    color: [Vec4; VERTEX_BUFFER_SIZE + VERTEX_OVERLAP],
    clip_pos: [Vec4; VERTEX_BUFFER_SIZE + VERTEX_OVERLAP],
}

impl VertexChunk {
    fn new() -> Self {
        Self {
            vertex: [Vec3::ZERO; VERTEX_BUFFER_SIZE + VERTEX_OVERLAP],
            normal: [Vec3::ZERO; VERTEX_BUFFER_SIZE + VERTEX_OVERLAP],
            tex: [Vec2::ZERO; VERTEX_BUFFER_SIZE + VERTEX_OVERLAP],
            color: [Vec4::ZERO; VERTEX_BUFFER_SIZE + VERTEX_OVERLAP],
            clip_pos: [Vec4::ZERO; VERTEX_BUFFER_SIZE + VERTEX_OVERLAP],
        }
    }
}

pub struct VertexPipeline {
    /// Model-view-projection composite, applied to produce clip-space
    /// positions.
    model_projection: Mat44,
    /// Model-view, applied to produce eye-space positions for lighting and
    /// eye-linear texgen.
    model: Mat44,
    /// Inverse-transpose of `model`'s upper-left 3x3.
    normal: Mat44,

    viewport_x: i32,
    viewport_y: i32,
    viewport_width: i32,
    viewport_height: i32,
    viewport_width_half: f32,
    viewport_height_half: f32,
    viewport_x_shift: f32,
    viewport_y_shift: f32,

    depth_near: f32,
    depth_far: f32,

    cull_enabled: bool,
    cull_face: CullFace,

    pub lighting: LightingState,
    pub texgen: TexGenState,
}

impl VertexPipeline {
    pub fn new() -> Self {
        let mut pipeline = Self {
            model_projection: Mat44::identity(),
            model: Mat44::identity(),
            normal: Mat44::identity(),
            viewport_x: 0,
            viewport_y: 0,
            viewport_width: 0,
            viewport_height: 0,
            viewport_width_half: 0.0,
            viewport_height_half: 0.0,
            viewport_x_shift: 0.0,
            viewport_y_shift: 0.0,
            depth_near: 0.0,
            depth_far: 1.0,
            cull_enabled: false,
            cull_face: CullFace::Back,
            lighting: LightingState::new(),
            texgen: TexGenState::new(),
        };
        pipeline.set_viewport(0, 0, 1, 1);
        pipeline
    }

    pub fn set_model_projection_matrix(&mut self, m: Mat44) {
        self.model_projection = m;
    }

    pub fn set_model_matrix(&mut self, m: Mat44) {
        self.model = m;
        self.normal = Mat44::normal_matrix(&m);
    }

    pub fn set_depth_range(&mut self, near: f32, far: f32) {
        self.depth_near = near;
        self.depth_far = far;
    }

    pub fn set_cull_mode(&mut self, enabled: bool, face: CullFace) {
        self.cull_enabled = enabled;
        self.cull_face = face;
    }

    /// Matches the reference implementation's `-1` on stored height/width:
    /// the viewport transform clamps into `[0, height]` inclusive, i.e.
    /// `height + 1` distinct pixel rows, so the stored extent is one less
    /// than the requested size.
    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.viewport_x = x;
        self.viewport_y = y;
        self.viewport_width = width - 1;
        self.viewport_height = height - 1;
        self.viewport_width_half = self.viewport_width as f32 / 2.0;
        self.viewport_height_half = self.viewport_height as f32 / 2.0;
        self.viewport_x_shift = x as f32 + self.viewport_width_half;
        self.viewport_y_shift = y as f32 + self.viewport_height_half;
    }

    fn clip_rect(&self) -> ScreenRect {
        ScreenRect {
            x0: self.viewport_x,
            y0: self.viewport_y,
            x1: self.viewport_x + self.viewport_width,
            y1: self.viewport_y + self.viewport_height,
        }
    }

    fn viewport_transform(&self, v: Vec4) -> Vec4 {
        Vec4::new(
            v.x * self.viewport_width_half + self.viewport_x_shift,
            v.y * self.viewport_height_half + self.viewport_y_shift,
            (v.z + 1.0) * 0.25 * (self.depth_far - self.depth_near),
            v.w,
        )
    }

    /// Process a `RenderObj` in overlapping chunks, transforming and
    /// decomposing each chunk into triangles submitted to `renderer`.
    /// Returns `false` (without processing further chunks) the moment a
    /// submitted triangle fails, so the caller can flush and retry.
    pub fn draw_obj<O: RenderObj>(&self, obj: &O, renderer: &mut dyn IRenderer) -> bool {
        let count = obj.count();
        let mut offset = 0usize;
        let mut chunk = VertexChunk::new();

        while offset < count {
            let remaining = count - offset;
            if remaining <= VERTEX_OVERLAP {
                break;
            }
            let n = (VERTEX_BUFFER_SIZE + VERTEX_OVERLAP).min(remaining);

            self.load_vertex_data(obj, offset, n, &mut chunk);
            self.transform(obj, n, &mut chunk);
            if !self.draw_triangle_array(obj.draw_mode(), &chunk, n, renderer) {
                return false;
            }

            offset += VERTEX_BUFFER_SIZE;
        }
        true
    }

    /// Same as [`Self::draw_obj`], but reports failure as a
    /// [`crate::error::DriverError`] for callers that prefer `Result` to a
    /// bare `bool`.
    pub fn draw_obj_checked<O: RenderObj>(
        &self,
        obj: &O,
        renderer: &mut dyn IRenderer,
    ) -> Result<(), crate::error::DriverError> {
        if self.draw_obj(obj, renderer) {
            Ok(())
        } else {
            Err(crate::error::DriverError::OutOfDisplayListMemory)
        }
    }

    fn load_vertex_data<O: RenderObj>(&self, obj: &O, offset: usize, n: usize, chunk: &mut VertexChunk) {
        for i in 0..n {
            let index = obj.get_index(offset + i);
            chunk.color[i] = if obj.color_array_enabled() { obj.color(index) } else { obj.vertex_color() };
            if obj.vertex_array_enabled() {
                chunk.vertex[i] = obj.vertex(index);
            }
            if obj.normal_array_enabled() {
                chunk.normal[i] = obj.normal(index);
            }
            chunk.tex[i] = if obj.tex_coord_array_enabled() { obj.tex_coord(index) } else { Vec2::ZERO };
        }
    }

    fn transform<O: RenderObj>(&self, obj: &O, n: usize, chunk: &mut VertexChunk) {
        let vertex_enabled = obj.vertex_array_enabled();
        let normal_enabled = obj.normal_array_enabled();

        for i in 0..n {
            let object_vertex = chunk.vertex[i].to_vec4(1.0);

            let eye_vertex =
                if vertex_enabled { self.model.transform_point(object_vertex) } else { Vec4::ZERO };
            let eye_normal = if normal_enabled {
                self.normal.transform_point(chunk.normal[i].to_vec4(0.0)).xyz().normalize()
            } else {
                Vec3::new(0.0, 0.0, 1.0)
            };

            if self.lighting.enabled {
                chunk.color[i] = self.lighting.calculate(chunk.color[i], eye_vertex.xyz(), eye_normal);
            }

            let passthrough = Vec4::new(chunk.tex[i].x, chunk.tex[i].y, 0.0, 1.0);
            let generated = self.texgen.calculate(object_vertex, eye_vertex, eye_normal, passthrough);
            chunk.tex[i] = Vec2::new(generated.x, generated.y);

            chunk.clip_pos[i] =
                if vertex_enabled { self.model_projection.transform_point(object_vertex) } else { Vec4::ZERO };
        }
    }

    fn draw_triangle_array(
        &self,
        mode: DrawMode,
        chunk: &VertexChunk,
        n: usize,
        renderer: &mut dyn IRenderer,
    ) -> bool {
        let mut i = 0usize;
        while i < n.saturating_sub(VERTEX_OVERLAP) {
            let (i0, i1, i2) = match mode {
                DrawMode::Triangles => {
                    let idx = (i, i + 1, i + 2);
                    i += 3;
                    idx
                }
                DrawMode::TriangleFan => {
                    let idx = (0, i + 1, i + 2);
                    i += 1;
                    idx
                }
                DrawMode::TriangleStrip => {
                    let idx = if i & 0x1 != 0 { (i + 1, i, i + 2) } else { (i, i + 1, i + 2) };
                    i += 1;
                    idx
                }
                DrawMode::QuadStrip => {
                    let idx = if i & 0x2 != 0 { (i + 1, i, i + 2) } else { (i, i + 1, i + 2) };
                    i += 1;
                    idx
                }
            };

            if i2 >= n {
                break;
            }

            let triangle = Triangle {
                v0: chunk.clip_pos[i0],
                v1: chunk.clip_pos[i1],
                v2: chunk.clip_pos[i2],
                st0: chunk.tex[i0],
                st1: chunk.tex[i1],
                st2: chunk.tex[i2],
                color0: chunk.color[i0],
                color1: chunk.color[i1],
                color2: chunk.color[i2],
            };
            if !self.draw_triangle(&triangle, renderer) {
                return false;
            }
        }
        true
    }

    /// Clip, perspective-divide, viewport-map, cull-test once, then emit
    /// the clipped fan as individual `RasterizedTriangle`s.
    pub fn draw_triangle(&self, triangle: &Triangle, renderer: &mut dyn IRenderer) -> bool {
        let clipped = clip_triangle(triangle);
        if clipped.count < 3 {
            return true;
        }

        let mut pos = [Vec4::ZERO; CLIP_CAP];
        for k in 0..clipped.count {
            pos[k] = self.viewport_transform(clipped.pos[k].homogeneous_divide());
        }

        if self.cull_enabled {
            let edge = (pos[1].x - pos[0].x) * (pos[2].y - pos[0].y)
                - (pos[1].y - pos[0].y) * (pos[2].x - pos[0].x);
            let is_back_face = edge <= 0.0;
            let keep_back = self.cull_face == CullFace::Back;
            if is_back_face != keep_back {
                return true;
            }
        }

        let clip_rect = self.clip_rect();
        for k in 3..=clipped.count {
            let input = SetupInput {
                v0: pos[0],
                v1: pos[k - 2],
                v2: pos[k - 1],
                st0: clipped.tex[0],
                st1: clipped.tex[k - 2],
                st2: clipped.tex[k - 1],
                color0: clipped.color[0],
                color1: clipped.color[k - 2],
                color2: clipped.color[k - 1],
            };
            if let Some(rasterized) = raster::setup_triangle(&input, clip_rect) {
                if !renderer.draw_triangle(&rasterized) {
                    return false;
                }
            }
        }
        true
    }
}

impl Default for VertexPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingRenderer {
        triangles: Vec<raster::RasterizedTriangle>,
    }

    impl IRenderer for RecordingRenderer {
        fn draw_triangle(&mut self, triangle: &raster::RasterizedTriangle) -> bool {
            self.triangles.push(*triangle);
            true
        }
    }

    struct StripObj {
        vertices: Vec<Vec3>,
    }

    impl RenderObj for StripObj {
        fn draw_mode(&self) -> DrawMode {
            DrawMode::TriangleStrip
        }
        fn count(&self) -> usize {
            self.vertices.len()
        }
        fn vertex_array_enabled(&self) -> bool {
            true
        }
        fn color_array_enabled(&self) -> bool {
            false
        }
        fn normal_array_enabled(&self) -> bool {
            false
        }
        fn tex_coord_array_enabled(&self) -> bool {
            false
        }
        fn vertex_color(&self) -> Vec4 {
            Vec4::ONE
        }
        fn get_index(&self, element: usize) -> u32 {
            element as u32
        }
        fn vertex(&self, index: u32) -> Vec3 {
            self.vertices[index as usize]
        }
        fn normal(&self, _index: u32) -> Vec3 {
            Vec3::new(0.0, 0.0, 1.0)
        }
        fn tex_coord(&self, _index: u32) -> Vec2 {
            Vec2::ZERO
        }
        fn color(&self, _index: u32) -> Vec4 {
            Vec4::ONE
        }
    }

    fn identity_pipeline() -> VertexPipeline {
        let mut pipeline = VertexPipeline::new();
        pipeline.set_viewport(0, 0, 100, 100);
        pipeline.set_depth_range(0.0, 1.0);
        pipeline
    }

    #[test]
    fn draw_mode_rejects_unknown_wire_value() {
        assert_eq!(DrawMode::try_from(0u8), Ok(DrawMode::Triangles));
        assert!(DrawMode::try_from(9u8).is_err());
    }

    #[test]
    fn single_triangle_produces_one_rasterized_triangle() {
        let pipeline = identity_pipeline();
        let triangle = Triangle {
            v0: Vec4::new(-1.0, -1.0, 0.0, 1.0),
            v1: Vec4::new(1.0, -1.0, 0.0, 1.0),
            v2: Vec4::new(0.0, 1.0, 0.0, 1.0),
            st0: Vec2::ZERO,
            st1: Vec2::ZERO,
            st2: Vec2::ZERO,
            color0: Vec4::ONE,
            color1: Vec4::ONE,
            color2: Vec4::ONE,
        };
        let mut renderer = RecordingRenderer { triangles: Vec::new() };
        assert!(pipeline.draw_triangle(&triangle, &mut renderer));
        assert_eq!(renderer.triangles.len(), 1);
        let tri = &renderer.triangles[0];
        assert_eq!(tri.bbox_min_x, 0);
        assert_eq!(tri.bbox_min_y, 0);
        assert_eq!(tri.bbox_max_x, 99);
        assert_eq!(tri.bbox_max_y, 99);
    }

    #[test]
    fn viewport_round_trip_matches_corners() {
        let pipeline = identity_pipeline();
        let left = pipeline.viewport_transform(Vec4::new(-1.0, -1.0, -1.0, 1.0));
        let right = pipeline.viewport_transform(Vec4::new(1.0, 1.0, 1.0, 1.0));
        let center = pipeline.viewport_transform(Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert!((left.x - 0.0).abs() < 1e-4);
        assert!((right.x - 99.0).abs() < 1e-4);
        assert!((center.x - 49.5).abs() < 1e-4);
    }

    #[test]
    fn four_vertex_strip_decomposes_with_odd_swap() {
        let obj = StripObj {
            vertices: vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ],
        };
        let mut pipeline = identity_pipeline();
        pipeline.set_model_projection_matrix(Mat44::identity());
        let mut renderer = RecordingRenderer { triangles: Vec::new() };
        assert!(pipeline.draw_obj(&obj, &mut renderer));
    }

    fn clockwise_triangle() -> Triangle {
        // Clockwise in NDC -> screen-space back face under our convention.
        Triangle {
            v0: Vec4::new(-1.0, -1.0, 0.0, 1.0),
            v1: Vec4::new(0.0, 1.0, 0.0, 1.0),
            v2: Vec4::new(1.0, -1.0, 0.0, 1.0),
            st0: Vec2::ZERO,
            st1: Vec2::ZERO,
            st2: Vec2::ZERO,
            color0: Vec4::ONE,
            color1: Vec4::ONE,
            color2: Vec4::ONE,
        }
    }

    #[test]
    fn triangle_with_opposite_orientation_is_culled() {
        let mut pipeline = identity_pipeline();
        pipeline.set_cull_mode(true, CullFace::Front);
        let mut renderer = RecordingRenderer { triangles: Vec::new() };
        assert!(pipeline.draw_triangle(&clockwise_triangle(), &mut renderer));
        assert!(renderer.triangles.is_empty());
    }

    #[test]
    fn triangle_with_matching_orientation_is_kept() {
        let mut pipeline = identity_pipeline();
        pipeline.set_cull_mode(true, CullFace::Back);
        let mut renderer = RecordingRenderer { triangles: Vec::new() };
        assert!(pipeline.draw_triangle(&clockwise_triangle(), &mut renderer));
        assert_eq!(renderer.triangles.len(), 1);
    }
}
