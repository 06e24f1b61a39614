//! Homogeneous-space Sutherland–Hodgman clipping against the six canonical
//! frustum planes `±w ± x <= 0`, `±w ± y <= 0`, `±w ± z <= 0`.
//!
//! Texture coordinates are carried as [`Vec2`] (the `s, t` pair); projective
//! (`r, q`) texturing is out of scope for the clipper — `TexGen` computes `q`
//! after clipping, operating on the already-clipped vertex positions, so the
//! clipper never needs to interpolate it.

use crate::math::{Vec2, Vec4};
use crate::pipeline::Triangle;

/// Upper bound on vertices in a clipped fan. A triangle clipped against all
/// six planes can produce at most `3 + 6 = 9` vertices; a little headroom is
/// budgeted for pathological near-plane cases.
pub const CLIP_CAP: usize = 12;

/// A convex polygon produced by clipping, stored as a triangle fan anchored
/// at vertex 0. `count == 0` means the input was entirely outside the
/// frustum.
#[derive(Debug, Clone, Copy)]
pub struct ClipPolygon {
    pub count: usize,
    pub pos: [Vec4; CLIP_CAP],
    pub tex: [Vec2; CLIP_CAP],
    pub color: [Vec4; CLIP_CAP],
}

impl ClipPolygon {
    fn empty() -> Self {
        Self {
            count: 0,
            pos: [Vec4::ZERO; CLIP_CAP],
            tex: [Vec2::ZERO; CLIP_CAP],
            color: [Vec4::ZERO; CLIP_CAP],
        }
    }
}

type PlaneFn = fn(Vec4) -> f32;

const PLANES: [PlaneFn; 6] = [
    |v| v.w + v.x, // x >= -w
    |v| v.w - v.x, // x <= w
    |v| v.w + v.y, // y >= -w
    |v| v.w - v.y, // y <= w
    |v| v.w + v.z, // z >= -w
    |v| v.w - v.z, // z <= w
];

/// Clip a triangle against the frustum, returning the resulting fan.
pub fn clip_triangle(tri: &Triangle) -> ClipPolygon {
    let mut front = ClipPolygon::empty();
    front.pos[0] = tri.v0;
    front.pos[1] = tri.v1;
    front.pos[2] = tri.v2;
    front.tex[0] = tri.st0;
    front.tex[1] = tri.st1;
    front.tex[2] = tri.st2;
    front.color[0] = tri.color0;
    front.color[1] = tri.color1;
    front.color[2] = tri.color2;
    front.count = 3;

    let mut back = ClipPolygon::empty();

    let mut current = &mut front;
    let mut scratch = &mut back;

    for plane in PLANES {
        if current.count == 0 {
            break;
        }
        clip_against_plane(current, scratch, plane);
        std::mem::swap(&mut current, &mut scratch);
    }

    *current
}

fn clip_against_plane(input: &ClipPolygon, output: &mut ClipPolygon, plane: PlaneFn) {
    output.count = 0;
    let n = input.count;
    if n == 0 {
        return;
    }

    for i in 0..n {
        let j = (i + 1) % n;
        let dist_i = plane(input.pos[i]);
        let dist_j = plane(input.pos[j]);

        if dist_i >= 0.0 {
            push(output, input.pos[i], input.tex[i], input.color[i]);
        }

        let crosses = (dist_i >= 0.0) != (dist_j >= 0.0);
        if crosses {
            let denom = dist_i - dist_j;
            // Parallel-to-plane edges have denom == 0 only when both
            // distances are equal, which can't happen when `crosses` is
            // true (their signs differ), so this division is safe.
            let t = dist_i / denom;
            let pos = input.pos[i].lerp(input.pos[j], t);
            let tex = input.tex[i].lerp(input.tex[j], t);
            let color = input.color[i].lerp(input.color[j], t);
            push(output, pos, tex, color);
        }
    }
}

fn push(output: &mut ClipPolygon, pos: Vec4, tex: Vec2, color: Vec4) {
    if output.count >= CLIP_CAP {
        // Pathological near-plane intersection: truncate and return the
        // partial fan rather than overflow the fixed-size buffer. This is a
        // finite, testable behavior, not a crash.
        return;
    }
    output.pos[output.count] = pos;
    output.tex[output.count] = tex;
    output.color[output.count] = color;
    output.count += 1;
}
