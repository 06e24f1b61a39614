//! Texture-coordinate generation: object-linear, eye-linear, sphere-map,
//! reflection-map and normal-map, configured independently per `(s, t, r,
//! q)` coordinate.

use crate::math::{Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexGenMode {
    ObjectLinear,
    EyeLinear,
    SphereMap,
    ReflectionMap,
    NormalMap,
}

#[derive(Debug, Clone, Copy)]
pub struct CoordGen {
    pub enabled: bool,
    pub mode: TexGenMode,
    /// Plane coefficients dotted against the object-space vertex (`w = 1`).
    pub object_plane: Vec4,
    /// Plane coefficients dotted against the eye-space vertex, assumed
    /// already expressed in the eye space the pipeline transforms into.
    pub eye_plane: Vec4,
}

impl CoordGen {
    fn disabled(object_plane: Vec4, eye_plane: Vec4) -> Self {
        Self { enabled: false, mode: TexGenMode::EyeLinear, object_plane, eye_plane }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TexGenState {
    pub s: CoordGen,
    pub t: CoordGen,
    pub r: CoordGen,
    pub q: CoordGen,
}

impl TexGenState {
    /// Matches the classic GL default object-plane coefficients: `s =
    /// (1,0,0,0)`, `t = (0,1,0,0)`, `r = q = (0,0,0,0)`.
    pub fn new() -> Self {
        Self {
            s: CoordGen::disabled(Vec4::new(1.0, 0.0, 0.0, 0.0), Vec4::new(1.0, 0.0, 0.0, 0.0)),
            t: CoordGen::disabled(Vec4::new(0.0, 1.0, 0.0, 0.0), Vec4::new(0.0, 1.0, 0.0, 0.0)),
            r: CoordGen::disabled(Vec4::ZERO, Vec4::ZERO),
            q: CoordGen::disabled(Vec4::ZERO, Vec4::ZERO),
        }
    }

    /// Generate `(s, t, r, q)` for one vertex. Coordinates with texgen
    /// disabled pass `passthrough`'s matching component through unchanged.
    pub fn calculate(
        &self,
        object_vertex: Vec4,
        eye_vertex: Vec4,
        eye_normal: Vec3,
        passthrough: Vec4,
    ) -> Vec4 {
        let reflection = sphere_inputs(eye_vertex, eye_normal);
        Vec4::new(
            coord(&self.s, 0, object_vertex, eye_vertex, eye_normal, passthrough.x, reflection),
            coord(&self.t, 1, object_vertex, eye_vertex, eye_normal, passthrough.y, reflection),
            coord(&self.r, 2, object_vertex, eye_vertex, eye_normal, passthrough.z, reflection),
            coord(&self.q, 3, object_vertex, eye_vertex, eye_normal, passthrough.w, reflection),
        )
    }
}

impl Default for TexGenState {
    fn default() -> Self {
        Self::new()
    }
}

/// Reflection vector shared by sphere-map and reflection-map, computed once
/// per vertex regardless of how many coordinates use it.
fn sphere_inputs(eye_vertex: Vec4, eye_normal: Vec3) -> Vec3 {
    let view = eye_vertex.xyz().normalize();
    let normal = eye_normal.normalize();
    view - normal * (2.0 * normal.dot(view))
}

fn coord(
    c: &CoordGen,
    component: usize,
    object_vertex: Vec4,
    eye_vertex: Vec4,
    eye_normal: Vec3,
    passthrough: f32,
    reflection: Vec3,
) -> f32 {
    if !c.enabled {
        return passthrough;
    }
    match c.mode {
        TexGenMode::ObjectLinear => c.object_plane.dot(object_vertex),
        TexGenMode::EyeLinear => c.eye_plane.dot(eye_vertex),
        TexGenMode::SphereMap => {
            let m = 2.0 * (reflection.x * reflection.x
                + reflection.y * reflection.y
                + (reflection.z + 1.0) * (reflection.z + 1.0))
                .sqrt();
            let m = if m.abs() < 1e-6 { 1.0 } else { m };
            match component {
                0 => reflection.x / m + 0.5,
                1 => reflection.y / m + 0.5,
                _ => passthrough,
            }
        }
        TexGenMode::ReflectionMap => match component {
            0 => reflection.x,
            1 => reflection.y,
            2 => reflection.z,
            _ => passthrough,
        },
        TexGenMode::NormalMap => {
            let n = eye_normal.normalize();
            match component {
                0 => n.x,
                1 => n.y,
                2 => n.z,
                _ => passthrough,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_coordinate_passes_through() {
        let state = TexGenState::new();
        let passthrough = Vec4::new(0.25, 0.5, 0.0, 1.0);
        let out = state.calculate(Vec4::ONE, Vec4::ONE, Vec3::new(0.0, 0.0, 1.0), passthrough);
        assert_eq!(out, passthrough);
    }

    #[test]
    fn object_linear_matches_default_plane() {
        let mut state = TexGenState::new();
        state.s.enabled = true;
        state.s.mode = TexGenMode::ObjectLinear;
        let object_vertex = Vec4::new(3.0, 4.0, 5.0, 1.0);
        let out = state.calculate(object_vertex, object_vertex, Vec3::new(0.0, 0.0, 1.0), Vec4::ZERO);
        assert!((out.x - 3.0).abs() < 1e-6);
    }

    #[test]
    fn normal_map_reports_eye_space_normal() {
        let mut state = TexGenState::new();
        state.r.enabled = true;
        state.r.mode = TexGenMode::NormalMap;
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let out = state.calculate(Vec4::ONE, Vec4::new(0.0, 0.0, -1.0, 1.0), normal, Vec4::ZERO);
        assert!((out.z - 1.0).abs() < 1e-6);
    }
}
