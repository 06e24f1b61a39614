//! OpenGL-1.x fixed-function lighting: up to [`MAX_LIGHTS`] light slots,
//! ambient/diffuse/specular material channels, directional/positional/spot
//! lights with attenuation, and optional color-material tracking.
//!
//! State is a flat record of enables and per-slot parameters mutated by
//! `set_*` methods, with derived quantities (normalized spot direction,
//! cutoff cosine) recomputed at set time rather than lazily — the per-vertex
//! hot path (`calculate`) never allocates or recomputes a trig function.

use crate::math::{Vec3, Vec4};

pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub enabled: bool,
    /// `w == 0.0`: directional, `xyz` is the direction *to* the light.
    /// `w == 1.0`: positional, `xyz` is the eye-space position.
    pub position: Vec4,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    /// `(constant, linear, quadratic)` attenuation coefficients.
    pub attenuation: Vec3,
    pub spot_direction: Vec3,
    pub spot_enabled: bool,
    pub spot_cutoff_cos: f32,
    pub spot_exponent: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            enabled: false,
            position: Vec4::new(0.0, 0.0, 1.0, 0.0),
            ambient: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse: Vec4::new(0.0, 0.0, 0.0, 1.0),
            specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
            attenuation: Vec3::new(1.0, 0.0, 0.0),
            spot_direction: Vec3::new(0.0, 0.0, -1.0),
            spot_enabled: false,
            spot_cutoff_cos: -1.0,
            spot_exponent: 0.0,
        }
    }
}

impl Light {
    /// Light 0 defaults to white diffuse/specular, disabled (matches GL's
    /// `GL_LIGHT0` defaults), everything else stays black until lit.
    fn light0_defaults() -> Self {
        Self {
            diffuse: Vec4::ONE,
            specular: Vec4::ONE,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub emission: Vec4,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
            emission: Vec4::new(0.0, 0.0, 0.0, 1.0),
            shininess: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LightingState {
    pub enabled: bool,
    pub lights: [Light; MAX_LIGHTS],
    pub global_ambient: Vec4,
    pub material: Material,
    pub color_material_enabled: bool,
    /// `true` selects the Blinn half-vector for specular; `false` selects
    /// the classic reflection vector.
    pub blinn_specular: bool,
}

impl LightingState {
    pub fn new() -> Self {
        let mut lights = [Light::default(); MAX_LIGHTS];
        lights[0] = Light::light0_defaults();
        Self {
            enabled: false,
            lights,
            global_ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            material: Material::default(),
            color_material_enabled: false,
            blinn_specular: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_light_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(light) = self.lights.get_mut(index) {
            light.enabled = enabled;
        } else {
            log::warn!("set_light_enabled: light index {index} out of range");
        }
    }

    pub fn set_light_position(&mut self, index: usize, position: Vec4) {
        if let Some(light) = self.lights.get_mut(index) {
            light.position = position;
        } else {
            log::warn!("set_light_position: light index {index} out of range");
        }
    }

    pub fn set_light_colors(&mut self, index: usize, ambient: Vec4, diffuse: Vec4, specular: Vec4) {
        if let Some(light) = self.lights.get_mut(index) {
            light.ambient = ambient;
            light.diffuse = diffuse;
            light.specular = specular;
        } else {
            log::warn!("set_light_colors: light index {index} out of range");
        }
    }

    pub fn set_light_attenuation(&mut self, index: usize, constant: f32, linear: f32, quadratic: f32) {
        if let Some(light) = self.lights.get_mut(index) {
            light.attenuation = Vec3::new(constant, linear, quadratic);
        } else {
            log::warn!("set_light_attenuation: light index {index} out of range");
        }
    }

    /// `cutoff_degrees == 180.0` disables the spot cone (the light behaves
    /// as a plain positional/directional light).
    pub fn set_light_spot(&mut self, index: usize, direction: Vec3, cutoff_degrees: f32, exponent: f32) {
        let Some(light) = self.lights.get_mut(index) else {
            log::warn!("set_light_spot: light index {index} out of range");
            return;
        };
        light.spot_direction = direction;
        light.spot_exponent = exponent;
        light.spot_enabled = cutoff_degrees < 180.0;
        light.spot_cutoff_cos = cutoff_degrees.to_radians().cos();
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn set_color_material_enabled(&mut self, enabled: bool) {
        self.color_material_enabled = enabled;
    }

    /// Compute the lit vertex color. `eye_pos`/`eye_normal` are in eye
    /// space, normal already oriented outward. Returns `vertex_color`
    /// unchanged when lighting is disabled.
    pub fn calculate(&self, vertex_color: Vec4, eye_pos: Vec3, eye_normal: Vec3) -> Vec4 {
        if !self.enabled {
            return vertex_color;
        }

        let normal = eye_normal.normalize();
        let view_dir = (eye_pos * -1.0).normalize();

        let mat_ambient = if self.color_material_enabled { vertex_color } else { self.material.ambient };
        let mat_diffuse = if self.color_material_enabled { vertex_color } else { self.material.diffuse };

        let mut rgb = (self.global_ambient * mat_ambient).xyz() + self.material.emission.xyz();

        for light in self.lights.iter().filter(|l| l.enabled) {
            let (light_dir, attenuation) = if light.position.w == 0.0 {
                (light.position.xyz().normalize(), 1.0)
            } else {
                let to_light = light.position.xyz() - eye_pos;
                let dist = to_light.length();
                let atten = light.attenuation.x + light.attenuation.y * dist + light.attenuation.z * dist * dist;
                let atten = if atten > 0.0 { 1.0 / atten } else { 1.0 };
                (to_light.normalize(), atten)
            };

            let spot = if light.spot_enabled {
                let spot_dir = light.spot_direction.normalize();
                let cos_angle = (light_dir * -1.0).dot(spot_dir);
                if cos_angle < light.spot_cutoff_cos {
                    0.0
                } else {
                    cos_angle.powf(light.spot_exponent)
                }
            } else {
                1.0
            };

            let n_dot_l = normal.dot(light_dir).max(0.0);
            let ambient_term = (mat_ambient * light.ambient).xyz();
            let diffuse_term = (mat_diffuse * light.diffuse).xyz() * n_dot_l;

            let specular_term = if n_dot_l > 0.0 && self.material.shininess > 0.0 {
                let spec_angle = if self.blinn_specular {
                    let half = (light_dir + view_dir).normalize();
                    normal.dot(half).max(0.0)
                } else {
                    let reflection = (normal * (2.0 * normal.dot(light_dir)) - light_dir).normalize();
                    reflection.dot(view_dir).max(0.0)
                };
                (self.material.specular * light.specular).xyz() * spec_angle.powf(self.material.shininess)
            } else {
                Vec3::ZERO
            };

            rgb = rgb + (ambient_term + diffuse_term + specular_term) * (attenuation * spot);
        }

        Vec4::new(rgb.x, rgb.y, rgb.z, mat_diffuse.w).clamp01()
    }
}

impl Default for LightingState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_lighting_passes_color_through() {
        let state = LightingState::new();
        let color = Vec4::new(0.5, 0.25, 0.1, 1.0);
        assert_eq!(state.calculate(color, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0)), color);
    }

    #[test]
    fn directional_light_facing_surface_adds_diffuse() {
        let mut state = LightingState::new();
        state.set_enabled(true);
        state.set_light_enabled(0, true);
        state.set_light_position(0, Vec4::new(0.0, 0.0, 1.0, 0.0));
        state.set_light_colors(0, Vec4::ZERO, Vec4::ONE, Vec4::ZERO);
        state.material.diffuse = Vec4::new(1.0, 1.0, 1.0, 1.0);
        state.material.ambient = Vec4::ZERO;
        state.global_ambient = Vec4::ZERO;

        let lit = state.calculate(Vec4::ONE, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(lit.x > 0.9);
    }

    #[test]
    fn light_behind_surface_contributes_nothing() {
        let mut state = LightingState::new();
        state.set_enabled(true);
        state.set_light_enabled(0, true);
        state.set_light_position(0, Vec4::new(0.0, 0.0, -1.0, 0.0));
        state.set_light_colors(0, Vec4::ZERO, Vec4::ONE, Vec4::ZERO);
        state.material.ambient = Vec4::ZERO;
        state.global_ambient = Vec4::ZERO;

        let lit = state.calculate(Vec4::ONE, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(lit.x < 1e-4);
    }

    #[test]
    fn spot_cutoff_excludes_points_outside_cone() {
        let mut state = LightingState::new();
        state.set_enabled(true);
        state.set_light_enabled(0, true);
        state.set_light_position(0, Vec4::new(0.0, 0.0, 5.0, 1.0));
        state.set_light_colors(0, Vec4::ZERO, Vec4::ONE, Vec4::ZERO);
        state.set_light_spot(0, Vec3::new(1.0, 0.0, 0.0), 10.0, 1.0);
        state.material.ambient = Vec4::ZERO;
        state.global_ambient = Vec4::ZERO;

        let lit = state.calculate(Vec4::ONE, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(lit.x < 1e-4);
    }

    #[test]
    fn color_material_uses_vertex_color_as_ambient_diffuse() {
        let mut state = LightingState::new();
        state.set_color_material_enabled(true);
        state.material.diffuse = Vec4::ZERO;
        let vertex_color = Vec4::new(0.3, 0.4, 0.5, 1.0);
        // Lighting disabled: passthrough still holds regardless of material.
        assert_eq!(state.calculate(vertex_color, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0)), vertex_color);
    }
}
