use glam::{Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightType {
    Directional,
    Point,
    Spot,
}

/// Shadow casting mode of a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightShadows {
    #[default]
    None,
    Hard,
    Soft,
}

/// Scene light as authored, before culling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub light_type: LightType,
    pub color: Vec3,
    pub intensity: f32,
    pub shadows: LightShadows,
    pub shadow_strength: f32,
    /// Slope-scale depth bias applied while drawing casters.
    pub shadow_bias: f32,
    pub shadow_normal_bias: f32,
    /// Pulls the shadow near plane back towards the light.
    pub shadow_near_plane: f32,
}

impl Light {
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            color,
            intensity,
            ..Default::default()
        }
    }

    pub fn with_shadows(mut self, shadows: LightShadows, strength: f32) -> Self {
        self.shadows = shadows;
        self.shadow_strength = strength;
        self
    }

    pub fn with_biases(mut self, slope_scale: f32, normal: f32, near_plane: f32) -> Self {
        self.shadow_bias = slope_scale;
        self.shadow_normal_bias = normal;
        self.shadow_near_plane = near_plane;
        self
    }

    pub fn casts_shadows(&self) -> bool {
        self.shadows != LightShadows::None && self.shadow_strength > 0.0
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_type: LightType::Directional,
            color: Vec3::ONE,
            intensity: 1.0,
            shadows: LightShadows::None,
            shadow_strength: 1.0,
            shadow_bias: 0.0,
            shadow_normal_bias: 0.4,
            shadow_near_plane: 0.2,
        }
    }
}

/// A light that survived culling this frame. Its position in the culling
/// results' visible list is the `visible_light_index` used everywhere else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleLight {
    pub light: Light,
    pub local_to_world: Mat4,
}

impl VisibleLight {
    /// `forward` is the direction the light travels in.
    pub fn directional(light: Light, forward: Vec3) -> Self {
        let rotation = Quat::from_rotation_arc(Vec3::Z, forward.normalize());
        Self {
            light,
            local_to_world: Mat4::from_quat(rotation),
        }
    }

    pub fn light_type(&self) -> LightType {
        self.light.light_type
    }

    pub fn forward(&self) -> Vec3 {
        self.local_to_world.z_axis.truncate().normalize()
    }

    /// Linear color scaled by intensity.
    pub fn final_color(&self) -> Vec4 {
        (self.light.color * self.light.intensity).extend(1.0)
    }

    /// Direction towards the light, as consumed by shading.
    pub fn direction_to_light(&self) -> Vec4 {
        (-self.forward()).extend(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn shading_direction_points_back_at_the_light() {
        let forward = Vec3::new(0.3, -1.0, 0.2).normalize();
        let visible = VisibleLight::directional(Light::default(), forward);
        let to_light = visible.direction_to_light().truncate();
        assert_relative_eq!(to_light.dot(forward), -1.0, epsilon = 1e-5);
    }

    #[test]
    fn strength_and_mode_gate_shadow_casting() {
        let light = Light::directional(Vec3::ONE, 1.0);
        assert!(!light.casts_shadows());
        assert!(light.with_shadows(LightShadows::Soft, 1.0).casts_shadows());
        assert!(!light.with_shadows(LightShadows::Hard, 0.0).casts_shadows());
    }
}
