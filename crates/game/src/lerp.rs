use glam::{Quat, Vec3};

/// Linear blend between two samples of the same state.
///
/// `t` is nominally in `[0, 1]`; values above 1 extrapolate along the same line.
pub trait Lerp: Sized {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::lerp(*self, *other, t)
    }
}

impl Lerp for Quat {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let to = if self.dot(*other) < 0.0 { -*other } else { *other };
        self.slerp(to, t).normalize()
    }
}

pub fn lerp_frame(from: u32, to: u32, t: f32) -> f64 {
    from as f64 + (to as f64 - from as f64) * t as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec3_midpoint() {
        let a = Vec3::ZERO;
        let b = Vec3::new(10.0, 20.0, 30.0);
        let mid = Lerp::lerp(&a, &b, 0.5);
        assert!((mid - Vec3::new(5.0, 10.0, 15.0)).length() < 0.001);
    }

    #[test]
    fn quat_takes_shortest_path() {
        let from = Quat::IDENTITY;
        let to = -Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let mid = Lerp::lerp(&from, &to, 0.5);
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(mid.dot(expected).abs() > 0.999);
    }

    #[test]
    fn frame_lerp_is_fractional() {
        assert!((lerp_frame(10, 12, 0.25) - 10.5).abs() < 1e-9);
    }
}
