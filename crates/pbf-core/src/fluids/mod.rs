pub mod viscosity;
pub mod vorticity;

use glam::Vec3;
use std::f32::consts::PI;

/// Poly6 smoothing kernel used for density and interpolation.
///
/// `W(r) = 315 / (64 * PI * h^3) * (1 - r^2 / h^2)^3` for `r < h`, and `0.0`
/// beyond the kernel radius.
#[derive(Clone, Copy, Debug)]
pub struct StdKernel {
    pub h: f32,
    h2: f32,
    coeff: f32,
}

impl StdKernel {
    pub fn new(kernel_radius: f32) -> Self {
        let h = kernel_radius;
        Self {
            h,
            h2: h * h,
            coeff: 315.0 / (64.0 * PI * h * h * h),
        }
    }

    #[inline]
    pub fn value(&self, distance: f32) -> f32 {
        if distance >= self.h {
            return 0.0;
        }
        let x = 1.0 - distance * distance / self.h2;
        self.coeff * x * x * x
    }
}

/// Spiky kernel, used for constraint and curl gradients.
///
/// `W(r) = 15 / (PI * h^3) * (1 - r / h)^3`; its gradient does not vanish
/// as `r -> 0`, which keeps close particles apart.
#[derive(Clone, Copy, Debug)]
pub struct SpikyKernel {
    pub h: f32,
    value_coeff: f32,
    derivative_coeff: f32,
}

impl SpikyKernel {
    pub fn new(kernel_radius: f32) -> Self {
        let h = kernel_radius;
        let h3 = h * h * h;
        Self {
            h,
            value_coeff: 15.0 / (PI * h3),
            derivative_coeff: -45.0 / (PI * h3 * h),
        }
    }

    #[inline]
    pub fn value(&self, distance: f32) -> f32 {
        if distance >= self.h {
            return 0.0;
        }
        let x = 1.0 - distance / self.h;
        self.value_coeff * x * x * x
    }

    /// `dW/dr`, negative inside the support.
    #[inline]
    pub fn first_derivative(&self, distance: f32) -> f32 {
        if distance >= self.h {
            return 0.0;
        }
        let x = 1.0 - distance / self.h;
        self.derivative_coeff * x * x
    }

    /// Gradient with respect to `x_i` of `W(x_i - x_j)`, given `r = x_i - x_j`.
    ///
    /// Points from `x_i` toward `x_j`. Returns `Vec3::ZERO` at and beyond
    /// the kernel radius and for coincident particles.
    #[inline]
    pub fn gradient(&self, r: Vec3) -> Vec3 {
        let distance = r.length();
        if distance >= self.h || distance <= 1e-6 {
            return Vec3::ZERO;
        }
        (r / distance) * self.first_derivative(distance)
    }
}
