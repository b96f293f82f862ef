//! Initial parameter sampling for new strokes
//!
//! Shape parameters are drawn according to one of three initialization
//! regimes. Strokes created later (larger `stroke_step`) are drawn smaller
//! and, for the generative sphere regime, further out, following
//! `decay = exp(-stroke_step / 200)`.
//!
//! The sampled vector is assembled in catalog order (base-shape params,
//! scale, rotation, translation) and projected into the declared ranges.

use crate::catalog::{BaseSampler, ColorModel, ColorSamplerKind, ParamRange, ShapeFamily};
use crate::error::{Result, StrokeError};
use glam::Vec3;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use std::str::FromStr;

/// Steps over which the initial stroke size decays by a factor of e
pub const DECAY_STEPS: f32 = 200.0;

/// Initialization regime for new strokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitType {
    /// Unit box, optionally guided towards a high-error coordinate
    #[default]
    #[serde(alias = "recon")]
    Reconstruction,
    /// Uniform in a slightly larger box, big strokes near the center
    GenBox,
    /// On a sphere whose radius grows with the stroke step
    GenSphere,
}

impl FromStr for InitType {
    type Err = StrokeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reconstruction" | "recon" => Ok(InitType::Reconstruction),
            "gen_box" => Ok(InitType::GenBox),
            "gen_sphere" => Ok(InitType::GenSphere),
            other => Err(StrokeError::InvalidArgument(format!("unknown init type: {other}"))),
        }
    }
}

/// Where and how large a new stroke starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Lower bound of the scale draw
    pub scale_min: f32,
    /// Upper bound of the scale draw
    pub scale_max: f32,
    /// Stroke center
    pub coord: Vec3,
}

/// Size decay for a stroke created at `stroke_step`
#[inline]
pub fn decay(stroke_step: u32) -> f32 {
    (-(stroke_step as f32) / DECAY_STEPS).exp()
}

/// Uniform draw in `[lo, hi)`
#[inline]
fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + rng.gen::<f32>() * (hi - lo)
}

fn uniform_in_box<R: Rng + ?Sized>(rng: &mut R, lo: Vec3, hi: Vec3) -> Vec3 {
    Vec3::new(uniform(rng, lo.x, hi.x), uniform(rng, lo.y, hi.y), uniform(rng, lo.z, hi.z))
}

/// Standard normal draw
#[inline]
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.sample(StandardNormal)
}

impl InitType {
    /// Draw the placement of a new stroke
    pub fn placement<R: Rng + ?Sized>(self, rng: &mut R, stroke_step: u32, error_coord: Option<Vec3>) -> Placement {
        let decay_t = decay(stroke_step);
        match self {
            InitType::Reconstruction => {
                let lo = Vec3::splat(-0.5);
                let hi = Vec3::splat(0.5);
                let diag = (hi - lo).length();
                let coord = match error_coord {
                    Some(c) if c.is_finite() => c,
                    Some(c) => {
                        tracing::warn!(?c, "non-finite error coordinate, sampling uniformly");
                        uniform_in_box(rng, lo, hi)
                    }
                    None => uniform_in_box(rng, lo, hi),
                };
                Placement {
                    scale_min: (0.02 + 0.12 * decay_t) * diag,
                    scale_max: (0.04 + 0.18 * decay_t) * diag,
                    coord,
                }
            }
            InitType::GenBox => {
                let lo = Vec3::splat(-0.6);
                let hi = Vec3::splat(0.6);
                let diag = (hi - lo).length();
                let coord = uniform_in_box(rng, lo, hi);
                let dist = 1.0 - 2.0 * coord.length() / diag;
                let shrink = 4.0_f32.powf(-dist);
                Placement {
                    scale_min: 0.05 * diag * shrink,
                    scale_max: 0.10 * diag * shrink,
                    coord,
                }
            }
            InitType::GenSphere => {
                let theta = uniform(rng, 0.0, TAU);
                let phi = uniform(rng, 0.0, TAU);
                let radius = 1.0 - decay_t;
                Placement {
                    scale_min: 0.04 + 0.06 * decay_t,
                    scale_max: 0.06 + 0.09 * decay_t,
                    coord: Vec3::new(
                        radius * phi.sin() * theta.cos(),
                        radius * phi.sin() * theta.sin(),
                        radius * phi.cos(),
                    ),
                }
            }
        }
    }
}

impl BaseSampler {
    /// Draw the base-shape parameters
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R, placement: &Placement) -> Vec<f32> {
        match self {
            BaseSampler::RoundCube => vec![0.8 * rng.gen::<f32>()],
            BaseSampler::CappedTorus => vec![rng.gen(), rng.gen()],
            BaseSampler::Capsule => vec![rng.gen::<f32>() + 0.25],
            BaseSampler::Line => vec![rng.gen::<f32>() + 0.25, rng.gen::<f32>() - 0.5],
            BaseSampler::Triprism => vec![rng.gen()],
            BaseSampler::Spline { control_points, radii } => {
                let scale = uniform(rng, placement.scale_min, placement.scale_max);
                let mut out = Vec::with_capacity(control_points * 3 + radii);
                for _ in 0..control_points {
                    let jitter = uniform_in_box(rng, Vec3::splat(-0.5), Vec3::splat(0.5));
                    out.extend((placement.coord + jitter * scale).to_array());
                }
                for _ in 0..radii {
                    out.push((0.2 + 0.2 * rng.gen::<f32>()) * scale);
                }
                out
            }
        }
    }
}

/// Initial shape parameter sampler for one stroke kind
#[derive(Debug, Clone)]
pub struct ShapeSampler {
    family: ShapeFamily,
    init_type: InitType,
    ranges: Vec<ParamRange>,
}

impl ShapeSampler {
    /// Sampler for a family under an initialization regime
    pub fn new(family: ShapeFamily, init_type: InitType, ranges: Vec<ParamRange>) -> Self {
        Self {
            family,
            init_type,
            ranges,
        }
    }

    /// Number of parameters produced
    #[inline]
    pub fn dim(&self) -> usize {
        self.ranges.len()
    }

    /// Draw a shape parameter vector
    ///
    /// # Arguments
    /// * `stroke_step` - How many strokes were created before this one
    /// * `error_coord` - Optional target coordinate (reconstruction regime only)
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, stroke_step: u32, error_coord: Option<Vec3>) -> Vec<f32> {
        let placement = self.init_type.placement(rng, stroke_step, error_coord);
        let caps = self.family.caps;

        let mut params = Vec::with_capacity(self.ranges.len());
        if let Some(base) = self.family.base_sampler {
            params.extend(base.sample(rng, &placement));
        }
        for _ in 0..caps.scale_len() {
            params.push(uniform(rng, placement.scale_min, placement.scale_max));
        }
        if caps.rotation {
            for _ in 0..3 {
                params.push(uniform(rng, -PI, PI));
            }
        }
        if caps.translation {
            params.extend(placement.coord.to_array());
        }

        debug_assert_eq!(params.len(), self.ranges.len());
        for (v, r) in params.iter_mut().zip(&self.ranges) {
            *v = r.clamp(*v);
        }
        params
    }
}

/// Initial color parameter sampler for one color model
#[derive(Debug, Clone)]
pub struct ColorSampler {
    model: ColorModel,
}

impl ColorSampler {
    /// Sampler for a color model
    pub fn new(model: ColorModel) -> Self {
        Self { model }
    }

    /// Number of parameters produced
    #[inline]
    pub fn dim(&self) -> usize {
        self.model.ranges.len()
    }

    /// Draw a color parameter vector
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f32> {
        match self.model.sampler {
            ColorSamplerKind::UniformRgb => (0..self.dim()).map(|_| rng.gen::<f32>()).collect(),
            ColorSamplerKind::Gradient => {
                let half = self.dim() / 2;
                let mut out: Vec<f32> = (0..half).map(|_| rng.gen::<f32>() - 0.5).collect();
                out.extend((half..self.dim()).map(|_| rng.gen::<f32>()));
                out
            }
            ColorSamplerKind::StandardNormal => (0..self.dim()).map(|_| standard_normal(rng)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColorType, ShapeType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sampler(shape: ShapeType, init: InitType) -> ShapeSampler {
        ShapeSampler::new(shape.family(), init, shape.param_ranges())
    }

    #[test]
    fn test_decay_curve() {
        assert_eq!(decay(0), 1.0);
        assert!((decay(200) - (-1.0_f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_recon_scale_narrows() {
        let mut rng = StdRng::seed_from_u64(7);
        let early = InitType::Reconstruction.placement(&mut rng, 0, None);
        let late = InitType::Reconstruction.placement(&mut rng, 2000, None);
        let diag = 3.0_f32.sqrt();
        assert!((early.scale_min - 0.14 * diag).abs() < 1e-5);
        assert!((early.scale_max - 0.22 * diag).abs() < 1e-5);
        assert!(late.scale_max < early.scale_min);
    }

    #[test]
    fn test_recon_uses_error_coord() {
        let mut rng = StdRng::seed_from_u64(1);
        let target = Vec3::new(0.1, -0.2, 0.3);
        let s = sampler(ShapeType::Sphere, InitType::Reconstruction);
        let p = s.sample(&mut rng, 10, Some(target));
        // sphere: [scale, tx, ty, tz]
        assert_eq!(&p[1..4], &target.to_array());
    }

    #[test]
    fn test_non_finite_error_coord_falls_back() {
        let mut rng = StdRng::seed_from_u64(2);
        let p = InitType::Reconstruction.placement(&mut rng, 0, Some(Vec3::new(f32::NAN, 0.0, 0.0)));
        assert!(p.coord.is_finite());
        assert!(p.coord.abs().max_element() <= 0.5);
    }

    #[test]
    fn test_gen_sphere_radius_grows() {
        let mut rng = StdRng::seed_from_u64(3);
        let first = InitType::GenSphere.placement(&mut rng, 0, None);
        assert!(first.coord.length() < 1e-6);
        let later = InitType::GenSphere.placement(&mut rng, 400, None);
        assert!((later.coord.length() - (1.0 - decay(400))).abs() < 1e-5);
    }

    #[test]
    fn test_gen_box_center_strokes_are_larger() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let p = InitType::GenBox.placement(&mut rng, 0, None);
            let diag = 1.2 * 3.0_f32.sqrt();
            let dist = 1.0 - 2.0 * p.coord.length() / diag;
            assert!((p.scale_max - 0.1 * diag * 4.0_f32.powf(-dist)).abs() < 1e-5);
            assert!(p.scale_min < p.scale_max);
        }
    }

    #[test]
    fn test_rotation_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let s = sampler(ShapeType::Cube, InitType::GenBox);
        for step in [0, 50, 500] {
            let p = s.sample(&mut rng, step, None);
            // cube: [scale, rx, ry, rz, tx, ty, tz]
            assert_eq!(p.len(), 7);
            assert!(p[1..4].iter().all(|a| a.abs() <= PI));
        }
    }

    #[test]
    fn test_color_samplers() {
        let mut rng = StdRng::seed_from_u64(6);
        let rgb = ColorSampler::new(ColorType::ConstantRgb.model()).sample(&mut rng);
        assert_eq!(rgb.len(), 3);
        assert!(rgb.iter().all(|c| (0.0..1.0).contains(c)));

        let grad = ColorSampler::new(ColorType::GradientRgb.model()).sample(&mut rng);
        assert_eq!(grad.len(), 12);
        assert!(grad[..6].iter().all(|v| (-0.5..0.5).contains(v)));
        assert!(grad[6..].iter().all(|v| (0.0..1.0).contains(v)));

        let sh = ColorSampler::new(ColorType::ConstantSh3.model()).sample(&mut rng);
        assert_eq!(sh.len(), 27);
        assert!(sh.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_standard_normal_moments() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 20_000;
        let xs: Vec<f32> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = xs.iter().sum::<f32>() / n as f32;
        let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / n as f32;
        assert!(mean.abs() < 0.05, "mean {}", mean);
        assert!((var - 1.0).abs() < 0.05, "var {}", var);
    }

    #[test]
    fn test_init_type_names() {
        assert_eq!("recon".parse::<InitType>().unwrap(), InitType::Reconstruction);
        assert_eq!("gen_box".parse::<InitType>().unwrap(), InitType::GenBox);
        assert!(matches!("gen_cone".parse::<InitType>(), Err(StrokeError::InvalidArgument(_))));
    }
}
