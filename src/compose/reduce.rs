//! Per-sample max and softmax reductions over the stroke axis

/// Softmax temperature of the soft strategies
pub const SOFTMAX_TEMPERATURE: f32 = 0.05;

/// Selection key of stroke `s`
#[inline]
fn key(alpha: &[f32], density: &[f32], s: usize, density_weighted: bool) -> f32 {
    if density_weighted {
        alpha[s] * density[s]
    } else {
        alpha[s]
    }
}

/// Index of the largest key, first occurrence on ties
///
/// A NaN key ranks above every number, so the first NaN stroke is selected
/// and its NaN reaches the output.
pub fn argmax(alpha: &[f32], density: &[f32], density_weighted: bool) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for s in 0..alpha.len() {
        let k = key(alpha, density, s, density_weighted);
        match best {
            Some((_, b)) if b.is_nan() => break,
            Some((_, b)) if !k.is_nan() && k <= b => {}
            _ => best = Some((s, k)),
        }
    }
    best.map(|(s, _)| s)
}

/// Hard selection: density and color of the winning stroke
pub fn max_sample(alpha: &[f32], color: &[f32], density: &[f32], density_weighted: bool, out_color: &mut [f32]) -> f32 {
    let c = out_color.len();
    match argmax(alpha, density, density_weighted) {
        Some(s) => {
            out_color.copy_from_slice(&color[s * c..(s + 1) * c]);
            alpha[s] * density[s]
        }
        None => {
            out_color.fill(0.0);
            0.0
        }
    }
}

/// Gradient of [`max_sample`], flowing through the selected stroke only
#[allow(clippy::too_many_arguments)]
pub fn max_sample_backward(
    alpha: &[f32],
    density: &[f32],
    density_weighted: bool,
    grad_density: f32,
    grad_color: &[f32],
    g_alpha: &mut [f32],
    g_color: &mut [f32],
    g_density: &mut [f32],
) {
    let c = grad_color.len();
    if let Some(s) = argmax(alpha, density, density_weighted) {
        g_alpha[s] += grad_density * density[s];
        g_density[s] += grad_density * alpha[s];
        g_color[s * c..(s + 1) * c].copy_from_slice(grad_color);
    }
}

/// Softmax weights over the selection keys
pub fn softmax_weights(alpha: &[f32], density: &[f32], density_weighted: bool) -> Vec<f32> {
    let keys: Vec<f32> = (0..alpha.len())
        .map(|s| key(alpha, density, s, density_weighted) / SOFTMAX_TEMPERATURE)
        .collect();
    let m = keys.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut w: Vec<f32> = keys.iter().map(|k| (k - m).exp()).collect();
    let total: f32 = w.iter().sum();
    if total > 0.0 {
        w.iter_mut().for_each(|x| *x /= total);
    }
    w
}

/// Soft selection: `density = Σ w·alpha·d`, `color = Σ w·color`
pub fn softmax_sample(
    alpha: &[f32],
    color: &[f32],
    density: &[f32],
    density_weighted: bool,
    out_color: &mut [f32],
) -> f32 {
    let c = out_color.len();
    let w = softmax_weights(alpha, density, density_weighted);
    out_color.fill(0.0);
    let mut out_density = 0.0;
    for (s, &ws) in w.iter().enumerate() {
        out_density += ws * alpha[s] * density[s];
        for (o, &cs) in out_color.iter_mut().zip(&color[s * c..(s + 1) * c]) {
            *o += ws * cs;
        }
    }
    out_density
}

/// Gradient of [`softmax_sample`]
#[allow(clippy::too_many_arguments)]
pub fn softmax_sample_backward(
    alpha: &[f32],
    color: &[f32],
    density: &[f32],
    density_weighted: bool,
    grad_density: f32,
    grad_color: &[f32],
    g_alpha: &mut [f32],
    g_color: &mut [f32],
    g_density: &mut [f32],
) {
    let c = grad_color.len();
    let w = softmax_weights(alpha, density, density_weighted);

    let g_w: Vec<f32> = (0..w.len())
        .map(|s| {
            let dot: f32 = grad_color.iter().zip(&color[s * c..(s + 1) * c]).map(|(g, x)| g * x).sum();
            grad_density * alpha[s] * density[s] + dot
        })
        .collect();
    let mean: f32 = w.iter().zip(&g_w).map(|(a, b)| a * b).sum();

    for s in 0..w.len() {
        let g_key = w[s] / SOFTMAX_TEMPERATURE * (g_w[s] - mean);
        g_alpha[s] += grad_density * w[s] * density[s];
        g_density[s] += grad_density * w[s] * alpha[s];
        if density_weighted {
            g_alpha[s] += g_key * density[s];
            g_density[s] += g_key * alpha[s];
        } else {
            g_alpha[s] += g_key;
        }
        for (gc_out, &gc) in g_color[s * c..(s + 1) * c].iter_mut().zip(grad_color) {
            *gc_out += gc * w[s];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_occurrence() {
        assert_eq!(argmax(&[0.5, 0.9, 0.9], &[1.0; 3], false), Some(1));
        assert_eq!(argmax(&[], &[], false), None);
    }

    #[test]
    fn test_argmax_nan_wins() {
        assert_eq!(argmax(&[f32::NAN, 0.1], &[1.0; 2], false), Some(0));
        assert_eq!(argmax(&[0.2, f32::NAN, 0.9, f32::NAN], &[1.0; 4], false), Some(1));
        assert_eq!(argmax(&[0.2, 0.4], &[1.0, f32::NAN], true), Some(1));

        let mut out = [0.0; 3];
        let d = max_sample(&[0.2, f32::NAN, 0.4], &[0.0; 9], &[1.0; 3], false, &mut out);
        assert!(d.is_nan());
        let d = max_sample(&[f32::NAN], &[0.0; 3], &[1.0], true, &mut out);
        assert!(d.is_nan());
    }

    #[test]
    fn test_density_weighted_key_changes_winner() {
        let alpha = [0.9, 0.5];
        let density = [1.0, 3.0];
        assert_eq!(argmax(&alpha, &density, false), Some(0));
        assert_eq!(argmax(&alpha, &density, true), Some(1));
    }

    #[test]
    fn test_softmax_weights_sum_to_one() {
        let w = softmax_weights(&[0.2, 0.5, 0.4], &[1.0; 3], false);
        assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(w[1] > w[2] && w[2] > w[0]);
    }

    #[test]
    fn test_softmax_backward_matches_finite_differences() {
        for weighted in [false, true] {
            let alpha = [0.3_f32, 0.35, 0.32];
            let color = [0.1_f32, 0.9, 0.4, 0.7, 0.2, 0.5, 0.3, 0.3, 0.8];
            let density = [1.0_f32, 0.8, 1.1];
            let gd = 0.7;
            let gc = [0.2_f32, -0.4, 1.1];
            let loss = |a: &[f32], d: &[f32]| {
                let mut out = [0.0; 3];
                let dens = softmax_sample(a, &color, d, weighted, &mut out);
                gd * dens + out.iter().zip(&gc).map(|(o, g)| o * g).sum::<f32>()
            };

            let mut g_alpha = [0.0; 3];
            let mut g_color = [0.0; 9];
            let mut g_density = [0.0; 3];
            softmax_sample_backward(
                &alpha, &color, &density, weighted, gd, &gc, &mut g_alpha, &mut g_color, &mut g_density,
            );

            let eps = 1e-3;
            for i in 0..3 {
                let (mut hi, mut lo) = (alpha, alpha);
                hi[i] += eps;
                lo[i] -= eps;
                let fd = (loss(&hi, &density) - loss(&lo, &density)) / (2.0 * eps);
                assert!((fd - g_alpha[i]).abs() < 2e-2, "alpha[{}] fd {} vs {}", i, fd, g_alpha[i]);

                let (mut hi, mut lo) = (density, density);
                hi[i] += eps;
                lo[i] -= eps;
                let fd = (loss(&alpha, &hi) - loss(&alpha, &lo)) / (2.0 * eps);
                assert!((fd - g_density[i]).abs() < 2e-2, "density[{}] fd {} vs {}", i, fd, g_density[i]);
            }
        }
    }
}
