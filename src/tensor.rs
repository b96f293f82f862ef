//! Dense row-major `f32` arrays
//!
//! The unit of exchange at the evaluation and compositing call boundaries.
//! Only shape bookkeeping lives here; the math is done on flat slices.

use crate::error::{Result, StrokeError};
use serde::{Deserialize, Serialize};

/// Contiguous row-major `f32` array with an explicit shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Wrap `data` with `shape`
    ///
    /// Fails with `ShapeMismatch` when the element count disagrees.
    pub fn new(shape: impl Into<Vec<usize>>, data: Vec<f32>) -> Result<Self> {
        let shape = shape.into();
        let numel: usize = shape.iter().product();
        if numel != data.len() {
            return Err(StrokeError::mismatch("tensor element count", &[numel], &[data.len()]));
        }
        Ok(Self { shape, data })
    }

    /// Zero-filled tensor
    pub fn zeros(shape: impl Into<Vec<usize>>) -> Self {
        let shape = shape.into();
        let numel = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; numel],
        }
    }

    /// One-dimensional tensor over `data`
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Zero-length placeholder
    pub fn empty() -> Self {
        Self {
            shape: vec![0],
            data: Vec::new(),
        }
    }

    /// Dimensions
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total element count
    #[inline]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// True when the tensor holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size of the last dimension (0 for a scalar)
    #[inline]
    pub fn last_dim(&self) -> usize {
        self.shape.last().copied().unwrap_or(0)
    }

    /// Flat element view
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable flat element view
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume into the flat element buffer
    #[inline]
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Same elements under a new shape
    pub fn reshape(self, shape: impl Into<Vec<usize>>) -> Result<Self> {
        Self::new(shape, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_numel() {
        assert!(Tensor::new([2, 3], vec![0.0; 6]).is_ok());
        assert!(matches!(
            Tensor::new([2, 3], vec![0.0; 5]),
            Err(StrokeError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_reshape_keeps_data() {
        let t = Tensor::new([2, 3], (0..6).map(|i| i as f32).collect()).unwrap();
        let r = t.reshape([3, 2]).unwrap();
        assert_eq!(r.shape(), &[3, 2]);
        assert_eq!(r.data()[5], 5.0);
        assert!(r.reshape([4]).is_err());
    }

    #[test]
    fn test_empty_and_zeros() {
        assert!(Tensor::empty().is_empty());
        let z = Tensor::zeros(vec![4, 0]);
        assert_eq!(z.numel(), 0);
        assert_eq!(z.last_dim(), 0);
        assert_eq!(Tensor::zeros([2, 2]).data(), &[0.0; 4]);
    }
}
