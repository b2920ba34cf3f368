use ndarray::{Array, IxDyn};
use crate::errors::DetectError;
use crate::Result;

/// Model tensor, wrapper over [`Array<f32, IxDyn>`]. Used for both the
/// preprocessed input and the raw model output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct X(pub Array<f32, IxDyn>);

impl From<Array<f32, IxDyn>> for X {
    fn from(x: Array<f32, IxDyn>) -> Self {
        Self(x)
    }
}

impl std::ops::Deref for X {
    type Target = Array<f32, IxDyn>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl X {
    pub fn from_shape_vec(shape: &[usize], xs: Vec<f32>) -> Result<Self> {
        let array = Array::from_shape_vec(IxDyn(shape), xs)
            .map_err(|e| DetectError::InferenceExecution(format!("bad tensor shape {shape:?}: {e}")))?;
        Ok(Self(array))
    }

    pub fn ndim(&self) -> usize {
        self.0.ndim()
    }

    pub fn dims(&self) -> Vec<usize> {
        self.0.shape().to_vec()
    }

    /// Row-major view of the data. Copies only when the array is not standard-layout.
    pub fn contiguous(&self) -> std::borrow::Cow<'_, [f32]> {
        match self.0.as_slice() {
            Some(slice) => std::borrow::Cow::Borrowed(slice),
            None => std::borrow::Cow::Owned(self.0.iter().copied().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_is_an_error() {
        assert!(X::from_shape_vec(&[1, 2, 3], vec![0.; 5]).is_err());
        let x = X::from_shape_vec(&[1, 2, 3], vec![0.; 6]).unwrap();
        assert_eq!(x.dims(), vec![1, 2, 3]);
        assert_eq!(x.ndim(), 3);
    }

    #[test]
    fn transposed_view_is_copied_in_logical_order() {
        let x = X::from_shape_vec(&[2, 2], vec![1., 2., 3., 4.]).unwrap();
        let t = X(x.0.clone().reversed_axes());
        assert_eq!(t.contiguous().as_ref(), &[1., 3., 2., 4.]);
    }
}
