//! Tensor descriptors and materialized tensors.

use ndarray::{ArrayD, IxDyn};

/// Supported tensor element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Float32,
    Float64,
    Int32,
    Int64,
    Uint8,
}

impl ElementType {
    /// Whether this element type is floating point.
    ///
    /// Drives the input normalization policy: float inputs get pixel
    /// values scaled by 1/255, integral inputs take raw bytes.
    pub fn is_float(self) -> bool {
        matches!(self, ElementType::Float32 | ElementType::Float64)
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
            ElementType::Uint8 => "uint8",
        };
        f.write_str(name)
    }
}

/// Shape and type metadata for one input or output tensor.
///
/// Descriptors are handed out by a [`crate::ModelSession`] and stay fixed for
/// the lifetime of that session; `index` is the session-specific identifier
/// used to fetch the materialized tensor after an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorDescriptor {
    /// Tensor name as declared by the model.
    pub name: String,
    /// Declared shape, one entry per dimension.
    pub shape: Vec<usize>,
    /// Element type.
    pub dtype: ElementType,
    /// Position in the session's input or output list.
    pub index: usize,
}

impl TensorDescriptor {
    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements implied by the declared shape.
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Render the shape as `[1, 10, 4]`.
    pub fn shape_string(&self) -> String {
        let dims: Vec<String> = self.shape.iter().map(|d| d.to_string()).collect();
        format!("[{}]", dims.join(", "))
    }
}

/// Input tensor for inference.
#[derive(Debug, Clone)]
pub enum InputTensor {
    Float32(ArrayD<f32>),
    Uint8(ArrayD<u8>),
}

impl InputTensor {
    /// Get the shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        match self {
            InputTensor::Float32(arr) => arr.shape(),
            InputTensor::Uint8(arr) => arr.shape(),
        }
    }

    /// Get the element type of the tensor.
    pub fn dtype(&self) -> ElementType {
        match self {
            InputTensor::Float32(_) => ElementType::Float32,
            InputTensor::Uint8(_) => ElementType::Uint8,
        }
    }

    /// Create a Float32 tensor from raw data and shape.
    ///
    /// Returns `None` when the data length does not match the shape.
    pub fn from_f32(data: Vec<f32>, shape: &[usize]) -> Option<Self> {
        ArrayD::from_shape_vec(IxDyn(shape), data)
            .ok()
            .map(InputTensor::Float32)
    }

    /// Create a Uint8 tensor from raw data and shape.
    pub fn from_u8(data: Vec<u8>, shape: &[usize]) -> Option<Self> {
        ArrayD::from_shape_vec(IxDyn(shape), data)
            .ok()
            .map(InputTensor::Uint8)
    }

    /// Zero-filled tensor of the given shape and type.
    pub fn zeros(shape: &[usize], dtype: ElementType) -> Self {
        if dtype.is_float() {
            InputTensor::Float32(ArrayD::zeros(IxDyn(shape)))
        } else {
            InputTensor::Uint8(ArrayD::zeros(IxDyn(shape)))
        }
    }
}

/// Output tensor materialized by an inference invocation.
#[derive(Debug, Clone)]
pub enum OutputTensor {
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    Uint8(ArrayD<u8>),
}

impl OutputTensor {
    /// Get the shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        match self {
            OutputTensor::Float32(arr) => arr.shape(),
            OutputTensor::Float64(arr) => arr.shape(),
            OutputTensor::Int32(arr) => arr.shape(),
            OutputTensor::Int64(arr) => arr.shape(),
            OutputTensor::Uint8(arr) => arr.shape(),
        }
    }

    /// Get the element type of the tensor.
    pub fn dtype(&self) -> ElementType {
        match self {
            OutputTensor::Float32(_) => ElementType::Float32,
            OutputTensor::Float64(_) => ElementType::Float64,
            OutputTensor::Int32(_) => ElementType::Int32,
            OutputTensor::Int64(_) => ElementType::Int64,
            OutputTensor::Uint8(_) => ElementType::Uint8,
        }
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// Whether the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Observed minimum and maximum value, or `None` for an empty tensor.
    ///
    /// This is the probe behind the scores/classes disambiguation: the
    /// classifier only needs to know whether all values fall inside [0, 1].
    pub fn value_range(&self) -> Option<(f64, f64)> {
        fn fold<T: Copy + Into<f64>>(arr: &ArrayD<T>) -> Option<(f64, f64)> {
            arr.iter().fold(None, |acc, &v| {
                let v: f64 = v.into();
                match acc {
                    None => Some((v, v)),
                    Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                }
            })
        }

        match self {
            OutputTensor::Float32(arr) => fold(arr),
            OutputTensor::Float64(arr) => fold(arr),
            OutputTensor::Int32(arr) => fold(arr),
            OutputTensor::Uint8(arr) => fold(arr),
            OutputTensor::Int64(arr) => arr.iter().fold(None, |acc, &v| {
                let v = v as f64;
                match acc {
                    None => Some((v, v)),
                    Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                }
            }),
        }
    }

    /// Widen or cast the tensor to f32.
    ///
    /// The canonical detection layout materializes everything as float32
    /// (classes arrive as int-like floats), but some converters export
    /// classes or counts as genuine integers; the decoder works on f32
    /// uniformly.
    pub fn to_f32(&self) -> ArrayD<f32> {
        match self {
            OutputTensor::Float32(arr) => arr.clone(),
            OutputTensor::Float64(arr) => arr.mapv(|v| v as f32),
            OutputTensor::Int32(arr) => arr.mapv(|v| v as f32),
            OutputTensor::Int64(arr) => arr.mapv(|v| v as f32),
            OutputTensor::Uint8(arr) => arr.mapv(|v| v as f32),
        }
    }

    /// Read a single-element tensor as f64.
    pub fn scalar(&self) -> Option<f64> {
        if self.len() != 1 {
            return None;
        }
        match self {
            OutputTensor::Float32(arr) => arr.iter().next().map(|&v| v as f64),
            OutputTensor::Float64(arr) => arr.iter().next().copied(),
            OutputTensor::Int32(arr) => arr.iter().next().map(|&v| v as f64),
            OutputTensor::Int64(arr) => arr.iter().next().map(|&v| v as f64),
            OutputTensor::Uint8(arr) => arr.iter().next().map(|&v| v as f64),
        }
    }

    /// Create a Float32 output from raw data and shape.
    pub fn from_f32(data: Vec<f32>, shape: &[usize]) -> Option<Self> {
        ArrayD::from_shape_vec(IxDyn(shape), data)
            .ok()
            .map(OutputTensor::Float32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn descriptor_helpers() {
        let desc = TensorDescriptor {
            name: "boxes".into(),
            shape: vec![1, 10, 4],
            dtype: ElementType::Float32,
            index: 0,
        };
        assert_eq!(desc.rank(), 3);
        assert_eq!(desc.element_count(), 40);
        assert_eq!(desc.shape_string(), "[1, 10, 4]");
    }

    #[test]
    fn value_range_spans_min_and_max() {
        let t = OutputTensor::from_f32(vec![0.3, -1.5, 0.9, 7.0], &[1, 4]).unwrap();
        assert_eq!(t.value_range(), Some((-1.5, 7.0)));
    }

    #[test]
    fn value_range_of_empty_tensor_is_none() {
        let t = OutputTensor::from_f32(vec![], &[1, 0]).unwrap();
        assert_eq!(t.value_range(), None);
    }

    #[test]
    fn scalar_requires_single_element() {
        let one = OutputTensor::from_f32(vec![3.0], &[1]).unwrap();
        assert_eq!(one.scalar(), Some(3.0));

        let two = OutputTensor::from_f32(vec![1.0, 2.0], &[2]).unwrap();
        assert_eq!(two.scalar(), None);
    }

    #[test]
    fn to_f32_casts_integer_tensors() {
        let t = OutputTensor::Int64(ArrayD::from_shape_vec(IxDyn(&[3]), vec![1, 2, 7]).unwrap());
        let f = t.to_f32();
        assert_eq!(f.as_slice().unwrap(), &[1.0, 2.0, 7.0]);
    }

    #[test]
    fn zeros_follows_dtype_policy() {
        let f = InputTensor::zeros(&[1, 2, 2, 3], ElementType::Float32);
        assert_eq!(f.dtype(), ElementType::Float32);
        assert_eq!(f.shape(), &[1, 2, 2, 3]);

        let u = InputTensor::zeros(&[1, 2, 2, 3], ElementType::Uint8);
        assert_eq!(u.dtype(), ElementType::Uint8);
    }
}
