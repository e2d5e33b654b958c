//! Session backends.

#[cfg(feature = "native")]
pub mod ort;

use crate::{InputTensor, OutputTensor, Result, TensorDescriptor};

/// An owned, loaded inference session.
///
/// This is the model-provider seam: the classifier and decoder never touch
/// an engine directly, they consume descriptors and materialized tensors
/// obtained through this trait. One full cycle is set-input, invoke, then
/// any number of read-outputs; the outputs read after an invocation all
/// belong to that invocation, and a subsequent invoke replaces them.
pub trait ModelSession {
    /// Input tensor descriptors in declaration order.
    fn inputs(&self) -> &[TensorDescriptor];

    /// Output tensor descriptors in declaration order.
    fn outputs(&self) -> &[TensorDescriptor];

    /// Stage an input tensor for the next invocation.
    fn set_input(&mut self, descriptor: &TensorDescriptor, tensor: InputTensor) -> Result<()>;

    /// Run one blocking inference pass over the staged inputs.
    fn invoke(&mut self) -> Result<()>;

    /// Fetch a materialized output of the most recent invocation.
    ///
    /// Fails with [`crate::InferenceError::NotInvoked`] when no invocation
    /// has completed yet.
    fn read_output(&self, descriptor: &TensorDescriptor) -> Result<OutputTensor>;
}
