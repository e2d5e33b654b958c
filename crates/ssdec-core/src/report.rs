//! Model inspection report.

use std::fmt;

use ssdec_inference::TensorDescriptor;

/// Input/output metadata plus the realized output shapes of a dry run.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub inputs: Vec<TensorDescriptor>,
    pub outputs: Vec<TensorDescriptor>,
    /// Output shapes observed after a zero-input invocation.
    pub realized_shapes: Vec<Vec<usize>>,
}

impl ModelReport {
    /// One-line verdict on the output layout, keyed off the output count.
    pub fn layout_comment(&self) -> &'static str {
        match self.outputs.len() {
            4 => "Looks like a typical SSD-style detection model with 4 outputs (boxes, classes, scores, num_detections).",
            8 => "Model has 8 outputs; this is not the 4-output SSD layout and needs a custom decode pipeline.",
            _ => "Model has an unexpected number of outputs; custom handling needed.",
        }
    }
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Inputs ==")?;
        for d in &self.inputs {
            writeln!(
                f,
                "  #{}: name={}, shape={}, dtype={}",
                d.index,
                d.name,
                d.shape_string(),
                d.dtype
            )?;
        }

        writeln!(f, "\n== Outputs ==")?;
        for d in &self.outputs {
            writeln!(
                f,
                "  #{}: name={}, shape={}, dtype={}",
                d.index,
                d.name,
                d.shape_string(),
                d.dtype
            )?;
        }

        writeln!(f, "\nOutput tensor count: {}", self.outputs.len())?;
        writeln!(f, "{}", self.layout_comment())?;

        writeln!(f, "\nDry-run output shapes:")?;
        for (i, shape) in self.realized_shapes.iter().enumerate() {
            let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
            writeln!(f, "  #{}: [{}]", i, dims.join(", "))?;
        }
        Ok(())
    }
}
