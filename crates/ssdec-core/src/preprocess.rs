//! Image preprocessing for the detection input tensor.

use image::DynamicImage;
use tracing::{debug, warn};

use ssdec_inference::{InputTensor, TensorDescriptor};

/// Spatial layout extracted from an NHWC input descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLayout {
    pub height: u32,
    pub width: u32,
}

/// Interpret an input descriptor as `[1, H, W, 3]` NHWC.
///
/// Detection models ingest one RGB image; anything else is an unusual input
/// we feed zeros into rather than guess at.
pub fn input_layout(descriptor: &TensorDescriptor) -> Option<InputLayout> {
    match descriptor.shape.as_slice() {
        &[1, h, w, 3] if h > 0 && w > 0 => Some(InputLayout {
            height: h as u32,
            width: w as u32,
        }),
        _ => None,
    }
}

/// Convert an image into the model's input tensor.
///
/// The image is resized (bilinear) to the declared width and height in RGB
/// byte order. Normalization follows the input dtype: floating point gets
/// pixel values scaled by 1/255, integral types take raw bytes. When the
/// declared shape is not `[1, H, W, 3]` a zero-filled tensor of the
/// declared shape is produced instead.
pub fn image_to_input(image: &DynamicImage, descriptor: &TensorDescriptor) -> InputTensor {
    let Some(layout) = input_layout(descriptor) else {
        warn!(
            shape = %descriptor.shape_string(),
            "unusual input shape, feeding zeros"
        );
        return dummy_input(descriptor);
    };

    debug!(
        width = layout.width,
        height = layout.height,
        dtype = %descriptor.dtype,
        "resizing image for model input"
    );

    let resized = image.resize_exact(
        layout.width,
        layout.height,
        image::imageops::FilterType::Triangle,
    );
    let rgb = resized.to_rgb8();
    let pixels = rgb.into_raw();

    let shape = [1, layout.height as usize, layout.width as usize, 3];
    if descriptor.dtype.is_float() {
        let scaled: Vec<f32> = pixels.iter().map(|&p| p as f32 / 255.0).collect();
        // Length matches the shape by construction.
        InputTensor::from_f32(scaled, &shape).unwrap_or_else(|| InputTensor::zeros(&shape, descriptor.dtype))
    } else {
        InputTensor::from_u8(pixels, &shape).unwrap_or_else(|| InputTensor::zeros(&shape, descriptor.dtype))
    }
}

/// Zero-filled input of the declared shape and dtype, for dry runs.
pub fn dummy_input(descriptor: &TensorDescriptor) -> InputTensor {
    InputTensor::zeros(&descriptor.shape, descriptor.dtype)
}
