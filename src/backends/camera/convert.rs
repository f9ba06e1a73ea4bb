// SPDX-License-Identifier: GPL-3.0-only

//! Pixel format conversion for captured frames
//!
//! Webcams commonly deliver YUYV or MJPG; everything is converted to RGBA
//! on the capture thread so the rest of the application sees one format.

/// Source pixel formats accepted from the capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Packed 4:2:2 YUV (Y0 U Y1 V)
    Yuyv,
    /// Motion JPEG
    Mjpg,
    /// 24-bit RGB
    Rgb24,
    /// 8-bit grayscale
    Gray8,
}

impl SourceFormat {
    /// Map a V4L2 FourCC to a supported source format
    pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"YUYV" => Some(SourceFormat::Yuyv),
            b"MJPG" | b"JPEG" => Some(SourceFormat::Mjpg),
            b"RGB3" => Some(SourceFormat::Rgb24),
            b"GREY" => Some(SourceFormat::Gray8),
            _ => None,
        }
    }

    /// Preference order when negotiating with the device
    pub const PREFERRED: [&'static [u8; 4]; 4] = [b"YUYV", b"MJPG", b"RGB3", b"GREY"];
}

/// Convert one captured buffer to RGBA
pub fn to_rgba(
    format: SourceFormat,
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
) -> Result<Vec<u8>, String> {
    match format {
        SourceFormat::Yuyv => Ok(yuyv_to_rgba(data, width, height, stride)),
        SourceFormat::Mjpg => mjpg_to_rgba(data, width, height),
        SourceFormat::Rgb24 => Ok(rgb24_to_rgba(data, width, height, stride)),
        SourceFormat::Gray8 => Ok(gray8_to_rgba(data, width, height, stride)),
    }
}

/// Convert YUV (BT.601) to RGB
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let stride = effective_stride(stride, width * 2);
    let mut out = Vec::with_capacity((width * height * 4) as usize);

    for row in 0..height {
        for x in 0..width {
            // Two pixels share one chroma pair
            let pair = (x & !1) as usize;
            let base = row as usize * stride + pair * 2;
            if base + 3 >= data.len() {
                out.extend_from_slice(&[0, 0, 0, 255]);
                continue;
            }
            let luma = if x & 1 == 0 { data[base] } else { data[base + 2] };
            let (r, g, b) = yuv_to_rgb(luma, data[base + 1], data[base + 3]);
            out.extend_from_slice(&[r, g, b, 255]);
        }
    }
    out
}

fn mjpg_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, String> {
    let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| format!("MJPG decode failed: {}", e))?;
    let rgba = decoded.to_rgba8();
    if rgba.width() != width || rgba.height() != height {
        return Err(format!(
            "MJPG frame is {}x{}, expected {}x{}",
            rgba.width(),
            rgba.height(),
            width,
            height
        ));
    }
    Ok(rgba.into_raw())
}

fn rgb24_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let stride = effective_stride(stride, width * 3);
    let mut out = Vec::with_capacity((width * height * 4) as usize);

    for row in 0..height {
        for x in 0..width {
            let idx = row as usize * stride + x as usize * 3;
            if idx + 2 < data.len() {
                out.extend_from_slice(&[data[idx], data[idx + 1], data[idx + 2], 255]);
            } else {
                out.extend_from_slice(&[0, 0, 0, 255]);
            }
        }
    }
    out
}

fn gray8_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let stride = effective_stride(stride, width);
    let mut out = Vec::with_capacity((width * height * 4) as usize);

    for row in 0..height {
        for x in 0..width {
            let idx = row as usize * stride + x as usize;
            let v = data.get(idx).copied().unwrap_or(0);
            out.extend_from_slice(&[v, v, v, 255]);
        }
    }
    out
}

fn effective_stride(stride: u32, minimum: u32) -> usize {
    if stride >= minimum { stride as usize } else { minimum as usize }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_mapping() {
        assert_eq!(SourceFormat::from_fourcc(b"YUYV"), Some(SourceFormat::Yuyv));
        assert_eq!(SourceFormat::from_fourcc(b"MJPG"), Some(SourceFormat::Mjpg));
        assert_eq!(SourceFormat::from_fourcc(b"RGB3"), Some(SourceFormat::Rgb24));
        assert_eq!(SourceFormat::from_fourcc(b"GREY"), Some(SourceFormat::Gray8));
        assert_eq!(SourceFormat::from_fourcc(b"NV12"), None);
    }

    #[test]
    fn test_yuyv_neutral_gray() {
        // Y=128, U=V=128 is mid gray in BT.601
        let data = [128u8, 128, 128, 128];
        let out = yuyv_to_rgba(&data, 2, 1, 0);
        assert_eq!(out.len(), 8);
        assert_eq!(&out[0..4], &[128, 128, 128, 255]);
        assert_eq!(&out[4..8], &[128, 128, 128, 255]);
    }

    #[test]
    fn test_yuyv_red() {
        // Pure red in BT.601: Y=76, U=84, V=255
        let data = [76u8, 84, 76, 255];
        let out = yuyv_to_rgba(&data, 2, 1, 0);
        let (r, g, b) = (out[0], out[1], out[2]);
        assert!(r > 230, "red channel should dominate, got {}", r);
        assert!(g < 40 && b < 40, "green/blue should be low, got {}/{}", g, b);
    }

    #[test]
    fn test_gray8_expansion() {
        let out = gray8_to_rgba(&[7, 9], 2, 1, 0);
        assert_eq!(out, vec![7, 7, 7, 255, 9, 9, 9, 255]);
    }

    #[test]
    fn test_rgb24_respects_stride_padding() {
        // 1x2 image with 8-byte stride (2 bytes padding per row)
        let data = [1u8, 2, 3, 0, 0, 0, 0, 0, 4, 5, 6, 0, 0, 0, 0, 0];
        let out = rgb24_to_rgba(&data, 1, 2, 8);
        assert_eq!(out, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }
}
