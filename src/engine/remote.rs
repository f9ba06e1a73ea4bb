// SPDX-License-Identifier: GPL-3.0-only

//! Remote inference service adapter
//!
//! Speaks length-prefixed JSON over TCP to an external face-landmark
//! service. At connect time a configure message carries the model asset
//! path and face limit; each detect call then ships a header plus a
//! JPEG-encoded frame and reads back one detection payload.
//!
//! Wire framing: a big-endian u32 byte length followed by the payload.

use super::{EngineError, EngineOptions, LandmarkEngine};
use crate::backends::camera::CameraFrame;
use crate::constants::FRAME_JPEG_QUALITY;
use crate::landmark::{BlendShape, DetectedFace, DetectionResult, NormalizedLandmark};

use image::ImageEncoder;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::io::Cursor;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Upper bound on a single wire frame
const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigureRequest<'a> {
    r#type: &'static str,
    model_asset_path: &'a str,
    num_faces: usize,
    output_face_blend_shapes: bool,
}

#[derive(Deserialize)]
struct ConfigureReply {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectHeader {
    r#type: &'static str,
    width: u32,
    height: u32,
    timestamp_ms: u64,
    encoding: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireDetection {
    faces: Vec<WireFace>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireFace {
    landmarks: Vec<WireLandmark>,
    blend_shapes: Option<Vec<WireBlendShape>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireLandmark {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlendShape {
    #[serde(default)]
    category_name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    score: Option<f32>,
}

impl WireDetection {
    fn into_result(self) -> DetectionResult {
        DetectionResult {
            faces: self
                .faces
                .into_iter()
                .map(|face| DetectedFace {
                    landmarks: face
                        .landmarks
                        .into_iter()
                        .map(|p| NormalizedLandmark {
                            x: p.x,
                            y: p.y,
                            z: p.z,
                        })
                        .collect(),
                    blend_shapes: face.blend_shapes.and_then(convert_blend_shapes),
                })
                .collect(),
        }
    }
}

/// Convert wire blend shapes, degrading malformed lists to `None`.
///
/// A category missing its name or score makes the whole list unusable for
/// display; the visualizer then shows its placeholder instead.
fn convert_blend_shapes(list: Vec<WireBlendShape>) -> Option<Vec<BlendShape>> {
    list.into_iter()
        .map(|category| {
            let category_name = category.category_name?;
            let score = category.score?;
            Some(BlendShape {
                category_name,
                display_name: category.display_name,
                score: score.clamp(0.0, 1.0),
            })
        })
        .collect()
}

/// TCP client for an external face-landmark inference service
pub struct RemoteEngine {
    stream: TcpStream,
}

impl RemoteEngine {
    /// Connect to the service and apply the engine configuration.
    ///
    /// Any failure here is a terminal initialization error for the session.
    pub async fn connect(endpoint: &str, options: &EngineOptions) -> Result<Self, EngineError> {
        let stream = TcpStream::connect(endpoint)
            .await
            .map_err(|e| EngineError::ConnectFailed(format!("{}: {}", endpoint, e)))?;
        let _ = stream.set_nodelay(true);

        let mut engine = Self { stream };
        engine.configure(options).await?;
        info!(endpoint, model = %options.model_asset_path, "Engine configured");
        Ok(engine)
    }

    async fn configure(&mut self, options: &EngineOptions) -> Result<(), EngineError> {
        write_json(
            &mut self.stream,
            &ConfigureRequest {
                r#type: "configure",
                model_asset_path: &options.model_asset_path,
                num_faces: options.num_faces,
                output_face_blend_shapes: options.output_blend_shapes,
            },
        )
        .await?;

        let reply: ConfigureReply = read_json(&mut self.stream).await?;
        if reply.status == "ok" {
            Ok(())
        } else {
            Err(EngineError::ConfigureRejected(
                reply.message.unwrap_or_else(|| reply.status.clone()),
            ))
        }
    }
}

impl LandmarkEngine for RemoteEngine {
    async fn detect(
        &mut self,
        frame: &CameraFrame,
        timestamp_ms: u64,
    ) -> Result<DetectionResult, EngineError> {
        let jpeg = encode_jpeg(frame).await?;
        debug!(
            bytes = jpeg.len(),
            timestamp_ms,
            "Shipping frame to inference service"
        );

        write_json(
            &mut self.stream,
            &DetectHeader {
                r#type: "detect",
                width: frame.width,
                height: frame.height,
                timestamp_ms,
                encoding: "jpeg",
            },
        )
        .await?;
        write_frame(&mut self.stream, &jpeg).await?;

        let wire: WireDetection = read_json(&mut self.stream).await?;
        Ok(wire.into_result())
    }
}

/// Encode an RGBA frame as JPEG on a blocking worker
async fn encode_jpeg(frame: &CameraFrame) -> Result<Vec<u8>, EngineError> {
    let width = frame.width;
    let height = frame.height;
    let data = Arc::clone(&frame.data);

    tokio::task::spawn_blocking(move || {
        // JPEG carries no alpha; strip it first
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for pixel in data.chunks_exact(4) {
            rgb.extend_from_slice(&pixel[..3]);
        }

        let mut out = Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, FRAME_JPEG_QUALITY);
        encoder
            .write_image(&rgb, width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| EngineError::Encode(e.to_string()))?;
        Ok(out.into_inner())
    })
    .await
    .map_err(|e| EngineError::Encode(format!("encode task failed: {}", e)))?
}

async fn write_frame<S>(stream: &mut S, data: &[u8]) -> Result<(), EngineError>
where
    S: AsyncWrite + Unpin,
{
    if data.len() as u64 > MAX_FRAME_BYTES as u64 {
        return Err(EngineError::Protocol(format!(
            "outgoing frame of {} bytes exceeds limit",
            data.len()
        )));
    }
    stream
        .write_u32(data.len() as u32)
        .await
        .map_err(|e| EngineError::Io(e.to_string()))?;
    stream
        .write_all(data)
        .await
        .map_err(|e| EngineError::Io(e.to_string()))?;
    stream
        .flush()
        .await
        .map_err(|e| EngineError::Io(e.to_string()))
}

async fn read_frame<S>(stream: &mut S) -> Result<Vec<u8>, EngineError>
where
    S: AsyncRead + Unpin,
{
    let len = stream
        .read_u32()
        .await
        .map_err(|e| EngineError::Io(e.to_string()))?;
    if len > MAX_FRAME_BYTES {
        return Err(EngineError::Protocol(format!(
            "incoming frame of {} bytes exceeds limit",
            len
        )));
    }
    let mut data = vec![0u8; len as usize];
    stream
        .read_exact(&mut data)
        .await
        .map_err(|e| EngineError::Io(e.to_string()))?;
    Ok(data)
}

async fn write_json<S, T>(stream: &mut S, value: &T) -> Result<(), EngineError>
where
    S: AsyncWrite + Unpin,
    T: Serialize,
{
    let data = serde_json::to_vec(value).map_err(|e| EngineError::Protocol(e.to_string()))?;
    write_frame(stream, &data).await
}

async fn read_json<S, T>(stream: &mut S) -> Result<T, EngineError>
where
    S: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let data = read_frame(stream).await?;
    serde_json::from_slice(&data).map_err(|e| EngineError::Protocol(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_detection_parses() {
        let json = r#"{
            "faces": [{
                "landmarks": [{"x": 0.25, "y": 0.5, "z": -0.01}],
                "blendShapes": [
                    {"categoryName": "jawOpen", "displayName": "Jaw Open", "score": 0.42}
                ]
            }]
        }"#;
        let wire: WireDetection = serde_json::from_str(json).unwrap();
        let result = wire.into_result();

        assert_eq!(result.faces.len(), 1);
        assert_eq!(result.faces[0].landmarks[0].x, 0.25);
        let shapes = result.first_blend_shapes().unwrap();
        assert_eq!(shapes[0].category_name, "jawOpen");
        assert_eq!(shapes[0].score, 0.42);
    }

    #[test]
    fn test_missing_category_name_degrades_to_none() {
        let json = r#"{
            "faces": [{
                "landmarks": [],
                "blendShapes": [
                    {"categoryName": "jawOpen", "score": 0.4},
                    {"score": 0.2}
                ]
            }]
        }"#;
        let wire: WireDetection = serde_json::from_str(json).unwrap();
        let result = wire.into_result();
        assert_eq!(result.faces[0].blend_shapes, None);
    }

    #[test]
    fn test_missing_score_degrades_to_none() {
        let json = r#"{
            "faces": [{
                "landmarks": [],
                "blendShapes": [{"categoryName": "jawOpen"}]
            }]
        }"#;
        let wire: WireDetection = serde_json::from_str(json).unwrap();
        assert_eq!(wire.into_result().faces[0].blend_shapes, None);
    }

    #[test]
    fn test_scores_are_clamped() {
        let json = r#"{
            "faces": [{
                "landmarks": [],
                "blendShapes": [
                    {"categoryName": "a", "score": 1.7},
                    {"categoryName": "b", "score": -0.3}
                ]
            }]
        }"#;
        let wire: WireDetection = serde_json::from_str(json).unwrap();
        let result = wire.into_result();
        let shapes = result.first_blend_shapes().unwrap();
        assert_eq!(shapes[0].score, 1.0);
        assert_eq!(shapes[1].score, 0.0);
    }

    #[test]
    fn test_empty_payload_is_empty_result() {
        let wire: WireDetection = serde_json::from_str("{}").unwrap();
        assert!(wire.into_result().faces.is_empty());
    }

    #[tokio::test]
    async fn test_frame_roundtrip() {
        let (mut a, mut b) = tokio::io::duplex(1024);

        write_frame(&mut a, b"hello frames").await.unwrap();
        let data = read_frame(&mut b).await.unwrap();
        assert_eq!(data, b"hello frames");
    }

    #[tokio::test]
    async fn test_json_roundtrip() {
        let (mut a, mut b) = tokio::io::duplex(1024);

        write_json(
            &mut a,
            &DetectHeader {
                r#type: "detect",
                width: 640,
                height: 480,
                timestamp_ms: 123,
                encoding: "jpeg",
            },
        )
        .await
        .unwrap();

        let value: serde_json::Value = read_json(&mut b).await.unwrap();
        assert_eq!(value["type"], "detect");
        assert_eq!(value["timestampMs"], 123);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);

        tokio::spawn(async move {
            let _ = a.write_u32(MAX_FRAME_BYTES + 1).await;
        });
        let err = read_frame(&mut b).await.unwrap_err();
        assert!(matches!(err, EngineError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_encode_jpeg_produces_jpeg_magic() {
        let frame = CameraFrame::from_rgba(4, 4, vec![200u8; 64]);
        let jpeg = encode_jpeg(&frame).await.unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
