use crate::models::MediaMetadata;
use anyhow::Result;
use serde_json::Value;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Run ffprobe against a local file
    pub async fn extract_metadata(file_path: &Path) -> Result<MediaMetadata> {
        debug!("Probing media file: {}", file_path.display());

        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg(file_path)
            .output()
            .await?;

        if !output.status.success() {
            return Err(anyhow::anyhow!("ffprobe exited with {}", output.status));
        }

        let probe: Value = serde_json::from_slice(&output.stdout)?;
        Ok(Self::parse_ffprobe_output(&probe))
    }

    /// Duration in seconds, `None` when ffprobe is unavailable or the file has none
    pub async fn probe_duration(file_path: &Path) -> Option<f64> {
        match Self::extract_metadata(file_path).await {
            Ok(metadata) => metadata.duration,
            Err(e) => {
                warn!("Could not probe {}: {}", file_path.display(), e);
                None
            }
        }
    }

    pub fn parse_ffprobe_output(probe: &Value) -> MediaMetadata {
        let duration = probe
            .pointer("/format/duration")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0);

        MediaMetadata { duration }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_duration() {
        let probe = json!({
            "format": { "duration": "12.480000", "format_name": "mov,mp4,m4a,3gp,3g2,mj2" },
            "streams": [
                { "codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080 },
                { "codec_type": "audio", "codec_name": "aac" }
            ]
        });

        let metadata = MetadataExtractor::parse_ffprobe_output(&probe);

        assert_eq!(metadata.duration, Some(12.48));
    }

    #[test]
    fn test_parse_missing_duration() {
        let probe = json!({ "format": { "duration": "N/A" }, "streams": [] });

        let metadata = MetadataExtractor::parse_ffprobe_output(&probe);
        assert_eq!(metadata.duration, None);

        let negative = json!({ "format": { "duration": "-1.0" } });
        assert_eq!(MetadataExtractor::parse_ffprobe_output(&negative).duration, None);
    }

    #[test]
    fn test_parse_empty_document() {
        assert_eq!(
            MetadataExtractor::parse_ffprobe_output(&json!({})),
            MediaMetadata::default()
        );
    }

    #[tokio::test]
    async fn test_probe_duration_of_non_media_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"not a video").unwrap();

        assert_eq!(MetadataExtractor::probe_duration(&path).await, None);
    }
}
