use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::assumptions::check_non_negative;
use crate::error::{Result, SizingError};

/// Free-text context captured alongside the numeric assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DesignBrief {
    pub problem_statement: String,
    pub read_write_ratio: String,
    pub regions: String,
    pub availability: String,
    pub latency_target: String,
    pub data_retention: String,
    pub sla_slo: String,
    pub security: String,
    pub compliance: String,
    pub integrations: String,
    pub rollout_strategy: String,
}

impl Default for DesignBrief {
    fn default() -> Self {
        Self {
            problem_statement: String::new(),
            read_write_ratio: "80/20".to_string(),
            regions: "Multi-region".to_string(),
            availability: "99.9%".to_string(),
            latency_target: "<200ms".to_string(),
            data_retention: "30 days".to_string(),
            sla_slo: "99.9% uptime, 95% requests < 200ms".to_string(),
            security: "OAuth2, Encrypted at rest and in transit".to_string(),
            compliance: "GDPR, SOC2".to_string(),
            integrations: "Slack, Email, Prometheus".to_string(),
            rollout_strategy: "Alpha → Beta → GA with canary deployments".to_string(),
        }
    }
}

impl DesignBrief {
    /// Label/value pairs in display order. The problem statement is rendered separately.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Read/Write Ratio", self.read_write_ratio.as_str()),
            ("Regions", self.regions.as_str()),
            ("Availability", self.availability.as_str()),
            ("Latency Target", self.latency_target.as_str()),
            ("Data Retention", self.data_retention.as_str()),
            ("SLA/SLOs", self.sla_slo.as_str()),
            ("Security", self.security.as_str()),
            ("Compliance", self.compliance.as_str()),
            ("Integration", self.integrations.as_str()),
            ("Rollout Strategy", self.rollout_strategy.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum VideoResolution {
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "1440p")]
    P1440,
    #[serde(rename = "2160p")]
    P2160,
}

impl VideoResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
            Self::P1440 => "1440p",
            Self::P2160 => "2160p (4K)",
        }
    }
}

impl fmt::Display for VideoResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoResolution {
    type Err = SizingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "480p" => Ok(Self::P480),
            "720p" => Ok(Self::P720),
            "1080p" => Ok(Self::P1080),
            "1440p" => Ok(Self::P1440),
            "2160p" | "4k" | "2160p (4k)" => Ok(Self::P2160),
            other => Err(SizingError::invalid(
                "resolution",
                format!("unsupported video resolution '{other}'"),
            )),
        }
    }
}

/// Photo/video handling assumptions. Only rendered when either kind of upload is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MediaAssumptions {
    pub photos: bool,
    pub videos: bool,
    pub avg_photo_size_mb: f64,
    pub avg_video_duration_min: f64,
    pub avg_video_bitrate_mbps: f64,
    pub resolution: VideoResolution,
    pub uploads_per_user_per_day: u32,
    pub peak_upload_qps: u32,
    pub transcoding: bool,
    pub thumbnails: bool,
    pub playback_latency: String,
    pub storage_tiering: String,
    pub adaptive_streaming: bool,
    pub retention_policy: String,
}

impl Default for MediaAssumptions {
    fn default() -> Self {
        Self {
            photos: false,
            videos: false,
            avg_photo_size_mb: 3.0,
            avg_video_duration_min: 2.0,
            avg_video_bitrate_mbps: 5.0,
            resolution: VideoResolution::P480,
            uploads_per_user_per_day: 2,
            peak_upload_qps: 500,
            transcoding: true,
            thumbnails: true,
            playback_latency: "<5s".to_string(),
            storage_tiering: "Hot for recent, Cold for archive, CDN for active content"
                .to_string(),
            adaptive_streaming: true,
            retention_policy: "User-controlled, default 90 days".to_string(),
        }
    }
}

impl MediaAssumptions {
    pub fn enabled(&self) -> bool {
        self.photos || self.videos
    }

    pub fn validate(&self) -> Result<()> {
        check_non_negative("avg_photo_size_mb", self.avg_photo_size_mb)?;
        check_non_negative("avg_video_duration_min", self.avg_video_duration_min)?;
        check_non_negative("avg_video_bitrate_mbps", self.avg_video_bitrate_mbps)?;
        Ok(())
    }

    /// Label/value lines for the media section, honoring the photo/video switches.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut lines = Vec::new();
        if !self.enabled() {
            return lines;
        }
        if self.photos {
            lines.push(("Avg Photo Size", format!("{} MB", self.avg_photo_size_mb)));
        }
        if self.videos {
            lines.push((
                "Avg Video Duration",
                format!("{} min", self.avg_video_duration_min),
            ));
            lines.push((
                "Avg Video Bitrate",
                format!("{} Mbps", self.avg_video_bitrate_mbps),
            ));
            lines.push(("Video Resolution", self.resolution.to_string()));
        }
        lines.push(("Uploads/User/Day", self.uploads_per_user_per_day.to_string()));
        lines.push(("Peak Upload QPS", self.peak_upload_qps.to_string()));
        lines.push(("Transcoding Required", yes_no(self.transcoding)));
        lines.push(("Thumbnail Generation", yes_no(self.thumbnails)));
        lines.push(("Playback Latency Target", self.playback_latency.clone()));
        lines.push(("Storage Tiering", self.storage_tiering.clone()));
        lines.push(("Adaptive Streaming", yes_no(self.adaptive_streaming)));
        lines.push(("Media Retention Policy", self.retention_policy.clone()));
        lines
    }
}

fn yes_no(flag: bool) -> String {
    let answer = if flag { "Yes" } else { "No" };
    answer.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_disabled_renders_nothing() {
        let media = MediaAssumptions::default();
        assert!(!media.enabled());
        assert!(media.entries().is_empty());
    }

    #[test]
    fn test_photo_only_media_skips_video_lines() {
        let media = MediaAssumptions {
            photos: true,
            ..Default::default()
        };
        let labels: Vec<_> = media.entries().into_iter().map(|(label, _)| label).collect();
        assert_eq!(labels[0], "Avg Photo Size");
        assert!(!labels.contains(&"Video Resolution"));
        assert!(labels.contains(&"Peak Upload QPS"));
    }

    #[test]
    fn test_media_validation() {
        let media = MediaAssumptions {
            videos: true,
            avg_video_bitrate_mbps: -1.0,
            ..Default::default()
        };
        assert!(media.validate().is_err());
    }

    #[test]
    fn test_resolution_parsing() {
        assert_eq!("4K".parse::<VideoResolution>().unwrap(), VideoResolution::P2160);
        assert_eq!(VideoResolution::P2160.to_string(), "2160p (4K)");
        assert!("8k".parse::<VideoResolution>().is_err());
    }
}
