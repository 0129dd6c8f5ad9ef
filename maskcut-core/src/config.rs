//! Configuration for the masking pipeline.
//!
//! A `CoreConfig` value is created by the consumer (typically maskcut-cli)
//! and passed into the pipeline explicitly; nothing in the core reads
//! process-wide state. Serde derives allow the CLI to load the whole
//! structure from a JSON file and override individual fields from flags.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// Default constants

/// Minimum confidence an instance needs before its mask is aggregated.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Opacity of the per-instance tint in the visualization stream.
pub const DEFAULT_VISUALIZATION_ALPHA: f64 = 0.5;

/// Class ids masked by default (COCO: person, sports racket).
pub const DEFAULT_CLASSES_TO_MASK: [i32; 2] = [0, 38];

/// File extensions scanned for in the input folder.
pub const DEFAULT_VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];

/// Filename suffixes appended to the input file's stem for each of the
/// three derived streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSuffixes {
    pub visualization: String,
    pub mask_only: String,
    pub masked_final: String,
}

impl Default for OutputSuffixes {
    fn default() -> Self {
        Self {
            visualization: "_visualization.mp4".to_string(),
            mask_only: "_mask_only.mp4".to_string(),
            masked_final: "_masked_final.mp4".to_string(),
        }
    }
}

/// What the pipeline does with a frame whose inference, aggregation or
/// compositing failed.
///
/// `PassThrough` writes the unmodified source frame to all three writers,
/// keeping frame counts and timestamps aligned across the outputs. `Skip`
/// drops the frame from all three outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameFailurePolicy {
    #[default]
    PassThrough,
    Skip,
}

/// Main configuration structure for the maskcut-core library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Instances below this score are excluded from mask aggregation.
    /// A value of 0.0 means the class filter alone decides.
    pub confidence_threshold: f32,

    /// Class ids whose masks are aggregated. An empty set is valid and
    /// yields all-background masks for every frame.
    pub classes_to_mask: HashSet<i32>,

    /// Opacity of the instance overlay in the visualization stream (0.0-1.0).
    pub visualization_alpha: f64,

    /// Output filename suffixes for the three derived streams.
    pub output_suffixes: OutputSuffixes,

    /// Recovery behavior for frames that fail mid-pipeline.
    pub frame_failure_policy: FrameFailurePolicy,

    /// File extensions considered when scanning the input folder.
    pub video_extensions: Vec<String>,

    /// Optional human-readable names per class id, used only for the
    /// visualization overlay captions.
    pub class_labels: HashMap<i32, String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            classes_to_mask: DEFAULT_CLASSES_TO_MASK.into_iter().collect(),
            visualization_alpha: DEFAULT_VISUALIZATION_ALPHA,
            output_suffixes: OutputSuffixes::default(),
            frame_failure_policy: FrameFailurePolicy::default(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            class_labels: HashMap::new(),
        }
    }
}

impl CoreConfig {
    /// Validates the configuration, returning `CoreError::Config` for the
    /// first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(CoreError::Config(format!(
                "confidence_threshold must be within [0.0, 1.0], got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.visualization_alpha) {
            return Err(CoreError::Config(format!(
                "visualization_alpha must be within [0.0, 1.0], got {}",
                self.visualization_alpha
            )));
        }
        if self.video_extensions.is_empty() {
            return Err(CoreError::Config(
                "video_extensions must not be empty".to_string(),
            ));
        }
        let suffixes = [
            &self.output_suffixes.visualization,
            &self.output_suffixes.mask_only,
            &self.output_suffixes.masked_final,
        ];
        if suffixes.iter().any(|suffix| suffix.is_empty()) {
            return Err(CoreError::Config(
                "output suffixes must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(CoreConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_threshold_is_valid() {
        let config = CoreConfig {
            confidence_threshold: 0.0,
            ..CoreConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_class_filter_is_valid() {
        let config = CoreConfig {
            classes_to_mask: HashSet::new(),
            ..CoreConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let config = CoreConfig {
            confidence_threshold: 1.5,
            ..CoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn out_of_range_alpha_is_rejected() {
        let config = CoreConfig {
            visualization_alpha: -0.1,
            ..CoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn empty_suffix_is_rejected() {
        let mut config = CoreConfig::default();
        config.output_suffixes.mask_only.clear();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = CoreConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: CoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.classes_to_mask, config.classes_to_mask);
        assert_eq!(parsed.output_suffixes, config.output_suffixes);
        assert_eq!(parsed.frame_failure_policy, config.frame_failure_policy);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let parsed: CoreConfig =
            serde_json::from_str(r#"{"confidence_threshold": 0.25}"#).unwrap();
        assert_eq!(parsed.confidence_threshold, 0.25);
        assert_eq!(parsed.visualization_alpha, DEFAULT_VISUALIZATION_ALPHA);
        assert_eq!(
            parsed.frame_failure_policy,
            FrameFailurePolicy::PassThrough
        );
    }
}
