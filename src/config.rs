use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    scan::ExtensionFilter,
    video::{EncoderBackend, FrameSize, ResizeFilter, StreamSpec},
};

/// Main configuration for a conversion run
///
/// Built once at start-up (defaults, optionally a TOML file, then command
/// line overrides) and handed by value to the sequencer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where images are read from
    #[serde(default)]
    pub input: InputConfig,

    /// Where the video is written
    #[serde(default)]
    pub output: OutputConfig,

    /// Encoding settings
    #[serde(default)]
    pub video: VideoConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.input.validate()?;
        self.output.validate()?;
        self.video.validate()?;
        Ok(())
    }

    /// Full path of the video file to produce
    pub fn output_path(&self) -> PathBuf {
        self.output.directory.join(&self.output.file_name)
    }
}

/// Input folder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Folder holding the still images
    pub directory: PathBuf,

    /// Accepted file extensions, matched case-insensitively
    pub extensions: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("input"),
            extensions: ["jpg", "jpeg", "png", "bmp"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl InputConfig {
    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.extensions)
    }

    fn validate(&self) -> Result<()> {
        if self.extensions.iter().all(|ext| ext.trim_start_matches('.').is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "input.extensions".to_string(),
                value: format!("{:?}", self.extensions),
            }
            .into());
        }
        Ok(())
    }
}

/// Output location settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Folder the video is written into; created when missing
    pub directory: PathBuf,

    /// Video file name; its extension picks the container
    pub file_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            file_name: "output.mp4".to_string(),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        let name = Path::new(&self.file_name);
        if self.file_name.is_empty() || name.file_name().map(|n| n != name.as_os_str()).unwrap_or(true) {
            return Err(ConfigError::InvalidValue {
                key: "output.file_name".to_string(),
                value: self.file_name.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Encoding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Frames per second; each image is shown for exactly one frame
    pub fps: f64,

    /// Fixed output size; the first image's size is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_size: Option<FrameSize>,

    /// Filter used when an image has to be rescaled
    pub resize_filter: ResizeFilter,

    /// FFmpeg encoder name (`mpeg4` gives the classic `mp4v` stream)
    pub codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,

    /// Encoder implementation
    pub backend: EncoderBackend,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            frame_size: None,
            resize_filter: ResizeFilter::default(),
            codec: "mpeg4".to_string(),
            quality: 85,
            backend: EncoderBackend::default(),
        }
    }
}

impl VideoConfig {
    /// Stream parameters for a run whose frame size has been fixed
    pub fn stream_spec(&self, frame_size: FrameSize) -> StreamSpec {
        StreamSpec {
            frame_size,
            fps: self.fps,
            codec: self.codec.clone(),
            quality: self.quality,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "video.fps".to_string(),
                value: self.fps.to_string(),
            }
            .into());
        }

        if let Some(size) = self.frame_size {
            if size.width == 0 || size.height == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "video.frame_size".to_string(),
                    value: size.to_string(),
                }
                .into());
            }
        }

        if self.codec.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "video.codec".to_string(),
                value: self.codec.clone(),
            }
            .into());
        }

        if self.quality > 100 {
            return Err(ConfigError::InvalidValue {
                key: "video.quality".to_string(),
                value: self.quality.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output_path(), PathBuf::from("output").join("output.mp4"));
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.video.fps = 4.0;
        original_config.video.frame_size = Some(FrameSize::new(640, 480));
        original_config.video.resize_filter = ResizeFilter::Lanczos3;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(
            &file_path,
            "[input]\ndirectory = \"shots\"\nextensions = [\"jpg\"]\n",
        )
        .unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.input.directory, PathBuf::from("shots"));
        assert_eq!(config.video, VideoConfig::default());
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Config::from_file(dir.path().join("nope.toml")),
            Err(crate::error::SequencerError::Config(ConfigError::FileNotFound { .. }))
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "video = 3").unwrap();
        assert!(matches!(
            Config::from_file(&bad),
            Err(crate::error::SequencerError::Config(ConfigError::ParseFailed { .. }))
        ));
    }

    #[test]
    fn test_invalid_fps() {
        let mut config = Config::default();
        config.video.fps = 0.0;
        assert!(config.validate().is_err());

        config.video.fps = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_extension_list() {
        let mut config = Config::default();
        config.input.extensions = vec![".".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_name_must_be_a_bare_file_name() {
        let mut config = Config::default();
        config.output.file_name = "sub/out.mp4".to_string();
        assert!(config.validate().is_err());
    }
}
