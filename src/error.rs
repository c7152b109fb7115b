use thiserror::Error;

/// Main error type for the Frame Sequencer library
#[derive(Error, Debug)]
pub enum SequencerError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Video error: {0}")]
    Video(#[from] VideoError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while enumerating the input directory
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input directory not found: {path}")]
    InputNotFound { path: String },

    #[error("Failed to read input directory {path}: {reason}")]
    ScanFailure { path: String, reason: String },

    #[error("No valid image files found in: {path}")]
    NoValidImages { path: String },
}

/// Decode and encode errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Cannot read first frame {path}: {reason}")]
    UnreadableFirstFrame { path: String, reason: String },

    #[error("Video writer initialization failed: {reason}")]
    WriterInitFailed { reason: String },

    /// Per-file failure; the sequencer recovers from it by skipping the image.
    #[error("Failed to decode image {path}: {reason}")]
    DecodingFailed { path: String, reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path} ({reason})")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid frame size '{value}': {reason}")]
    InvalidFrameSize { value: String, reason: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using SequencerError
pub type Result<T> = std::result::Result<T, SequencerError>;

impl SequencerError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Scan(ScanError::InputNotFound { path }) => {
                format!("Input folder '{}' does not exist.", path)
            }
            Self::Scan(ScanError::NoValidImages { path }) => {
                format!("No readable images (jpg, jpeg, png, bmp) were found in '{}'.", path)
            }
            Self::Video(VideoError::UnreadableFirstFrame { path, .. }) => {
                format!("Could not read the first image '{}' to determine the video size.", path)
            }
            Self::Video(VideoError::WriterInitFailed { reason }) => {
                format!("Could not create the video file, check that the encoder is available: {}", reason)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_errors_convert_into_sequencer_error() {
        let err: SequencerError = ScanError::NoValidImages { path: "in".to_string() }.into();
        assert!(matches!(err, SequencerError::Scan(ScanError::NoValidImages { .. })));

        let err: SequencerError = VideoError::WriterInitFailed { reason: "no codec".to_string() }.into();
        assert!(err.to_string().contains("no codec"));
    }

    #[test]
    fn test_user_message_names_the_path() {
        let err = SequencerError::from(ScanError::InputNotFound { path: "/missing".to_string() });
        assert!(err.user_message().contains("/missing"));
    }
}
