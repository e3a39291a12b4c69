// Dataset construction and harness error types

use crate::error::FormatError;
use std::fmt;

/// Errors raised during dataset construction, splitting and training
#[derive(Debug)]
pub enum PipelineError {
    /// Normalization attempted over a corpus with zero values
    EmptyCorpus,

    /// Channel views of one recording yield chunk counts that cannot be
    /// reconciled (one channel produced zero chunks while another did not)
    ChannelMismatch {
        recording: String,
        counts: Vec<usize>,
    },

    /// Invalid channel count, pipeline selector or fold parameters
    Configuration { reason: String },

    /// Audio input failure, carried when a caller needs the cause
    Format(FormatError),

    /// Artifact store or checkpoint I/O failure
    Artifact {
        context: String,
        source: std::io::Error,
    },

    /// Manifest, fold plan or checkpoint (de)serialization failure
    Serialization {
        context: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::EmptyCorpus => {
                write!(f, "corpus is empty: normalization statistics are undefined")
            }
            PipelineError::ChannelMismatch { recording, counts } => {
                write!(
                    f,
                    "channel chunk counts diverge for recording {}: {:?}",
                    recording, counts
                )
            }
            PipelineError::Configuration { reason } => {
                write!(f, "invalid configuration: {}", reason)
            }
            PipelineError::Format(err) => write!(f, "audio format error: {}", err),
            PipelineError::Artifact { context, source } => {
                write!(f, "artifact I/O failed while {}: {}", context, source)
            }
            PipelineError::Serialization { context, source } => {
                write!(f, "serialization failed while {}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Format(err) => Some(err),
            PipelineError::Artifact { source, .. } => Some(source),
            PipelineError::Serialization { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FormatError> for PipelineError {
    fn from(err: FormatError) -> Self {
        PipelineError::Format(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::EmptyCorpus;
        assert!(format!("{}", err).contains("empty"));

        let err = PipelineError::ChannelMismatch {
            recording: "blues.00042".to_string(),
            counts: vec![9, 0],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("blues.00042"));
        assert!(msg.contains("[9, 0]"));
    }

    #[test]
    fn test_from_format_error() {
        let format_err = FormatError::ChannelLayoutMismatch { channels: 2 };
        let err: PipelineError = format_err.clone().into();
        match err {
            PipelineError::Format(inner) => assert_eq!(inner, format_err),
            other => panic!("Expected Format variant, got {:?}", other),
        }
    }
}
