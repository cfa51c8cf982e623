//! Error types for uber-archive assembly.

use crate::tree::ArtifactRef;
use std::path::PathBuf;

/// Exit code for an unreadable or corrupt input archive.
pub const EXIT_INPUT_ERROR: i32 = 1;
/// Exit code for a missing entry-point, invalid manifest or bad configuration.
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// Exit code for an output that could not be written.
pub const EXIT_WRITE_FAILURE: i32 = 3;

/// Assembly errors.
///
/// Every variant is terminal for the current invocation: the stage that
/// detects it returns immediately and nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// Input artifact could not be opened or read.
    #[error("unreadable artifact {artifact}: {source}")]
    UnreadableArtifact {
        artifact: ArtifactRef,
        #[source]
        source: std::io::Error,
    },

    /// Input artifact is not a well-formed archive.
    #[error("corrupt archive {artifact}: {reason}")]
    CorruptArchive { artifact: ArtifactRef, reason: String },

    /// Manifest declaration has no entry-point.
    #[error("missing entry-point: Main-Class must be set before stamping")]
    MissingEntryPoint,

    /// Manifest declaration contains an attribute that cannot be written.
    #[error("invalid manifest: {reason}")]
    InvalidManifest { reason: String },

    /// Build configuration is incomplete or malformed.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Output archive could not be written.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AssemblyError {
    pub(crate) fn corrupt(artifact: &ArtifactRef, reason: impl Into<String>) -> Self {
        Self::CorruptArchive {
            artifact: artifact.clone(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Bad inputs
            Self::UnreadableArtifact { .. } => EXIT_INPUT_ERROR,
            Self::CorruptArchive { .. } => EXIT_INPUT_ERROR,

            // Missing or invalid configuration
            Self::MissingEntryPoint => EXIT_CONFIG_ERROR,
            Self::InvalidManifest { .. } => EXIT_CONFIG_ERROR,
            Self::Config { .. } => EXIT_CONFIG_ERROR,

            // Environment I/O
            Self::WriteFailure { .. } => EXIT_WRITE_FAILURE,
        }
    }

    /// The artifact this error is attributed to, if any.
    pub fn artifact(&self) -> Option<&ArtifactRef> {
        match self {
            Self::UnreadableArtifact { artifact, .. } | Self::CorruptArchive { artifact, .. } => {
                Some(artifact)
            }
            _ => None,
        }
    }
}

/// Result type for assembly operations.
pub type AssemblyResult<T> = Result<T, AssemblyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_group_by_cause() {
        let artifact = ArtifactRef::new("libs/a.jar");
        let corrupt = AssemblyError::corrupt(&artifact, "bad crc");
        assert_eq!(corrupt.exit_code(), 1);
        assert_eq!(corrupt.artifact(), Some(&artifact));
        assert_eq!(AssemblyError::MissingEntryPoint.exit_code(), 2);

        let write = AssemblyError::WriteFailure {
            path: PathBuf::from("out.jar"),
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(write.exit_code(), 3);
        assert!(write.artifact().is_none());
    }

    #[test]
    fn messages_name_the_offending_artifact() {
        let err = AssemblyError::corrupt(&ArtifactRef::new("libs/broken.jar"), "truncated");
        assert_eq!(
            err.to_string(),
            "corrupt archive libs/broken.jar: truncated"
        );
    }
}
