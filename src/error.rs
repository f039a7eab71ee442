use std::path::PathBuf;

use thiserror::Error;

/// Fatal, whole-run failures. Per-file outcomes such as duplicates and
/// conflicts are ordinary values, never errors.
#[derive(Debug, Error)]
pub enum WranglerError {
    #[error(
        "matched only {matched} directory patterns out of {total} files; see {}",
        manifest.display()
    )]
    UnmatchedPaths {
        matched: usize,
        total: usize,
        manifest: PathBuf,
    },
    #[error("failed to compute a standardisation for the full path: {0}")]
    UnresolvedStandardization(String),
    #[error("failed to standardise output subdirectory: {0}")]
    StandardizationFailed(String),
    #[error("standardisation of {dialect} directories is not implemented: {path}")]
    NotImplemented { dialect: &'static str, path: String },
    #[error("{0}")]
    LeftoverFiles(String),
    #[error("only {processed} of {total} input files were processed")]
    ReconciliationMismatch { processed: usize, total: usize },
    #[error("invalid input directory: {0}")]
    InvalidInput(String),
    #[error("invalid directory layout: {0}")]
    InvalidLayout(String),
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WranglerErrorCode {
    Jw001Unmatched,
    Jw002Unresolved,
    Jw003StandardizationFailed,
    Jw004NotImplemented,
    Jw005Leftover,
    Jw006Reconciliation,
    Jw007InvalidInput,
    Jw008InvalidLayout,
    Jw009InvalidConfig,
}

impl WranglerErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jw001Unmatched => "JW001_UNMATCHED",
            Self::Jw002Unresolved => "JW002_UNRESOLVED",
            Self::Jw003StandardizationFailed => "JW003_STANDARDISATION_FAILED",
            Self::Jw004NotImplemented => "JW004_NOT_IMPLEMENTED",
            Self::Jw005Leftover => "JW005_LEFTOVER",
            Self::Jw006Reconciliation => "JW006_RECONCILIATION",
            Self::Jw007InvalidInput => "JW007_INVALID_INPUT",
            Self::Jw008InvalidLayout => "JW008_INVALID_LAYOUT",
            Self::Jw009InvalidConfig => "JW009_INVALID_CONFIG",
        }
    }
}

impl WranglerError {
    pub fn code(&self) -> WranglerErrorCode {
        match self {
            Self::UnmatchedPaths { .. } => WranglerErrorCode::Jw001Unmatched,
            Self::UnresolvedStandardization(_) => WranglerErrorCode::Jw002Unresolved,
            Self::StandardizationFailed(_) => WranglerErrorCode::Jw003StandardizationFailed,
            Self::NotImplemented { .. } => WranglerErrorCode::Jw004NotImplemented,
            Self::LeftoverFiles(_) => WranglerErrorCode::Jw005Leftover,
            Self::ReconciliationMismatch { .. } => WranglerErrorCode::Jw006Reconciliation,
            Self::InvalidInput(_) => WranglerErrorCode::Jw007InvalidInput,
            Self::InvalidLayout(_) => WranglerErrorCode::Jw008InvalidLayout,
            Self::InvalidConfig(_) => WranglerErrorCode::Jw009InvalidConfig,
        }
    }
}

/// Finds the wrangler error code behind an `anyhow` chain, if any.
pub fn code_of(err: &anyhow::Error) -> Option<WranglerErrorCode> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<WranglerError>())
        .map(WranglerError::code)
}
