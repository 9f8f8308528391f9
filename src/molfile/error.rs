use std::fmt;

use log::warn;
use thiserror::Error;

use super::Mode;

/// Category of a molfile problem, shared by fatal errors and relaxed-mode
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedLineLength,
    InvalidNumericField,
    UnknownElementSymbol,
    UndeclaredSgroupReference,
    InvalidBondStereoTypeCombination,
    UnstableMassDelta,
    UnsupportedVersion,
    UnspecifiedVersion,
    EmptyCountsLine,
    AtomCountMismatch,
    BondCountMismatch,
    AtomIndexOutOfRange,
    UnknownBondType,
    InvalidSgroupValue,
    SgroupCycle,
    HydrogenIsotopeLabel,
    UnexpectedEof,
    ProprietaryProperty,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MalformedLineLength => "malformed line length",
            ErrorKind::InvalidNumericField => "invalid numeric field",
            ErrorKind::UnknownElementSymbol => "unknown element symbol",
            ErrorKind::UndeclaredSgroupReference => "undeclared sgroup reference",
            ErrorKind::InvalidBondStereoTypeCombination => "invalid bond stereo/type combination",
            ErrorKind::UnstableMassDelta => "unstable mass delta",
            ErrorKind::UnsupportedVersion => "unsupported ctab version",
            ErrorKind::UnspecifiedVersion => "unspecified ctab version",
            ErrorKind::EmptyCountsLine => "empty counts line",
            ErrorKind::AtomCountMismatch => "atom count mismatch",
            ErrorKind::BondCountMismatch => "bond count mismatch",
            ErrorKind::AtomIndexOutOfRange => "index out of range",
            ErrorKind::UnknownBondType => "unknown bond type",
            ErrorKind::InvalidSgroupValue => "invalid sgroup value",
            ErrorKind::SgroupCycle => "sgroup cycle",
            ErrorKind::HydrogenIsotopeLabel => "hydrogen isotope label",
            ErrorKind::UnexpectedEof => "unexpected end of input",
            ErrorKind::ProprietaryProperty => "proprietary property",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort decoding of the current record.
#[derive(Debug, Error)]
pub enum MolfileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{kind} at line {line}: {message}")]
    Parse {
        /// 1-based line number within the input stream.
        line: usize,
        kind: ErrorKind,
        message: String,
    },
}

impl MolfileError {
    pub fn parse(line: usize, kind: ErrorKind, message: impl Into<String>) -> Self {
        MolfileError::Parse {
            line,
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            MolfileError::Parse { kind, .. } => Some(*kind),
            MolfileError::Io(_) => None,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            MolfileError::Parse { line, .. } => Some(*line),
            MolfileError::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MolfileError>;

/// A recovered problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}: {}", self.kind, self.line, self.message)
    }
}

/// Applies the strict/relaxed policy and collects diagnostics for one
/// record.
#[derive(Debug)]
pub(crate) struct Reporter {
    mode: Mode,
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub(crate) fn new(mode: Mode) -> Self {
        Self {
            mode,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn mode(&self) -> Mode {
        self.mode
    }

    /// Fatal in strict mode; logged and recorded in relaxed mode.
    pub(crate) fn recoverable(
        &mut self,
        line: usize,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Result<()> {
        let message = message.into();
        match self.mode {
            Mode::Strict => Err(MolfileError::parse(line, kind, message)),
            Mode::Relaxed => {
                self.warn(line, kind, message);
                Ok(())
            }
        }
    }

    /// Logged and recorded in either mode.
    pub(crate) fn warn(&mut self, line: usize, kind: ErrorKind, message: impl Into<String>) {
        let message = message.into();
        warn!("molfile line {line}: {kind}: {message}");
        self.diagnostics.push(Diagnostic {
            line,
            kind,
            message,
        });
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
