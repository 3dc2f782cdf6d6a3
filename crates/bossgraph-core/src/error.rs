//! Error types shared by the closure engine, the loaders and the CLI.

use std::fmt;
use std::time::Duration;

/// Which defensive guard on a closure computation was tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    /// Number of frontier expansions.
    Iterations,
    /// Number of distinct `(id, ancestor)` pairs in the closure.
    Pairs,
    /// Wall-clock time spent in the computation, in milliseconds.
    Duration,
}

impl LimitKind {
    /// Stable lowercase name used in logs and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Iterations => "iterations",
            Self::Pairs => "pairs",
            Self::Duration => "duration_ms",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the closure engine and at its input boundary.
///
/// There is no partial-success mode: a computation either yields the
/// complete closure or one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClosureError {
    /// A raw relation row carried a null parent.
    #[error("invalid edge: entity '{id}' has a null parent_id")]
    InvalidEdge { id: String },

    /// A configured iteration/size/time guard was exceeded.
    #[error("closure computation exceeded {limit} limit ({observed} > {bound})")]
    ComputationLimitExceeded {
        limit: LimitKind,
        bound: u64,
        observed: u64,
    },
}

impl ClosureError {
    pub(crate) fn limit(limit: LimitKind, bound: u64, observed: u64) -> Self {
        Self::ComputationLimitExceeded {
            limit,
            bound,
            observed,
        }
    }

    /// The bound is truncated to whole milliseconds and the observed time
    /// rounded up, so a tripped limit always reads `observed > bound`.
    pub(crate) fn duration_limit(bound: Duration, observed: Duration) -> Self {
        let observed_ms = observed.as_nanos().div_ceil(1_000_000);
        Self::limit(
            LimitKind::Duration,
            u64::try_from(bound.as_millis()).unwrap_or(u64::MAX),
            u64::try_from(observed_ms).unwrap_or(u64::MAX),
        )
    }

    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidEdge { .. } => ErrorCode::InvalidEdge,
            Self::ComputationLimitExceeded { .. } => ErrorCode::ComputationLimitExceeded,
        }
    }
}

/// Machine-readable error codes for scripts and agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InputNotFound,
    InputParseError,
    InvalidEdge,
    UnsupportedKey,
    ComputationLimitExceeded,
    StorageError,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InputNotFound => "E2001",
            Self::InputParseError => "E2002",
            Self::InvalidEdge => "E2003",
            Self::UnsupportedKey => "E2004",
            Self::ComputationLimitExceeded => "E3001",
            Self::StorageError => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InputNotFound => "Input file not found",
            Self::InputParseError => "Input parse error",
            Self::InvalidEdge => "Edge with null parent",
            Self::UnsupportedKey => "Unsupported entity id type",
            Self::ComputationLimitExceeded => "Computation limit exceeded",
            Self::StorageError => "Storage error",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .bossgraph/config.toml and retry."),
            Self::InputNotFound => Some("Check the --db/--input/--edges path."),
            Self::InputParseError => {
                Some("Input must be JSON: {\"employees\": [...]} or [{\"id\", \"parent_id\"}].")
            }
            Self::InvalidEdge => Some("Drop rows without a parent before computing the closure."),
            Self::UnsupportedKey => Some("Entity ids must be integers or text."),
            Self::ComputationLimitExceeded => {
                Some("Raise [limits] in the config or pass --max-iterations/--max-pairs.")
            }
            Self::StorageError => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::InputNotFound,
            ErrorCode::InputParseError,
            ErrorCode::InvalidEdge,
            ErrorCode::UnsupportedKey,
            ErrorCode::ComputationLimitExceeded,
            ErrorCode::StorageError,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::ComputationLimitExceeded.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn limit_error_display_names_the_limit() {
        let err = ClosureError::limit(LimitKind::Pairs, 10, 11);
        let s = err.to_string();
        assert!(s.contains("pairs"), "display: {s}");
        assert!(s.contains("11 > 10"), "display: {s}");
        assert_eq!(err.code(), ErrorCode::ComputationLimitExceeded);
    }

    #[test]
    fn invalid_edge_display_names_the_entity() {
        let err = ClosureError::InvalidEdge {
            id: "emp-7".to_string(),
        };
        assert!(err.to_string().contains("emp-7"));
        assert_eq!(err.code(), ErrorCode::InvalidEdge);
    }

    #[test]
    fn duration_limit_reports_milliseconds() {
        let err = ClosureError::duration_limit(Duration::from_millis(5), Duration::from_millis(9));
        assert_eq!(
            err,
            ClosureError::ComputationLimitExceeded {
                limit: LimitKind::Duration,
                bound: 5,
                observed: 9,
            }
        );
    }

    #[test]
    fn sub_millisecond_overrun_still_reads_as_exceeded() {
        let err = ClosureError::duration_limit(Duration::ZERO, Duration::from_micros(300));
        assert_eq!(
            err.to_string(),
            "closure computation exceeded duration_ms limit (1 > 0)"
        );

        let err =
            ClosureError::duration_limit(Duration::from_micros(2500), Duration::from_micros(2600));
        assert!(matches!(
            err,
            ClosureError::ComputationLimitExceeded {
                bound: 2,
                observed: 3,
                ..
            }
        ));
    }
}
