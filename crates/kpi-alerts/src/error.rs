//! Error types for the kpi-alerts crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a check run.
///
/// Ledgers are never written once one of these has been returned.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Notification delivery failed.
    #[error("notification failed: {reason}")]
    NotificationFailed {
        /// The reason the notification failed.
        reason: String,
    },

    /// Another writer holds the ledger lock.
    #[error("ledger is locked: {}", path.display())]
    LedgerLocked {
        /// The lock file that already exists.
        path: PathBuf,
    },

    /// Filesystem error while writing a ledger.
    #[error("ledger io error: {0}")]
    Ledger(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Dataset or grid error.
    #[error(transparent)]
    Grid(#[from] kpi_grid::GridError),
}

impl From<serde_json::Error> for AlertError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Result type for alert operations.
pub type Result<T> = std::result::Result<T, AlertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_notification_failed() {
        let err = AlertError::NotificationFailed {
            reason: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "notification failed: connection refused");
    }

    #[test]
    fn error_display_ledger_locked() {
        let err = AlertError::LedgerLocked {
            path: PathBuf::from("state/ledger.json.lock"),
        };
        assert_eq!(err.to_string(), "ledger is locked: state/ledger.json.lock");
    }

    #[test]
    fn error_from_grid_is_transparent() {
        let err: AlertError = kpi_grid::GridError::MalformedDataset {
            reason: "missing 'sheets' mapping".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "malformed dataset: missing 'sheets' mapping");
    }

    #[test]
    fn error_from_serde_json() {
        let json_err = serde_json::from_str::<String>("invalid json");
        assert!(json_err.is_err());
        let alert_err: AlertError = json_err.unwrap_err().into();
        assert!(matches!(alert_err, AlertError::SerializationError(_)));
    }
}
