use super::super::storage::StorageError;
use crate::utils::AppError;
use shared::models::OrderStatus;
use thiserror::Error;

/// Order lifecycle errors
///
/// All variants are recoverable at the caller's discretion: the request can
/// be retried with corrected input. None is fatal to the process. Partial
/// failure cannot leave the order and its table disagreeing because every
/// mutation commits in a single transaction.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Order creation with no line items
    #[error("At least one item required")]
    EmptyItems,

    /// Status change not permitted from the current status
    #[error("Cannot transition from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Operation preconditions not met (e.g. settling a non-pending order)
    #[error("{0}")]
    InvalidState(String),

    /// Referenced entity does not exist or belongs to a different tenant.
    /// Tenant-scoping failures surface as not-found rather than leaking
    /// existence.
    #[error("{0}")]
    NotFound(String),

    /// Table already held by a different non-terminal order
    #[error("{0}")]
    TableConflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::EmptyItems => AppError::validation(err.to_string()),
            LifecycleError::InvalidTransition { .. } => AppError::business_rule(err.to_string()),
            LifecycleError::InvalidState(msg) => AppError::business_rule(msg),
            LifecycleError::NotFound(msg) => AppError::not_found(msg),
            LifecycleError::TableConflict(msg) => AppError::conflict(msg),
            LifecycleError::Storage(e) => {
                tracing::error!(error = %e, "Storage error during lifecycle operation");
                AppError::database(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = LifecycleError::InvalidTransition {
            from: OrderStatus::Active,
            to: OrderStatus::Closed,
        };
        assert_eq!(err.to_string(), "Cannot transition from 'active' to 'closed'");
    }

    #[test]
    fn test_empty_items_message() {
        assert_eq!(LifecycleError::EmptyItems.to_string(), "At least one item required");
    }
}
