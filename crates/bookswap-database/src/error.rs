//! Mapping of sqlx errors onto [`AppError`] kinds.

use bookswap_core::error::{AppError, ErrorKind};

/// PostgreSQL `undefined_table` SQLSTATE.
const UNDEFINED_TABLE: &str = "42P01";

/// Map a sqlx error into an [`AppError`] with the given context message.
///
/// A missing table becomes [`ErrorKind::FeatureUnavailable`] so callers can
/// degrade instead of failing, and `RowNotFound` becomes `NotFound`.
pub fn db_error(context: &str, err: sqlx::Error) -> AppError {
    let kind = classify(&err);
    AppError::with_source(kind, format!("{context}: {err}"), err)
}

fn classify(err: &sqlx::Error) -> ErrorKind {
    match err {
        sqlx::Error::RowNotFound => ErrorKind::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNDEFINED_TABLE) => {
            ErrorKind::FeatureUnavailable
        }
        sqlx::Error::Database(db) if db.is_unique_violation() => ErrorKind::Conflict,
        sqlx::Error::PoolTimedOut => ErrorKind::Timeout,
        _ => ErrorKind::Database,
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    use super::*;

    #[derive(Debug)]
    struct PgFailure {
        code: &'static str,
        unique: bool,
    }

    impl fmt::Display for PgFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "postgres error {}", self.code)
        }
    }

    impl StdError for PgFailure {}

    impl sqlx::error::DatabaseError for PgFailure {
        fn message(&self) -> &str {
            "postgres error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.unique {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::Other
            }
        }
    }

    fn pg_error(code: &'static str, unique: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgFailure { code, unique }))
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err = db_error(
            "Failed to insert broadcast view",
            pg_error("23505", true),
        );
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_undefined_table_maps_to_feature_unavailable() {
        let err = db_error(
            "Failed to list broadcasts",
            pg_error(UNDEFINED_TABLE, false),
        );
        assert_eq!(err.kind, ErrorKind::FeatureUnavailable);
        assert!(err.is_missing_resource());
    }

    #[test]
    fn test_other_database_errors_are_transient() {
        let err = db_error(
            "Failed to list broadcasts",
            pg_error("08006", false),
        );
        assert_eq!(err.kind, ErrorKind::Database);
        assert!(err.is_transient());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = db_error("Failed to load notification", sqlx::Error::RowNotFound);
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.starts_with("Failed to load notification"));
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err = db_error("Failed to list", sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
    }
}
