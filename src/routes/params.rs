use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: u64 = 100;
/// Postgres OFFSET is a signed bigint.
pub const MAX_SKIP: u64 = i64::MAX as u64;

#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Rows to skip, default 0.
    pub skip: Option<u64>,
    /// Page size, default 100, at most 100.
    pub limit: Option<u64>,
}

impl Pagination {
    pub fn new(skip: u64, limit: u64) -> Self {
        Self {
            skip: Some(skip),
            limit: Some(limit),
        }
    }

    /// Returns `(skip, limit)` with defaults applied and both clamped.
    pub fn normalize(&self) -> (u64, u64) {
        let skip = self.skip.unwrap_or(0).min(MAX_SKIP);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (skip, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_hundred() {
        assert_eq!(Pagination::default().normalize(), (0, 100));
    }

    #[test]
    fn clamps_limit() {
        assert_eq!(Pagination::new(5, 0).normalize(), (5, 1));
        assert_eq!(Pagination::new(5, 1000).normalize(), (5, 100));
        assert_eq!(Pagination::new(40, 20).normalize(), (40, 20));
    }

    #[test]
    fn clamps_skip_to_signed_range() {
        assert_eq!(Pagination::new(u64::MAX, 10).normalize(), (MAX_SKIP, 10));
        assert_eq!(Pagination::new(MAX_SKIP, 10).normalize(), (MAX_SKIP, 10));
    }
}
