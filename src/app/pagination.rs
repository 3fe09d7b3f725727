//! Page/limit normalisation and the pagination envelope.

use serde::Serialize;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

/// Clamped page request: `page >= 1`, `1 <= limit <= MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn with_total(&self, total: i64) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            pages: (total + self.limit - 1) / self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        assert_eq!(PageParams::new(None, None), PageParams { page: 1, limit: 10 });
        assert_eq!(PageParams::new(Some(0), Some(0)), PageParams { page: 1, limit: 1 });
        assert_eq!(PageParams::new(Some(-3), Some(1000)), PageParams { page: 1, limit: 100 });
    }

    #[test]
    fn offset_follows_page() {
        assert_eq!(PageParams::new(Some(1), Some(10)).offset(), 0);
        assert_eq!(PageParams::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn pages_is_ceiling_of_total_over_limit() {
        for limit in 1..=12 {
            for total in 0..=50 {
                let p = PageParams::new(Some(1), Some(limit)).with_total(total);
                assert_eq!(p.pages, (total as f64 / limit as f64).ceil() as i64);
            }
        }
    }
}
