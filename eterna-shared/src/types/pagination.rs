use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 50 }

const MAX_PER_PAGE: u64 = 100;

impl PaginationParams {
    /// Row offset, capped so it always fits a SQL `BIGINT`.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1)
            .saturating_mul(self.limit())
            .min(i64::MAX as u64)
    }

    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: default_page(), per_page: default_per_page() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        let per_page = params.limit();
        Self {
            items,
            total,
            page: params.page.max(1),
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_fifty() {
        let params = PaginationParams::default();
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 50);
    }

    #[test]
    fn page_zero_is_treated_as_first() {
        let params = PaginationParams { page: 0, per_page: 10 };
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn per_page_is_clamped() {
        let params = PaginationParams { page: 3, per_page: 500 };
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 200);

        let params = PaginationParams { page: 1, per_page: 0 };
        assert_eq!(params.limit(), 1);
    }

    #[test]
    fn huge_page_offset_stays_in_bigint_range() {
        let params = PaginationParams { page: u64::MAX, per_page: 50 };
        assert_eq!(params.offset(), i64::MAX as u64);
        assert!(i64::try_from(params.offset()).is_ok());
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PaginationParams { page: 1, per_page: 20 };
        let page = Paginated::new(vec![1, 2, 3], 41, &params);
        assert_eq!(page.total_pages, 3);

        let empty: Paginated<i32> = Paginated::new(vec![], 0, &params);
        assert_eq!(empty.total_pages, 0);
    }
}
