use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters shared by every list endpoint: `?page=2&pageSize=25`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        self.page_size() as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * self.limit()
    }
}

/// List response envelope: `{count, page, page_size, results}`.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn from_params(count: i64, params: &PageParams, results: Vec<T>) -> Self {
        Self {
            count,
            page: params.page(),
            page_size: params.page_size(),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_absent() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn page_size_is_clamped_to_bounds() {
        let too_big = PageParams {
            page: None,
            page_size: Some(10_000),
        };
        assert_eq!(too_big.page_size(), MAX_PAGE_SIZE);

        let zero = PageParams {
            page: Some(0),
            page_size: Some(0),
        };
        assert_eq!(zero.page(), 1);
        assert_eq!(zero.page_size(), 1);
    }

    #[test]
    fn offset_follows_page_number() {
        let params = PageParams {
            page: Some(3),
            page_size: Some(25),
        };
        assert_eq!(params.limit(), 25);
        assert_eq!(params.offset(), 50);
    }
}
