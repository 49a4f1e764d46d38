use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::query::{OrderBy, WhereInput};

/// Page size used when neither the caller nor `data.pagination.limit` sets one.
pub const DEFAULT_LIMIT: NonZeroU64 = match NonZeroU64::new(10) {
    Some(limit) => limit,
    None => panic!("default limit must be non-zero"),
};

/// Raw pagination parameters as they arrive from a query string.
///
/// `page = 0` asks for every matching row. A missing `limit` falls back to
/// the configured default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default, alias = "orderBy")]
    pub order_by: Option<String>,
}

impl PaginationQuery {
    /// Validate with [`DEFAULT_LIMIT`] as the fallback page size.
    pub fn into_request(self, filter: Option<WhereInput>) -> Result<PaginationRequest, DomainError> {
        self.into_request_with(DEFAULT_LIMIT, filter)
    }

    /// Validate and turn into a request the pagination engine accepts.
    ///
    /// `default_limit` is usually [`DataSettings::default_limit`](crate::DataSettings).
    pub fn into_request_with(
        self,
        default_limit: NonZeroU64,
        filter: Option<WhereInput>,
    ) -> Result<PaginationRequest, DomainError> {
        let limit = match self.limit {
            None => default_limit,
            Some(raw) => NonZeroU64::new(raw)
                .ok_or_else(|| DomainError::invalid_argument("limit must be a positive integer"))?,
        };
        let order_by = match self.order_by.as_deref() {
            Some(raw) => OrderBy::parse(raw)?,
            None => OrderBy::default(),
        };
        Ok(PaginationRequest {
            page: self.page,
            limit,
            filter,
            order_by,
        })
    }
}

/// Validated input to [`paginate`](crate::extensions::paginate).
#[derive(Debug, Clone)]
pub struct PaginationRequest {
    pub page: u64,
    pub limit: NonZeroU64,
    pub filter: Option<WhereInput>,
    pub order_by: OrderBy,
}

impl PaginationRequest {
    pub fn new(page: u64, limit: NonZeroU64) -> Self {
        Self {
            page,
            limit,
            filter: None,
            order_by: OrderBy::default(),
        }
    }

    pub fn filter(mut self, filter: WhereInput) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    /// `(skip, take)` for a paginated request, `None` when `page = 0`.
    pub fn window(&self) -> Option<(u64, u64)> {
        if self.page == 0 {
            return None;
        }
        let limit = self.limit.get();
        Some(((self.page - 1).saturating_mul(limit), limit))
    }

    pub fn total_pages(&self, total_count: u64) -> u64 {
        if self.page == 0 {
            u64::from(total_count > 0)
        } else {
            total_count.div_ceil(self.limit.get())
        }
    }
}

/// A page of results with pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub result: Vec<T>,
    pub total_count: u64,
    pub current_page_count: u64,
    pub current_page: u64,
    pub total_page: u64,
}

impl<T> Page<T> {
    pub fn new(result: Vec<T>, request: &PaginationRequest, total_count: u64) -> Self {
        Self {
            current_page_count: result.len() as u64,
            result,
            total_count,
            current_page: request.page.max(1),
            total_page: request.total_pages(total_count),
        }
    }

    pub fn meta(&self) -> PaginationMeta {
        PaginationMeta {
            total_count: self.total_count,
            current_page_count: self.current_page_count,
            current_page: self.current_page,
            total_page: self.total_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            result: self.result.into_iter().map(f).collect(),
            total_count: self.total_count,
            current_page_count: self.current_page_count,
            current_page: self.current_page,
            total_page: self.total_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total_count: u64,
    pub current_page_count: u64,
    pub current_page: u64,
    pub total_page: u64,
}

/// Response envelope: `{ "list": [...], "meta": {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceList<T> {
    pub list: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> From<Page<T>> for ResourceList<T> {
    fn from(page: Page<T>) -> Self {
        let meta = page.meta();
        Self {
            list: page.result,
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn request(page: u64, limit: u64) -> PaginationRequest {
        PaginationRequest::new(page, NonZeroU64::new(limit).unwrap())
    }

    #[test]
    fn window_skips_previous_pages() {
        assert_eq!(request(1, 10).window(), Some((0, 10)));
        assert_eq!(request(3, 10).window(), Some((20, 10)));
        assert_eq!(request(0, 10).window(), None);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(request(1, 10).total_pages(0), 0);
        assert_eq!(request(1, 10).total_pages(10), 1);
        assert_eq!(request(1, 10).total_pages(11), 2);
        assert_eq!(request(0, 10).total_pages(0), 0);
        assert_eq!(request(0, 10).total_pages(57), 1);
    }

    #[test]
    fn unpaginated_page_reports_page_one() {
        let page = Page::new(vec![1, 2, 3], &request(0, 2), 3);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.current_page_count, 3);
        assert_eq!(page.total_page, 1);
    }

    #[test]
    fn page_serializes_camel_case() {
        let page = Page::new(vec!["a"], &request(2, 1), 2);
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            serde_json::json!({
                "result": ["a"],
                "totalCount": 2,
                "currentPageCount": 1,
                "currentPage": 2,
                "totalPage": 2
            })
        );
    }

    #[test]
    fn resource_list_splits_meta() {
        let list = ResourceList::from(Page::new(vec![7], &request(1, 5), 1));
        assert_eq!(list.list, vec![7]);
        assert_eq!(
            serde_json::to_value(list.meta).unwrap()["totalPage"],
            serde_json::json!(1)
        );
    }

    #[test]
    fn query_defaults_and_alias() {
        let q: PaginationQuery =
            serde_json::from_value(serde_json::json!({"page": 2, "orderBy": "name:desc"})).unwrap();
        assert_eq!(q.limit, None);
        let req = q.into_request(None).unwrap();
        assert_eq!(req.page, 2);
        assert_eq!(req.limit.get(), 10);
        assert_eq!(req.order_by.to_string(), "name:desc");
    }

    #[test]
    fn zero_limit_is_invalid() {
        let q = PaginationQuery {
            limit: Some(0),
            ..PaginationQuery::default()
        };
        let err = q.into_request(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn missing_limit_uses_given_default() {
        let fallback = NonZeroU64::new(25).unwrap();
        let req = PaginationQuery::default()
            .into_request_with(fallback, None)
            .unwrap();
        assert_eq!(req.limit.get(), 25);

        let q = PaginationQuery {
            limit: Some(3),
            ..PaginationQuery::default()
        };
        assert_eq!(q.into_request_with(fallback, None).unwrap().limit.get(), 3);
    }

    #[test]
    fn bad_order_by_is_invalid() {
        let q = PaginationQuery {
            order_by: Some("name:sideways".into()),
            ..PaginationQuery::default()
        };
        assert!(q.into_request(None).is_err());
    }
}
