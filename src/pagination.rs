//! Paging for every collection endpoint.
//!
//! Each listing runs the same dance: validate `page`/`limit`, count the
//! rows matching the filter, derive the page bounds, then either fetch the
//! bounded slice or short-circuit with an empty page. The count and fetch
//! queries stay with the callers; this module owns the math and the two
//! documented edge cases:
//!
//! * an empty collection answers `currentPage = 1, totalPages = 0`;
//! * a page past the end answers the last page number with an empty item
//!   list, which is not an error.

use diesel::QueryResult;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated paging input. Both values are required and at least 1.
#[derive(Clone, Copy)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    pub fn from_query(query: &PageQuery) -> Result<PageParams, ApiError> {
        match (query.page, query.limit) {
            (Some(page), Some(limit)) if page >= 1 && limit >= 1 => {
                Ok(PageParams { page, limit })
            }
            _ => Err(ApiError::invalid("Page and limit must be positive numbers")),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

impl<T> Page<T> {
    fn empty(current_page: i64, total_pages: i64, total_items: i64) -> Page<T> {
        Page {
            items: Vec::new(),
            current_page,
            total_pages,
            total_items,
        }
    }
}

// Callers guarantee total_items >= 1, so this ceiling form cannot
// overflow even for a limit of i64::MAX.
fn total_pages(total_items: i64, limit: i64) -> i64 {
    (total_items - 1) / limit + 1
}

/// Runs `count` under the same filter predicate as `fetch`, then fetches
/// the bounded slice unless the page falls outside the collection.
/// `fetch` receives `(limit, offset)` and must order by a stable key with
/// an id tie-break so repeated calls see the same slicing.
pub fn paginate<T, C, F>(params: PageParams, count: C, fetch: F) -> Result<Page<T>, ApiError>
where
    C: FnOnce() -> QueryResult<i64>,
    F: FnOnce(i64, i64) -> QueryResult<Vec<T>>,
{
    let total_items = count()?;

    if total_items == 0 {
        return Ok(Page::empty(1, 0, 0));
    }

    let total_pages = total_pages(total_items, params.limit);

    if params.page > total_pages {
        return Ok(Page::empty(total_pages, total_pages, total_items));
    }

    let items = fetch(params.limit, params.offset())?;

    Ok(Page {
        items,
        current_page: params.page,
        total_pages,
        total_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: i64, limit: i64) -> PageParams {
        PageParams { page, limit }
    }

    /// Backs count/fetch with an in-memory collection so the engine's
    /// slicing can be checked without a database.
    fn paged(total: i64, page: i64, limit: i64) -> Page<i64> {
        paginate(
            params(page, limit),
            || Ok(total),
            |limit, offset| {
                let items: Vec<i64> = (0..total).skip(offset as usize).take(limit as usize).collect();
                Ok(items)
            },
        )
        .unwrap()
    }

    #[test]
    fn rejects_missing_and_non_positive_params() {
        let cases = vec![
            (None, None),
            (Some(1), None),
            (None, Some(10)),
            (Some(0), Some(10)),
            (Some(1), Some(0)),
            (Some(-3), Some(10)),
        ];

        for (page, limit) in cases {
            let query = PageQuery { page, limit };
            assert!(PageParams::from_query(&query).is_err());
        }
    }

    #[test]
    fn accepts_positive_params() {
        let query = PageQuery {
            page: Some(1),
            limit: Some(10),
        };
        let p = PageParams::from_query(&query).unwrap();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 10);
    }

    #[test]
    fn empty_collection_answers_page_one_of_zero() {
        let page = paged(0, 3, 10);
        assert_eq!(page, Page::empty(1, 0, 0));
    }

    #[test]
    fn first_page_of_twenty_five_items() {
        let page = paged(25, 1, 10);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 25);
    }

    #[test]
    fn last_partial_page() {
        let page = paged(25, 3, 10);
        assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        assert_eq!(page.current_page, 3);
    }

    #[test]
    fn past_the_end_answers_last_page_without_error() {
        let page = paged(25, 7, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.current_page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 25);
    }

    #[test]
    fn exact_fill_has_no_phantom_page() {
        let page = paged(30, 3, 10);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_pages, 3);

        let past = paged(30, 4, 10);
        assert!(past.items.is_empty());
        assert_eq!(past.current_page, 3);
    }

    #[test]
    fn huge_limit_is_a_single_page() {
        let page = paged(25, 1, i64::MAX);
        assert_eq!(page.items.len(), 25);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn offset_math() {
        assert_eq!(params(1, 10).offset(), 0);
        assert_eq!(params(3, 10).offset(), 20);
        assert_eq!(params(2, 7).offset(), 7);
    }

    #[test]
    fn count_failure_propagates() {
        let result: Result<Page<i64>, ApiError> = paginate(
            params(1, 10),
            || Err(diesel::result::Error::NotFound),
            |_, _| Ok(Vec::new()),
        );
        assert!(result.is_err());
    }
}
