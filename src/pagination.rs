//! Generic LIMIT/OFFSET pagination over any table.
//!
//! A [`PageScope`] names the table, the timestamp column used for ordering and
//! date filtering, fixed equality filters and an optional search callback.
//! [`fetch_page_with`] runs the count and the page query against the same
//! filtered scope and maps rows through a caller-supplied function.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use uuid::Uuid;

use crate::utils::parse_date;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_PAGE: i64 = 1000;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_SEARCH_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("Invalid {0} format. Use YYYY-MM-DD")]
    InvalidDate(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Raw query-string parameters, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Normalized parameters, ready to be turned into SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    /// Inclusive lower bound, midnight UTC of `start_date`.
    pub start: Option<DateTime<Utc>>,
    /// Exclusive upper bound, midnight UTC of the day after `end_date`.
    pub end_exclusive: Option<DateTime<Utc>>,
}

impl PaginationParams {
    /// Applies defaults and caps and parses the date bounds.
    ///
    /// Fails before any query is built when a date is not `YYYY-MM-DD`.
    pub fn normalize(&self) -> Result<PageRequest, PaginationError> {
        let page = match self.page {
            Some(page) if page > 0 => page.min(MAX_PAGE),
            _ => DEFAULT_PAGE,
        };
        let limit = match self.limit {
            Some(limit) if limit > 0 => limit.min(MAX_LIMIT),
            _ => DEFAULT_LIMIT,
        };

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.chars().take(MAX_SEARCH_LEN).collect::<String>());

        let start = parse_bound(self.start_date.as_deref(), "start_date")?
            .map(|date| date.and_time(NaiveTime::MIN).and_utc());

        // The whole end day is included by moving the bound forward 24 hours.
        let end_exclusive = parse_bound(self.end_date.as_deref(), "end_date")?
            .map(|date| (date.and_time(NaiveTime::MIN) + Duration::days(1)).and_utc());

        Ok(PageRequest {
            page,
            limit,
            search,
            start,
            end_exclusive,
        })
    }
}

fn parse_bound(value: Option<&str>, field: &'static str) -> Result<Option<chrono::NaiveDate>, PaginationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => parse_date(raw).map(Some).ok_or(PaginationError::InvalidDate(field)),
    }
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// One page of results plus counting metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationResult<T> {
    pub results: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub total_results: i64,
}

impl<T> PaginationResult<T> {
    pub fn new(results: Vec<T>, page: i64, limit: i64, total_results: i64) -> Self {
        Self {
            results,
            page,
            limit,
            total_pages: total_pages(total_results, limit),
            total_results,
        }
    }
}

/// `ceil(total / limit)`; zero results means zero pages.
pub fn total_pages(total_results: i64, limit: i64) -> i64 {
    if limit <= 0 || total_results <= 0 {
        return 0;
    }
    (total_results + limit - 1) / limit
}

/// Pushes a search predicate for a non-empty term. The predicate is wrapped in
/// parentheses by the caller.
pub type SearchFn = fn(&mut QueryBuilder<'static, Postgres>, &str);

/// `%term%` for `ILIKE`, with the term's own `%`, `_` and `\` matched literally.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Value bound to a fixed equality filter.
#[derive(Debug, Clone)]
pub enum FilterValue {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
}

/// The query scope a page is drawn from.
#[derive(Debug, Clone)]
pub struct PageScope {
    table: &'static str,
    columns: &'static str,
    date_field: &'static str,
    filters: Vec<(&'static str, FilterValue)>,
    search: Option<SearchFn>,
}

impl PageScope {
    pub fn new(table: &'static str, date_field: &'static str) -> Self {
        Self {
            table,
            columns: "*",
            date_field,
            filters: Vec::new(),
            search: None,
        }
    }

    pub fn columns(mut self, columns: &'static str) -> Self {
        self.columns = columns;
        self
    }

    pub fn filter_eq(mut self, column: &'static str, value: FilterValue) -> Self {
        self.filters.push((column, value));
        self
    }

    pub fn search(mut self, search: SearchFn) -> Self {
        self.search = Some(search);
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'static, Postgres>, request: &PageRequest) {
        query.push(" WHERE 1=1");

        for (column, value) in &self.filters {
            query.push(" AND ").push(*column).push(" = ");
            match value {
                FilterValue::Uuid(v) => query.push_bind(*v),
                FilterValue::Text(v) => query.push_bind(v.clone()),
                FilterValue::Bool(v) => query.push_bind(*v),
            };
        }

        if let (Some(term), Some(search)) = (request.search.as_deref(), self.search) {
            query.push(" AND (");
            search(query, term);
            query.push(")");
        }

        if let Some(start) = request.start {
            query.push(" AND ").push(self.date_field).push(" >= ").push_bind(start);
        }
        if let Some(end) = request.end_exclusive {
            query.push(" AND ").push(self.date_field).push(" < ").push_bind(end);
        }
    }

    /// `SELECT COUNT(*)` over the filtered scope, ignoring limit and offset.
    pub fn count_query(&self, request: &PageRequest) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", self.table));
        self.push_conditions(&mut query, request);
        query
    }

    /// The page itself, most recent first.
    pub fn select_query(&self, request: &PageRequest) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!("SELECT {} FROM {}", self.columns, self.table));
        self.push_conditions(&mut query, request);
        query
            .push(" ORDER BY ")
            .push(self.date_field)
            .push(" DESC, id DESC LIMIT ")
            .push_bind(request.limit)
            .push(" OFFSET ")
            .push_bind(request.offset());
        query
    }
}

/// Fetches one page, mapping each row with `map`.
pub async fn fetch_page_with<T, F>(
    pool: &PgPool,
    scope: &PageScope,
    params: &PaginationParams,
    map: F,
) -> Result<PaginationResult<T>, PaginationError>
where
    F: Fn(&PgRow) -> Result<T, sqlx::Error>,
{
    let request = params.normalize()?;

    let total_results: i64 = {
        let mut count = scope.count_query(&request);
        count.build_query_scalar().fetch_one(pool).await?
    };

    let rows = {
        let mut select = scope.select_query(&request);
        select.build().fetch_all(pool).await?
    };
    let results = rows.iter().map(map).collect::<Result<Vec<T>, _>>()?;

    Ok(PaginationResult::new(results, request.page, request.limit, total_results))
}

/// [`fetch_page_with`] for types that implement `FromRow`.
pub async fn fetch_page<T>(
    pool: &PgPool,
    scope: &PageScope,
    params: &PaginationParams,
) -> Result<PaginationResult<T>, PaginationError>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    fetch_page_with(pool, scope, params, |row| T::from_row(row)).await
}
