//! Query-string grammar for list endpoints.
//!
//! `search=<field>:<operator>:<value>` may be repeated, `sort=<field>:<asc|desc>`
//! may be repeated for tie-breaks, `page` and `limit` are positive integers.
//! Tokens that do not fit the grammar are dropped without an error; allow-list
//! checks happen later in [`crate::filtering::conditions`].

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};
use serde::Serialize;
use std::convert::Infallible;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Comparison applied by a single search directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Like,
    Nlike,
    In,
    Nin,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOperator {
    /// Operators valid for free text columns.
    pub const TEXT: &'static [Self] = &[Self::Eq, Self::Like, Self::Nlike];
    /// Operators valid for identifier columns.
    pub const IDENTITY: &'static [Self] = &[Self::Eq, Self::Ne, Self::In, Self::Nin];
    /// Operators valid for timestamps.
    pub const COMPARISON: &'static [Self] = &[Self::Gt, Self::Gte, Self::Lt, Self::Lte];

    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "like" => Self::Like,
            "nlike" => Self::Nlike,
            "in" => Self::In,
            "nin" => Self::Nin,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            _ => return None,
        };
        Some(op)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Like => "like",
            Self::Nlike => "nlike",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One `field:operator:value` filter taken from the query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SearchDirective {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
}

/// One `field:direction` ordering taken from the query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SortDirective {
    pub field: String,
    pub direction: SortDirection,
}

/// Parse a single search token.
///
/// The value is everything after the second colon so timestamps such as
/// `created_at:gt:2024-01-01T10:00:00Z` survive intact. Returns `None` for
/// fewer than three segments, an empty field or an unknown operator.
#[must_use]
pub fn parse_search(raw: &str) -> Option<SearchDirective> {
    let mut parts = raw.splitn(3, ':');
    let field = parts.next()?;
    let operator = parts.next()?;
    let value = parts.next()?;

    if field.is_empty() {
        return None;
    }

    Some(SearchDirective {
        field: field.to_string(),
        operator: FilterOperator::from_token(operator)?,
        value: value.to_string(),
    })
}

/// Parse a single sort token. The direction is matched case-insensitively.
#[must_use]
pub fn parse_sort(raw: &str) -> Option<SortDirective> {
    let (field, direction) = raw.split_once(':')?;
    if field.is_empty() || direction.contains(':') {
        return None;
    }

    let direction = match direction.to_lowercase().as_str() {
        "asc" => SortDirection::Asc,
        "desc" => SortDirection::Desc,
        _ => return None,
    };

    Some(SortDirective {
        field: field.to_string(),
        direction,
    })
}

/// Non-numeric, zero and negative values all resolve to `default`.
fn parse_positive(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|&value| value > 0)
        .unwrap_or(default)
}

/// Everything a list endpoint reads from its query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Vec<SearchDirective>,
    pub sort: Vec<SortDirective>,
    pub page: u64,
    pub limit: u64,
    /// Request path without the query string, used for pagination links.
    pub path: String,
}

impl ListQuery {
    /// Build from a raw (still percent-encoded) query string.
    #[must_use]
    pub fn from_query(path: impl Into<String>, query: Option<&str>) -> Self {
        let mut search = Vec::new();
        let mut sort = Vec::new();
        let mut page = None;
        let mut limit = None;

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "search" => match parse_search(&value) {
                    Some(directive) => search.push(directive),
                    None => tracing::debug!(token = %value, "Dropping malformed search token"),
                },
                "sort" => match parse_sort(&value) {
                    Some(directive) => sort.push(directive),
                    None => tracing::debug!(token = %value, "Dropping malformed sort token"),
                },
                "page" => page = Some(value.into_owned()),
                "limit" => limit = Some(value.into_owned()),
                _ => {}
            }
        }

        Self {
            search,
            sort,
            page: parse_positive(page.as_deref(), DEFAULT_PAGE),
            limit: parse_positive(limit.as_deref(), DEFAULT_LIMIT).min(MAX_LIMIT),
            path: path.into(),
        }
    }
}

/// Documented form of the list query string. Handlers extract [`ListQuery`].
#[derive(Debug, IntoParams)]
#[into_params(parameter_in = Query)]
#[allow(dead_code)]
pub struct ListParams {
    /// Repeatable `field:operator:value`, e.g. `title:like:rust`
    search: Option<Vec<String>>,
    /// Repeatable `field:asc` or `field:desc`, applied in order
    sort: Option<Vec<String>>,
    /// 1-based page number, default 1
    page: Option<u64>,
    /// Page size, default 10, at most 100
    limit: Option<u64>,
}

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped URI; links must point at the public path.
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path().to_string(), |uri| uri.path().to_string());
        Ok(Self::from_query(path, parts.uri.query()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_list_query() {
        let query = ListQuery::from_query(
            "/api/posts",
            Some("search=title:like:hello&sort=created_at:desc&page=2&limit=5"),
        );
        assert_eq!(
            query.search,
            vec![SearchDirective {
                field: "title".to_string(),
                operator: FilterOperator::Like,
                value: "hello".to_string(),
            }]
        );
        assert_eq!(
            query.sort,
            vec![SortDirective {
                field: "created_at".to_string(),
                direction: SortDirection::Desc,
            }]
        );
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 5);
        assert_eq!(query.path, "/api/posts");
    }

    #[test]
    fn test_two_segment_search_is_dropped() {
        let query = ListQuery::from_query("/api/posts", Some("search=title:hello"));
        assert!(query.search.is_empty());
    }

    #[test]
    fn test_unknown_operator_is_dropped() {
        assert!(parse_search("title:contains:hello").is_none());
        assert!(parse_search("title:LIKE:hello").is_none());
        assert!(parse_search(":eq:hello").is_none());
    }

    #[test]
    fn test_search_value_keeps_colons() {
        let directive = parse_search("created_at:gt:2024-01-01T10:00:00Z").unwrap();
        assert_eq!(directive.operator, FilterOperator::Gt);
        assert_eq!(directive.value, "2024-01-01T10:00:00Z");
    }

    #[test]
    fn test_search_value_may_be_empty() {
        let directive = parse_search("title:eq:").unwrap();
        assert_eq!(directive.value, "");
    }

    #[test]
    fn test_sort_direction_case_insensitive() {
        assert_eq!(parse_sort("title:ASC").unwrap().direction, SortDirection::Asc);
        assert_eq!(parse_sort("title:Desc").unwrap().direction, SortDirection::Desc);
    }

    #[test]
    fn test_malformed_sort_is_dropped() {
        assert!(parse_sort("title").is_none());
        assert!(parse_sort("title:up").is_none());
        assert!(parse_sort("title:asc:extra").is_none());
        assert!(parse_sort(":asc").is_none());
    }

    #[test]
    fn test_repeated_params_are_collected_in_order() {
        let query = ListQuery::from_query(
            "/api/users",
            Some("search=username:like:al&search=email:eq:a%40b.c&sort=username:asc&sort=created_at:desc"),
        );
        assert_eq!(query.search.len(), 2);
        assert_eq!(query.search[1].value, "a@b.c");
        assert_eq!(query.sort[0].field, "username");
        assert_eq!(query.sort[1].field, "created_at");
    }

    #[test]
    fn test_pagination_defaults() {
        let query = ListQuery::from_query("/", None);
        assert_eq!((query.page, query.limit), (DEFAULT_PAGE, DEFAULT_LIMIT));

        let query = ListQuery::from_query("/", Some("page=abc&limit=-4"));
        assert_eq!((query.page, query.limit), (1, 10));

        let query = ListQuery::from_query("/", Some("page=0&limit=0"));
        assert_eq!((query.page, query.limit), (1, 10));
    }

    #[test]
    fn test_limit_is_capped() {
        let query = ListQuery::from_query("/", Some("limit=5000"));
        assert_eq!(query.limit, MAX_LIMIT);
    }
}
