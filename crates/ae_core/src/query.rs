use serde::{Deserialize, Serialize};

use crate::types::{Article, ArticleId, ArticleType};
use crate::Result;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 15;

/// Raw list parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_all: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub kind: Option<ArticleType>,
    pub original_article_id: Option<ArticleId>,
}

impl ArticleFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of_type(kind: ArticleType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Updated articles pointing at `id`.
    pub fn dependents_of(id: ArticleId) -> Self {
        Self {
            kind: None,
            original_article_id: Some(id),
        }
    }

    pub fn matches(&self, article: &Article) -> bool {
        if let Some(kind) = self.kind {
            if article.kind != kind {
                return false;
            }
        }
        if let Some(id) = self.original_article_id {
            if article.original_id() != Some(id) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleQuery {
    pub filter: ArticleFilter,
    pub page: u64,
    pub limit: u64,
}

impl ArticleQuery {
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            filter: ArticleFilter::of_type(ArticleType::Original),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListParams {
    pub fn include_all() -> Self {
        Self {
            include_all: Some("true".to_string()),
            ..Self::default()
        }
    }

    /// An explicit `type` always wins. Without one, only the literal
    /// `includeAll=true` lifts the default restriction to originals.
    pub fn build(&self) -> Result<ArticleQuery> {
        let kind = match self.kind.as_deref().map(str::trim) {
            Some(kind) if !kind.is_empty() => Some(kind.parse::<ArticleType>()?),
            _ if self.include_all.as_deref() == Some("true") => None,
            _ => Some(ArticleType::Original),
        };

        Ok(ArticleQuery {
            filter: ArticleFilter {
                kind,
                original_article_id: None,
            },
            page: positive_or(self.page.as_deref(), DEFAULT_PAGE),
            limit: positive_or(self.limit.as_deref(), DEFAULT_LIMIT),
        })
    }
}

/// Non-numeric input falls back to `default`; anything below 1 becomes 1.
fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    match raw.and_then(|raw| raw.trim().parse::<i64>().ok()) {
        Some(value) if value >= 1 => value as u64,
        Some(_) => 1,
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn params(kind: Option<&str>, include_all: Option<&str>) -> ListParams {
        ListParams {
            kind: kind.map(str::to_string),
            include_all: include_all.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_type_wins_over_include_all() {
        for include_all in [None, Some("true"), Some("false"), Some("yes")] {
            let query = params(Some("updated"), include_all).build().unwrap();
            assert_eq!(query.filter.kind, Some(ArticleType::Updated));

            let query = params(Some("original"), include_all).build().unwrap();
            assert_eq!(query.filter.kind, Some(ArticleType::Original));
        }
    }

    #[test]
    fn test_include_all_lifts_type_filter() {
        let query = params(None, Some("true")).build().unwrap();
        assert_eq!(query.filter, ArticleFilter::all());
    }

    #[test]
    fn test_defaults_to_originals() {
        for include_all in [None, Some("false"), Some("TRUE"), Some("1"), Some("")] {
            let query = params(None, include_all).build().unwrap();
            assert_eq!(query.filter.kind, Some(ArticleType::Original));
        }
        let query = params(Some(""), None).build().unwrap();
        assert_eq!(query.filter.kind, Some(ArticleType::Original));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(matches!(
            params(Some("draft"), None).build(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_pagination() {
        let query = ListParams {
            page: Some("2".to_string()),
            limit: Some("10".to_string()),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!(query.skip(), 10);
        assert_eq!(query.limit, 10);

        let defaults = ListParams::default().build().unwrap();
        assert_eq!(defaults, ArticleQuery::default());
        assert_eq!(defaults.skip(), 0);
    }

    #[test]
    fn test_pagination_clamps_and_defaults() {
        let query = ListParams {
            page: Some("-4".to_string()),
            limit: Some("0".to_string()),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!((query.page, query.limit, query.skip()), (1, 1, 0));

        let query = ListParams {
            page: Some("abc".to_string()),
            limit: Some("ten".to_string()),
            ..Default::default()
        }
        .build()
        .unwrap();
        assert_eq!((query.page, query.limit), (DEFAULT_PAGE, DEFAULT_LIMIT));
    }

    #[test]
    fn test_build_is_deterministic() {
        let a: ListParams =
            serde_json::from_str(r#"{"limit":"5","page":"3","includeAll":"true"}"#).unwrap();
        let b: ListParams =
            serde_json::from_str(r#"{"includeAll":"true","page":"3","limit":"5"}"#).unwrap();
        assert_eq!(a.build().unwrap(), b.build().unwrap());
        assert_eq!(a.build().unwrap(), a.build().unwrap());
    }
}
