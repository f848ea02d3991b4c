use ae_core::envelope::ListResponse;
use ae_core::{pair_articles, ArticlePair, PairStats};

use crate::FetchError;

/// What the article view is showing.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<ArticlePair>),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Fetch,
    Succeeded(Vec<ArticlePair>),
    Failed(String),
}

impl ViewEvent {
    pub fn from_fetch(result: Result<ListResponse, FetchError>) -> Self {
        match result {
            Ok(body) => Self::Succeeded(pair_articles(&body.data)),
            Err(error) => Self::Failed(error.user_message()),
        }
    }
}

impl ViewState {
    /// A fetch can start from any settled state; while one is in flight
    /// further fetches are ignored. Results only land on a loading view.
    pub fn transition(self, event: ViewEvent) -> Self {
        match (self, event) {
            (_, ViewEvent::Fetch) => Self::Loading,
            (Self::Loading, ViewEvent::Succeeded(pairs)) => Self::Loaded(pairs),
            (Self::Loading, ViewEvent::Failed(message)) => Self::Error(message),
            (state, _) => state,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Loaded with nothing to show, which is not the same as an error.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Loaded(pairs) if pairs.is_empty())
    }

    pub fn pairs(&self) -> Option<&[ArticlePair]> {
        match self {
            Self::Loaded(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn stats(&self) -> PairStats {
        self.pairs().map(PairStats::from_pairs).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_core::{Article, ArticleFields, ArticleId, ArticleType};
    use chrono::Utc;

    fn loaded_pair() -> ArticlePair {
        let fields = ArticleFields {
            title: "Original".to_string(),
            content: "Body".to_string(),
            url: None,
            author: "Unknown".to_string(),
            published_date: None,
            image_url: None,
            kind: ArticleType::Original,
            original_article_id: None,
            references: vec![],
            scraped: true,
        };
        let article = Article::from_fields(ArticleId::new(), fields, Utc::now());
        pair_articles(&[article]).remove(0)
    }

    #[test]
    fn test_fetch_then_success() {
        let state = ViewState::Idle.transition(ViewEvent::Fetch);
        assert!(state.is_loading());

        let state = state.transition(ViewEvent::Succeeded(vec![loaded_pair()]));
        assert_eq!(state.pairs().map(<[ArticlePair]>::len), Some(1));
        assert_eq!(state.stats().original_count, 1);
        assert!(!state.is_empty());
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let state = ViewState::Loading.transition(ViewEvent::Succeeded(vec![]));
        assert!(state.is_empty());
        assert_eq!(state, ViewState::Loaded(vec![]));
    }

    #[test]
    fn test_failure_then_retry() {
        let state = ViewState::Loading.transition(ViewEvent::Failed("boom".to_string()));
        assert_eq!(state, ViewState::Error("boom".to_string()));

        let state = state.transition(ViewEvent::Fetch);
        assert!(state.is_loading());
    }

    #[test]
    fn test_results_only_apply_while_loading() {
        let state = ViewState::Idle.transition(ViewEvent::Succeeded(vec![loaded_pair()]));
        assert_eq!(state, ViewState::Idle);

        let loaded = ViewState::Loaded(vec![]);
        let state = loaded.clone().transition(ViewEvent::Failed("late".to_string()));
        assert_eq!(state, loaded);
    }

    #[test]
    fn test_fetch_while_loading_stays_loading() {
        assert_eq!(
            ViewState::Loading.transition(ViewEvent::Fetch),
            ViewState::Loading
        );
    }
}
