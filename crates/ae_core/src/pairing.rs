use serde::Serialize;

use crate::types::{Article, ArticleId, ArticleSummary, ArticleType};

/// Left-hand side of a pair: a full article, or only the populated
/// reference an updated article carried.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PairOriginal {
    Article(Article),
    Reference(ArticleSummary),
}

impl PairOriginal {
    pub fn id(&self) -> ArticleId {
        match self {
            Self::Article(article) => article.id,
            Self::Reference(summary) => summary.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Article(article) => &article.title,
            Self::Reference(summary) => &summary.title,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Article(article) => article.url.as_deref(),
            Self::Reference(summary) => summary.url.as_deref(),
        }
    }

    /// The full article when there is enough content to show it.
    pub fn as_article(&self) -> Option<&Article> {
        match self {
            Self::Article(article) if !article.content.is_empty() => Some(article),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticlePair {
    pub original: Option<PairOriginal>,
    pub enhanced: Option<Article>,
}

/// Groups a flat, mixed list into display pairs.
///
/// With at least one original present, every original yields one pair and
/// picks up the first updated article that references it; further updated
/// versions of the same original are not surfaced. Without originals, each
/// updated article yields a pair whose left side is its populated reference.
pub fn pair_articles(articles: &[Article]) -> Vec<ArticlePair> {
    let (originals, updated): (Vec<&Article>, Vec<&Article>) = articles
        .iter()
        .partition(|article| article.kind == ArticleType::Original);

    if !originals.is_empty() {
        return originals
            .into_iter()
            .map(|original| ArticlePair {
                original: Some(PairOriginal::Article(original.clone())),
                enhanced: updated
                    .iter()
                    .find(|candidate| candidate.original_id() == Some(original.id))
                    .map(|enhanced| (*enhanced).clone()),
            })
            .collect();
    }

    updated
        .into_iter()
        .map(|enhanced| ArticlePair {
            original: enhanced
                .original_article_id
                .as_ref()
                .and_then(|reference| reference.summary())
                .cloned()
                .map(PairOriginal::Reference),
            enhanced: Some(enhanced.clone()),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairStats {
    pub total_count: usize,
    pub original_count: usize,
    pub enhanced_count: usize,
}

impl PairStats {
    pub fn from_pairs(pairs: &[ArticlePair]) -> Self {
        let original_count = pairs.len();
        let enhanced_count = pairs.iter().filter(|pair| pair.enhanced.is_some()).count();
        Self {
            total_count: original_count + enhanced_count,
            original_count,
            enhanced_count,
        }
    }
}
