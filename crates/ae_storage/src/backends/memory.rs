use std::sync::Arc;

use ae_core::{Article, ArticleFields, ArticleFilter, ArticleId, ArticleStorage, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::StorageBackend;

#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
}

impl MemoryStore {
    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    fn matching(&self, filter: &ArticleFilter) -> Vec<&Article> {
        let mut matching: Vec<&Article> = self
            .articles
            .iter()
            .filter(|article| filter.matches(article))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        matching
    }

    pub fn find(&self, filter: &ArticleFilter, skip: u64, limit: Option<u64>) -> Vec<Article> {
        let limit = limit.map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        self.matching(filter)
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn count(&self, filter: &ArticleFilter) -> u64 {
        self.articles.iter().filter(|article| filter.matches(article)).count() as u64
    }

    pub fn get(&self, id: &ArticleId) -> Option<Article> {
        self.articles.iter().find(|article| article.id == *id).cloned()
    }

    pub fn insert(&mut self, fields: ArticleFields) -> Article {
        let article = Article::from_fields(ArticleId::new(), fields, Utc::now());
        self.articles.push(article.clone());
        article
    }

    pub fn replace(&mut self, id: &ArticleId, fields: ArticleFields) -> Option<Article> {
        let existing = self.articles.iter_mut().find(|article| article.id == *id)?;
        let mut replaced = Article::from_fields(*id, fields, Utc::now());
        replaced.created_at = existing.created_at;
        *existing = replaced.clone();
        Some(replaced)
    }

    pub fn delete(&mut self, id: &ArticleId) -> bool {
        let before = self.articles.len();
        self.articles.retain(|article| article.id != *id);
        self.articles.len() < before
    }

    pub fn delete_with_dependents(&mut self, id: &ArticleId) -> u64 {
        if self.get(id).is_none() {
            return 0;
        }
        let before = self.articles.len();
        self.articles
            .retain(|article| article.id != *id && article.original_id() != Some(*id));
        (before - self.articles.len()) as u64
    }
}

/// Process-local store. All operations run under one lock, which makes the
/// cascading delete atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from already-stored records, keeping their ids and timestamps.
    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new(articles))),
        }
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn backend_name() -> &'static str {
        "memory"
    }

    async fn connect(_location: Option<&str>) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn find(&self, filter: &ArticleFilter, skip: u64, limit: Option<u64>) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.find(filter, skip, limit))
    }

    async fn count(&self, filter: &ArticleFilter) -> Result<u64> {
        let store = self.store.read().await;
        Ok(store.count(filter))
    }

    async fn get(&self, id: &ArticleId) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.get(id))
    }

    async fn insert(&self, fields: ArticleFields) -> Result<Article> {
        let mut store = self.store.write().await;
        Ok(store.insert(fields))
    }

    async fn replace(&self, id: &ArticleId, fields: ArticleFields) -> Result<Option<Article>> {
        let mut store = self.store.write().await;
        Ok(store.replace(id, fields))
    }

    async fn delete(&self, id: &ArticleId) -> Result<bool> {
        let mut store = self.store.write().await;
        Ok(store.delete(id))
    }

    async fn delete_with_dependents(&self, id: &ArticleId) -> Result<u64> {
        let mut store = self.store.write().await;
        Ok(store.delete_with_dependents(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_core::ArticleType;
    use chrono::Duration;

    fn fields(title: &str, kind: ArticleType, original: Option<ArticleId>) -> ArticleFields {
        ArticleFields {
            title: title.to_string(),
            content: "Test content".to_string(),
            url: None,
            author: "Test Author".to_string(),
            published_date: None,
            image_url: None,
            kind,
            original_article_id: original,
            references: vec![],
            scraped: true,
        }
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = InMemoryStorage::new();
        let article = storage
            .insert(fields("Test Article", ArticleType::Original, None))
            .await
            .unwrap();

        let fetched = storage.get(&article.id).await.unwrap().unwrap();
        assert_eq!(fetched, article);
        assert_eq!(storage.count(&ArticleFilter::all()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_orders_newest_first_with_id_tie_break() {
        let now = Utc::now();
        let mut articles = Vec::new();
        for (i, offset) in [0, 0, 5, 0].into_iter().enumerate() {
            articles.push(Article::from_fields(
                ArticleId::new(),
                fields(&format!("a{}", i), ArticleType::Original, None),
                now + Duration::seconds(offset),
            ));
        }
        let storage = InMemoryStorage::with_articles(articles.clone());

        let found = storage.find(&ArticleFilter::all(), 0, None).await.unwrap();
        assert_eq!(found[0].title, "a2");
        for pair in found[1..].windows(2) {
            assert!(pair[0].id > pair[1].id);
        }

        let page = storage.find(&ArticleFilter::all(), 1, Some(2)).await.unwrap();
        assert_eq!(page, found[1..3].to_vec());
    }

    #[tokio::test]
    async fn test_replace_keeps_created_at() {
        let storage = InMemoryStorage::new();
        let article = storage
            .insert(fields("Before", ArticleType::Original, None))
            .await
            .unwrap();

        let replaced = storage
            .replace(&article.id, fields("After", ArticleType::Original, None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.title, "After");
        assert_eq!(replaced.created_at, article.created_at);
        assert!(replaced.updated_at >= article.updated_at);

        let missing = storage
            .replace(&ArticleId::new(), fields("Nope", ArticleType::Original, None))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_with_dependents() {
        let storage = InMemoryStorage::new();
        let original = storage
            .insert(fields("Original", ArticleType::Original, None))
            .await
            .unwrap();
        let other = storage
            .insert(fields("Other", ArticleType::Original, None))
            .await
            .unwrap();
        for title in ["U1", "U2"] {
            storage
                .insert(fields(title, ArticleType::Updated, Some(original.id)))
                .await
                .unwrap();
        }

        assert_eq!(storage.delete_with_dependents(&ArticleId::new()).await.unwrap(), 0);
        assert_eq!(storage.delete_with_dependents(&original.id).await.unwrap(), 3);

        let remaining = storage.find(&ArticleFilter::all(), 0, None).await.unwrap();
        assert_eq!(remaining, vec![other]);
    }
}
