use async_trait::async_trait;

use crate::query::ArticleFilter;
use crate::types::{Article, ArticleFields, ArticleId};
use crate::Result;

/// Persistence boundary for articles.
///
/// Backends assign ids and timestamps. References come back unresolved;
/// populating them is the repository's job.
#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Articles matching `filter`, newest first with ties broken by id
    /// (descending), after skipping `skip` and returning at most `limit`.
    async fn find(&self, filter: &ArticleFilter, skip: u64, limit: Option<u64>) -> Result<Vec<Article>>;

    async fn count(&self, filter: &ArticleFilter) -> Result<u64>;

    async fn get(&self, id: &ArticleId) -> Result<Option<Article>>;

    async fn insert(&self, fields: ArticleFields) -> Result<Article>;

    /// Overwrites the stored fields and bumps `updated_at`.
    async fn replace(&self, id: &ArticleId, fields: ArticleFields) -> Result<Option<Article>>;

    async fn delete(&self, id: &ArticleId) -> Result<bool>;

    /// Removes the article and every article referencing it as one atomic
    /// operation. Returns the number of records removed, 0 when `id` is absent.
    async fn delete_with_dependents(&self, id: &ArticleId) -> Result<u64>;
}
