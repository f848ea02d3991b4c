use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::query::{ArticleFilter, ArticleQuery};
use crate::storage::ArticleStorage;
use crate::types::{
    Article, ArticleDetail, ArticleId, ArticlePage, ArticlePatch, ArticleRef, ArticleSummary,
    ArticleType, NewArticle,
};
use crate::{Error, Result};

/// Article operations exposed to the HTTP layer: validation, reference
/// population and cascading deletes on top of an [`ArticleStorage`].
#[derive(Clone)]
pub struct ArticleRepository {
    storage: Arc<dyn ArticleStorage>,
}

impl ArticleRepository {
    pub fn new(storage: Arc<dyn ArticleStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn ArticleStorage> {
        &self.storage
    }

    pub async fn list(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let mut articles = self
            .storage
            .find(&query.filter, query.skip(), Some(query.limit))
            .await?;
        let total = self.storage.count(&query.filter).await?;

        let mut summaries: HashMap<ArticleId, Option<ArticleSummary>> = HashMap::new();
        for article in &mut articles {
            let Some(ArticleRef::Unresolved(id)) = article.original_article_id else {
                continue;
            };
            if !summaries.contains_key(&id) {
                let summary = self.storage.get(&id).await?.map(|a| a.summary(false));
                summaries.insert(id, summary);
            }
            if let Some(Some(summary)) = summaries.get(&id) {
                article.original_article_id = Some(ArticleRef::Resolved(summary.clone()));
            }
        }

        debug!(
            "📚 Listed {} of {} articles (filter: {:?}, page {})",
            articles.len(),
            total,
            query.filter,
            query.page
        );

        Ok(ArticlePage {
            articles,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    pub async fn get_by_id(&self, id: &str) -> Result<ArticleDetail> {
        let id: ArticleId = id.parse()?;
        let mut article = self
            .storage
            .get(&id)
            .await?
            .ok_or_else(Error::article_not_found)?;

        if let Some(ArticleRef::Unresolved(original_id)) = article.original_article_id {
            if let Some(original) = self.storage.get(&original_id).await? {
                article.original_article_id = Some(ArticleRef::Resolved(original.summary(true)));
            }
        }

        let updated_versions = if article.is_original() {
            self.storage
                .find(&ArticleFilter::dependents_of(id), 0, None)
                .await?
        } else {
            Vec::new()
        };

        Ok(ArticleDetail {
            article,
            updated_versions,
        })
    }

    pub async fn create(&self, new_article: NewArticle) -> Result<Article> {
        let fields = new_article.into_fields()?;

        if let Some(original_id) = fields.original_article_id {
            match self.storage.get(&original_id).await? {
                Some(original) if original.kind == ArticleType::Original => {}
                _ => {
                    return Err(Error::validation(
                        "originalArticleId must reference an existing original article",
                    ))
                }
            }
        }

        let article = self.storage.insert(fields).await?;
        info!("📝 Created {} article {}", article.kind, article.id);
        Ok(article)
    }

    pub async fn update(&self, id: &str, patch: ArticlePatch) -> Result<Article> {
        let id: ArticleId = id.parse()?;
        let existing = self
            .storage
            .get(&id)
            .await?
            .ok_or_else(Error::article_not_found)?;

        let mut fields = existing.fields();
        patch.apply(&mut fields);
        fields.validate()?;

        let article = self
            .storage
            .replace(&id, fields)
            .await?
            .ok_or_else(Error::article_not_found)?;
        info!("✏️ Updated article {}", article.id);
        Ok(article)
    }

    /// Deletes an article. Originals take their updated versions with them.
    /// Returns how many records were removed.
    pub async fn delete(&self, id: &str) -> Result<u64> {
        let id: ArticleId = id.parse()?;
        let existing = self
            .storage
            .get(&id)
            .await?
            .ok_or_else(Error::article_not_found)?;

        let removed = if existing.is_original() {
            self.storage.delete_with_dependents(&id).await?
        } else {
            u64::from(self.storage.delete(&id).await?)
        };

        if removed == 0 {
            return Err(Error::article_not_found());
        }
        info!("🗑️ Deleted article {} ({} records removed)", id, removed);
        Ok(removed)
    }
}
