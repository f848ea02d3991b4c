use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const DEFAULT_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(Uuid);

impl ArticleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArticleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Ids that do not parse are reported as missing articles, the same way an
/// unknown id is.
impl FromStr for ArticleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::article_not_found())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleType {
    #[default]
    Original,
    Updated,
}

impl ArticleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Updated => "updated",
        }
    }
}

impl fmt::Display for ArticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "original" => Ok(Self::Original),
            "updated" => Ok(Self::Updated),
            other => Err(Error::validation(format!("Invalid article type: {}", other))),
        }
    }
}

/// Shallow projection of an article used when a reference is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub id: ArticleId,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Link from an updated article to its original.
///
/// The store only knows the id; the repository swaps in a summary of the
/// referenced article when it exists. On the wire the two shapes are a bare
/// id string and an object respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleRef {
    Unresolved(ArticleId),
    Resolved(ArticleSummary),
}

impl ArticleRef {
    pub fn id(&self) -> ArticleId {
        match self {
            Self::Unresolved(id) => *id,
            Self::Resolved(summary) => summary.id,
        }
    }

    pub fn summary(&self) -> Option<&ArticleSummary> {
        match self {
            Self::Unresolved(_) => None,
            Self::Resolved(summary) => Some(summary),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ArticleType,
    #[serde(default)]
    pub original_article_id: Option<ArticleRef>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default = "default_scraped")]
    pub scraped: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn from_fields(id: ArticleId, fields: ArticleFields, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title,
            content: fields.content,
            url: fields.url,
            author: fields.author,
            published_date: fields.published_date,
            image_url: fields.image_url,
            kind: fields.kind,
            original_article_id: fields.original_article_id.map(ArticleRef::Unresolved),
            references: fields.references,
            scraped: fields.scraped,
            created_at: now,
            updated_at: now,
        }
    }

    /// The mutable part of the record, with any populated reference reduced
    /// back to its id.
    pub fn fields(&self) -> ArticleFields {
        ArticleFields {
            title: self.title.clone(),
            content: self.content.clone(),
            url: self.url.clone(),
            author: self.author.clone(),
            published_date: self.published_date,
            image_url: self.image_url.clone(),
            kind: self.kind,
            original_article_id: self.original_id(),
            references: self.references.clone(),
            scraped: self.scraped,
        }
    }

    pub fn original_id(&self) -> Option<ArticleId> {
        self.original_article_id.as_ref().map(ArticleRef::id)
    }

    pub fn summary(&self, with_content: bool) -> ArticleSummary {
        ArticleSummary {
            id: self.id,
            title: self.title.clone(),
            url: self.url.clone(),
            content: with_content.then(|| self.content.clone()),
        }
    }

    pub fn is_original(&self) -> bool {
        self.kind == ArticleType::Original
    }
}

/// Everything about an article except the store-managed id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleFields {
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub author: String,
    pub published_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub kind: ArticleType,
    pub original_article_id: Option<ArticleId>,
    pub references: Vec<String>,
    pub scraped: bool,
}

impl ArticleFields {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(Error::validation("Please provide title and content"));
        }
        match (self.kind, self.original_article_id) {
            (ArticleType::Updated, None) => Err(Error::validation(
                "originalArticleId is required for updated articles",
            )),
            (ArticleType::Original, Some(_)) => Err(Error::validation(
                "originalArticleId must be null for original articles",
            )),
            _ => Ok(()),
        }
    }
}

/// Body of a create request. Everything is optional here so that missing
/// required fields surface as validation errors rather than parse errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ArticleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_article_id: Option<ArticleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped: Option<bool>,
}

impl NewArticle {
    pub fn into_fields(self) -> Result<ArticleFields> {
        let (title, content) = match (self.title, self.content) {
            (Some(title), Some(content)) => (title, content),
            _ => return Err(Error::validation("Please provide title and content")),
        };
        let fields = ArticleFields {
            title: title.trim().to_string(),
            content,
            url: self.url.map(|url| url.trim().to_string()),
            author: self
                .author
                .map(|author| author.trim().to_string())
                .unwrap_or_else(default_author),
            published_date: self.published_date,
            image_url: self.image_url,
            kind: self.kind.unwrap_or_default(),
            original_article_id: self.original_article_id,
            references: self.references.unwrap_or_default(),
            scraped: self.scraped.unwrap_or_else(default_scraped),
        };
        fields.validate()?;
        Ok(fields)
    }
}

/// Body of an update request. Nullable fields distinguish "absent" (`None`)
/// from an explicit `null` (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub published_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ArticleType>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub original_article_id: Option<Option<ArticleId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped: Option<bool>,
}

impl ArticlePatch {
    /// Replaces every provided field. The caller re-validates the result.
    pub fn apply(self, fields: &mut ArticleFields) {
        if let Some(title) = self.title {
            fields.title = title.trim().to_string();
        }
        if let Some(content) = self.content {
            fields.content = content;
        }
        if let Some(url) = self.url {
            fields.url = url.map(|url| url.trim().to_string());
        }
        if let Some(author) = self.author {
            fields.author = author.trim().to_string();
        }
        if let Some(published_date) = self.published_date {
            fields.published_date = published_date;
        }
        if let Some(image_url) = self.image_url {
            fields.image_url = image_url;
        }
        if let Some(kind) = self.kind {
            fields.kind = kind;
        }
        if let Some(original_article_id) = self.original_article_id {
            fields.original_article_id = original_article_id;
        }
        if let Some(references) = self.references {
            fields.references = references;
        }
        if let Some(scraped) = self.scraped {
            fields.scraped = scraped;
        }
    }
}

/// A single article as returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    #[serde(default)]
    pub updated_versions: Vec<Article>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl ArticlePage {
    pub fn pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit)
    }
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

fn default_scraped() -> bool {
    true
}

fn nullable<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_article(title: &str, content: &str) -> NewArticle {
        NewArticle {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_article_defaults() {
        let fields = new_article("  Spaced title ", "Body").into_fields().unwrap();
        assert_eq!(fields.title, "Spaced title");
        assert_eq!(fields.author, DEFAULT_AUTHOR);
        assert_eq!(fields.kind, ArticleType::Original);
        assert!(fields.scraped);
        assert!(fields.references.is_empty());
        assert!(fields.original_article_id.is_none());
    }

    #[test]
    fn test_new_article_requires_title_and_content() {
        let missing = NewArticle {
            title: Some("Only a title".to_string()),
            ..Default::default()
        };
        assert!(matches!(missing.into_fields(), Err(Error::Validation(_))));

        let blank = new_article("   ", "Body");
        assert!(matches!(blank.into_fields(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_updated_article_requires_reference() {
        let mut article = new_article("Enhanced", "Better body");
        article.kind = Some(ArticleType::Updated);
        match article.clone().into_fields() {
            Err(Error::Validation(message)) => {
                assert_eq!(message, "originalArticleId is required for updated articles")
            }
            other => panic!("Expected validation error, got {:?}", other),
        }

        article.original_article_id = Some(ArticleId::new());
        assert!(article.into_fields().is_ok());
    }

    #[test]
    fn test_original_article_rejects_reference() {
        let mut article = new_article("Original", "Body");
        article.original_article_id = Some(ArticleId::new());
        assert!(matches!(article.into_fields(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_invalid_id_is_not_found() {
        assert!(matches!("not-an-id".parse::<ArticleId>(), Err(Error::NotFound(_))));
        let id = ArticleId::new();
        assert_eq!(id.to_string().parse::<ArticleId>().unwrap(), id);
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let patch: ArticlePatch = serde_json::from_value(json!({
            "type": "original",
            "originalArticleId": null,
            "title": "Renamed"
        }))
        .unwrap();
        assert_eq!(patch.original_article_id, Some(None));
        assert_eq!(patch.url, None);

        let mut fields = new_article("Old", "Body").into_fields().unwrap();
        fields.kind = ArticleType::Updated;
        fields.original_article_id = Some(ArticleId::new());
        fields.url = Some("https://example.com".to_string());

        patch.apply(&mut fields);
        assert_eq!(fields.title, "Renamed");
        assert_eq!(fields.kind, ArticleType::Original);
        assert!(fields.original_article_id.is_none());
        assert_eq!(fields.url.as_deref(), Some("https://example.com"));
        assert!(fields.validate().is_ok());
    }

    #[test]
    fn test_article_ref_wire_shapes() {
        let id = ArticleId::new();
        let unresolved: ArticleRef = serde_json::from_value(json!(id.to_string())).unwrap();
        assert_eq!(unresolved, ArticleRef::Unresolved(id));

        let resolved: ArticleRef = serde_json::from_value(json!({
            "id": id.to_string(),
            "title": "Source",
            "url": "https://example.com/source"
        }))
        .unwrap();
        assert_eq!(resolved.id(), id);
        assert_eq!(resolved.summary().map(|s| s.title.as_str()), Some("Source"));
    }

    #[test]
    fn test_article_serializes_camel_case() {
        let fields = new_article("Title", "Body").into_fields().unwrap();
        let article = Article::from_fields(ArticleId::new(), fields, Utc::now());
        let value = serde_json::to_value(&article).unwrap();
        assert_eq!(value["type"], "original");
        assert_eq!(value["author"], "Unknown");
        assert!(value["originalArticleId"].is_null());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("imageUrl").is_some());
    }

    #[test]
    fn test_pages_rounds_up() {
        let page = ArticlePage {
            articles: vec![],
            total: 31,
            page: 1,
            limit: 15,
        };
        assert_eq!(page.pages(), 3);
    }
}
