pub mod envelope;
pub mod error;
pub mod pairing;
pub mod query;
pub mod repository;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use pairing::{pair_articles, ArticlePair, PairOriginal, PairStats};
pub use query::{ArticleFilter, ArticleQuery, ListParams};
pub use repository::ArticleRepository;
pub use storage::ArticleStorage;
pub use types::{
    Article, ArticleDetail, ArticleFields, ArticleId, ArticlePage, ArticlePatch, ArticleRef,
    ArticleSummary, ArticleType, NewArticle,
};

pub mod prelude {
    pub use crate::{Article, ArticleId, ArticleRepository, ArticleStorage, ArticleType, Error, Result};
}
