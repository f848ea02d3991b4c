pub mod client;
pub mod error;
pub mod render;
pub mod state;

pub use client::{ArticleClient, DEFAULT_API_URL};
pub use error::FetchError;
pub use render::render;
pub use state::{ViewEvent, ViewState};
