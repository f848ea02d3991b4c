//! Plain-text rendering of the article view.

use std::fmt::{self, Write};

use ae_core::{Article, ArticlePair, PairOriginal, PairStats};
use chrono::{DateTime, Utc};

use crate::state::ViewState;

const PREVIEW_CHARS: usize = 200;
const MAX_REFERENCES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Original,
    Enhanced,
}

impl CardKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Original => "📄 ORIGINAL",
            Self::Enhanced => "✨ ENHANCED",
        }
    }
}

pub fn render(state: &ViewState) -> String {
    match state {
        ViewState::Idle => String::new(),
        ViewState::Loading => "⏳ Loading articles...\n".to_string(),
        ViewState::Error(message) => collect(|out| write_error(out, message)),
        ViewState::Loaded(pairs) if pairs.is_empty() => collect(write_empty),
        ViewState::Loaded(pairs) => collect(|out| write_pairs(out, pairs)),
    }
}

pub fn render_card(article: &Article, kind: CardKind) -> String {
    collect(|out| write_card(out, article, kind))
}

fn collect(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write(&mut out);
    out
}

fn write_error(out: &mut String, message: &str) -> fmt::Result {
    writeln!(out, "❌ Error")?;
    writeln!(out, "{}", message)?;
    writeln!(out)?;
    writeln!(out, "💡 Common fixes:")?;
    writeln!(out, "  • Make sure the backend is running (ae serve)")?;
    writeln!(out, "  • Check: http://localhost:5000/api/articles")
}

fn write_empty(out: &mut String) -> fmt::Result {
    writeln!(out, "📭 No Articles Found")?;
    writeln!(out, "Store some articles through POST /api/articles first.")
}

fn write_pairs(out: &mut String, pairs: &[ArticlePair]) -> fmt::Result {
    let stats = PairStats::from_pairs(pairs);
    writeln!(out, "📚 Original Articles vs AI-Enhanced Versions")?;
    writeln!(
        out,
        "Total Articles: {} | Original: {} | Enhanced: {}",
        stats.total_count, stats.original_count, stats.enhanced_count
    )?;

    for (index, pair) in pairs.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "===== Article Pair {} =====", index + 1)?;

        match pair.original.as_ref() {
            Some(original) => match original.as_article() {
                Some(article) => write_card(out, article, CardKind::Original)?,
                None => write_reference(out, Some(original))?,
            },
            None => write_reference(out, None)?,
        }

        match pair.enhanced.as_ref() {
            Some(article) => write_card(out, article, CardKind::Enhanced)?,
            None => writeln!(out, "--- ⏳ No Enhanced Version Yet ---")?,
        }
    }
    Ok(())
}

/// Placeholder for an original known only by reference, or not at all.
fn write_reference(out: &mut String, original: Option<&PairOriginal>) -> fmt::Result {
    writeln!(out, "--- 📄 Original Article ---")?;
    if let Some(original) = original {
        if !original.title().is_empty() {
            writeln!(out, "{}", original.title())?;
        }
        if let Some(url) = original.url() {
            writeln!(out, "View Original Source → {}", url)?;
        }
    }
    writeln!(out, "Full content not available")
}

fn write_card(out: &mut String, article: &Article, kind: CardKind) -> fmt::Result {
    writeln!(out, "--- {} · {} ---", kind.label(), format_date(&article.created_at))?;
    writeln!(out, "{}", article.title)?;
    if !article.author.is_empty() {
        writeln!(out, "👤 {}", article.author)?;
    }
    writeln!(out, "{}", truncate(&article.content, PREVIEW_CHARS))?;
    writeln!(
        out,
        "📝 {} words · {}",
        word_count(&article.content),
        article.kind.as_str().to_uppercase()
    )?;

    if !article.references.is_empty() {
        writeln!(out, "📚 References:")?;
        for (index, reference) in article.references.iter().take(MAX_REFERENCES).enumerate() {
            writeln!(out, "  {}. {}", index + 1, reference)?;
        }
    }
    Ok(())
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.is_empty() {
        return "No content available".to_string();
    }
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Counts space-separated chunks, the way the card has always counted.
pub fn word_count(text: &str) -> usize {
    text.split(' ').count()
}
