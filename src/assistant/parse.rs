use regex::Regex;
use std::sync::OnceLock;

use crate::models::{BookSearchResult, BookSuggestion};

pub(crate) const MAX_TITLE_COMPLETIONS: usize = 5;
pub(crate) const MAX_SUGGESTIONS: usize = 3;
pub(crate) const MAX_COVER_CANDIDATES: usize = 6;
pub(crate) const MAX_SEARCH_RESULTS: usize = 5;

/// Fixed covers handed out when lookup yields nothing, so callers never
/// have to special-case an empty candidate set. The images may not match
/// the requested book.
const FALLBACK_COVER_URLS: [&str; 6] = [
    "https://images-na.ssl-images-amazon.com/images/P/B08FHQQ4QX.01._SX500_.jpg",
    "https://images.livrariasaraiva.com.br/imagemnet/imagem.aspx/?pro_id=9788542212464&qld=90&l=430&a=-1",
    "https://statics.livrariacultura.net.br/products/capas_lg/832/9788542212464.jpg",
    "https://images-americanas.b2w.io/produtos/01/00/img/832640/6/832640626_1GG.jpg",
    "https://static.fnac-static.com/multimedia/Images/BR/NR/46/24/21/2171974/1540-1/tsp20210624115427/Mais-esperto-que-o-diabo.jpg",
    "https://d1pkzhm5uq4mnt.cloudfront.net/imagens/capas/9788542212464.jpg",
];

pub(crate) fn fallback_cover_urls() -> Vec<String> {
    FALLBACK_COVER_URLS.iter().map(|url| url.to_string()).collect()
}

/// Non-empty lines of a title-completion reply, trimmed and capped.
pub(crate) fn parse_title_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_TITLE_COMPLETIONS)
        .map(str::to_string)
        .collect()
}

/// Parses a reading-suggestion reply.
///
/// Attempts the structured grammar first (a JSON array somewhere in the
/// text), then falls back to `---`-separated blocks of `TITLE:` / `AUTHOR:`
/// / `REASON:` lines. The upstream output format is not contractually
/// guaranteed, so both strategies coexist. Total: never panics, always
/// returns a list, possibly empty. Records missing both title and author
/// are discarded; the result is capped whatever the source format.
pub(crate) fn parse_suggestions(text: &str) -> Vec<BookSuggestion> {
    let structured = extract_json_array(text)
        .and_then(|raw| serde_json::from_str::<Vec<BookSuggestion>>(raw).ok());

    let suggestions = match structured {
        Some(parsed) => parsed,
        None => parse_labeled_blocks(text),
    };

    suggestions
        .into_iter()
        .filter(|s| !(s.title.trim().is_empty() && s.author.trim().is_empty()))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Parses an online-search reply. Structured grammar only; anything else
/// yields an empty list.
pub(crate) fn parse_search_results(text: &str) -> Vec<BookSearchResult> {
    extract_json_array(text)
        .and_then(|raw| serde_json::from_str::<Vec<BookSearchResult>>(raw).ok())
        .unwrap_or_default()
        .into_iter()
        .filter(|r| !r.title.trim().is_empty())
        .take(MAX_SEARCH_RESULTS)
        .collect()
}

/// Lines of a cover-lookup reply that carry an http(s) URL, trimmed and
/// capped.
pub(crate) fn parse_cover_urls(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains("http"))
        .take(MAX_COVER_CANDIDATES)
        .map(str::to_string)
        .collect()
}

fn extract_json_array(text: &str) -> Option<&str> {
    static JSON_ARRAY: OnceLock<Regex> = OnceLock::new();
    let pattern = JSON_ARRAY.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("valid literal pattern"));
    pattern.find(text).map(|m| m.as_str())
}

fn parse_labeled_blocks(text: &str) -> Vec<BookSuggestion> {
    text.split("---")
        .filter(|block| !block.trim().is_empty())
        .map(|block| {
            let mut suggestion = BookSuggestion {
                title: String::new(),
                author: String::new(),
                reason: String::new(),
                cover_url: None,
            };
            for line in block.lines() {
                let line = line.trim();
                if let Some(rest) = line.strip_prefix("TITLE:") {
                    suggestion.title = rest.trim().to_string();
                } else if let Some(rest) = line.strip_prefix("AUTHOR:") {
                    suggestion.author = rest.trim().to_string();
                } else if let Some(rest) = line.strip_prefix("REASON:") {
                    suggestion.reason = rest.trim().to_string();
                }
            }
            suggestion
        })
        .collect()
}
