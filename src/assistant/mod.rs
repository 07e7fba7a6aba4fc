mod image_search;
mod parse;

pub use image_search::ImageSearchClient;

use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::error::Result;
use crate::llm::{self, TextCompletion};
use crate::models::{BookSearchResult, BookSuggestion};

/// Autocomplete stays quiet until the user has typed this many characters.
const MIN_AUTOCOMPLETE_CHARS: usize = 3;

/// AI assistance for the library views: title autocomplete, reading
/// suggestions, cover candidates and online book search.
///
/// Every operation absorbs upstream and parse failures: the caller gets an
/// empty or fallback result and can simply retry, never an error. Failures
/// are logged at warn so a transient notification can be raised upstream.
pub struct Assistant {
    llm: Arc<dyn TextCompletion>,
    image_search: Option<ImageSearchClient>,
}

impl Assistant {
    pub fn new(llm: Arc<dyn TextCompletion>) -> Self {
        Assistant {
            llm,
            image_search: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Assistant {
            llm: llm::create_client(config)?,
            image_search: ImageSearchClient::from_config(config)?,
        })
    }

    pub fn with_image_search(mut self, image_search: ImageSearchClient) -> Self {
        self.image_search = Some(image_search);
        self
    }

    /// Up to 5 title completions for a partially typed title. Below the
    /// 3-character threshold no request is issued at all.
    pub async fn autocomplete_title(&self, partial_title: &str) -> Vec<String> {
        if partial_title.chars().count() < MIN_AUTOCOMPLETE_CHARS {
            return Vec::new();
        }

        let prompt = format!(
            "Complete book titles that begin with \"{}\". Return up to 5 complete \
             titles, one per line, with no numbering or extra formatting. Only the \
             book titles.",
            partial_title
        );

        match self.llm.complete(&prompt).await {
            Ok(text) => parse::parse_title_lines(&text),
            Err(err) => {
                warn!("Title autocomplete failed: {}", err);
                Vec::new()
            }
        }
    }

    /// Up to 3 books similar to the given one, for the what-to-read-next
    /// dialog shown when a book is completed.
    pub async fn reading_suggestions(&self, title: &str, author: &str) -> Vec<BookSuggestion> {
        let prompt = format!(
            "Based on the book \"{}\" by {}, suggest 3 similar books to read next. \
             Return the suggestions as a JSON array of the form:\n\
             [\n\
               {{\n\
                 \"title\": \"book title\",\n\
                 \"author\": \"book author\",\n\
                 \"reason\": \"one sentence on why it is similar\",\n\
                 \"coverUrl\": \"real cover URL if available\"\n\
               }}\n\
             ]\n\n\
             Favor well-known books and keep the reasons short and relevant.",
            title, author
        );

        match self.llm.complete(&prompt).await {
            Ok(text) => parse::parse_suggestions(&text),
            Err(err) => {
                warn!("Reading suggestions failed: {}", err);
                Vec::new()
            }
        }
    }

    /// Up to 6 candidate cover image URLs.
    ///
    /// Tries the image-search service when configured, then the generative
    /// path; when both yield nothing the fixed fallback set is returned, so
    /// the result is never empty.
    pub async fn cover_candidates(
        &self,
        title: &str,
        author: &str,
        year: Option<i32>,
    ) -> Vec<String> {
        if let Some(image_search) = &self.image_search {
            match image_search.cover_urls(title, author, year).await {
                Ok(urls) if !urls.is_empty() => return urls,
                Ok(_) => {}
                Err(err) => warn!("Image search failed, trying generative lookup: {}", err),
            }
        }

        let published = match year {
            Some(year) => format!(", published in {}", year),
            None => String::new(),
        };
        let prompt = format!(
            "List 6 URLs of real cover images for the book \"{}\" by \"{}\"{}. \
             Return only the URLs, one per line, with no extra text. The URLs \
             should point to JPG or PNG images of covers of this specific book.",
            title, author, published
        );

        let urls = match self.llm.complete(&prompt).await {
            Ok(text) => parse::parse_cover_urls(&text),
            Err(err) => {
                warn!("Cover lookup failed: {}", err);
                Vec::new()
            }
        };

        if urls.is_empty() {
            parse::fallback_cover_urls()
        } else {
            urls
        }
    }

    /// Up to 5 books matching a free-text query, for the add-from-search
    /// dialog. A blank query issues no request.
    pub async fn search_books(&self, query: &str) -> Vec<BookSearchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let prompt = format!(
            "Find books matching \"{}\". Return exactly 5 books as a JSON array of \
             the form:\n\
             [\n\
               {{\n\
                 \"title\": \"full book title\",\n\
                 \"author\": \"full author name\",\n\
                 \"year\": 2023,\n\
                 \"pages\": 250,\n\
                 \"coverUrl\": \"real cover URL if available\",\n\
                 \"description\": \"short description\"\n\
               }}\n\
             ]\n\n\
             Favor popular, well-known books and only use real cover URLs.",
            query
        );

        match self.llm.complete(&prompt).await {
            Ok(text) => parse::parse_search_results(&text),
            Err(err) => {
                warn!("Book search failed: {}", err);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RitmoError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Canned(&'static str);

    #[async_trait]
    impl TextCompletion for Canned {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl TextCompletion for Failing {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(RitmoError::ModelApi("service unavailable".to_string()))
        }
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TextCompletion for Counting {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_autocomplete_below_threshold_issues_no_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let assistant = Assistant::new(Arc::new(Counting {
            calls: calls.clone(),
        }));

        assert!(assistant.autocomplete_title("du").await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assistant.autocomplete_title("dun").await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_autocomplete_returns_trimmed_lines() {
        let assistant = Assistant::new(Arc::new(Canned("Dune\n Dune Messiah \n\n")));
        let titles = assistant.autocomplete_title("dun").await;
        assert_eq!(titles, vec!["Dune", "Dune Messiah"]);
    }

    #[tokio::test]
    async fn test_autocomplete_absorbs_failure() {
        let assistant = Assistant::new(Arc::new(Failing));
        assert!(assistant.autocomplete_title("dune").await.is_empty());
    }

    #[tokio::test]
    async fn test_suggestions_absorb_failure() {
        let assistant = Assistant::new(Arc::new(Failing));
        assert!(assistant.reading_suggestions("Dune", "Herbert").await.is_empty());
    }

    #[tokio::test]
    async fn test_covers_fall_back_on_failure_deterministically() {
        let assistant = Assistant::new(Arc::new(Failing));
        let first = assistant.cover_candidates("Dune", "Herbert", None).await;
        let second = assistant.cover_candidates("Dune", "Herbert", None).await;
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_covers_fall_back_on_empty_extraction() {
        let assistant = Assistant::new(Arc::new(Canned("no links here, sorry")));
        let covers = assistant.cover_candidates("Dune", "Herbert", Some(1965)).await;
        assert!(!covers.is_empty());
    }

    #[tokio::test]
    async fn test_covers_prefer_extracted_urls() {
        let assistant = Assistant::new(Arc::new(Canned(
            "https://a.example/dune.jpg\nhttps://b.example/dune.png",
        )));
        let covers = assistant.cover_candidates("Dune", "Herbert", None).await;
        assert_eq!(
            covers,
            vec!["https://a.example/dune.jpg", "https://b.example/dune.png"]
        );
    }

    #[tokio::test]
    async fn test_search_absorbs_failure_and_blank_query() {
        let assistant = Assistant::new(Arc::new(Failing));
        assert!(assistant.search_books("dune").await.is_empty());
        assert!(assistant.search_books("   ").await.is_empty());
    }
}
