//! Wire DTOs for the volumes API and their mapping into candidates.

use serde::{Deserialize, Serialize};

use crate::store::{Book, UNKNOWN_AUTHOR};

/// One page of search results after DTO mapping.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub candidates: Vec<BookCandidate>,
    /// Total hits the upstream reports for the query, across all pages.
    pub total_items: u32,
}

/// A book produced by an upstream search call, not yet filtered or
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCandidate {
    /// Upstream volume id.
    pub id: String,
    /// Title; empty when the upstream listing omitted it, which makes the
    /// candidate inadmissible downstream.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
}

impl BookCandidate {
    /// The author, unless it is absent, blank or the upstream
    /// "Unknown Author" sentinel.
    pub fn real_author(&self) -> Option<&str> {
        self.author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty() && *a != UNKNOWN_AUTHOR)
    }

    /// Whether the description still needs to be fetched via a detail call.
    pub fn needs_description(&self) -> bool {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .is_none()
    }

    /// Convert into a storable record stamped with the given fetch time.
    pub fn into_book(self, fetched_at: i64) -> Book {
        Book {
            id: self.id,
            title: self.title,
            author: self.author,
            cover_url: self.cover_url,
            description: self.description,
            published_date: self.published_date,
            ratings_count: self.ratings_count,
            average_rating: self.average_rating,
            fetched_at,
            last_opened_at: 0,
        }
    }
}

/// Search response wire format.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumesResponse {
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub items: Vec<VolumeItem>,
}

/// A single volume in a search listing or detail response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeItem {
    pub id: String,
    #[serde(default)]
    pub volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub ratings_count: Option<u32>,
    pub average_rating: Option<f64>,
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
}

impl VolumeItem {
    /// Map a wire volume into a candidate. Returns `None` when the item
    /// carries no volume info at all.
    pub fn into_candidate(self) -> Option<BookCandidate> {
        let info = self.volume_info?;

        let author = (!info.authors.is_empty())
            .then(|| info.authors.join(", "))
            .filter(|a| a != UNKNOWN_AUTHOR);

        // Prefer the larger thumbnail; upgrade insecure URLs before anything
        // downstream sees them.
        let cover_url = info
            .image_links
            .and_then(|links| links.thumbnail.or(links.small_thumbnail))
            .map(upgrade_to_https);

        Some(BookCandidate {
            id: self.id,
            title: info.title.unwrap_or_default(),
            author,
            cover_url,
            description: info.description,
            published_date: info.published_date,
            ratings_count: info.ratings_count,
            average_rating: info.average_rating,
        })
    }
}

/// Upgrade an insecure cover URL to the secure scheme.
fn upgrade_to_https(url: String) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: &str) -> VolumeItem {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_into_candidate_full_record() {
        let item = item(
            r#"{
                "id": "v1",
                "volumeInfo": {
                    "title": "Dune",
                    "authors": ["Frank Herbert"],
                    "description": "A desert planet.",
                    "publishedDate": "1965-08-01",
                    "ratingsCount": 5000,
                    "averageRating": 4.3,
                    "imageLinks": {
                        "smallThumbnail": "http://books.example/s.jpg",
                        "thumbnail": "http://books.example/t.jpg"
                    }
                }
            }"#,
        );

        let candidate = item.into_candidate().unwrap();
        assert_eq!(candidate.title, "Dune");
        assert_eq!(candidate.author.as_deref(), Some("Frank Herbert"));
        // Prefers thumbnail and upgrades the scheme
        assert_eq!(
            candidate.cover_url.as_deref(),
            Some("https://books.example/t.jpg")
        );
        assert_eq!(candidate.ratings_count, Some(5000));
    }

    #[test]
    fn test_into_candidate_joins_authors() {
        let item = item(
            r#"{"id":"v1","volumeInfo":{"title":"T","authors":["A One","B Two"]}}"#,
        );
        let candidate = item.into_candidate().unwrap();
        assert_eq!(candidate.author.as_deref(), Some("A One, B Two"));
    }

    #[test]
    fn test_into_candidate_no_authors() {
        let item = item(r#"{"id":"v1","volumeInfo":{"title":"T"}}"#);
        let candidate = item.into_candidate().unwrap();
        assert!(candidate.author.is_none());
    }

    #[test]
    fn test_into_candidate_unknown_author_sentinel() {
        let item = item(
            r#"{"id":"v1","volumeInfo":{"title":"T","authors":["Unknown Author"]}}"#,
        );
        let candidate = item.into_candidate().unwrap();
        assert!(candidate.author.is_none());
        assert!(candidate.real_author().is_none());
    }

    #[test]
    fn test_into_candidate_small_thumbnail_fallback() {
        let item = item(
            r#"{"id":"v1","volumeInfo":{"title":"T","imageLinks":{"smallThumbnail":"https://x/s.jpg"}}}"#,
        );
        let candidate = item.into_candidate().unwrap();
        assert_eq!(candidate.cover_url.as_deref(), Some("https://x/s.jpg"));
    }

    #[test]
    fn test_into_candidate_missing_title_is_empty() {
        let item = item(r#"{"id":"v1","volumeInfo":{"authors":["A"]}}"#);
        let candidate = item.into_candidate().unwrap();
        assert!(candidate.title.is_empty());
    }

    #[test]
    fn test_into_candidate_no_volume_info() {
        let item = item(r#"{"id":"v1"}"#);
        assert!(item.into_candidate().is_none());
    }

    #[test]
    fn test_needs_description() {
        let mut candidate = item(r#"{"id":"v1","volumeInfo":{"title":"T"}}"#)
            .into_candidate()
            .unwrap();
        assert!(candidate.needs_description());

        candidate.description = Some("  ".to_string());
        assert!(candidate.needs_description());

        candidate.description = Some("Text.".to_string());
        assert!(!candidate.needs_description());
    }

    #[test]
    fn test_into_book_stamps_fetch_time() {
        let candidate = item(
            r#"{"id":"v1","volumeInfo":{"title":"Dune","authors":["Frank Herbert"]}}"#,
        )
        .into_candidate()
        .unwrap();

        let book = candidate.into_book(42);
        assert_eq!(book.id, "v1");
        assert_eq!(book.fetched_at, 42);
        assert_eq!(book.last_opened_at, 0);
    }

    #[test]
    fn test_https_urls_left_alone() {
        assert_eq!(
            upgrade_to_https("https://x/t.jpg".to_string()),
            "https://x/t.jpg"
        );
        assert_eq!(
            upgrade_to_https("http://x/t.jpg".to_string()),
            "https://x/t.jpg"
        );
    }

    #[test]
    fn test_volumes_response_defaults() {
        let page: VolumesResponse = serde_json::from_str(r#"{"totalItems": 0}"#).unwrap();
        assert_eq!(page.total_items, 0);
        assert!(page.items.is_empty());
    }
}
