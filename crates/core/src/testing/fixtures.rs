//! Candidate fixtures for tests.

use crate::provider::BookCandidate;

/// A candidate passing the strict completeness gate.
pub fn complete_candidate(id: &str, title: &str, ratings_count: u32) -> BookCandidate {
    BookCandidate {
        id: id.to_string(),
        title: title.to_string(),
        author: Some("Test Author".to_string()),
        cover_url: Some(format!("https://covers.example/{}.jpg", id)),
        description: Some(format!("Description of {}.", title)),
        published_date: Some("2020-01-15".to_string()),
        ratings_count: Some(ratings_count),
        average_rating: Some(4.0),
    }
}

/// A candidate with basic fields but no description; needs a detail call to
/// become complete.
pub fn incomplete_candidate(id: &str, title: &str, ratings_count: u32) -> BookCandidate {
    BookCandidate {
        description: None,
        ..complete_candidate(id, title, ratings_count)
    }
}

/// A candidate failing the basic admissibility gate (no author, no cover).
pub fn bare_candidate(id: &str, title: &str) -> BookCandidate {
    BookCandidate {
        id: id.to_string(),
        title: title.to_string(),
        author: None,
        cover_url: None,
        description: None,
        published_date: None,
        ratings_count: None,
        average_rating: None,
    }
}
