//! Quality ranking comparator for search candidates.

use std::cmp::Ordering;

use crate::provider::BookCandidate;

/// Extract the publication year from a partial-precision date string
/// (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`). Returns `None` for anything else.
pub fn published_year(date: &str) -> Option<i32> {
    let trimmed = date.trim();
    let mut parts = trimmed.split('-');

    let year_part = parts.next()?;
    if year_part.len() != 4 || !year_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year_part.parse().ok()?;

    if let Some(month_part) = parts.next() {
        if month_part.len() != 2 || !month_part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let month: u32 = month_part.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }

        if let Some(day_part) = parts.next() {
            if day_part.len() != 2 || !day_part.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let day: u32 = day_part.parse().ok()?;
            if !(1..=31).contains(&day) {
                return None;
            }
        }
    }

    if parts.next().is_some() {
        return None;
    }

    Some(year)
}

/// Total order over candidates, best first:
/// ratings count desc, average rating desc, publication year desc (skipped
/// unless both sides parse), cover presence, author presence. Ties keep
/// their incoming relative order under a stable sort.
pub fn compare_quality(a: &BookCandidate, b: &BookCandidate) -> Ordering {
    // 1. Ratings count, absent treated as 0
    let count_cmp = b.ratings_count.unwrap_or(0).cmp(&a.ratings_count.unwrap_or(0));
    if count_cmp != Ordering::Equal {
        return count_cmp;
    }

    // 2. Average rating, absent treated as 0.0
    let a_avg = a.average_rating.unwrap_or(0.0);
    let b_avg = b.average_rating.unwrap_or(0.0);
    let avg_cmp = b_avg.partial_cmp(&a_avg).unwrap_or(Ordering::Equal);
    if avg_cmp != Ordering::Equal {
        return avg_cmp;
    }

    // 3. Publication year, newer first; skipped unless both sides parse
    let a_year = a.published_date.as_deref().and_then(published_year);
    let b_year = b.published_date.as_deref().and_then(published_year);
    if let (Some(a_year), Some(b_year)) = (a_year, b_year) {
        let year_cmp = b_year.cmp(&a_year);
        if year_cmp != Ordering::Equal {
            return year_cmp;
        }
    }

    // 4. Cover presence
    let a_cover = a.cover_url.as_deref().is_some_and(|u| !u.is_empty());
    let b_cover = b.cover_url.as_deref().is_some_and(|u| !u.is_empty());
    if a_cover != b_cover {
        return if b_cover { Ordering::Greater } else { Ordering::Less };
    }

    // 5. Author presence
    let a_author = a.real_author().is_some();
    let b_author = b.real_author().is_some();
    if a_author != b_author {
        return if b_author { Ordering::Greater } else { Ordering::Less };
    }

    Ordering::Equal
}

/// Stable-sort candidates best first.
pub fn rank_by_quality(candidates: &mut [BookCandidate]) {
    candidates.sort_by(compare_quality);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str) -> BookCandidate {
        BookCandidate {
            id: id.to_string(),
            title: format!("Book {}", id),
            author: Some("Author".to_string()),
            cover_url: Some("https://x/c.jpg".to_string()),
            description: None,
            published_date: None,
            ratings_count: None,
            average_rating: None,
        }
    }

    #[test]
    fn test_published_year_formats() {
        assert_eq!(published_year("2020"), Some(2020));
        assert_eq!(published_year("2020-05"), Some(2020));
        assert_eq!(published_year("2020-05-17"), Some(2020));
        assert_eq!(published_year(" 1999 "), Some(1999));
    }

    #[test]
    fn test_published_year_invalid() {
        assert_eq!(published_year(""), None);
        assert_eq!(published_year("20"), None);
        assert_eq!(published_year("20200"), None);
        assert_eq!(published_year("2020-13"), None);
        assert_eq!(published_year("2020-00"), None);
        assert_eq!(published_year("2020-05-32"), None);
        assert_eq!(published_year("2020-5"), None);
        assert_eq!(published_year("2020-05-17-01"), None);
        assert_eq!(published_year("circa 2020"), None);
    }

    #[test]
    fn test_ratings_count_dominates() {
        let mut a = candidate("a");
        a.ratings_count = Some(50);
        a.average_rating = Some(4.0);
        let mut b = candidate("b");
        b.ratings_count = Some(10);
        b.average_rating = Some(5.0);

        assert_eq!(compare_quality(&a, &b), Ordering::Less);
        assert_eq!(compare_quality(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_average_rating_breaks_count_ties() {
        let mut a = candidate("a");
        a.ratings_count = Some(10);
        a.average_rating = Some(4.5);
        let mut b = candidate("b");
        b.ratings_count = Some(10);
        b.average_rating = Some(4.2);

        assert_eq!(compare_quality(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_absent_ratings_treated_as_zero() {
        let mut a = candidate("a");
        a.ratings_count = Some(1);
        let b = candidate("b");

        assert_eq!(compare_quality(&a, &b), Ordering::Less);
        assert_eq!(compare_quality(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_newer_year_wins_equal_ratings() {
        let mut a = candidate("a");
        a.published_date = Some("2020".to_string());
        let mut b = candidate("b");
        b.published_date = Some("2015".to_string());

        assert_eq!(compare_quality(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_unparseable_year_skips_criterion() {
        // One unparseable date: year is skipped and evaluation falls through
        // to the cover tiebreak.
        let mut a = candidate("a");
        a.published_date = Some("not a date".to_string());
        a.cover_url = None;
        let mut b = candidate("b");
        b.published_date = Some("2015".to_string());

        // b has a cover, a does not -> b first
        assert_eq!(compare_quality(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_cover_then_author_tiebreaks() {
        let mut a = candidate("a");
        a.cover_url = None;
        let b = candidate("b");
        assert_eq!(compare_quality(&b, &a), Ordering::Less);

        let mut c = candidate("c");
        c.author = None;
        let mut d = candidate("d");
        c.cover_url = None;
        d.cover_url = None;
        assert_eq!(compare_quality(&d, &c), Ordering::Less);
    }

    #[test]
    fn test_stable_sort_is_deterministic() {
        // Strict weak order: sorting twice yields the same output, and full
        // ties keep their incoming relative order.
        let mut items = vec![candidate("x"), candidate("y"), candidate("z")];
        items[0].ratings_count = Some(5);
        items[2].ratings_count = Some(5);

        rank_by_quality(&mut items);
        let first: Vec<String> = items.iter().map(|c| c.id.clone()).collect();
        rank_by_quality(&mut items);
        let second: Vec<String> = items.iter().map(|c| c.id.clone()).collect();

        assert_eq!(first, second);
        assert_eq!(first, vec!["x", "z", "y"]);
    }
}
