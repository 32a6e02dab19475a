//! Structured search filters
//!
//! User-supplied constraints on top of vector similarity:
//! - Genre membership (set intersection)
//! - Release year range
//! - Minimum rating floor
//!
//! Raw key/value parsing goes through the closed `FilterKey` variant once, at
//! the edge; the pipeline builder never does string matching.

use crate::errors::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// The closed set of recognized filter keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    Genres,
    MinYear,
    MaxYear,
    MinRating,
}

impl FromStr for FilterKey {
    type Err = SearchError;

    /// Case-insensitive; accepts both `genre` and `genres`, and both
    /// `minYear` and `min_year` spellings. Unrecognized keys are an error
    /// rather than being silently dropped.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "genre" | "genres" => Ok(FilterKey::Genres),
            "minyear" => Ok(FilterKey::MinYear),
            "maxyear" => Ok(FilterKey::MaxYear),
            "minrating" => Ok(FilterKey::MinRating),
            _ => Err(SearchError::UnknownFilterKey { key: s.to_string() }),
        }
    }
}

/// Optional structured constraint set; absent fields mean "no constraint
/// on that dimension"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Match documents whose genre set intersects this set
    pub genres: Option<BTreeSet<String>>,

    /// Inclusive lower bound on release year
    pub min_year: Option<i32>,

    /// Inclusive upper bound on release year
    pub max_year: Option<i32>,

    /// Inclusive lower bound on rating
    pub min_rating: Option<f64>,
}

impl SearchFilters {
    /// Create new empty filters (no filtering applied)
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by genre membership
    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = Some(genres.into_iter().map(Into::into).collect());
        self
    }

    /// Set inclusive minimum release year
    pub fn with_min_year(mut self, year: i32) -> Self {
        self.min_year = Some(year);
        self
    }

    /// Set inclusive maximum release year
    pub fn with_max_year(mut self, year: i32) -> Self {
        self.max_year = Some(year);
        self
    }

    /// Set inclusive minimum rating
    pub fn with_min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    /// Check whether any constraint is populated
    pub fn is_empty(&self) -> bool {
        self.genres.as_ref().map_or(true, BTreeSet::is_empty)
            && self.min_year.is_none()
            && self.max_year.is_none()
            && self.min_rating.is_none()
    }

    /// Parse one raw key/value pair into this filter set.
    ///
    /// Genres use the `|`-delimited multi-value syntax
    /// (e.g. `"Sci-Fi|Adventure"`); blank segments are skipped.
    pub fn apply(&mut self, key: FilterKey, raw: &str) -> Result<()> {
        match key {
            FilterKey::Genres => {
                let genres: BTreeSet<String> = raw
                    .split('|')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(String::from)
                    .collect();
                if genres.is_empty() {
                    return Err(SearchError::invalid_field(
                        "genre filter has no values",
                        "genres",
                    ));
                }
                self.genres = Some(genres);
            }
            FilterKey::MinYear => {
                self.min_year = Some(parse_int(raw, "min_year")?);
            }
            FilterKey::MaxYear => {
                self.max_year = Some(parse_int(raw, "max_year")?);
            }
            FilterKey::MinRating => {
                let rating: f64 = raw.trim().parse().map_err(|_| {
                    SearchError::invalid_field(
                        format!("not a valid rating: {raw}"),
                        "min_rating",
                    )
                })?;
                self.min_rating = Some(rating);
            }
        }
        Ok(())
    }

    /// Validate filter parameters.
    ///
    /// Fails with `InvalidArgument` if:
    /// - `min_year` > `max_year`
    /// - `min_rating` outside [0, 10]
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_year, self.max_year) {
            if min > max {
                return Err(SearchError::invalid_field(
                    format!("min_year ({min}) cannot exceed max_year ({max})"),
                    "min_year",
                ));
            }
        }

        if let Some(rating) = self.min_rating {
            if !(0.0..=10.0).contains(&rating) {
                return Err(SearchError::invalid_field(
                    format!("min_rating must be in [0.0, 10.0], got {rating}"),
                    "min_rating",
                ));
            }
        }

        Ok(())
    }
}

fn parse_int(raw: &str, field: &str) -> Result<i32> {
    raw.trim().parse().map_err(|_| {
        SearchError::invalid_field(format!("not a valid year: {raw}"), field)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_key_parsing() {
        assert_eq!("genres".parse::<FilterKey>().unwrap(), FilterKey::Genres);
        assert_eq!("Genre".parse::<FilterKey>().unwrap(), FilterKey::Genres);
        assert_eq!("minYear".parse::<FilterKey>().unwrap(), FilterKey::MinYear);
        assert_eq!("min_year".parse::<FilterKey>().unwrap(), FilterKey::MinYear);
        assert_eq!("MAXYEAR".parse::<FilterKey>().unwrap(), FilterKey::MaxYear);
        assert_eq!(
            "min-rating".parse::<FilterKey>().unwrap(),
            FilterKey::MinRating
        );
    }

    #[test]
    fn test_unknown_filter_key_rejected() {
        let err = "director".parse::<FilterKey>().unwrap_err();
        assert!(matches!(err, SearchError::UnknownFilterKey { key } if key == "director"));
    }

    #[test]
    fn test_builder() {
        let filters = SearchFilters::new()
            .with_genres(["Sci-Fi", "Adventure"])
            .with_min_year(2000)
            .with_max_year(2020)
            .with_min_rating(7.5);

        assert_eq!(filters.genres.as_ref().unwrap().len(), 2);
        assert_eq!(filters.min_year, Some(2000));
        assert_eq!(filters.max_year, Some(2020));
        assert_eq!(filters.min_rating, Some(7.5));
        assert!(!filters.is_empty());
    }

    #[test]
    fn test_empty_filters() {
        assert!(SearchFilters::new().is_empty());
        // An empty genre set counts as no constraint
        let filters = SearchFilters {
            genres: Some(BTreeSet::new()),
            ..Default::default()
        };
        assert!(filters.is_empty());
    }

    #[test]
    fn test_apply_pipe_delimited_genres() {
        let mut filters = SearchFilters::new();
        filters.apply(FilterKey::Genres, "Sci-Fi|Adventure| Drama ").unwrap();
        let genres = filters.genres.unwrap();
        assert_eq!(genres.len(), 3);
        assert!(genres.contains("Drama"));
    }

    #[test]
    fn test_apply_numeric_values() {
        let mut filters = SearchFilters::new();
        filters.apply(FilterKey::MinYear, "1990").unwrap();
        filters.apply(FilterKey::MinRating, "6.5").unwrap();
        assert_eq!(filters.min_year, Some(1990));
        assert_eq!(filters.min_rating, Some(6.5));

        let err = filters.apply(FilterKey::MaxYear, "not-a-year").unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument { .. }));
    }

    #[test]
    fn test_validate_year_order() {
        let filters = SearchFilters::new().with_min_year(2020).with_max_year(2000);
        assert!(filters.validate().is_err());

        let filters = SearchFilters::new().with_min_year(2000).with_max_year(2020);
        assert!(filters.validate().is_ok());
    }

    #[test]
    fn test_validate_rating_range() {
        assert!(SearchFilters::new().with_min_rating(10.5).validate().is_err());
        assert!(SearchFilters::new().with_min_rating(-1.0).validate().is_err());
        assert!(SearchFilters::new().with_min_rating(0.0).validate().is_ok());
        assert!(SearchFilters::new().with_min_rating(10.0).validate().is_ok());
    }
}
