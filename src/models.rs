use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Year of the earliest surviving motion picture.
pub const EARLIEST_FILM_YEAR: i32 = 1888;

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;

pub type MovieId = i32;

/// A stored movie as the API returns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub director: String,
    pub year: i32,
    pub watched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Candidate movie fields as sent to create and update. Unknown keys such
/// as `id` or `createdAt` are ignored, so a full record can be sent back.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieInput {
    pub title: Option<String>,
    pub director: Option<String>,
    pub year: Option<i32>,
    pub watched: Option<bool>,
    pub review: Option<String>,
    pub rating: Option<f64>,
}

impl From<&Movie> for MovieInput {
    fn from(movie: &Movie) -> Self {
        Self {
            title: Some(movie.title.clone()),
            director: Some(movie.director.clone()),
            year: Some(movie.year),
            watched: Some(movie.watched),
            review: movie.review.clone(),
            rating: movie.rating,
        }
    }
}

/// Mutable fields of a movie after validation, trimmed and defaulted.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieFields {
    pub title: String,
    pub director: String,
    pub year: i32,
    pub watched: bool,
    pub review: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
    /// The field was absent or blank rather than out of range.
    pub missing: bool,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field that failed validation, in field order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    fn missing(&mut self, field: &'static str, message: &str) {
        self.0.push(FieldError { field, message: message.to_string(), missing: true });
    }

    fn invalid(&mut self, field: &'static str, message: &str) {
        self.0.push(FieldError { field, message: message.to_string(), missing: false });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }

    pub fn has_missing(&self) -> bool {
        self.0.iter().any(|e| e.missing)
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validation shared by the API layer and the client pre-check.
pub fn validate(input: &MovieInput) -> Result<MovieFields, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = non_blank(input.title.as_deref());
    if title.is_none() {
        errors.missing("title", "Title is required.");
    }

    let director = non_blank(input.director.as_deref());
    if director.is_none() {
        errors.missing("director", "Director is required.");
    }

    match input.year {
        None => errors.missing("year", "Year is required."),
        Some(year) if year < EARLIEST_FILM_YEAR => {
            errors.invalid("year", "Year must be 1888 or later.")
        },
        Some(_) => {},
    }

    if let Some(rating) = input.rating {
        if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
            errors.invalid("rating", "Rating must be between 0 and 10.");
        }
    }

    match (title, director, input.year) {
        (Some(title), Some(director), Some(year)) if errors.is_empty() => Ok(MovieFields {
            title,
            director,
            year,
            watched: input.watched.unwrap_or(false),
            review: non_blank(input.review.as_deref()),
            rating: input.rating,
        }),
        _ => Err(errors),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// The new-entry form as the browser posts it. Numbers stay raw text until
/// the form is submitted.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovieForm {
    pub title: String,
    pub director: String,
    pub year: String,
    pub rating: String,
    pub review: String,
}

impl MovieForm {
    /// Parses the numeric fields and runs the shared validation, yielding the
    /// create payload for a backlog entry.
    pub fn submit(&self) -> Result<MovieInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let year = match self.year.trim() {
            "" => None,
            raw => match raw.parse::<i32>() {
                Ok(year) => Some(year),
                Err(_) => {
                    errors.invalid("year", "Year must be a whole number.");
                    None
                },
            },
        };

        let rating = match self.rating.trim() {
            "" => None,
            raw => match raw.parse::<f64>() {
                Ok(rating) => Some(rating),
                Err(_) => {
                    errors.invalid("rating", "Rating must be a number.");
                    None
                },
            },
        };

        let input = MovieInput {
            title: Some(self.title.clone()),
            director: Some(self.director.clone()),
            year,
            watched: Some(false),
            review: Some(self.review.clone()),
            rating,
        };

        if let Err(found) = validate(&input) {
            for err in found.0 {
                if errors.get(err.field).is_none() {
                    errors.0.push(err);
                }
            }
            errors.0.sort_by_key(|e| field_order(e.field));
        }

        if errors.is_empty() { Ok(input) } else { Err(errors) }
    }
}

fn field_order(field: &str) -> usize {
    ["title", "director", "year", "rating", "review"]
        .iter()
        .position(|f| *f == field)
        .unwrap_or(usize::MAX)
}
