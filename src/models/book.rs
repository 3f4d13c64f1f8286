use serde::{Deserialize, Serialize};

pub type BookId = i64;
pub type UserId = i64;

/// A book from the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    /// Unique identifier of the book
    pub book_id: BookId,
    pub title: String,
    /// Comma separated author names as they appear in the catalog
    pub authors: String,
    /// Total number of ratings the book received, used as popularity
    pub work_ratings_count: i64,
}

/// A single user rating of a book
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub book_id: BookId,
    pub rating: f64,
}

impl Book {
    /// Creates a new book
    pub fn new(book_id: BookId, title: &str, authors: &str, work_ratings_count: i64) -> Self {
        Self {
            book_id,
            title: title.to_string(),
            authors: authors.to_string(),
            work_ratings_count,
        }
    }
}

impl Rating {
    pub fn new(user_id: UserId, book_id: BookId, rating: f64) -> Self {
        Self {
            user_id,
            book_id,
            rating,
        }
    }
}
