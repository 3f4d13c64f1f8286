use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookId, Rating, UserId},
    services::svdpp::RatingScale,
};

/// Popularity and activity cut-offs applied when the store is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterThresholds {
    /// Books need strictly more ratings than this
    pub min_book_ratings: usize,
    /// Users need strictly more ratings than this
    pub min_user_ratings: usize,
}

/// Immutable catalog plus the filtered rating table used for training
#[derive(Debug, Clone)]
pub struct RatingStore {
    books: Vec<Book>,
    book_index: HashMap<BookId, usize>,
    ratings: Vec<Rating>,
    max_user_id: UserId,
}

impl RatingStore {
    /// Loads the catalog and ratings from CSV files and applies the filters.
    ///
    /// Any I/O or parse problem is a `StartupData` error; the service cannot
    /// run without both datasets.
    pub fn load(
        books_path: impl AsRef<Path>,
        ratings_path: impl AsRef<Path>,
        thresholds: FilterThresholds,
    ) -> AppResult<Self> {
        let books: Vec<Book> = read_csv(books_path.as_ref())?;
        let ratings: Vec<Rating> = read_csv(ratings_path.as_ref())?;

        tracing::info!(
            books = books.len(),
            ratings = ratings.len(),
            "Datasets loaded"
        );

        Self::from_parts(books, ratings, thresholds)
    }

    /// Builds the store from in-memory rows.
    ///
    /// Ratings are inner-joined with the catalog on `book_id`, then a row is
    /// kept only if its book AND its user both exceed the thresholds. Counts
    /// are taken on the joined table before either filter runs.
    pub fn from_parts(
        books: Vec<Book>,
        ratings: Vec<Rating>,
        thresholds: FilterThresholds,
    ) -> AppResult<Self> {
        let mut book_index = HashMap::with_capacity(books.len());
        for (position, book) in books.iter().enumerate() {
            if book_index.insert(book.book_id, position).is_some() {
                return Err(AppError::StartupData(format!(
                    "duplicate book_id {} in catalog",
                    book.book_id
                )));
            }
        }

        let scale = RatingScale::default();
        if let Some(bad) = ratings.iter().find(|r| !scale.contains(r.rating)) {
            return Err(AppError::StartupData(format!(
                "rating {} by user {} for book {} is outside {}..={}",
                bad.rating, bad.user_id, bad.book_id, scale.min, scale.max
            )));
        }

        let joined: Vec<Rating> = ratings
            .into_iter()
            .filter(|r| book_index.contains_key(&r.book_id))
            .collect();

        let mut book_counts: HashMap<BookId, usize> = HashMap::new();
        let mut user_counts: HashMap<UserId, usize> = HashMap::new();
        for r in &joined {
            *book_counts.entry(r.book_id).or_insert(0) += 1;
            *user_counts.entry(r.user_id).or_insert(0) += 1;
        }

        let popular_books: HashSet<BookId> = book_counts
            .into_iter()
            .filter(|&(_, count)| count > thresholds.min_book_ratings)
            .map(|(id, _)| id)
            .collect();
        let active_users: HashSet<UserId> = user_counts
            .into_iter()
            .filter(|&(_, count)| count > thresholds.min_user_ratings)
            .map(|(id, _)| id)
            .collect();

        let joined_len = joined.len();
        let filtered: Vec<Rating> = joined
            .into_iter()
            .filter(|r| popular_books.contains(&r.book_id) && active_users.contains(&r.user_id))
            .collect();

        let max_user_id = filtered.iter().map(|r| r.user_id).max().unwrap_or(0);

        tracing::info!(
            joined = joined_len,
            kept = filtered.len(),
            popular_books = popular_books.len(),
            active_users = active_users.len(),
            "Rating table filtered"
        );

        Ok(Self {
            books,
            book_index,
            ratings: filtered,
            max_user_id,
        })
    }

    /// Ratings that passed both filters
    pub fn filtered_ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// Largest user id in the filtered table, 0 when it is empty
    pub fn max_user_id(&self) -> UserId {
        self.max_user_id
    }

    /// Id for a user that does not exist yet in the filtered table
    pub fn next_user_id(&self) -> UserId {
        self.max_user_id + 1
    }

    /// Full catalog in file order
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Looks a book up by identifier
    pub fn book(&self, book_id: BookId) -> Option<&Book> {
        self.book_index.get(&book_id).map(|&pos| &self.books[pos])
    }

    /// Looks a book up by its row position in the catalog.
    ///
    /// Only equivalent to [`RatingStore::book`] when ids form a dense
    /// zero-based range matching file order. Rendering uses `book` instead.
    pub fn item_by_position(&self, position: usize) -> Option<&Book> {
        self.books.get(position)
    }
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::StartupData(format!("{}: {}", path.display(), e)))?;

    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|e| AppError::StartupData(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn thresholds(min_book_ratings: usize, min_user_ratings: usize) -> FilterThresholds {
        FilterThresholds {
            min_book_ratings,
            min_user_ratings,
        }
    }

    fn catalog() -> Vec<Book> {
        vec![
            Book::new(1, "Dune", "Frank Herbert", 300),
            Book::new(2, "Emma", "Jane Austen", 200),
            Book::new(3, "Ulysses", "James Joyce", 100),
        ]
    }

    #[test]
    fn test_inner_join_drops_unknown_books() {
        let ratings = vec![Rating::new(10, 1, 4.0), Rating::new(10, 99, 5.0)];
        let store = RatingStore::from_parts(catalog(), ratings, thresholds(0, 0)).unwrap();
        assert_eq!(store.filtered_ratings(), &[Rating::new(10, 1, 4.0)]);
    }

    #[test]
    fn test_filters_apply_jointly() {
        // Book 1: 3 ratings, book 2: 2 ratings, book 3: 1 rating.
        // User 10: 3 ratings, user 11: 2 ratings, user 12: 1 rating.
        let ratings = vec![
            Rating::new(10, 1, 5.0),
            Rating::new(10, 2, 4.0),
            Rating::new(10, 3, 3.0),
            Rating::new(11, 1, 2.0),
            Rating::new(11, 2, 1.0),
            Rating::new(12, 1, 5.0),
        ];
        let store = RatingStore::from_parts(catalog(), ratings.clone(), thresholds(1, 1)).unwrap();

        let mut book_counts: HashMap<BookId, usize> = HashMap::new();
        let mut user_counts: HashMap<UserId, usize> = HashMap::new();
        for r in &ratings {
            *book_counts.entry(r.book_id).or_default() += 1;
            *user_counts.entry(r.user_id).or_default() += 1;
        }
        for r in store.filtered_ratings() {
            assert!(book_counts[&r.book_id] > 1);
            assert!(user_counts[&r.user_id] > 1);
        }
        assert_eq!(store.filtered_ratings().len(), 4);
    }

    #[test]
    fn test_max_and_next_user_id() {
        let ratings = vec![Rating::new(7, 1, 5.0), Rating::new(42, 2, 3.0)];
        let store = RatingStore::from_parts(catalog(), ratings, thresholds(0, 0)).unwrap();
        assert_eq!(store.max_user_id(), 42);
        assert_eq!(store.next_user_id(), 43);
    }

    #[test]
    fn test_empty_table_next_user_id() {
        let store = RatingStore::from_parts(catalog(), vec![], thresholds(0, 0)).unwrap();
        assert_eq!(store.next_user_id(), 1);
    }

    #[test]
    fn test_lookup_by_id_and_position() {
        let store = RatingStore::from_parts(catalog(), vec![], thresholds(0, 0)).unwrap();
        assert_eq!(store.book(2).unwrap().title, "Emma");
        // Ids start at 1 here, so position 2 is a different book than id 2.
        assert_eq!(store.item_by_position(2).unwrap().title, "Ulysses");
        assert!(store.book(4).is_none());
    }

    #[test]
    fn test_duplicate_book_id_rejected() {
        let mut books = catalog();
        books.push(Book::new(1, "Dune Messiah", "Frank Herbert", 50));
        let err = RatingStore::from_parts(books, vec![], thresholds(0, 0)).unwrap_err();
        assert!(matches!(err, AppError::StartupData(_)));
    }

    #[test]
    fn test_out_of_scale_rating_rejected() {
        let ratings = vec![Rating::new(1, 1, 6.0)];
        let err = RatingStore::from_parts(catalog(), ratings, thresholds(0, 0)).unwrap_err();
        assert!(matches!(err, AppError::StartupData(_)));
    }

    #[test]
    fn test_load_from_csv_files() {
        let mut books = tempfile::NamedTempFile::new().unwrap();
        writeln!(books, "book_id,title,authors,work_ratings_count").unwrap();
        writeln!(books, "1,Dune,Frank Herbert,300").unwrap();
        writeln!(books, "2,\"Emma, Revised\",Jane Austen,200").unwrap();

        let mut ratings = tempfile::NamedTempFile::new().unwrap();
        writeln!(ratings, "user_id,book_id,rating").unwrap();
        writeln!(ratings, "1,1,5").unwrap();
        writeln!(ratings, "1,2,3").unwrap();

        let store = RatingStore::load(books.path(), ratings.path(), thresholds(0, 0)).unwrap();
        assert_eq!(store.books().len(), 2);
        assert_eq!(store.book(2).unwrap().title, "Emma, Revised");
        assert_eq!(store.filtered_ratings().len(), 2);
    }

    #[test]
    fn test_missing_file_is_startup_error() {
        let err = RatingStore::load(
            "/nonexistent/books.csv",
            "/nonexistent/ratings.csv",
            thresholds(0, 0),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::StartupData(_)));
    }

    #[test]
    fn test_malformed_row_is_startup_error() {
        let mut books = tempfile::NamedTempFile::new().unwrap();
        writeln!(books, "book_id,title,authors,work_ratings_count").unwrap();
        writeln!(books, "one,Dune,Frank Herbert,300").unwrap();
        let mut ratings = tempfile::NamedTempFile::new().unwrap();
        writeln!(ratings, "user_id,book_id,rating").unwrap();

        let err = RatingStore::load(books.path(), ratings.path(), thresholds(0, 0)).unwrap_err();
        assert!(matches!(err, AppError::StartupData(_)));
    }
}
