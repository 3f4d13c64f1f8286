use crate::{
    error::{AppError, AppResult},
    models::{Book, BookId},
    services::{formatter, rating_store::RatingStore},
};

/// Books offered to a new user to rate, with the prompt shown to them
#[derive(Debug, Clone, PartialEq)]
pub struct ColdStartSet {
    pub book_ids: Vec<BookId>,
    pub prompt: String,
}

/// Picks the `size` most popular books by `work_ratings_count`.
///
/// Ties keep catalog order, so the result is stable for a given catalog.
pub fn select_cold_start(store: &RatingStore, size: usize) -> AppResult<ColdStartSet> {
    let books = store.books();
    if books.len() < size {
        return Err(AppError::InsufficientCatalog {
            available: books.len(),
            required: size,
        });
    }

    let mut by_popularity: Vec<&Book> = books.iter().collect();
    by_popularity.sort_by(|a, b| b.work_ratings_count.cmp(&a.work_ratings_count));
    by_popularity.truncate(size);

    let book_ids: Vec<BookId> = by_popularity.iter().map(|b| b.book_id).collect();
    let prompt = formatter::render_cold_start(by_popularity.iter().copied());

    tracing::debug!(book_ids = ?book_ids, "Cold-start books selected");

    Ok(ColdStartSet { book_ids, prompt })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rating_store::FilterThresholds;

    fn store(books: Vec<Book>) -> RatingStore {
        RatingStore::from_parts(
            books,
            vec![],
            FilterThresholds {
                min_book_ratings: 0,
                min_user_ratings: 0,
            },
        )
        .unwrap()
    }

    fn six_books() -> Vec<Book> {
        vec![
            Book::new(3, "Gamma", "C", 30),
            Book::new(6, "Zeta", "F", 5),
            Book::new(1, "Alpha", "A", 50),
            Book::new(4, "Delta", "D", 20),
            Book::new(2, "Beta", "B", 40),
            Book::new(5, "Epsilon", "E", 10),
        ]
    }

    #[test]
    fn test_selects_five_most_popular_descending() {
        let set = select_cold_start(&store(six_books()), 5).unwrap();
        assert_eq!(set.book_ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            set.prompt,
            "Please provide your ratings (1-5) for the following books to avoid cold start:\n\
             Alpha by A; \nBeta by B; \nGamma by C; \nDelta by D; \nEpsilon by E; \n"
        );
    }

    #[test]
    fn test_repeated_selection_is_identical() {
        let store = store(six_books());
        let first = select_cold_start(&store, 5).unwrap();
        let second = select_cold_start(&store, 5).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let books = vec![
            Book::new(9, "Nine", "N", 10),
            Book::new(1, "One", "O", 10),
            Book::new(5, "Five", "F", 20),
        ];
        let set = select_cold_start(&store(books), 3).unwrap();
        assert_eq!(set.book_ids, vec![5, 9, 1]);
    }

    #[test]
    fn test_small_catalog_fails() {
        let books = six_books().into_iter().take(4).collect();
        let err = select_cold_start(&store(books), 5).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientCatalog {
                available: 4,
                required: 5
            }
        ));
    }
}
