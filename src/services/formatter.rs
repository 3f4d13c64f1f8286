use crate::error::AppError;
use crate::models::Book;

pub const COLD_START_PROMPT: &str =
    "Please provide your ratings (1-5) for the following books to avoid cold start:\n";

pub const RECOMMENDATION_HEADER: &str =
    "Based on the questionnaire, the books recommended to you are: \n";

/// One line per book: `"{title} by {authors}; \n"`
fn render_books<'a>(header: &str, books: impl IntoIterator<Item = &'a Book>) -> String {
    let mut text = header.to_string();
    for book in books {
        text.push_str(&format!("{} by {}; \n", book.title, book.authors));
    }
    text
}

/// Text asking a new user to rate the cold-start books
pub fn render_cold_start<'a>(books: impl IntoIterator<Item = &'a Book>) -> String {
    render_books(COLD_START_PROMPT, books)
}

/// Text listing recommended books
pub fn render_recommendations<'a>(books: impl IntoIterator<Item = &'a Book>) -> String {
    render_books(RECOMMENDATION_HEADER, books)
}

pub fn render_error(error: &AppError) -> String {
    format!("Sorry, I couldn't process that: {}", error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_start_prompt() {
        let books = vec![
            Book::new(1, "Dune", "Frank Herbert", 300),
            Book::new(2, "Emma", "Jane Austen", 200),
        ];
        assert_eq!(
            render_cold_start(&books),
            "Please provide your ratings (1-5) for the following books to avoid cold start:\n\
             Dune by Frank Herbert; \n\
             Emma by Jane Austen; \n"
        );
    }

    #[test]
    fn test_recommendations_without_books() {
        assert_eq!(render_recommendations(&Vec::<Book>::new()), RECOMMENDATION_HEADER);
    }

    #[test]
    fn test_error_text() {
        let err = AppError::UnrecognizedIntent("weather".to_string());
        assert_eq!(
            render_error(&err),
            "Sorry, I couldn't process that: Unrecognized intent: weather"
        );
    }
}
