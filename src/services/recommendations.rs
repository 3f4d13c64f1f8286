use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookId, Rating, UserId},
    services::{
        cold_start::ColdStartSet,
        formatter,
        ranking::top_n,
        rating_store::RatingStore,
        svdpp::{RatingScale, SvdParams, SvdPlusPlus, TrainSet},
    },
};

/// Placeholder true rating for anti-test-set candidates
const ANTI_TESTSET_FILL: f64 = 0.0;

/// Recommendations computed for a freshly created user
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub user_id: UserId,
    pub books: Vec<(Book, f64)>,
    pub text: String,
}

/// Parses the comma separated ratings a user typed for the cold-start books.
///
/// Exactly `expected` integer values in the rating scale are required.
pub fn parse_user_ratings(raw: &str, expected: usize) -> AppResult<Vec<f64>> {
    let scale = RatingScale::default();
    let values: Vec<&str> = raw.split(',').map(str::trim).collect();

    if values.len() != expected {
        return Err(AppError::MalformedRatingsInput(format!(
            "expected {} ratings, got {}",
            expected,
            values.len()
        )));
    }

    values
        .into_iter()
        .map(|v| {
            let score: i64 = v.parse().map_err(|_| {
                AppError::MalformedRatingsInput(format!("'{}' is not a whole number", v))
            })?;
            let score = score as f64;
            if !scale.contains(score) {
                return Err(AppError::MalformedRatingsInput(format!(
                    "{} is outside {}..={}",
                    score, scale.min, scale.max
                )));
            }
            Ok(score)
        })
        .collect()
}

/// Pairs cold-start books with the scores a new user gave them
pub fn new_user_ratings(user_id: UserId, set: &ColdStartSet, scores: &[f64]) -> Vec<Rating> {
    set.book_ids
        .iter()
        .zip(scores)
        .map(|(&book_id, &score)| Rating::new(user_id, book_id, score))
        .collect()
}

/// Retrains SVD++ on `ratings` and returns the `n` best unseen books for
/// `target_user`, highest estimate first.
///
/// A user who already rated every book gets an empty list.
pub fn recommend<'a, I>(
    ratings: I,
    target_user: UserId,
    n: usize,
    params: &SvdParams,
) -> AppResult<Vec<(BookId, f64)>>
where
    I: IntoIterator<Item = &'a Rating>,
{
    let start = Instant::now();

    let trainset = TrainSet::build(ratings, RatingScale::default())?;
    if !trainset.knows_user(target_user) {
        return Err(AppError::InsufficientData(format!(
            "user {} has no ratings in the training data",
            target_user
        )));
    }

    let model = SvdPlusPlus::fit(&trainset, params)?;

    let candidates: Vec<_> = trainset
        .anti_testset(ANTI_TESTSET_FILL)
        .filter(|c| c.user_id == target_user)
        .collect();
    let predictions = model.test(candidates);

    let mut ranked = top_n(&predictions, n);
    let result = ranked.remove(&target_user).unwrap_or_default();

    tracing::info!(
        user_id = target_user,
        users = trainset.n_users(),
        items = trainset.n_items(),
        candidates = predictions.len(),
        returned = result.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Recommendations computed"
    );

    Ok(result)
}

/// Full cold-start flow: parse the user's ratings, add them to the base table
/// under a new user id, retrain and render the top `n` books.
///
/// The base table is left untouched; the augmented copy lives only for this
/// call.
pub fn recommend_for_new_user(
    store: &RatingStore,
    set: &ColdStartSet,
    raw_ratings: &str,
    n: usize,
    params: &SvdParams,
) -> AppResult<Recommendation> {
    let scores = parse_user_ratings(raw_ratings, set.book_ids.len())?;
    let user_id = store.next_user_id();
    let extra = new_user_ratings(user_id, set, &scores);

    tracing::debug!(user_id, ratings = ?extra, "New user created");

    let augmented = store.filtered_ratings().iter().chain(extra.iter());
    let ranked = recommend(augmented, user_id, n, params)?;

    let books: Vec<(Book, f64)> = ranked
        .into_iter()
        .filter_map(|(book_id, estimate)| store.book(book_id).map(|b| (b.clone(), estimate)))
        .collect();
    let text = formatter::render_recommendations(books.iter().map(|(b, _)| b));

    Ok(Recommendation {
        user_id,
        books,
        text,
    })
}

/// Runs [`recommend_for_new_user`] on the blocking thread pool so the model
/// fit does not hold up the async workers.
pub async fn recommend_for_new_user_blocking(
    store: Arc<RatingStore>,
    set: ColdStartSet,
    raw_ratings: String,
    n: usize,
    params: SvdParams,
) -> AppResult<Recommendation> {
    tokio::task::spawn_blocking(move || {
        recommend_for_new_user(&store, &set, &raw_ratings, n, &params)
    })
    .await?
}
