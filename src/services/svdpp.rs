//! SVD++ latent-factor model for explicit ratings.
//!
//! Each rating is modelled as
//! `r̂(u, i) = μ + b_u + b_i + q_iᵀ (p_u + |I(u)|^-½ Σ_{j ∈ I(u)} y_j)`
//! where `I(u)` is the set of items the user rated. The `y_j` term is the
//! implicit feedback: it captures *which* books a user rated, not only the
//! scores. Parameters are learned with plain SGD over the full training set.

use std::collections::{HashMap, HashSet};

use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::{
    error::{AppError, AppResult},
    models::{BookId, Rating, UserId},
};

/// Closed interval of valid rating values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingScale {
    pub min: f64,
    pub max: f64,
}

impl Default for RatingScale {
    fn default() -> Self {
        Self { min: 1.0, max: 5.0 }
    }
}

impl RatingScale {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// SVD++ hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct SvdParams {
    /// Number of latent factors
    pub n_factors: usize,
    /// Number of SGD passes over the training set
    pub n_epochs: usize,
    /// Learning rate shared by every parameter group
    pub learning_rate: f64,
    /// Regularization term shared by every parameter group
    pub regularization: f64,
    /// Mean of the normal distribution factors are drawn from
    pub init_mean: f64,
    /// Standard deviation of the normal distribution factors are drawn from
    pub init_std_dev: f64,
    /// RNG seed for factor initialisation
    pub seed: u64,
}

impl Default for SvdParams {
    fn default() -> Self {
        Self {
            n_factors: 20,
            n_epochs: 20,
            learning_rate: 0.007,
            regularization: 0.02,
            init_mean: 0.0,
            init_std_dev: 0.1,
            seed: 42,
        }
    }
}

/// A (user, book) pair to score, with a placeholder for the true rating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub user_id: UserId,
    pub book_id: BookId,
    pub actual: f64,
}

/// Scored candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub user_id: UserId,
    pub book_id: BookId,
    pub actual: f64,
    pub estimate: f64,
    /// Set when the user or the book was unknown to the model and the
    /// estimate fell back to biases or the global mean
    pub was_impossible: bool,
}

/// Ratings re-indexed with dense inner ids, ready for training
#[derive(Debug, Clone)]
pub struct TrainSet {
    user_ids: Vec<UserId>,
    book_ids: Vec<BookId>,
    user_index: HashMap<UserId, usize>,
    book_index: HashMap<BookId, usize>,
    /// Ratings grouped by inner user id, as (inner book id, score)
    user_ratings: Vec<Vec<(usize, f64)>>,
    global_mean: f64,
    scale: RatingScale,
}

impl TrainSet {
    /// Builds a training set, assigning inner ids in order of first appearance.
    ///
    /// Every score must lie within `scale`. At least two distinct users and
    /// two distinct books are required for a meaningful fit.
    pub fn build<'a, I>(ratings: I, scale: RatingScale) -> AppResult<Self>
    where
        I: IntoIterator<Item = &'a Rating>,
    {
        let mut user_ids = Vec::new();
        let mut book_ids = Vec::new();
        let mut user_index = HashMap::new();
        let mut book_index = HashMap::new();
        let mut user_ratings: Vec<Vec<(usize, f64)>> = Vec::new();
        let mut total = 0.0;
        let mut count = 0usize;

        for rating in ratings {
            if !scale.contains(rating.rating) {
                return Err(AppError::MalformedRatingsInput(format!(
                    "rating {} for book {} is outside {}..={}",
                    rating.rating, rating.book_id, scale.min, scale.max
                )));
            }

            let u = *user_index.entry(rating.user_id).or_insert_with(|| {
                user_ids.push(rating.user_id);
                user_ratings.push(Vec::new());
                user_ids.len() - 1
            });
            let i = *book_index.entry(rating.book_id).or_insert_with(|| {
                book_ids.push(rating.book_id);
                book_ids.len() - 1
            });

            user_ratings[u].push((i, rating.rating));
            total += rating.rating;
            count += 1;
        }

        if user_ids.len() < 2 || book_ids.len() < 2 {
            return Err(AppError::InsufficientData(format!(
                "{} users and {} books in training data, need at least 2 of each",
                user_ids.len(),
                book_ids.len()
            )));
        }

        Ok(Self {
            user_ids,
            book_ids,
            user_index,
            book_index,
            user_ratings,
            global_mean: total / count as f64,
            scale,
        })
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_items(&self) -> usize {
        self.book_ids.len()
    }

    pub fn n_ratings(&self) -> usize {
        self.user_ratings.iter().map(Vec::len).sum()
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn knows_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }

    /// Every (user, book) pair absent from the training data, user by user.
    ///
    /// `fill` stands in for the unknown true rating; it is never used for
    /// scoring. The iterator is lazy, so restricting it to one user does not
    /// materialise the pairs of everyone else.
    pub fn anti_testset(&self, fill: f64) -> impl Iterator<Item = Candidate> + '_ {
        self.user_ratings
            .iter()
            .enumerate()
            .flat_map(move |(u, rated)| {
                let seen: HashSet<usize> = rated.iter().map(|&(i, _)| i).collect();
                let user_id = self.user_ids[u];
                (0..self.n_items())
                    .filter(move |i| !seen.contains(i))
                    .map(move |i| Candidate {
                        user_id,
                        book_id: self.book_ids[i],
                        actual: fill,
                    })
            })
    }
}

/// Trained SVD++ model
#[derive(Debug, Clone)]
pub struct SvdPlusPlus {
    user_index: HashMap<UserId, usize>,
    book_index: HashMap<BookId, usize>,
    global_mean: f64,
    scale: RatingScale,
    bu: Array1<f64>,
    bi: Array1<f64>,
    pu: Array2<f64>,
    qi: Array2<f64>,
    /// `|I(u)|^-½ Σ y_j` per user, frozen after training
    implicit: Array2<f64>,
}

impl SvdPlusPlus {
    /// Fits the model on the whole training set
    pub fn fit(trainset: &TrainSet, params: &SvdParams) -> AppResult<Self> {
        let k = params.n_factors;
        let n_users = trainset.n_users();
        let n_items = trainset.n_items();
        let lr = params.learning_rate;
        let reg = params.regularization;

        let normal = Normal::new(params.init_mean, params.init_std_dev)
            .map_err(|e| AppError::InvalidInput(format!("invalid factor init: {}", e)))?;
        let mut rng = StdRng::seed_from_u64(params.seed);

        let mut bu = Array1::<f64>::zeros(n_users);
        let mut bi = Array1::<f64>::zeros(n_items);
        let mut pu = Array2::from_shape_simple_fn((n_users, k), || normal.sample(&mut rng));
        let mut qi = Array2::from_shape_simple_fn((n_items, k), || normal.sample(&mut rng));
        let mut yj = Array2::from_shape_simple_fn((n_items, k), || normal.sample(&mut rng));

        let mean = trainset.global_mean;

        tracing::debug!(
            users = n_users,
            items = n_items,
            ratings = trainset.n_ratings(),
            factors = k,
            epochs = params.n_epochs,
            "Fitting SVD++"
        );

        for _epoch in 0..params.n_epochs {
            for (u, rated) in trainset.user_ratings.iter().enumerate() {
                let sqrt_iu = (rated.len() as f64).sqrt();

                for &(i, r) in rated {
                    let implicit = implicit_feedback(&yj, rated, sqrt_iu, k);

                    let user_vec = &pu.row(u) + &implicit;
                    let est = mean + bu[u] + bi[i] + qi.row(i).dot(&user_vec);
                    let err = r - est;

                    bu[u] += lr * (err - reg * bu[u]);
                    bi[i] += lr * (err - reg * bi[i]);

                    for f in 0..k {
                        let puf = pu[[u, f]];
                        let qif = qi[[i, f]];
                        pu[[u, f]] += lr * (err * qif - reg * puf);
                        qi[[i, f]] += lr * (err * (puf + implicit[f]) - reg * qif);
                        for &(j, _) in rated {
                            yj[[j, f]] += lr * (err * qif / sqrt_iu - reg * yj[[j, f]]);
                        }
                    }
                }
            }
        }

        let mut implicit = Array2::<f64>::zeros((n_users, k));
        for (u, rated) in trainset.user_ratings.iter().enumerate() {
            let sqrt_iu = (rated.len() as f64).sqrt();
            implicit
                .row_mut(u)
                .assign(&implicit_feedback(&yj, rated, sqrt_iu, k));
        }

        Ok(Self {
            user_index: trainset.user_index.clone(),
            book_index: trainset.book_index.clone(),
            global_mean: mean,
            scale: trainset.scale,
            bu,
            bi,
            pu,
            qi,
            implicit,
        })
    }

    /// Estimates a rating, clipped to the rating scale.
    ///
    /// Unknown users or books fall back to the available biases, or to the
    /// global mean when both are unknown.
    pub fn predict(&self, user_id: UserId, book_id: BookId, actual: f64) -> Prediction {
        let u = self.user_index.get(&user_id).copied();
        let i = self.book_index.get(&book_id).copied();

        let raw = match (u, i) {
            (Some(u), Some(i)) => {
                let user_vec = &self.pu.row(u) + &self.implicit.row(u);
                self.global_mean + self.bu[u] + self.bi[i] + self.qi.row(i).dot(&user_vec)
            }
            (Some(u), None) => self.global_mean + self.bu[u],
            (None, Some(i)) => self.global_mean + self.bi[i],
            (None, None) => self.global_mean,
        };

        Prediction {
            user_id,
            book_id,
            actual,
            estimate: self.scale.clip(raw),
            was_impossible: u.is_none() || i.is_none(),
        }
    }

    /// Scores a batch of candidates
    pub fn test<I>(&self, candidates: I) -> Vec<Prediction>
    where
        I: IntoIterator<Item = Candidate>,
    {
        candidates
            .into_iter()
            .map(|c| self.predict(c.user_id, c.book_id, c.actual))
            .collect()
    }
}

fn implicit_feedback(
    yj: &Array2<f64>,
    rated: &[(usize, f64)],
    sqrt_iu: f64,
    k: usize,
) -> Array1<f64> {
    let mut sum = Array1::<f64>::zeros(k);
    for &(j, _) in rated {
        sum += &yj.row(j);
    }
    sum / sqrt_iu
}
