//! # Rating Aggregation
//!
//! Keeps each tour's denormalized review statistics (`ratings_quantity`,
//! `ratings_average`) in step with the reviews collection. Stats are
//! recomputed in full from the surviving reviews on every review
//! mutation rather than patched incrementally, so the stored numbers
//! cannot drift from the source of truth.
//!
//! Recomputation is driven by the store's sequenced change feed and runs
//! on a single consumer task. A lone writer means interleaved review
//! mutations cannot overwrite each other's stats, and a watermark tracks
//! how far the consumer has caught up so callers can wait until a given
//! mutation is reflected. If the consumer falls behind the feed's buffer
//! it resynchronizes every tour from scratch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::models::review::{RATING_FIELD, TOUR_FIELD};
use crate::models::tour::{DEFAULT_RATING, RATINGS_AVERAGE_FIELD, RATINGS_QUANTITY_FIELD};
use crate::models::{Model, Review, Tour};
use crate::query::Predicate;
use crate::store::{ChangeEvent, Database, StoreError, StoreResult, ID_FIELD};

/// Denormalized review statistics for one tour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingStats {
    /// Number of reviews
    pub count: u64,

    /// Mean rating, rounded to one decimal
    pub mean: f64,
}

impl RatingStats {
    /// Stats for a tour with no reviews. The mean falls back to the
    /// product default rather than zero, so an unreviewed tour is not
    /// ranked below every reviewed one.
    pub fn fallback() -> Self {
        Self {
            count: 0,
            mean: DEFAULT_RATING,
        }
    }

    /// Computes stats from raw rating values.
    pub fn from_ratings(ratings: &[f64]) -> Self {
        if ratings.is_empty() {
            return Self::fallback();
        }
        let sum: f64 = ratings.iter().sum();
        let mean = sum / ratings.len() as f64;
        Self {
            count: ratings.len() as u64,
            mean: (mean * 10.0).round() / 10.0,
        }
    }
}

/// Maintains tour rating statistics from review change events
pub struct RatingAggregator {
    db: Arc<Database>,
    watermark: watch::Sender<u64>,
}

impl RatingAggregator {
    pub fn new(db: Arc<Database>) -> Self {
        let (watermark, _) = watch::channel(db.last_sequence());
        Self { db, watermark }
    }

    /// Creates an aggregator and spawns its consumer task. The feed is
    /// subscribed before the task starts, so no later mutation can slip
    /// past it.
    pub fn spawn(db: Arc<Database>) -> Arc<Self> {
        let events = db.subscribe();
        let aggregator = Arc::new(Self::new(db));
        tokio::spawn(Arc::clone(&aggregator).run(events));
        aggregator
    }

    /// Sequence of the last change event reflected in tour stats
    pub fn watermark(&self) -> u64 {
        *self.watermark.borrow()
    }

    /// Waits until the consumer has processed the event with the given
    /// sequence. Errors only if the consumer task is gone.
    pub async fn wait_for(&self, sequence: u64) -> StoreResult<()> {
        let mut rx = self.watermark.subscribe();
        rx.wait_for(|processed| *processed >= sequence)
            .await
            .map_err(|_| StoreError::Internal("rating consumer stopped".to_string()))?;
        Ok(())
    }

    /// Recomputes one tour's stats from all its surviving reviews and
    /// writes them onto the tour document. A missing tour is not an
    /// error; its reviews may outlive it briefly during deletion.
    pub fn recompute(&self, tour_id: &str) -> StoreResult<RatingStats> {
        let reviews = self.db.collection(Review::COLLECTION)?;
        let matching = reviews.scan(&[Predicate::eq(
            TOUR_FIELD,
            Value::String(tour_id.to_string()),
        )])?;
        let ratings: Vec<f64> = matching
            .iter()
            .filter_map(|doc| doc.get(RATING_FIELD).and_then(Value::as_f64))
            .collect();
        let stats = RatingStats::from_ratings(&ratings);

        let mut patch = Map::new();
        patch.insert(RATINGS_QUANTITY_FIELD.to_string(), Value::from(stats.count));
        patch.insert(RATINGS_AVERAGE_FIELD.to_string(), Value::from(stats.mean));
        match self.db.update(Tour::COLLECTION, tour_id, &patch)? {
            Some(_) => debug!(
                tour = tour_id,
                count = stats.count,
                mean = stats.mean,
                "recomputed rating stats"
            ),
            None => debug!(tour = tour_id, "rating parent is gone, stats not written"),
        }
        Ok(stats)
    }

    /// Applies one change event. Review events trigger a recompute of
    /// every tour the event touches; an update that moved a review to a
    /// different tour recomputes both the old and the new one. Events
    /// from other collections are ignored.
    pub fn handle(&self, event: &ChangeEvent) -> StoreResult<()> {
        if event.collection != Review::COLLECTION {
            return Ok(());
        }
        for tour_id in Self::parents_of(event) {
            self.recompute(&tour_id)?;
        }
        Ok(())
    }

    /// Recomputes stats for every tour. Used after the consumer lagged
    /// behind the change feed and may have dropped events.
    pub fn resync(&self) -> StoreResult<()> {
        let tours = self.db.collection(Tour::COLLECTION)?;
        let ids: Vec<String> = tours
            .scan(&[])?
            .iter()
            .filter_map(|doc| doc.get(ID_FIELD).and_then(Value::as_str).map(String::from))
            .collect();
        for id in &ids {
            self.recompute(id)?;
        }
        info!(tours = ids.len(), "resynced rating stats");
        Ok(())
    }

    /// Consumer loop. Every received event advances the watermark, also
    /// the ignored and the failed ones, so waiters never hang on an
    /// event that produced no stats write.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<ChangeEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let sequence = event.sequence;
                    if let Err(error) = self.handle(&event) {
                        warn!(%error, sequence, "rating recompute failed");
                    }
                    self.advance_watermark(sequence);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "rating consumer lagged, resyncing all tours");
                    if let Err(error) = self.resync() {
                        warn!(%error, "rating resync failed");
                    }
                    self.advance_watermark(self.db.last_sequence());
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("rating consumer stopped");
    }

    /// Tour ids an event touches, before and after the change.
    fn parents_of(event: &ChangeEvent) -> Vec<String> {
        let mut parents = Vec::new();
        let states = [event.previous.as_ref(), event.document.as_ref()];
        for doc in states.into_iter().flatten() {
            if let Some(tour) = doc.get(TOUR_FIELD).and_then(Value::as_str) {
                if !parents.iter().any(|p| p == tour) {
                    parents.push(tour.to_string());
                }
            }
        }
        parents
    }

    fn advance_watermark(&self, sequence: u64) {
        self.watermark.send_if_modified(|current| {
            if sequence > *current {
                *current = sequence;
                true
            } else {
                false
            }
        });
    }
}
