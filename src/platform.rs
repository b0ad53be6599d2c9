//! # Platform Assembly
//!
//! Wires the whole system together: the database, one service per
//! collection, the mailer and the rating aggregator's consumer task.
//! Embedders build a [`Platform`] and talk to the services; everything
//! behind it is private wiring.

use std::sync::Arc;

use tracing::info;

use crate::config::PlatformConfig;
use crate::mailer::{create_mailer, EmailSender};
use crate::ratings::RatingAggregator;
use crate::services::{BookingService, ReviewService, ServiceResult, TourService, UserService};
use crate::store::Database;

/// The assembled tour platform
pub struct Platform {
    db: Arc<Database>,
    tours: TourService,
    users: UserService,
    reviews: ReviewService,
    bookings: BookingService,
    aggregator: Arc<RatingAggregator>,
    mailer: Arc<dyn EmailSender>,
}

impl Platform {
    /// Builds the platform from configuration. Must run inside a tokio
    /// runtime; the rating consumer task is spawned here.
    pub fn new(config: &PlatformConfig) -> ServiceResult<Self> {
        Self::with_mailer(config, create_mailer(config.mailer()))
    }

    /// Same wiring with a caller-supplied mailer. Tests pass the
    /// recording mock and assert on what was sent.
    pub fn with_mailer(
        config: &PlatformConfig,
        mailer: Arc<dyn EmailSender>,
    ) -> ServiceResult<Self> {
        let db = Arc::new(Database::new());

        let tours = TourService::new(Arc::clone(&db))?;
        let users = UserService::new(Arc::clone(&db), Arc::clone(&mailer))?;
        let reviews = ReviewService::new(Arc::clone(&db))?;
        let bookings = BookingService::new(Arc::clone(&db))?;

        // Collections are registered by now; the consumer can recompute
        // from its first event.
        let aggregator = RatingAggregator::spawn(Arc::clone(&db));

        info!(environment = %config.environment, "platform ready");
        Ok(Self {
            db,
            tours,
            users,
            reviews,
            bookings,
            aggregator,
            mailer,
        })
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn tours(&self) -> &TourService {
        &self.tours
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn reviews(&self) -> &ReviewService {
        &self.reviews
    }

    pub fn bookings(&self) -> &BookingService {
        &self.bookings
    }

    pub fn ratings(&self) -> &Arc<RatingAggregator> {
        &self.aggregator
    }

    pub fn mailer(&self) -> &Arc<dyn EmailSender> {
        &self.mailer
    }

    /// Waits until every mutation made so far is reflected in the tour
    /// rating statistics.
    pub async fn settle_ratings(&self) -> ServiceResult<()> {
        Ok(self.aggregator.wait_for(self.db.last_sequence()).await?)
    }
}
