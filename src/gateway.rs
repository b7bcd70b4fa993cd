//! Remote data gateway: every read and write the app makes against the
//! hosted document database and identity provider.

use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::{json, Map, Value};

use crate::identity::{IdentityError, IdentityProvider};
use crate::models::{Article, AuthUser, Booking, BookingRequest, BookingResponse, DecodeError, Doctor};
use crate::store::{
    into_fields, Direction, Document, DocumentStore, Query, StoreError, COLLECTION_ARTICLES,
    COLLECTION_BOOKINGS, COLLECTION_DOCTORS, COLLECTION_USERS,
};

pub const BOOKING_STATUS_CONFIRMED: &str = "confirmed";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("{collection}/{id} not found")]
    NotFound { collection: &'static str, id: String },
    #[error("{collection}/{id} could not be decoded: {source}")]
    Decode {
        collection: &'static str,
        id: String,
        #[source]
        source: DecodeError,
    },
}

/// What `create_booking` does when the write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingFallback {
    /// Return the store error to the caller.
    #[default]
    Propagate,
    /// Answer with a locally generated confirmation marked `persisted: false`.
    Synthetic,
}

pub struct Gateway {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    booking_fallback: BookingFallback,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// Records that fail to decode are dropped from list results.
fn decode_all<T>(
    collection: &'static str,
    docs: Vec<Document>,
    decode: fn(&Document) -> Result<T, DecodeError>,
) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match decode(doc) {
            Ok(item) => Some(item),
            Err(e) => {
                error!("Error parsing {} document {}: {}", collection, doc.id, e);
                None
            }
        })
        .collect()
}

impl Gateway {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Gateway { store, identity, booking_fallback: BookingFallback::default() }
    }

    pub fn with_booking_fallback(mut self, fallback: BookingFallback) -> Self {
        self.booking_fallback = fallback;
        self
    }

    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser, GatewayError> {
        match self.identity.sign_in_with_google(id_token).await {
            Ok(user) => {
                info!("Google sign-in successful: {}", user.uid);
                Ok(user)
            }
            Err(e) => {
                error!("Google sign-in failed: {}", e);
                Err(e.into())
            }
        }
    }

    pub fn sign_out(&self) {
        self.identity.sign_out();
        info!("User signed out");
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.identity.current_user()
    }

    pub fn is_user_signed_in(&self) -> bool {
        self.current_user().is_some()
    }

    /// Merge-writes the profile document. Failures are logged, never returned.
    pub async fn save_user_profile(&self, user: &AuthUser) {
        let now = now_millis();
        let profile = json!({
            "uid": user.uid,
            "name": user.display_name.clone().unwrap_or_default(),
            "email": user.email.clone().unwrap_or_default(),
            "photoUrl": user.photo_url.clone().unwrap_or_default(),
            "createdAt": now,
            "lastLogin": now,
        });
        let result = match into_fields(profile) {
            Ok(fields) => self.store.set_merge(COLLECTION_USERS, &user.uid, fields).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => debug!("User profile saved: {}", user.uid),
            Err(e) => error!("Error saving user profile {}: {}", user.uid, e),
        }
    }

    pub async fn get_user_profile(&self, uid: &str) -> Result<Map<String, Value>, GatewayError> {
        match self.store.get(COLLECTION_USERS, uid).await? {
            Some(doc) => Ok(doc.data),
            None => Err(GatewayError::NotFound { collection: COLLECTION_USERS, id: uid.to_string() }),
        }
    }

    pub async fn get_articles(&self) -> Result<Vec<Article>, GatewayError> {
        let query = Query::collection(COLLECTION_ARTICLES).order_by("date", Direction::Descending);
        let docs = self.store.query(&query).await.map_err(|e| {
            error!("Error fetching articles: {}", e);
            e
        })?;
        if docs.is_empty() {
            warn!("No documents found in articles collection");
        }
        let articles = decode_all(COLLECTION_ARTICLES, docs, Article::from_document);
        debug!("Fetched {} articles", articles.len());
        Ok(articles)
    }

    pub async fn get_article_by_id(&self, id: &str) -> Result<Article, GatewayError> {
        let doc = self
            .store
            .get(COLLECTION_ARTICLES, id)
            .await?
            .ok_or_else(|| GatewayError::NotFound { collection: COLLECTION_ARTICLES, id: id.to_string() })?;
        Article::from_document(&doc).map_err(|source| GatewayError::Decode {
            collection: COLLECTION_ARTICLES,
            id: id.to_string(),
            source,
        })
    }

    pub async fn get_doctors(&self) -> Result<Vec<Doctor>, GatewayError> {
        let query = Query::collection(COLLECTION_DOCTORS).order_by("rating", Direction::Descending);
        let docs = self.store.query(&query).await.map_err(|e| {
            error!("Error fetching doctors: {}", e);
            e
        })?;
        let doctors = decode_all(COLLECTION_DOCTORS, docs, Doctor::from_document);
        debug!("Fetched {} doctors", doctors.len());
        Ok(doctors)
    }

    pub async fn get_doctor_by_id(&self, id: &str) -> Result<Doctor, GatewayError> {
        let doc = self
            .store
            .get(COLLECTION_DOCTORS, id)
            .await?
            .ok_or_else(|| GatewayError::NotFound { collection: COLLECTION_DOCTORS, id: id.to_string() })?;
        Doctor::from_document(&doc).map_err(|source| GatewayError::Decode {
            collection: COLLECTION_DOCTORS,
            id: id.to_string(),
            source,
        })
    }

    pub async fn search_doctors(&self, term: &str) -> Result<Vec<Doctor>, GatewayError> {
        let term = term.trim().to_lowercase();
        let query = Query::collection(COLLECTION_DOCTORS).where_array_contains("searchTerms", term.as_str());
        let docs = self.store.query(&query).await.map_err(|e| {
            error!("Error searching doctors: {}", e);
            e
        })?;
        let doctors = decode_all(COLLECTION_DOCTORS, docs, Doctor::from_document);
        debug!("Found {} doctors matching query: {}", doctors.len(), term);
        Ok(doctors)
    }

    pub async fn create_booking(&self, booking: &BookingRequest, user_id: &str) -> Result<BookingResponse, GatewayError> {
        let actual_user_id = self.current_user().map_or_else(|| user_id.to_string(), |u| u.uid);
        let data = json!({
            "doctorId": booking.doctor_id.clone().unwrap_or_else(|| "unknown".to_string()),
            "patientName": booking.patient_name,
            "patientEmail": booking.patient_email,
            "appointmentDate": booking.appointment_date,
            "appointmentTime": booking.appointment_time,
            "reason": booking.reason,
            "userId": actual_user_id,
            "status": BOOKING_STATUS_CONFIRMED,
            "createdAt": now_millis(),
        });

        let written = match into_fields(data) {
            Ok(fields) => self.store.add(COLLECTION_BOOKINGS, fields).await,
            Err(e) => Err(e),
        };

        match written {
            Ok(id) => {
                info!("Booking created: {} for user: {}", id, actual_user_id);
                Ok(BookingResponse {
                    id,
                    status: BOOKING_STATUS_CONFIRMED.to_string(),
                    message: "Appointment booked successfully".to_string(),
                    persisted: true,
                })
            }
            Err(e) => {
                error!("Error creating booking: {}", e);
                match self.booking_fallback {
                    BookingFallback::Propagate => Err(e.into()),
                    BookingFallback::Synthetic => {
                        warn!("Booking was not stored, answering with a local confirmation");
                        Ok(BookingResponse {
                            id: format!("local_{}", now_millis()),
                            status: BOOKING_STATUS_CONFIRMED.to_string(),
                            message: "Appointment booked successfully (local only)".to_string(),
                            persisted: false,
                        })
                    }
                }
            }
        }
    }

    pub async fn get_user_bookings(&self, user_id: &str) -> Result<Vec<Booking>, GatewayError> {
        let query = Query::collection(COLLECTION_BOOKINGS)
            .where_eq("userId", user_id)
            .order_by("createdAt", Direction::Descending);
        let docs = self.store.query(&query).await.map_err(|e| {
            error!("Error fetching user bookings: {}", e);
            e
        })?;
        let bookings = decode_all(COLLECTION_BOOKINGS, docs, Booking::from_document);
        debug!("Fetched {} bookings for user: {}", bookings.len(), user_id);
        Ok(bookings)
    }
}
