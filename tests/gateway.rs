mod common;

use std::sync::Arc;

use common::{alice, harness, MockIdentity};
use medassist::models::BookingRequest;
use medassist::seeder;
use medassist::store::{into_fields, MemoryDocumentStore, COLLECTION_BOOKINGS, COLLECTION_DOCTORS, COLLECTION_USERS};
use medassist::{BookingFallback, Gateway, GatewayError};
use pretty_assertions::assert_eq;
use serde_json::json;

fn request() -> BookingRequest {
    BookingRequest {
        doctor_id: None,
        patient_name: "Test Patient".to_string(),
        patient_email: "test@example.com".to_string(),
        appointment_date: "2025-01-20".to_string(),
        appointment_time: "10:00".to_string(),
        reason: "Test reason".to_string(),
    }
}

#[tokio::test]
async fn articles_come_back_newest_first() {
    let h = harness();
    seeder::seed_articles(&*h.store).await.unwrap();

    let articles = h.gateway.get_articles().await.unwrap();
    let dates: Vec<&str> = articles.iter().map(|a| a.date.as_str()).collect();
    assert_eq!(dates, vec!["2025-01-15", "2025-01-14", "2025-01-13", "2025-01-12", "2025-01-11"]);
}

#[tokio::test]
async fn malformed_records_are_skipped() {
    let h = harness();
    h.store.insert_raw("articles", "good", into_fields(json!({ "title": "Fine", "date": "2025-02-01" })).unwrap());
    h.store.insert_raw("articles", "bad", into_fields(json!({ "title": ["oops"], "date": "2025-03-01" })).unwrap());

    let articles = h.gateway.get_articles().await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].id, "good");
    assert_eq!(articles[0].author, "");
}

#[tokio::test]
async fn missing_article_is_not_found() {
    let h = harness();
    let err = h.gateway.get_article_by_id("nope").await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound { collection: "articles", .. }));
}

#[tokio::test]
async fn doctors_are_ordered_by_rating_and_unrated_ones_left_out() {
    let h = harness();
    seeder::seed_doctors(&*h.store).await.unwrap();
    h.store.insert_raw(COLLECTION_DOCTORS, "unrated", into_fields(json!({ "name": "Dr. New", "searchTerms": ["new"] })).unwrap());

    let doctors = h.gateway.get_doctors().await.unwrap();
    assert_eq!(doctors.len(), 6);
    let ratings: Vec<&str> = doctors.iter().map(|d| d.rating.as_str()).collect();
    let mut sorted = ratings.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(ratings, sorted);
    assert!(doctors.iter().all(|d| d.id != "unrated"));
}

#[tokio::test]
async fn search_is_case_insensitive_and_defaults_rating() {
    let h = harness();
    seeder::seed_doctors(&*h.store).await.unwrap();
    h.store.insert_raw(COLLECTION_DOCTORS, "unrated", into_fields(json!({ "name": "Dr. New", "searchTerms": ["heart"] })).unwrap());

    let found = h.gateway.search_doctors("  Heart ").await.unwrap();
    assert_eq!(found.len(), 2);
    let unrated = found.iter().find(|d| d.id == "unrated").unwrap();
    assert_eq!(unrated.rating, "0.0");
    assert!(found.iter().any(|d| d.name == "Dr. Sarah Johnson"));

    assert!(h.gateway.search_doctors("dentist").await.unwrap().is_empty());
}

#[tokio::test]
async fn booking_is_filed_under_the_signed_in_user() {
    let h = harness();
    h.gateway.sign_in_with_google("good-token").await.unwrap();

    let response = h.gateway.create_booking(&request(), "someone-else").await.unwrap();
    assert!(response.persisted);
    assert_eq!(response.status, "confirmed");
    assert_eq!(response.message, "Appointment booked successfully");

    let bookings = h.gateway.get_user_bookings("uid-alice").await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, response.id);
    assert_eq!(bookings[0].doctor_id, "unknown");
    assert_eq!(bookings[0].status, "confirmed");
    assert!(bookings[0].created_at > 0);
    assert!(h.gateway.get_user_bookings("someone-else").await.unwrap().is_empty());
}

#[tokio::test]
async fn user_bookings_are_newest_first() {
    let h = harness();
    for (id, created) in [("a", 1_000), ("b", 3_000), ("c", 2_000)] {
        h.store.insert_raw(
            COLLECTION_BOOKINGS,
            id,
            into_fields(json!({ "userId": "u1", "createdAt": created, "status": "Pending" })).unwrap(),
        );
    }
    h.store.insert_raw(COLLECTION_BOOKINGS, "other", into_fields(json!({ "userId": "u2", "createdAt": 9_000 })).unwrap());

    let ids: Vec<String> = h.gateway.get_user_bookings("u1").await.unwrap().into_iter().map(|b| b.id).collect();
    assert_eq!(ids, vec!["b", "c", "a"]);
}

#[tokio::test]
async fn failed_booking_write_propagates_by_default() {
    let h = harness();
    h.store.reject_writes_to(COLLECTION_BOOKINGS);
    let err = h.gateway.create_booking(&request(), "u1").await.unwrap_err();
    assert!(matches!(err, GatewayError::Store(_)));
}

#[tokio::test]
async fn synthetic_fallback_marks_the_booking_unsaved() {
    let store = Arc::new(MemoryDocumentStore::offline());
    let identity = Arc::new(MockIdentity::accepting("good-token", alice()));
    let gateway = Gateway::new(store.clone(), identity).with_booking_fallback(BookingFallback::Synthetic);

    let response = gateway.create_booking(&request(), "u1").await.unwrap();
    assert!(!response.persisted);
    assert!(response.id.starts_with("local_"));
    assert_eq!(response.message, "Appointment booked successfully (local only)");
    assert!(store.is_empty(COLLECTION_BOOKINGS));
}

#[tokio::test]
async fn profile_save_merges_and_swallows_errors() {
    let h = harness();
    let user = alice();
    h.store.insert_raw(COLLECTION_USERS, &user.uid, into_fields(json!({ "favourite": "heart" })).unwrap());

    h.gateway.save_user_profile(&user).await;
    let profile = h.gateway.get_user_profile(&user.uid).await.unwrap();
    assert_eq!(profile.get("email"), Some(&json!("alice@example.com")));
    assert_eq!(profile.get("photoUrl"), Some(&json!("")));
    assert_eq!(profile.get("favourite"), Some(&json!("heart")));

    h.store.set_offline(true);
    h.gateway.save_user_profile(&user).await;
}

#[tokio::test]
async fn sign_out_forgets_the_current_user() {
    let h = harness();
    h.gateway.sign_in_with_google("good-token").await.unwrap();
    assert!(h.gateway.is_user_signed_in());
    h.gateway.sign_out();
    assert!(!h.gateway.is_user_signed_in());
}
