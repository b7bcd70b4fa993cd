//! Screen view-models. Each screen issues one gateway call, and read
//! screens fall back to the built-in samples when the call fails.

use log::{error, info, warn};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::fixtures;
use crate::gateway::{Gateway, GatewayError};
use crate::models::{Article, Booking, BookingRequest, Doctor};
use crate::prefs::{PreferenceStore, PrefsError};

pub const DEFAULT_PHONE: &str = "+1 (555) 123-4567";
pub const DEFAULT_APPOINTMENT_TIME: &str = "10:00 AM";
pub const LANGUAGES: [&str; 4] = ["English", "Spanish", "French", "German"];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Please enter a search term")]
    EmptySearch,
    #[error("Please enter the date as YYYY-MM-DD, got `{0}`")]
    InvalidDate(String),
    #[error("Unsupported language `{0}`")]
    UnknownLanguage(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Booking failed: {0}")]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Preferences(#[from] PrefsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Remote,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub source: Source,
    /// Transient message to show the user, if any.
    pub notice: Option<String>,
}

impl<T> Loaded<T> {
    fn remote(items: Vec<T>) -> Self {
        Loaded { items, source: Source::Remote, notice: None }
    }

    fn fallback(items: Vec<T>, what: &str) -> Self {
        Loaded { items, source: Source::Fallback, notice: Some(format!("Failed to load {what}")) }
    }
}

fn or_fallback<T>(result: Result<Vec<T>, GatewayError>, what: &str, samples: fn() -> Vec<T>) -> Loaded<T> {
    match result {
        Ok(items) => {
            info!("Loaded {} {} from the remote store", items.len(), what);
            Loaded::remote(items)
        }
        Err(e) => {
            error!("Failed to load {}: {}", what, e);
            Loaded::fallback(samples(), what)
        }
    }
}

pub async fn load_articles(gateway: &Gateway) -> Loaded<Article> {
    or_fallback(gateway.get_articles().await, "articles", fixtures::sample_articles)
}

pub async fn load_doctors(gateway: &Gateway) -> Loaded<Doctor> {
    or_fallback(gateway.get_doctors().await, "doctors", fixtures::sample_doctors)
}

pub async fn search_doctors(gateway: &Gateway, term: &str) -> Result<Loaded<Doctor>, ValidationError> {
    if term.trim().is_empty() {
        return Err(ValidationError::EmptySearch);
    }
    Ok(or_fallback(gateway.search_doctors(term).await, "doctors", fixtures::sample_doctors))
}

pub async fn load_bookings(gateway: &Gateway, user_id: &str) -> Loaded<Booking> {
    or_fallback(gateway.get_user_bookings(user_id).await, "bookings", fixtures::sample_bookings)
}

/// Looks a doctor up by id for the booking screen, falling back to the
/// sample doctors when the store has no match or cannot be reached.
pub async fn find_doctor(gateway: &Gateway, id: &str) -> Option<Doctor> {
    match gateway.get_doctor_by_id(id).await {
        Ok(doctor) => Some(doctor),
        Err(e) => {
            warn!("Doctor {} not loaded from the remote store: {}", id, e);
            fixtures::sample_doctors().into_iter().find(|d| d.id == id)
        }
    }
}

/// The id bookings are filed under: the provider uid when signed in,
/// otherwise the stored email.
pub fn current_user_id(gateway: &Gateway, prefs: &PreferenceStore) -> String {
    match gateway.current_user() {
        Some(user) => user.uid,
        None => prefs.user_email(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingForm {
    pub doctor_id: String,
    pub doctor_name: String,
    pub patient_name: String,
    pub patient_email: String,
    pub phone: String,
    pub reason: String,
    pub appointment_date: String,
    pub appointment_time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub doctor_name: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub patient_name: String,
    pub patient_email: String,
    pub message: String,
    pub persisted: bool,
}

fn tomorrow() -> Date {
    let today = OffsetDateTime::now_utc().date();
    today.next_day().unwrap_or(today)
}

impl BookingForm {
    /// A form for `doctor` with the patient fields taken from the session.
    pub fn prefilled(prefs: &PreferenceStore, doctor: &Doctor) -> Self {
        BookingForm {
            doctor_id: doctor.id.clone(),
            doctor_name: doctor.name.clone(),
            patient_name: prefs.user_name(),
            patient_email: prefs.user_email(),
            phone: DEFAULT_PHONE.to_string(),
            reason: String::new(),
            appointment_date: String::new(),
            appointment_time: String::new(),
        }
    }

    pub fn validate(&self) -> Result<BookingRequest, ValidationError> {
        let required = [&self.patient_name, &self.patient_email, &self.phone, &self.reason];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(ValidationError::MissingFields);
        }

        let format = format_description!("[year]-[month]-[day]");
        let date = if self.appointment_date.trim().is_empty() {
            tomorrow()
        } else {
            Date::parse(self.appointment_date.trim(), &format)
                .map_err(|_| ValidationError::InvalidDate(self.appointment_date.clone()))?
        };
        let appointment_date = date
            .format(&format)
            .map_err(|_| ValidationError::InvalidDate(self.appointment_date.clone()))?;

        let appointment_time = match self.appointment_time.trim() {
            "" => DEFAULT_APPOINTMENT_TIME.to_string(),
            t => t.to_string(),
        };

        Ok(BookingRequest {
            doctor_id: Some(self.doctor_id.clone()).filter(|id| !id.trim().is_empty()),
            patient_name: self.patient_name.trim().to_string(),
            patient_email: self.patient_email.trim().to_string(),
            appointment_date,
            appointment_time,
            reason: self.reason.trim().to_string(),
        })
    }

    /// Validates locally, then creates the booking. Nothing is sent when
    /// validation fails.
    pub async fn submit(&self, gateway: &Gateway, user_id: &str) -> Result<BookingConfirmation, SubmitError> {
        let request = self.validate()?;
        let response = gateway.create_booking(&request, user_id).await?;
        info!("Booking {} created for {}", response.id, self.doctor_name);
        Ok(BookingConfirmation {
            booking_id: response.id,
            doctor_name: self.doctor_name.clone(),
            appointment_date: request.appointment_date,
            appointment_time: request.appointment_time,
            patient_name: request.patient_name,
            patient_email: request.patient_email,
            message: response.message,
            persisted: response.persisted,
        })
    }
}

pub struct Settings<'a> {
    prefs: &'a PreferenceStore,
}

impl<'a> Settings<'a> {
    pub fn new(prefs: &'a PreferenceStore) -> Self {
        Settings { prefs }
    }

    pub fn dark_theme(&self) -> bool {
        self.prefs.is_dark_theme_enabled()
    }

    pub fn set_dark_theme(&self, enabled: bool) -> Result<(), SettingsError> {
        Ok(self.prefs.set_dark_theme_enabled(enabled)?)
    }

    pub fn notifications(&self) -> bool {
        self.prefs.are_notifications_enabled()
    }

    pub fn set_notifications(&self, enabled: bool) -> Result<(), SettingsError> {
        Ok(self.prefs.set_notifications_enabled(enabled)?)
    }

    /// Display label of the stored language, English when unrecognised.
    pub fn language_label(&self) -> &'static str {
        let stored = self.prefs.language();
        LANGUAGES
            .iter()
            .copied()
            .find(|label| label.to_lowercase() == stored)
            .unwrap_or(LANGUAGES[0])
    }

    pub fn select_language(&self, label: &str) -> Result<(), SettingsError> {
        let wanted = label.trim().to_lowercase();
        if !LANGUAGES.iter().any(|l| l.to_lowercase() == wanted) {
            return Err(ValidationError::UnknownLanguage(label.to_string()).into());
        }
        Ok(self.prefs.set_language(&wanted)?)
    }
}
