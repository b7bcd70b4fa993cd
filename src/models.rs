use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::Document;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DecodeError {
    #[error("field `{field}` is not a {expected}")]
    WrongType { field: &'static str, expected: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub author: String,
    pub summary: String,
    pub content: String,
    pub image_url: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub rating: String,
    pub distance: String,
    pub experience: String,
    pub price: String,
    pub availability: String,
    pub search_terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub doctor_id: String,
    pub patient_name: String,
    pub patient_email: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub reason: String,
    pub user_id: String,
    pub status: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub doctor_id: Option<String>,
    pub patient_name: String,
    pub patient_email: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: String,
    pub status: String,
    pub message: String,
    /// False when the response was fabricated locally after a failed write.
    pub persisted: bool,
}

/// Identity returned by the hosted identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub is_logged_in: bool,
    pub user_name: String,
    pub user_email: String,
}

// Absent and null fields take the default; any other non-string is an error.
fn string_field(data: &Map<String, Value>, field: &'static str, default: &str) -> Result<String, DecodeError> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DecodeError::WrongType { field, expected: "string" }),
    }
}

fn string_list_field(data: &Map<String, Value>, field: &'static str) -> Result<Vec<String>, DecodeError> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(DecodeError::WrongType { field, expected: "string array" }),
            })
            .collect(),
        Some(_) => Err(DecodeError::WrongType { field, expected: "string array" }),
    }
}

fn millis_field(data: &Map<String, Value>, field: &'static str) -> Result<i64, DecodeError> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or(DecodeError::WrongType { field, expected: "integer" }),
        Some(_) => Err(DecodeError::WrongType { field, expected: "integer" }),
    }
}

impl Article {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let d = &doc.data;
        Ok(Article {
            id: doc.id.clone(),
            title: string_field(d, "title", "")?,
            author: string_field(d, "author", "")?,
            summary: string_field(d, "summary", "")?,
            content: string_field(d, "content", "")?,
            image_url: string_field(d, "imageUrl", "")?,
            date: string_field(d, "date", "")?,
        })
    }
}

impl Doctor {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let d = &doc.data;
        Ok(Doctor {
            id: doc.id.clone(),
            name: string_field(d, "name", "")?,
            specialty: string_field(d, "specialty", "")?,
            rating: string_field(d, "rating", "0.0")?,
            distance: string_field(d, "distance", "")?,
            experience: string_field(d, "experience", "")?,
            price: string_field(d, "price", "")?,
            availability: string_field(d, "availability", "")?,
            search_terms: string_list_field(d, "searchTerms")?,
        })
    }
}

impl Booking {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let d = &doc.data;
        Ok(Booking {
            id: doc.id.clone(),
            doctor_id: string_field(d, "doctorId", "")?,
            patient_name: string_field(d, "patientName", "")?,
            patient_email: string_field(d, "patientEmail", "")?,
            appointment_date: string_field(d, "appointmentDate", "")?,
            appointment_time: string_field(d, "appointmentTime", "")?,
            reason: string_field(d, "reason", "")?,
            user_id: string_field(d, "userId", "")?,
            status: string_field(d, "status", "")?,
            created_at: millis_field(d, "createdAt")?,
        })
    }
}
