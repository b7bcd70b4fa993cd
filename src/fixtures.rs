//! Built-in sample records: offline fallback lists and seed documents.

use serde_json::{json, Value};

use crate::models::{Article, Booking, Doctor};

struct SampleDoctor {
    id: &'static str,
    name: &'static str,
    specialty: &'static str,
    rating: &'static str,
    distance: &'static str,
    experience: &'static str,
    price: &'static str,
    availability: &'static str,
}

static SAMPLE_DOCTORS: [SampleDoctor; 5] = [
    SampleDoctor {
        id: "1",
        name: "Dr. Sarah Johnson",
        specialty: "Cardiologist",
        rating: "4.8",
        distance: "2.1 km away",
        experience: "15+ years experience",
        price: "$150 per visit",
        availability: "Available today",
    },
    SampleDoctor {
        id: "2",
        name: "Dr. Michael Chen",
        specialty: "General Practitioner",
        rating: "4.9",
        distance: "0.8 km away",
        experience: "12+ years experience",
        price: "$120 per visit",
        availability: "Available tomorrow",
    },
    SampleDoctor {
        id: "3",
        name: "Dr. Emily Rodriguez",
        specialty: "Dermatologist",
        rating: "4.7",
        distance: "3.2 km away",
        experience: "8+ years experience",
        price: "$180 per visit",
        availability: "Available next week",
    },
    SampleDoctor {
        id: "4",
        name: "Dr. James Wilson",
        specialty: "Orthopedist",
        rating: "4.6",
        distance: "1.5 km away",
        experience: "20+ years experience",
        price: "$200 per visit",
        availability: "Available today",
    },
    SampleDoctor {
        id: "5",
        name: "Dr. Lisa Thompson",
        specialty: "Pediatrician",
        rating: "4.9",
        distance: "2.8 km away",
        experience: "10+ years experience",
        price: "$130 per visit",
        availability: "Available tomorrow",
    },
];

/// Articles shown when the article feed cannot be fetched.
pub fn sample_articles() -> Vec<Article> {
    let article = |id: &str, title: &str, author: &str, summary: &str, content: &str, image: &str, date: &str| Article {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        summary: summary.to_string(),
        content: content.to_string(),
        image_url: image.to_string(),
        date: date.to_string(),
    };

    vec![
        article(
            "1",
            "Managing Diabetes in South Africa: A Comprehensive Guide",
            "Dr. Thabo Ndlovu",
            "With diabetes on the rise in SA, learn how to manage your blood sugar levels and live a healthy life.",
            "Diabetes is a growing concern in South Africa, affecting millions of people. This guide covers blood sugar management, dietary recommendations tailored to South African cuisine, exercise tips, and how to access affordable medication through public healthcare.",
            "https://via.placeholder.com/400x250/008B8B/FFFFFF?text=MedAssist+Health",
            "2025-10-05",
        ),
        article(
            "2",
            "Winter Health Tips for South Africans",
            "Dr. Zanele Khumalo",
            "Stay healthy this winter with practical tips for preventing flu, colds, and other seasonal illnesses.",
            "As winter approaches it's important to protect yourself from seasonal illnesses. This article covers vaccination schedules, immune-boosting foods available in local markets, and when to visit your local clinic.",
            "https://via.placeholder.com/400x250/20B2AA/FFFFFF?text=MedAssist+Health",
            "2025-10-02",
        ),
        article(
            "3",
            "Mental Health Resources in South Africa",
            "Dr. Sipho Mkhize",
            "Mental health matters. Discover free and affordable mental health resources available across South Africa.",
            "South Africa offers various mental health support systems. This guide covers community health centers, online counseling services, free helplines and support groups, and how to access care through medical aid schemes.",
            "https://via.placeholder.com/400x250/006666/FFFFFF?text=MedAssist+Health",
            "2025-09-28",
        ),
        article(
            "4",
            "Understanding Medical Aid Schemes in South Africa",
            "Dr. Lerato Mokoena",
            "Navigate the complex world of medical aids and choose the right plan for you and your family.",
            "Choosing the right medical aid can be overwhelming. This article explains Prescribed Minimum Benefits, hospital plans versus comprehensive plans, and how to get the most from your benefits.",
            "https://via.placeholder.com/400x250/008B8B/FFFFFF?text=MedAssist+Health",
            "2025-09-25",
        ),
        article(
            "5",
            "Healthy Eating on a Budget in South Africa",
            "Dr. Nomvula Dlamini",
            "Nutritious meals don't have to be expensive. Learn how to eat healthy with affordable South African ingredients.",
            "Eating healthy is possible on a tight budget. This guide covers affordable foods at local markets, meal planning with staples like pap, beans and seasonal vegetables, and budget-friendly protein sources.",
            "https://via.placeholder.com/400x250/20B2AA/FFFFFF?text=MedAssist+Health",
            "2025-09-20",
        ),
    ]
}

/// Doctors shown when the provider list cannot be fetched.
pub fn sample_doctors() -> Vec<Doctor> {
    SAMPLE_DOCTORS
        .iter()
        .map(|d| Doctor {
            id: d.id.to_string(),
            name: d.name.to_string(),
            specialty: d.specialty.to_string(),
            rating: d.rating.to_string(),
            distance: d.distance.to_string(),
            experience: d.experience.to_string(),
            price: d.price.to_string(),
            availability: d.availability.to_string(),
            search_terms: Vec::new(),
        })
        .collect()
}

/// Bookings shown when the user's bookings cannot be fetched.
pub fn sample_bookings() -> Vec<Booking> {
    let booking = |id: &str, doctor_id: &str, date: &str, time: &str, status: &str| Booking {
        id: id.to_string(),
        doctor_id: doctor_id.to_string(),
        patient_name: String::new(),
        patient_email: String::new(),
        appointment_date: date.to_string(),
        appointment_time: time.to_string(),
        reason: String::new(),
        user_id: String::new(),
        status: status.to_string(),
        created_at: 0,
    };
    vec![
        booking("1", "1", "2025-01-20", "10:00 AM", "Confirmed"),
        booking("2", "2", "2025-01-22", "2:30 PM", "Pending"),
    ]
}

/// Looks up a sample doctor's display name, for rendering fallback bookings.
pub fn sample_doctor_name(doctor_id: &str) -> Option<&'static str> {
    SAMPLE_DOCTORS.iter().find(|d| d.id == doctor_id).map(|d| d.name)
}

pub fn seed_articles() -> Vec<Value> {
    vec![
        json!({
            "title": "5 Essential Tips for Better Sleep",
            "author": "Dr. Sarah Johnson",
            "summary": "Learn essential techniques to improve your sleep quality and overall health.",
            "content": "Sleep is crucial for overall health and well-being. This guide covers everything from sleep hygiene to relaxation techniques that can help you get the rest you need.",
            "imageUrl": "https://via.placeholder.com/300x200/008B8B/FFFFFF?text=Sleep+Tips",
            "date": "2025-01-15"
        }),
        json!({
            "title": "Understanding Heart Health",
            "author": "Dr. Michael Chen",
            "summary": "Your heart is your most important muscle. Discover the key factors that contribute to cardiovascular health.",
            "content": "Everything you need to know about maintaining a healthy heart. This article covers diet, exercise, and lifestyle changes that can significantly improve your heart health.",
            "imageUrl": "https://via.placeholder.com/300x200/20B2AA/FFFFFF?text=Heart+Health",
            "date": "2025-01-14"
        }),
        json!({
            "title": "Mental Health and Wellness",
            "author": "Dr. Emily Rodriguez",
            "summary": "Mental health is just as important as physical health. Explore practical strategies for managing stress.",
            "content": "Practical strategies for managing stress and maintaining good mental health, including mindfulness and meditation.",
            "imageUrl": "https://via.placeholder.com/300x200/006666/FFFFFF?text=Mental+Health",
            "date": "2025-01-13"
        }),
        json!({
            "title": "Nutrition for Active Living",
            "author": "Dr. James Wilson",
            "summary": "Fuel your body with the right nutrients to support an active lifestyle. Discover the best foods.",
            "content": "Discover the best foods to fuel an active lifestyle. This guide covers macronutrients, micronutrients, and meal planning strategies.",
            "imageUrl": "https://via.placeholder.com/300x200/008B8B/FFFFFF?text=Nutrition",
            "date": "2025-01-12"
        }),
        json!({
            "title": "Preventing Common Cold",
            "author": "Dr. Lisa Thompson",
            "summary": "Boost your immunity and avoid seasonal illnesses with these simple but effective prevention strategies.",
            "content": "Simple steps to boost your immunity, covering vitamins, hygiene practices, and lifestyle changes that help you stay healthy year-round.",
            "imageUrl": "https://via.placeholder.com/300x200/20B2AA/FFFFFF?text=Cold+Prevention",
            "date": "2025-01-11"
        }),
    ]
}

pub fn seed_doctors() -> Vec<Value> {
    let doctor = |d: &SampleDoctor, terms: [&str; 5]| {
        json!({
            "name": d.name,
            "specialty": d.specialty,
            "rating": d.rating,
            "distance": d.distance,
            "experience": d.experience,
            "price": d.price,
            "availability": d.availability,
            "searchTerms": terms,
        })
    };
    let park = SampleDoctor {
        id: "6",
        name: "Dr. David Park",
        specialty: "Neurologist",
        rating: "4.8",
        distance: "4.1 km away",
        experience: "18+ years experience",
        price: "$220 per visit",
        availability: "Available next week",
    };
    vec![
        doctor(&SAMPLE_DOCTORS[0], ["cardiology", "heart", "cardiovascular", "sarah", "johnson"]),
        doctor(&SAMPLE_DOCTORS[1], ["general", "family", "doctor", "michael", "chen"]),
        doctor(&SAMPLE_DOCTORS[2], ["dermatology", "skin", "dermatologist", "emily", "rodriguez"]),
        doctor(&SAMPLE_DOCTORS[3], ["orthopedics", "bone", "joint", "james", "wilson"]),
        doctor(&SAMPLE_DOCTORS[4], ["pediatrics", "children", "kids", "lisa", "thompson"]),
        doctor(&park, ["neurology", "brain", "nervous", "david", "park"]),
    ]
}
