use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row of the `users` table. Profile columns stay NULL until the intake form
/// is submitted.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    /// Storage key of the most recent report.
    pub pdf_path: Option<String>,
    pub full_name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub family_history: Option<String>,
    pub previous_conditions: Option<String>,
    pub smoking_habits: Option<String>,
    pub alcohol_consumption: Option<String>,
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// The submitted intake profile, if one exists and every enumerated column parses.
    pub fn profile(&self) -> Option<UserProfile> {
        Some(UserProfile {
            full_name: self.full_name.clone()?,
            age: self.age?,
            gender: self.gender.as_deref()?.parse().ok()?,
            family_history: self.family_history.clone(),
            previous_conditions: self.previous_conditions.clone(),
            smoking_habits: self.smoking_habits.as_deref()?.parse().ok()?,
            alcohol_consumption: self.alcohol_consumption.as_deref()?.parse().ok()?,
            contact_email: self.contact_email.clone()?,
        })
    }
}

/// Medical-intake profile consumed by the report layout and the narrative prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: String,
    pub age: i32,
    pub gender: Gender,
    #[serde(default)]
    pub family_history: Option<String>,
    #[serde(default)]
    pub previous_conditions: Option<String>,
    pub smoking_habits: SmokingHabits,
    pub alcohol_consumption: AlcoholConsumption,
    pub contact_email: String,
}

pub const MAX_AGE: i32 = 120;

impl UserProfile {
    /// Full name and contact email are required; age must be within 0..=120.
    pub fn validate(&self) -> Result<(), String> {
        if self.full_name.trim().is_empty() || self.contact_email.trim().is_empty() {
            return Err("full_name and contact_email are required".to_string());
        }
        if !(0..=MAX_AGE).contains(&self.age) {
            return Err(format!("age must be between 0 and {MAX_AGE}"));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Enumerated intake fields
// ────────────────────────────────────────────────────────────────────────────

/// Declares a closed set of form options stored as their display strings.
macro_rules! form_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} option '{other}'", stringify!($name))),
                }
            }
        }
    };
}

form_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

form_enum!(SmokingHabits {
    NonSmoker => "Non-smoker",
    Occasional => "Occasional",
    Regular => "Regular",
});

form_enum!(AlcoholConsumption {
    Never => "Never",
    Occasional => "Occasional",
    Frequent => "Frequent",
});
