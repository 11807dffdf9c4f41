//! Dependent records hanging off a hotel

use super::ids::{HotelId, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_available() -> bool {
    true
}

/// A persisted accessibility feature (`accessibility_features` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityFeature {
    pub id: RecordId,
    pub hotel_id: HotelId,
    pub name: String,
    #[serde(default = "default_available")]
    pub available: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccessibilityFeature {
    pub hotel_id: HotelId,
    pub name: String,
    pub available: bool,
    pub description: Option<String>,
}

/// A persisted compliance note (`compliance_notes` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceNote {
    pub id: RecordId,
    pub hotel_id: HotelId,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComplianceNote {
    pub hotel_id: HotelId,
    pub note: String,
}

/// A persisted guest-sentiment insight (`sentiment_insights` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentInsight {
    pub id: RecordId,
    pub hotel_id: HotelId,
    pub insight: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSentimentInsight {
    pub hotel_id: HotelId,
    pub insight: String,
}

/// Anything that belongs to exactly one hotel
pub trait HotelOwned {
    fn hotel_id(&self) -> HotelId;
}

impl HotelOwned for AccessibilityFeature {
    fn hotel_id(&self) -> HotelId {
        self.hotel_id
    }
}

impl HotelOwned for NewAccessibilityFeature {
    fn hotel_id(&self) -> HotelId {
        self.hotel_id
    }
}

impl HotelOwned for ComplianceNote {
    fn hotel_id(&self) -> HotelId {
        self.hotel_id
    }
}

impl HotelOwned for NewComplianceNote {
    fn hotel_id(&self) -> HotelId {
        self.hotel_id
    }
}

impl HotelOwned for SentimentInsight {
    fn hotel_id(&self) -> HotelId {
        self.hotel_id
    }
}

impl HotelOwned for NewSentimentInsight {
    fn hotel_id(&self) -> HotelId {
        self.hotel_id
    }
}
