// src/services/models.rs
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Vente,
    Location,
}

impl TransactionType {
    pub const ALL: [TransactionType; 2] = [TransactionType::Vente, TransactionType::Location];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vente => "vente",
            Self::Location => "location",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Vente => "Vente",
            Self::Location => "Location",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Vente => "🏠",
            Self::Location => "🔑",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    pub fn is_location(&self) -> bool {
        matches!(self, Self::Location)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Appartement,
    Villa,
    Maison,
    Riad,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::Appartement,
        PropertyType::Villa,
        PropertyType::Maison,
        PropertyType::Riad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appartement => "Appartement",
            Self::Villa => "Villa",
            Self::Maison => "Maison",
            Self::Riad => "Riad",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Appartement => "🏢",
            Self::Villa => "🏡",
            Self::Maison => "🏘️",
            Self::Riad => "🕌",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selectable options served by `GET /data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableData {
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub quartiers: HashMap<String, Vec<String>>,
}

impl AvailableData {
    pub fn has_city(&self, city: &str) -> bool {
        self.cities.iter().any(|c| c == city)
    }

    pub fn quartiers_of(&self, city: &str) -> &[String] {
        self.quartiers.get(city).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_quartier(&self, city: &str, quartier: &str) -> bool {
        self.quartiers_of(city).iter().any(|q| q == quartier)
    }
}

/// Body of `POST /predict`. Field order follows the backend contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub transaction_type: TransactionType,
    pub city: String,
    pub quartier: String,
    pub property_type: PropertyType,
    pub surface_m2: u32,
    pub num_rooms: u8,
    pub num_bathrooms: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub price_dh: f64,
    /// Absent for rentals.
    #[serde(default)]
    pub price_millions: Option<f64>,
    pub price_per_m2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_monthly: Option<f64>,
    pub confidence_interval: ConfidenceInterval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub success: bool,
    #[serde(default)]
    pub transaction_type: TransactionType,
    pub prediction: Prediction,
    pub input: PredictionRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub models_loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Single-model description from `GET /model-info`. A backend answering with
/// per-transaction entries (`{"vente": {...}, "location": {...}}`) fails to
/// decode here and shows up as `model_error` on `/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub r2_score: f64,
    pub rmse: f64,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Aggregate over one transaction type. The backend answers `{}` when the
/// dataset failed to load, hence the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub prix_moyen: f64,
    #[serde(default)]
    pub prix_m2_moyen: f64,
    #[serde(default)]
    pub surface_moyenne: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub vente: TransactionSummary,
    #[serde(default)]
    pub location: TransactionSummary,
}

impl StatsSummary {
    pub fn for_kind(&self, kind: TransactionType) -> &TransactionSummary {
        match kind {
            TransactionType::Vente => &self.vente,
            TransactionType::Location => &self.location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityStats {
    pub count: u64,
    pub prix_moyen: f64,
    #[serde(default)]
    pub prix_min: Option<f64>,
    #[serde(default)]
    pub prix_max: Option<f64>,
    #[serde(default)]
    pub prix_m2_moyen: f64,
    #[serde(default)]
    pub surface_moyenne: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityStatsResponse {
    #[serde(default)]
    pub vente: Option<CityStats>,
    #[serde(default)]
    pub location: Option<CityStats>,
}

impl CityStatsResponse {
    pub fn for_kind(&self, kind: TransactionType) -> Option<&CityStats> {
        match kind {
            TransactionType::Vente => self.vente.as_ref(),
            TransactionType::Location => self.location.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuartierStat {
    pub quartier: String,
    pub count: u64,
    pub prix_moyen: f64,
}

/// Per-quartier aggregates, already sorted by the backend (highest average first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuartierStatsResponse {
    #[serde(default)]
    pub vente: Vec<QuartierStat>,
    #[serde(default)]
    pub location: Vec<QuartierStat>,
}

impl QuartierStatsResponse {
    pub fn for_kind(&self, kind: TransactionType) -> &[QuartierStat] {
        match kind {
            TransactionType::Vente => &self.vente,
            TransactionType::Location => &self.location,
        }
    }
}
