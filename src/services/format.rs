// src/services/format.rs
use serde::{Deserialize, Serialize};

use super::models::PredictionResult;

/// Rounds to the nearest unit and groups thousands with spaces: `1 250 000`.
pub fn format_price(price: f64) -> String {
    let rounded = price.round();
    let digits = format!("{}", rounded.abs() as u64);

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Price wording used by the market view.
pub fn format_market_price(price: f64, is_location: bool) -> String {
    if is_location {
        format!("{} DH/mois", format_price(price))
    } else if price >= 1_000_000.0 {
        format!("{:.2}M DH", price / 1_000_000.0)
    } else {
        format!("{} DH", format_price(price))
    }
}

pub fn plural(count: u8, word: &str) -> String {
    if count > 1 {
        format!("{count} {word}s")
    } else {
        format!("{count} {word}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

/// Text rendition of an estimate, ready to be laid out by any client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultCard {
    pub title: String,
    pub transaction_label: String,
    pub headline: String,
    pub price: String,
    pub secondary: Option<String>,
    pub price_per_m2: String,
    pub margin: String,
    pub interval: String,
    pub summary: Vec<SummaryRow>,
    pub restart_label: String,
}

impl From<&PredictionResult> for ResultCard {
    fn from(result: &PredictionResult) -> Self {
        let prediction = &result.prediction;
        let input = &result.input;
        let is_location = result.transaction_type.is_location();

        let (headline, unit) = if is_location {
            ("Loyer mensuel estimé", "DH/mois")
        } else {
            ("Prix de vente estimé", "DH")
        };

        let secondary = if is_location {
            Some(format!(
                "Soit environ {} DH/an",
                format_price(prediction.price_dh * 12.0)
            ))
        } else {
            prediction
                .price_millions
                .filter(|m| *m != 0.0)
                .map(|m| format!("Soit environ {m:.2} Millions DH"))
        };

        let row = |label: &str, value: String| SummaryRow {
            label: label.to_string(),
            value,
        };

        ResultCard {
            title: "Estimation terminée !".to_string(),
            transaction_label: result.transaction_type.label().to_string(),
            headline: headline.to_string(),
            price: format!("{} {unit}", format_price(prediction.price_dh)),
            secondary,
            price_per_m2: format!(
                "{} DH/m²{}",
                format_price(prediction.price_per_m2),
                if is_location { "/mois" } else { "" }
            ),
            margin: format!("± {}", format_price(prediction.confidence_interval.margin)),
            interval: format!(
                "Intervalle : {} - {} DH",
                format_price(prediction.confidence_interval.min),
                format_price(prediction.confidence_interval.max)
            ),
            summary: vec![
                row(
                    "Type",
                    format!("{} {}", input.property_type.icon(), input.property_type),
                ),
                row("Ville", input.city.clone()),
                row("Quartier", input.quartier.clone()),
                row("Surface", format!("{} m²", input.surface_m2)),
                row("Chambres", input.num_rooms.to_string()),
                row("Salles de bain", input.num_bathrooms.to_string()),
            ],
            restart_label: "🔄 Nouvelle estimation".to_string(),
        }
    }
}
