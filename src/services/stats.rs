//! Market statistics view: descriptive figures per city and quartier.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::format::{format_market_price, format_price};
use super::gateway::EstimatorGateway;
use super::models::{CityStats, QuartierStat, StatsSummary, TransactionType};
use crate::error::GatewayError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatCard {
    pub icon: String,
    pub label: String,
    pub value: String,
}

impl StatCard {
    fn new(icon: &str, label: &str, value: impl Into<String>) -> Self {
        Self {
            icon: icon.to_string(),
            label: label.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySection {
    pub city: String,
    pub kind: TransactionType,
    pub cards: Vec<StatCard>,
    pub chart: Vec<QuartierStat>,
    pub narrative: Option<String>,
    /// Set when the backend has no figures for `kind` in this city.
    pub empty: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketView {
    pub cities: Vec<String>,
    pub summary: Vec<StatCard>,
    pub city: Option<CitySection>,
}

fn summary_cards(summary: &StatsSummary) -> Vec<StatCard> {
    vec![
        StatCard::new("🏠", "Total Annonces Vente", summary.vente.count.to_string()),
        StatCard::new("🔑", "Total Annonces Location", summary.location.count.to_string()),
        StatCard::new(
            "💰",
            "Prix Moyen Vente",
            format_market_price(summary.vente.prix_moyen, false),
        ),
        StatCard::new(
            "📅",
            "Loyer Moyen",
            format_market_price(summary.location.prix_moyen, true),
        ),
    ]
}

fn city_cards(stats: &CityStats, kind: TransactionType) -> Vec<StatCard> {
    let per_m2_unit = if kind.is_location() { "DH/m²/mois" } else { "DH/m²" };
    vec![
        StatCard::new(
            "💰",
            "Prix Moyen",
            format_market_price(stats.prix_moyen, kind.is_location()),
        ),
        StatCard::new(
            "📐",
            "Surface Moyenne",
            format!("{} m²", format_price(stats.surface_moyenne)),
        ),
        StatCard::new(
            "📊",
            "Prix au m²",
            format!("{} {per_m2_unit}", format_price(stats.prix_m2_moyen)),
        ),
        StatCard::new("📋", "Nombre d'annonces", stats.count.to_string()),
    ]
}

fn no_data_message(kind: TransactionType) -> String {
    let scope = if kind.is_location() { "la location" } else { "la vente" };
    format!("Aucune donnée disponible pour {scope}")
}

/// One-paragraph reading of a city's figures.
pub fn narrative(
    city: &str,
    stats: &CityStats,
    quartiers: &[QuartierStat],
    kind: TransactionType,
) -> String {
    let surface = format_price(stats.surface_moyenne);
    let mut text = if kind.is_location() {
        format!(
            "À {city}, le loyer moyen est de {}, soit environ {} DH/m²/mois. La surface moyenne des biens en location est de {surface} m².",
            format_market_price(stats.prix_moyen, true),
            format_price(stats.prix_m2_moyen),
        )
    } else {
        format!(
            "À {city}, le prix moyen de vente est de {}, soit environ {} DH/m². La surface moyenne des biens est de {surface} m².",
            format_market_price(stats.prix_moyen, false),
            format_price(stats.prix_m2_moyen),
        )
    };

    if let Some(top) = quartiers.first() {
        let top_price = format_market_price(top.prix_moyen, kind.is_location());
        if kind.is_location() {
            text.push_str(&format!(
                " Le quartier avec les loyers les plus élevés est {} avec un loyer moyen de {top_price}.",
                top.quartier
            ));
        } else {
            text.push_str(&format!(
                " Le quartier le plus cher est {} avec un prix moyen de {top_price}.",
                top.quartier
            ));
        }
    }
    text
}

/// Build the market view. `city` defaults to the first city listed in the summary.
pub async fn market_overview(
    gateway: &dyn EstimatorGateway,
    city: Option<&str>,
    kind: TransactionType,
) -> Result<MarketView, GatewayError> {
    let summary = gateway.stats_summary().await?;

    let selected = city
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .or_else(|| summary.cities.first().cloned());

    let section = match selected {
        Some(city) => Some(city_section(gateway, city, kind).await),
        None => None,
    };

    Ok(MarketView {
        summary: summary_cards(&summary),
        cities: summary.cities,
        city: section,
    })
}

async fn city_section(
    gateway: &dyn EstimatorGateway,
    city: String,
    kind: TransactionType,
) -> CitySection {
    let mut section = CitySection {
        city,
        kind,
        cards: Vec::new(),
        chart: Vec::new(),
        narrative: None,
        empty: None,
        error: None,
    };

    let fetched = tokio::try_join!(
        gateway.city_stats(&section.city),
        gateway.quartier_stats(&section.city)
    );
    let (stats, quartiers) = match fetched {
        Ok(pair) => pair,
        Err(err) => {
            warn!(city = %section.city, error = %err, "city statistics unavailable");
            section.error = Some(err.to_string());
            return section;
        }
    };

    section.chart = quartiers.for_kind(kind).to_vec();
    match stats.for_kind(kind) {
        Some(stats) => {
            section.cards = city_cards(stats, kind);
            section.narrative = Some(narrative(&section.city, stats, &section.chart, kind));
        }
        None => section.empty = Some(no_data_message(kind)),
    }
    section
}
