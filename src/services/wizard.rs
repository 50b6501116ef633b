//! Guided estimation conversation.
//!
//! Progresses linearly: Welcome → TransactionType → PropertyType → City →
//! Quartier → Surface → Rooms → Bathrooms → Loading → Result. `Restart` is the
//! only way back. The machine is independent of any transport: callers feed
//! [`Event`]s and carry out the returned [`Effect`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::format::{ResultCard, plural};
use super::models::{
    AvailableData, PredictionRequest, PredictionResult, PropertyType, TransactionType,
};

pub const SURFACE_MIN: u32 = 10;
pub const SURFACE_MAX: u32 = 10_000;
pub const MAX_ROOMS: u8 = 6;
pub const MAX_BATHROOMS: u8 = 5;

const GREETING: &str = "👋 Bonjour ! Je suis votre assistant d'estimation immobilière. Je vais vous aider à estimer le prix de votre bien au Maroc.\n\nPour commencer, quel type de transaction vous intéresse ?";
const ESTIMATE_READY: &str = "✨ Voici votre estimation :";
const ESTIMATE_FAILED: &str =
    "❌ Désolé, une erreur s'est produite lors de l'estimation. Veuillez réessayer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Welcome,
    TransactionType,
    PropertyType,
    City,
    Quartier,
    Surface,
    Rooms,
    Bathrooms,
    Loading,
    Result,
}

impl Step {
    pub const ORDER: [Step; 10] = [
        Step::Welcome,
        Step::TransactionType,
        Step::PropertyType,
        Step::City,
        Step::Quartier,
        Step::Surface,
        Step::Rooms,
        Step::Bathrooms,
        Step::Loading,
        Step::Result,
    ];

    /// The next step in the linear progression, if any.
    pub fn next(&self) -> Option<Step> {
        let index = Self::ORDER.iter().position(|s| s == self)?;
        Self::ORDER.get(index + 1).copied()
    }

    /// Steps that wait for a user answer.
    pub fn is_answering(&self) -> bool {
        !matches!(self, Step::Welcome | Step::Loading | Step::Result)
    }

    /// Assistant text announcing this step.
    fn prompt(&self) -> Option<&'static str> {
        match self {
            Step::TransactionType => Some(GREETING),
            Step::PropertyType => Some("Parfait ! Quel type de bien souhaitez-vous évaluer ?"),
            Step::City => Some("Dans quelle ville se trouve votre bien ?"),
            Step::Quartier => Some("Sélectionnez le quartier :"),
            Step::Surface => Some("Quelle est la surface du bien (en m²) ?"),
            Step::Rooms => Some("Combien de chambres ?"),
            Step::Bathrooms => Some("Combien de salles de bain ?"),
            Step::Loading => Some("🔄 Analyse en cours de vos informations..."),
            Step::Welcome | Step::Result => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Welcome => "welcome",
            Step::TransactionType => "transaction_type",
            Step::PropertyType => "property_type",
            Step::City => "city",
            Step::Quartier => "quartier",
            Step::Surface => "surface",
            Step::Rooms => "rooms",
            Step::Bathrooms => "bathrooms",
            Step::Loading => "loading",
            Step::Result => "result",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub step: Option<Step>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>, step: Option<Step>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            step,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub transaction_type: Option<TransactionType>,
    pub property_type: Option<PropertyType>,
    pub city: Option<String>,
    pub quartier: Option<String>,
    pub surface: Option<u32>,
    pub rooms: Option<u8>,
    pub bathrooms: Option<u8>,
}

impl AnswerSet {
    /// Whether the field collected at `step` is populated.
    pub fn has_answer_for(&self, step: Step) -> bool {
        match step {
            Step::TransactionType => self.transaction_type.is_some(),
            Step::PropertyType => self.property_type.is_some(),
            Step::City => self.city.is_some(),
            Step::Quartier => self.quartier.is_some(),
            Step::Surface => self.surface.is_some(),
            Step::Rooms => self.rooms.is_some(),
            Step::Bathrooms => self.bathrooms.is_some(),
            Step::Welcome | Step::Loading | Step::Result => true,
        }
    }

    pub fn to_request(&self) -> Option<PredictionRequest> {
        Some(PredictionRequest {
            transaction_type: self.transaction_type?,
            city: self.city.clone()?,
            quartier: self.quartier.clone()?,
            property_type: self.property_type?,
            surface_m2: self.surface?,
            num_rooms: self.rooms?,
            num_bathrooms: self.bathrooms?,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Start,
    Answer(String),
    PredictionSucceeded(PredictionResult),
    PredictionFailed(String),
    Restart,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Answer(_) => "answer",
            Event::PredictionSucceeded(_) => "prediction_succeeded",
            Event::PredictionFailed(_) => "prediction_failed",
            Event::Restart => "restart",
        }
    }
}

/// Side effect the caller must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    RequestPrediction(PredictionRequest),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("cannot handle {event} while at step {step}")]
    UnexpectedEvent { step: Step, event: &'static str },

    #[error("'{value}' is not an option for {step}")]
    InvalidChoice { step: Step, value: String },

    #[error("unknown city: {0}")]
    UnknownCity(String),

    #[error("unknown quartier {quartier} for {city}")]
    UnknownQuartier { city: String, quartier: String },

    #[error("Veuillez entrer une surface valide (entre 10 et 10 000 m²)")]
    InvalidSurface(String),

    #[error("answers incomplete before leaving {0}")]
    IncompleteAnswers(Step),
}

impl WizardError {
    /// Errors the user fixes by answering the same step again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, WizardError::InvalidSurface(_))
    }
}

/// Transition table: `(current step, event) → next step`.
/// `None` means the event is not accepted in that step.
pub fn transition(step: Step, event: &Event) -> Option<Step> {
    use Step::*;
    match (step, event) {
        (_, Event::Restart) => Some(TransactionType),
        (Welcome, Event::Start) => Some(TransactionType),
        (current, Event::Answer(_)) if current.is_answering() => current.next(),
        (Loading, Event::PredictionSucceeded(_) | Event::PredictionFailed(_)) => Some(Result),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Choice {
    fn new(label: impl Into<String>, value: impl Into<String>, icon: Option<&str>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            icon: icon.map(str::to_string),
        }
    }
}

/// Interactive widget attached to the active assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Control {
    Buttons { options: Vec<Choice>, columns: u8 },
    Select { options: Vec<Choice>, placeholder: String },
    NumberInput { placeholder: String, error: Option<String> },
    Loading,
    ResultCard { card: ResultCard },
    Restart { label: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub control: Option<Control>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationView {
    pub step: Step,
    pub messages: Vec<MessageView>,
    pub answers: AnswerSet,
    pub result: Option<PredictionResult>,
    pub validation_error: Option<String>,
    pub banner: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    step: Step,
    answers: AnswerSet,
    transcript: Vec<Message>,
    result: Option<PredictionResult>,
    validation_error: Option<String>,
    options: AvailableData,
    options_error: Option<String>,
    cycle: u64,
}

impl Wizard {
    /// A machine waiting in `Welcome`. `options` stay fixed for its lifetime.
    pub fn new(options: AvailableData, options_error: Option<String>) -> Self {
        Self {
            step: Step::Welcome,
            answers: AnswerSet::default(),
            transcript: Vec::new(),
            result: None,
            validation_error: None,
            options,
            options_error,
            cycle: 0,
        }
    }

    /// A machine that already greeted the user.
    pub fn started(options: AvailableData, options_error: Option<String>) -> Self {
        let mut wizard = Self::new(options, options_error);
        wizard.greet();
        wizard
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn options(&self) -> &AvailableData {
        &self.options
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn handle(&mut self, event: Event) -> Result<Effect, WizardError> {
        let next = transition(self.step, &event).ok_or(WizardError::UnexpectedEvent {
            step: self.step,
            event: event.name(),
        })?;

        match event {
            Event::Start => {
                self.greet();
                Ok(Effect::None)
            }
            Event::Answer(raw) => self.accept_answer(raw.trim(), next),
            Event::PredictionSucceeded(result) => {
                self.result = Some(result);
                self.step = next;
                self.say(ESTIMATE_READY, next);
                Ok(Effect::None)
            }
            Event::PredictionFailed(reason) => {
                tracing::warn!(%reason, cycle = self.cycle, "estimation failed");
                self.result = None;
                self.step = next;
                self.say(ESTIMATE_FAILED, next);
                Ok(Effect::None)
            }
            Event::Restart => {
                self.reset();
                self.greet();
                Ok(Effect::None)
            }
        }
    }

    fn greet(&mut self) {
        self.step = Step::TransactionType;
        if let Some(prompt) = Step::TransactionType.prompt() {
            self.say(prompt, Step::TransactionType);
        }
    }

    fn reset(&mut self) {
        self.step = Step::Welcome;
        self.answers = AnswerSet::default();
        self.transcript.clear();
        self.result = None;
        self.validation_error = None;
        self.cycle += 1;
    }

    fn say(&mut self, content: &str, step: Step) {
        self.transcript
            .push(Message::new(Role::Assistant, content, Some(step)));
    }

    fn accept_answer(&mut self, raw: &str, next: Step) -> Result<Effect, WizardError> {
        let current = self.step;
        let echo = match self.record(raw) {
            Ok(echo) => echo,
            Err(err) => {
                if err.is_recoverable() {
                    self.validation_error = Some(err.to_string());
                }
                return Err(err);
            }
        };

        if !self.answers.has_answer_for(current) {
            return Err(WizardError::IncompleteAnswers(current));
        }

        self.validation_error = None;
        self.transcript
            .push(Message::new(Role::User, echo, Some(current)));
        self.step = next;
        if let Some(prompt) = next.prompt() {
            self.say(prompt, next);
        }

        if next == Step::Loading {
            let request = self
                .answers
                .to_request()
                .ok_or(WizardError::IncompleteAnswers(current))?;
            return Ok(Effect::RequestPrediction(request));
        }
        Ok(Effect::None)
    }

    /// Validates `raw` for the current step, stores it and returns the user echo.
    fn record(&mut self, raw: &str) -> Result<String, WizardError> {
        let invalid = |step: Step| WizardError::InvalidChoice {
            step,
            value: raw.to_string(),
        };

        match self.step {
            Step::TransactionType => {
                let kind = TransactionType::parse(raw).ok_or_else(|| invalid(self.step))?;
                self.answers.transaction_type = Some(kind);
                Ok(format!("{} {}", kind.icon(), kind.label()))
            }
            Step::PropertyType => {
                let kind = PropertyType::parse(raw).ok_or_else(|| invalid(self.step))?;
                self.answers.property_type = Some(kind);
                Ok(format!("{} {}", kind.icon(), kind))
            }
            Step::City => {
                if !self.options.has_city(raw) {
                    return Err(WizardError::UnknownCity(raw.to_string()));
                }
                self.answers.city = Some(raw.to_string());
                Ok(format!("📍 {raw}"))
            }
            Step::Quartier => {
                let city = self
                    .answers
                    .city
                    .clone()
                    .ok_or(WizardError::IncompleteAnswers(Step::City))?;
                if !self.options.has_quartier(&city, raw) {
                    return Err(WizardError::UnknownQuartier {
                        city,
                        quartier: raw.to_string(),
                    });
                }
                self.answers.quartier = Some(raw.to_string());
                Ok(format!("📍 {raw}"))
            }
            Step::Surface => {
                let surface = parse_surface(raw)?;
                self.answers.surface = Some(surface);
                Ok(format!("📐 {surface} m²"))
            }
            Step::Rooms => {
                let rooms = parse_count(raw, MAX_ROOMS).ok_or_else(|| invalid(self.step))?;
                self.answers.rooms = Some(rooms);
                Ok(format!("🛏️ {}", plural(rooms, "chambre")))
            }
            Step::Bathrooms => {
                let bathrooms =
                    parse_count(raw, MAX_BATHROOMS).ok_or_else(|| invalid(self.step))?;
                self.answers.bathrooms = Some(bathrooms);
                Ok(format!("🚿 {} de bain", plural(bathrooms, "salle")))
            }
            step @ (Step::Welcome | Step::Loading | Step::Result) => {
                Err(WizardError::UnexpectedEvent {
                    step,
                    event: "answer",
                })
            }
        }
    }

    /// Choices offered for `step`, or `None` for free-form and passive steps.
    pub fn choices_for(&self, step: Step) -> Option<Vec<Choice>> {
        let choices = match step {
            Step::TransactionType => TransactionType::ALL
                .iter()
                .map(|t| Choice::new(t.label(), t.as_str(), Some(t.icon())))
                .collect(),
            Step::PropertyType => PropertyType::ALL
                .iter()
                .map(|t| Choice::new(t.as_str(), t.as_str(), Some(t.icon())))
                .collect(),
            Step::City => self
                .options
                .cities
                .iter()
                .map(|c| Choice::new(c.as_str(), c.as_str(), Some("📍")))
                .collect(),
            Step::Quartier => {
                let city = self.answers.city.as_deref().unwrap_or_default();
                self.options
                    .quartiers_of(city)
                    .iter()
                    .map(|q| Choice::new(q.as_str(), q.as_str(), Some("🏘️")))
                    .collect()
            }
            Step::Rooms => count_choices(MAX_ROOMS),
            Step::Bathrooms => count_choices(MAX_BATHROOMS),
            Step::Welcome | Step::Surface | Step::Loading | Step::Result => return None,
        };
        Some(choices)
    }

    fn control_for_current_step(&self) -> Option<Control> {
        match self.step {
            Step::TransactionType | Step::PropertyType => Some(Control::Buttons {
                options: self.choices_for(self.step)?,
                columns: 2,
            }),
            Step::Rooms | Step::Bathrooms => Some(Control::Buttons {
                options: self.choices_for(self.step)?,
                columns: 6,
            }),
            Step::City => Some(Control::Select {
                options: self.choices_for(self.step)?,
                placeholder: "Choisissez une ville...".to_string(),
            }),
            Step::Quartier => Some(Control::Select {
                options: self.choices_for(self.step)?,
                placeholder: "Choisissez un quartier...".to_string(),
            }),
            Step::Surface => Some(Control::NumberInput {
                placeholder: "Ex: 120".to_string(),
                error: self.validation_error.clone(),
            }),
            Step::Loading => Some(Control::Loading),
            Step::Result => Some(match &self.result {
                Some(result) => Control::ResultCard {
                    card: ResultCard::from(result),
                },
                None => Control::Restart {
                    label: "🔄 Nouvelle estimation".to_string(),
                },
            }),
            Step::Welcome => None,
        }
    }

    /// Snapshot for rendering. Only the latest assistant message matching the
    /// current step carries a control; older messages are plain history.
    pub fn view(&self) -> ConversationView {
        let last = self.transcript.len().saturating_sub(1);
        let messages = self
            .transcript
            .iter()
            .enumerate()
            .map(|(index, message)| {
                let active = index == last
                    && message.role == Role::Assistant
                    && message.step == Some(self.step);
                MessageView {
                    message: message.clone(),
                    control: if active {
                        self.control_for_current_step()
                    } else {
                        None
                    },
                }
            })
            .collect();

        ConversationView {
            step: self.step,
            messages,
            answers: self.answers.clone(),
            result: self.result.clone(),
            validation_error: self.validation_error.clone(),
            banner: self.options_error.clone(),
        }
    }
}

fn parse_surface(raw: &str) -> Result<u32, WizardError> {
    match raw.parse::<i64>() {
        Ok(value) if (SURFACE_MIN as i64..=SURFACE_MAX as i64).contains(&value) => Ok(value as u32),
        _ => Err(WizardError::InvalidSurface(raw.to_string())),
    }
}

/// Accepts `1..=max`, plus the `max+` spelling used by the last button.
fn parse_count(raw: &str, max: u8) -> Option<u8> {
    let digits = raw.strip_suffix('+').unwrap_or(raw);
    if digits.len() != raw.len() && digits.parse::<u8>().ok() != Some(max) {
        return None;
    }
    digits.parse::<u8>().ok().filter(|n| (1..=max).contains(n))
}

fn count_choices(max: u8) -> Vec<Choice> {
    (1..=max)
        .map(|n| {
            let label = if n == max { format!("{n}+") } else { n.to_string() };
            Choice::new(label, n.to_string(), None)
        })
        .collect()
}
