//! Typed records and enumerations for the experiment data model.
//!
//! Every enumerated code stored in the database is a closed enum here; the
//! lowercase serde representation matches both the wire format and the CHECK
//! constraints in the schema. `label()` gives the human form used by the
//! export workbook.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(Error::InvalidInput(format!("unknown gender '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vision {
    Normal,
    Corrected,
}

impl Vision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vision::Normal => "normal",
            Vision::Corrected => "corrected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Vision::Normal => "Normal",
            Vision::Corrected => "Corrected",
        }
    }
}

impl std::str::FromStr for Vision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(Vision::Normal),
            "corrected" => Ok(Vision::Corrected),
            other => Err(Error::InvalidInput(format!("unknown vision '{}'", other))),
        }
    }
}

/// Which symbol set a stimulus came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolType {
    Ai,
    Kaac,
}

impl SymbolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolType::Ai => "ai",
            SymbolType::Kaac => "kaac",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SymbolType::Ai => "AI",
            SymbolType::Kaac => "KAAC",
        }
    }
}

impl std::str::FromStr for SymbolType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ai" => Ok(SymbolType::Ai),
            "kaac" => Ok(SymbolType::Kaac),
            other => Err(Error::InvalidInput(format!("unknown symbol type '{}'", other))),
        }
    }
}

/// Counterbalancing order: which symbol block a participant saw first.
///
/// Carried as integer 1/2 on the wire and in the database, matching the
/// front-end contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum BlockOrder {
    AiFirst,
    KaacFirst,
}

impl BlockOrder {
    pub fn as_i64(&self) -> i64 {
        match self {
            BlockOrder::AiFirst => 1,
            BlockOrder::KaacFirst => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BlockOrder::AiFirst => "AI first",
            BlockOrder::KaacFirst => "KAAC first",
        }
    }
}

impl From<BlockOrder> for i64 {
    fn from(order: BlockOrder) -> i64 {
        order.as_i64()
    }
}

impl TryFrom<i64> for BlockOrder {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(BlockOrder::AiFirst),
            2 => Ok(BlockOrder::KaacFirst),
            other => Err(Error::InvalidInput(format!(
                "block_order must be 1 or 2, got {}",
                other
            ))),
        }
    }
}

/// Side of the screen the AI symbol was shown on during a forced choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolSide {
    Left,
    Right,
}

impl SymbolSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolSide::Left => "left",
            SymbolSide::Right => "right",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SymbolSide::Left => "Left",
            SymbolSide::Right => "Right",
        }
    }
}

impl std::str::FromStr for SymbolSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(SymbolSide::Left),
            "right" => Ok(SymbolSide::Right),
            other => Err(Error::InvalidInput(format!("unknown side '{}'", other))),
        }
    }
}

/// Raw forced-choice answer: a side, or "the two look similar".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceChoice {
    Left,
    Right,
    Similar,
}

impl PreferenceChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceChoice::Left => "left",
            PreferenceChoice::Right => "right",
            PreferenceChoice::Similar => "similar",
        }
    }
}

impl std::str::FromStr for PreferenceChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(PreferenceChoice::Left),
            "right" => Ok(PreferenceChoice::Right),
            "similar" => Ok(PreferenceChoice::Similar),
            other => Err(Error::InvalidInput(format!("unknown choice '{}'", other))),
        }
    }
}

/// The forced choice translated to a symbol set via the AI-position mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceType {
    Ai,
    Kaac,
    Similar,
}

impl ChoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChoiceType::Ai => "ai",
            ChoiceType::Kaac => "kaac",
            ChoiceType::Similar => "similar",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChoiceType::Ai => "AI",
            ChoiceType::Kaac => "KAAC",
            ChoiceType::Similar => "Similar",
        }
    }
}

impl std::str::FromStr for ChoiceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ai" => Ok(ChoiceType::Ai),
            "kaac" => Ok(ChoiceType::Kaac),
            "similar" => Ok(ChoiceType::Similar),
            other => Err(Error::InvalidInput(format!(
                "unknown choice type '{}'",
                other
            ))),
        }
    }
}

/// One experiment session.
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    pub id: i64,
    pub participant_id: String,
    pub name: String,
    pub phone_last4: String,
    pub age: i64,
    pub gender: Gender,
    pub education: String,
    pub vision: Vision,
    pub has_aac_experience: bool,
    pub has_aac_education: bool,
    pub consent_agreed: bool,
    pub block_order: BlockOrder,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields needed to insert a participant row (the public code and row id are
/// allocated by the store).
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub name: String,
    pub phone_last4: String,
    pub age: i64,
    pub gender: Gender,
    pub education: String,
    pub vision: Vision,
    pub has_aac_experience: bool,
    pub has_aac_education: bool,
    pub consent_agreed: bool,
    pub block_order: BlockOrder,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One stimulus-presentation-and-response unit.
#[derive(Debug, Clone, Serialize)]
pub struct TrialResponse {
    pub id: i64,
    pub participant_id: i64,
    pub trial_number: i64,
    pub is_practice: bool,
    pub target_word: String,
    pub symbol_type: SymbolType,
    pub block_type: String,
    pub presented_symbols: Vec<String>,
    pub selected_symbol: String,
    pub is_correct: bool,
    pub reaction_time: i64,
    pub error_count: i64,
    pub responded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTrial {
    pub trial_number: i64,
    pub is_practice: bool,
    pub target_word: String,
    pub symbol_type: SymbolType,
    pub block_type: String,
    pub presented_symbols: Vec<String>,
    pub selected_symbol: String,
    pub is_correct: bool,
    pub reaction_time: i64,
    pub error_count: i64,
}

/// One (participant, word) forced-choice judgment.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolPreference {
    pub id: i64,
    pub participant_id: i64,
    pub target_word: String,
    pub ai_position: SymbolSide,
    pub chosen: PreferenceChoice,
    pub chosen_type: ChoiceType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSymbolPreference {
    pub target_word: String,
    pub ai_position: SymbolSide,
    pub chosen: PreferenceChoice,
    pub chosen_type: ChoiceType,
}

/// Legacy whole-session preference judgment, superseded by
/// [`SymbolPreference`]. Kept for older client versions.
#[derive(Debug, Clone, Serialize)]
pub struct Preference {
    pub id: i64,
    pub participant_id: i64,
    pub easier_to_understand: ChoiceType,
    pub preference: ChoiceType,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPreference {
    pub easier_to_understand: ChoiceType,
    pub preference: ChoiceType,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_through_str() {
        assert_eq!("ai".parse::<SymbolType>().unwrap(), SymbolType::Ai);
        assert_eq!(SymbolType::Kaac.as_str(), "kaac");
        assert_eq!("similar".parse::<ChoiceType>().unwrap(), ChoiceType::Similar);
        assert!("AI".parse::<SymbolType>().is_err());
    }

    #[test]
    fn block_order_wire_format_is_integer() {
        let order: BlockOrder = serde_json::from_str("2").unwrap();
        assert_eq!(order, BlockOrder::KaacFirst);
        assert_eq!(serde_json::to_string(&BlockOrder::AiFirst).unwrap(), "1");
        assert!(serde_json::from_str::<BlockOrder>("3").is_err());
    }

    #[test]
    fn lowercase_serde_representation() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
        let side: SymbolSide = serde_json::from_str("\"right\"").unwrap();
        assert_eq!(side, SymbolSide::Right);
    }
}
