use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

/// Point in the call flow. Never persisted: every callback rebuilds it from
/// the route the provider invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStage {
    Entry,
    LanguageSelect,
    MainMenu,
    PnrPrompt,
    TrainStatusPrompt,
    TrainSchedulePrompt,
    RepeatMenu,
    Terminated,
}

impl CallStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::LanguageSelect => "language_select",
            Self::MainMenu => "main_menu",
            Self::PnrPrompt => "pnr_prompt",
            Self::TrainStatusPrompt => "train_status_prompt",
            Self::TrainSchedulePrompt => "train_schedule_prompt",
            Self::RepeatMenu => "repeat_menu",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for CallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback route exposed to the telephony provider, one per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Voice,
    Language,
    MainMenu,
    Pnr,
    TrainStatus,
    TrainSchedule,
    RepeatMenu,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Voice,
        Route::Language,
        Route::MainMenu,
        Route::Pnr,
        Route::TrainStatus,
        Route::TrainSchedule,
        Route::RepeatMenu,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Voice => "/voice",
            Self::Language => "/language",
            Self::MainMenu => "/main-menu",
            Self::Pnr => "/pnr",
            Self::TrainStatus => "/train-status",
            Self::TrainSchedule => "/train-schedule",
            Self::RepeatMenu => "/repeat-menu",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim().trim_start_matches('/');
        Self::ALL
            .into_iter()
            .find(|route| route.path().trim_start_matches('/') == trimmed)
    }

    pub fn stage(self) -> CallStage {
        match self {
            Self::Voice => CallStage::Entry,
            Self::Language => CallStage::LanguageSelect,
            Self::MainMenu => CallStage::MainMenu,
            Self::Pnr => CallStage::PnrPrompt,
            Self::TrainStatus => CallStage::TrainStatusPrompt,
            Self::TrainSchedule => CallStage::TrainSchedulePrompt,
            Self::RepeatMenu => CallStage::RepeatMenu,
        }
    }
}

impl FromStr for Route {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_path(value).ok_or_else(|| CoreError::UnknownRoute(value.to_string()))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Hindi,
}

impl Language {
    pub fn from_digit(digit: &str) -> Option<Self> {
        match digit {
            "1" => Some(Self::English),
            "2" => Some(Self::Hindi),
            _ => None,
        }
    }
}

/// Main menu entries keyed by the digit the caller presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    PnrStatus,
    TrainRunningStatus,
    TrainSchedule,
    BookingInfo,
    CancellationPolicy,
    Restart,
    Exit,
}

impl MenuOption {
    pub fn from_digit(digit: &str) -> Option<Self> {
        match digit {
            "1" => Some(Self::PnrStatus),
            "2" => Some(Self::TrainRunningStatus),
            "3" => Some(Self::TrainSchedule),
            "4" => Some(Self::BookingInfo),
            "5" => Some(Self::CancellationPolicy),
            "9" => Some(Self::Restart),
            "0" => Some(Self::Exit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    PnrQuery,
    TrainQuery,
    Unknown,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PnrQuery => "pnr_query",
            Self::TrainQuery => "train_query",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub status: String,
    #[serde(deserialize_with = "string_or_number")]
    pub coach: String,
    #[serde(deserialize_with = "string_or_number")]
    pub seat: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainTiming {
    #[serde(deserialize_with = "string_or_number")]
    pub departure: String,
    #[serde(deserialize_with = "string_or_number")]
    pub arrival: String,
}

/// A ticket or train entry keyed by PNR / train number in the record file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Ticket(TicketRecord),
    TrainTiming(TrainTiming),
}

impl Record {
    pub fn as_ticket(&self) -> Option<&TicketRecord> {
        match self {
            Self::Ticket(ticket) => Some(ticket),
            Self::TrainTiming(_) => None,
        }
    }

    pub fn as_train_timing(&self) -> Option<&TrainTiming> {
        match self {
            Self::TrainTiming(timing) => Some(timing),
            Self::Ticket(_) => None,
        }
    }
}

/// Identifiers the text simulation looks up for each intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoIdentifiers {
    pub pnr: String,
    pub train_number: String,
}

impl Default for DemoIdentifiers {
    fn default() -> Self {
        Self {
            pnr: "PNR123".to_string(),
            train_number: "12345".to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
