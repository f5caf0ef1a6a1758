//! Messages pushed by the authority over the live connection. Every message
//! is a JSON object discriminated by its `type` field.

use crate::match_state::{MatchAggregate, ScoreboardStylePatch};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityKind {
    GameReport,
    Scoreboard,
    PlayersList,
    MatchInfo,
}

impl VisibilityKind {
    /// The segment used for this toggle in command paths
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::GameReport => "game-report",
            Self::Scoreboard => "scoreboard",
            Self::PlayersList => "players-list",
            Self::MatchInfo => "match-info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "PushWire")]
pub enum PushMessage {
    Time {
        seconds: u32,
    },
    Status {
        is_running: Option<bool>,
        seconds: Option<u32>,
    },
    Config {
        config: MatchAggregate,
    },
    ScoreboardStyle {
        style: ScoreboardStylePatch,
    },
    Visibility {
        kind: VisibilityKind,
        is_visible: bool,
    },
    ExtraTimeStatus {
        minutes: Option<u8>,
        is_visible: Option<bool>,
    },
    FutsalClockStatus {
        is_on: bool,
    },
    /// A `type` this client does not know about
    Unknown,
}

#[derive(Debug, Error)]
#[error("undecodable push message: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

impl PushMessage {
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Time { .. } => "time",
            Self::Status { .. } => "status",
            Self::Config { .. } => "config",
            Self::ScoreboardStyle { .. } => "scoreboard_style",
            Self::Visibility { kind, .. } => match kind {
                VisibilityKind::GameReport => "game_report_visibility",
                VisibilityKind::Scoreboard => "scoreboard_visibility",
                VisibilityKind::PlayersList => "players_list_visibility",
                VisibilityKind::MatchInfo => "match_info_visibility",
            },
            Self::ExtraTimeStatus { .. } => "extra_time_status",
            Self::FutsalClockStatus { .. } => "futsal_clock_status",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PushWire {
    Time {
        seconds: u32,
    },
    Status {
        #[serde(rename = "isRunning", default)]
        is_running: Option<bool>,
        #[serde(default)]
        seconds: Option<u32>,
    },
    Config {
        config: MatchAggregate,
    },
    ScoreboardStyle {
        #[serde(default)]
        style: ScoreboardStylePatch,
    },
    GameReportVisibility {
        #[serde(rename = "isVisible")]
        is_visible: bool,
    },
    ScoreboardVisibility {
        #[serde(rename = "isVisible")]
        is_visible: bool,
    },
    PlayersListVisibility {
        #[serde(rename = "isVisible")]
        is_visible: bool,
    },
    MatchInfoVisibility {
        #[serde(rename = "isVisible")]
        is_visible: bool,
    },
    ExtraTimeStatus {
        #[serde(default)]
        minutes: Option<u8>,
        #[serde(rename = "isVisible", default)]
        is_visible: Option<bool>,
    },
    FutsalClockStatus {
        #[serde(rename = "isOn")]
        is_on: bool,
    },
    #[serde(other)]
    Unknown,
}

impl From<PushWire> for PushMessage {
    fn from(wire: PushWire) -> Self {
        let visibility = |kind, is_visible| PushMessage::Visibility { kind, is_visible };
        match wire {
            PushWire::Time { seconds } => Self::Time { seconds },
            PushWire::Status {
                is_running,
                seconds,
            } => Self::Status {
                is_running,
                seconds,
            },
            PushWire::Config { config } => Self::Config { config },
            PushWire::ScoreboardStyle { style } => Self::ScoreboardStyle { style },
            PushWire::GameReportVisibility { is_visible } => {
                visibility(VisibilityKind::GameReport, is_visible)
            }
            PushWire::ScoreboardVisibility { is_visible } => {
                visibility(VisibilityKind::Scoreboard, is_visible)
            }
            PushWire::PlayersListVisibility { is_visible } => {
                visibility(VisibilityKind::PlayersList, is_visible)
            }
            PushWire::MatchInfoVisibility { is_visible } => {
                visibility(VisibilityKind::MatchInfo, is_visible)
            }
            PushWire::ExtraTimeStatus {
                minutes,
                is_visible,
            } => Self::ExtraTimeStatus {
                minutes,
                is_visible,
            },
            PushWire::FutsalClockStatus { is_on } => Self::FutsalClockStatus { is_on },
            PushWire::Unknown => Self::Unknown,
        }
    }
}
