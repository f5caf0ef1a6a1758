//! The configuration documents the authority persists, and the shape checks
//! run on them before an import is uploaded.

use crate::{
    match_state::{MatchAggregate, ScoreboardStyle, TeamState},
    periods::PeriodSchedule,
};
use serde_json::Value;
use thiserror::Error;

/// The `score` a lone exported team carries instead of a real score
pub const SINGLE_TEAM_SCORE_SENTINEL: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigDocument {
    TeamInfo,
    ScoreboardStyle,
    PeriodSchedule,
}

impl ConfigDocument {
    pub const ALL: [ConfigDocument; 3] = [
        ConfigDocument::TeamInfo,
        ConfigDocument::ScoreboardStyle,
        ConfigDocument::PeriodSchedule,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::TeamInfo => "team-info-config.json",
            Self::ScoreboardStyle => "scoreboard-customization.json",
            Self::PeriodSchedule => "period-settings.json",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|doc| doc.file_name() == name)
    }
}

impl core::fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::TeamInfo => write!(f, "Team Info"),
            Self::ScoreboardStyle => write!(f, "Scoreboard Customization"),
            Self::PeriodSchedule => write!(f, "Period Settings"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    /// Replaces the whole document
    FullDocument(Value),
    /// One team exported on its own; the caller has to pick a side for it
    SingleTeam(TeamState),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no JSON data to import")]
    Empty,
    #[error("import is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("{document} import has the wrong shape: {reason}")]
    Shape {
        document: ConfigDocument,
        reason: String,
    },
}

fn shape_error(document: ConfigDocument, reason: impl ToString) -> ImportError {
    ImportError::Shape {
        document,
        reason: reason.to_string(),
    }
}

/// Checks an import's shape and decides how it has to be uploaded
pub fn classify_import(document: ConfigDocument, text: &str) -> Result<ImportPayload, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }
    let value: Value = serde_json::from_str(text).map_err(ImportError::NotJson)?;

    match document {
        ConfigDocument::TeamInfo => {
            if value.get("score").and_then(Value::as_i64) == Some(SINGLE_TEAM_SCORE_SENTINEL) {
                let mut team = value;
                team["score"] = Value::from(0);
                let team: TeamState =
                    serde_json::from_value(team).map_err(|e| shape_error(document, e))?;
                return Ok(ImportPayload::SingleTeam(team));
            }
            for key in ["teamA", "teamB"] {
                if !value.get(key).is_some_and(Value::is_object) {
                    return Err(shape_error(document, format!("missing `{key}`")));
                }
            }
            serde_json::from_value::<MatchAggregate>(value.clone())
                .map_err(|e| shape_error(document, e))?;
        }
        ConfigDocument::ScoreboardStyle => {
            if !value.is_object() {
                return Err(shape_error(document, "expected an object"));
            }
            serde_json::from_value::<ScoreboardStyle>(value.clone())
                .map_err(|e| shape_error(document, e))?;
        }
        ConfigDocument::PeriodSchedule => {
            serde_json::from_value::<PeriodSchedule>(value.clone())
                .map_err(|e| shape_error(document, e))?;
        }
    }

    Ok(ImportPayload::FullDocument(value))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_file_names() {
        for doc in ConfigDocument::ALL {
            assert_eq!(ConfigDocument::from_file_name(doc.file_name()), Some(doc));
        }
        assert_eq!(ConfigDocument::from_file_name("other.json"), None);
    }

    #[test]
    fn test_empty_and_garbage() {
        assert!(matches!(
            classify_import(ConfigDocument::TeamInfo, "  \n"),
            Err(ImportError::Empty)
        ));
        assert!(matches!(
            classify_import(ConfigDocument::ScoreboardStyle, "{nope"),
            Err(ImportError::NotJson(_))
        ));
    }

    #[test]
    fn test_single_team_sentinel() {
        let text = r##"{"name": "Riverside", "abbreviation": "RIV", "score": -1,
                       "colors": {"primary": "#112233", "secondary": "#FFFFFF"},
                       "players": [{"number": 7, "name": "Ada"}]}"##;
        match classify_import(ConfigDocument::TeamInfo, text).unwrap() {
            ImportPayload::SingleTeam(team) => {
                assert_eq!(team.name, "Riverside");
                assert_eq!(team.score, 0);
                assert_eq!(team.players.len(), 1);
            }
            other => panic!("Expected a single team, got {other:?}"),
        }
    }

    #[test]
    fn test_full_team_document() {
        let text = r#"{"teamA": {"name": "A", "score": 0}, "teamB": {"name": "B", "score": 3}}"#;
        assert!(matches!(
            classify_import(ConfigDocument::TeamInfo, text).unwrap(),
            ImportPayload::FullDocument(_)
        ));

        let missing = r#"{"teamA": {"name": "A", "score": 0}}"#;
        assert!(matches!(
            classify_import(ConfigDocument::TeamInfo, missing),
            Err(ImportError::Shape { .. })
        ));
    }

    #[test]
    fn test_period_document() {
        assert!(classify_import(
            ConfigDocument::PeriodSchedule,
            r#"[{"name": "First Half", "endTime": 45}]"#
        )
        .is_ok());
        assert!(classify_import(ConfigDocument::PeriodSchedule, r#"{"name": "x"}"#).is_err());
    }

    #[test]
    fn test_style_document() {
        assert!(classify_import(ConfigDocument::ScoreboardStyle, r#"{"opacity": 80}"#).is_ok());
        assert!(classify_import(ConfigDocument::ScoreboardStyle, "[1, 2]").is_err());
    }
}
