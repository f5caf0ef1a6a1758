//! Requests to the authority, one per mutation. None of these touch the
//! local store; their effect shows up once the authority pushes it back.

use crate::control::ValidationError;
use log::*;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use scoreboard_common::{
    bundles::HomeAwayBundle,
    documents::ConfigDocument,
    match_state::{
        Card, CardKind, Goal, MatchAggregate, PlayerState, ScoreboardStyle, TeamColors,
        TimerPosition,
    },
    periods::PeriodSchedule,
    push::VisibilityKind,
    side::TeamSide,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} was rejected with {status}: {body}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    #[error("no match data has been received from the authority yet")]
    NotSynced,
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The authority's answer to an accepted command
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub endpoint: String,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamInfo {
    pub name: String,
    pub abbreviation: String,
}

#[derive(Debug, Clone)]
pub struct CommandClient {
    base_url: String,
    client: Client,
}

impl CommandClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = ClientBuilder::new().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<String, CommandError> {
        let url = format!("{}{endpoint}", self.base_url);
        let http_error = |source| CommandError::Http {
            endpoint: endpoint.to_string(),
            source,
        };

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        debug!("{method} {endpoint}");

        let response = request.send().await.map_err(http_error)?;
        let status = response.status();
        let text = response.text().await.map_err(http_error)?;

        if status.is_success() {
            Ok(text)
        } else {
            warn!("{method} {endpoint} failed with {status}: {text}");
            Err(CommandError::Status {
                endpoint: endpoint.to_string(),
                status,
                body: text,
            })
        }
    }

    async fn post(&self, endpoint: &str, body: Value) -> Result<Ack, CommandError> {
        let text = self.send(Method::POST, endpoint, Some(body)).await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(Ack {
            endpoint: endpoint.to_string(),
            body,
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, CommandError> {
        let text = self.send(Method::GET, endpoint, None).await?;
        serde_json::from_str(&text).map_err(|source| CommandError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    pub async fn start_timer(&self) -> Result<Ack, CommandError> {
        self.post("/api/timer/start", json!({})).await
    }

    pub async fn stop_timer(&self) -> Result<Ack, CommandError> {
        self.post("/api/timer/stop", json!({})).await
    }

    pub async fn reset_timer(&self) -> Result<Ack, CommandError> {
        self.post("/api/timer/reset", json!({})).await
    }

    pub async fn set_timer(&self, seconds: u32) -> Result<Ack, CommandError> {
        self.post("/api/timer/set", json!({ "seconds": seconds })).await
    }

    pub async fn set_score(&self, side: TeamSide, score: u32) -> Result<Ack, CommandError> {
        self.post("/api/score/set", json!({ "team": side, "score": score }))
            .await
    }

    pub async fn get_config(&self) -> Result<MatchAggregate, CommandError> {
        self.get("/api/config").await
    }

    pub async fn save_team_info(
        &self,
        teams: &HomeAwayBundle<TeamInfo>,
    ) -> Result<Ack, CommandError> {
        self.post("/api/team-info", json!(teams)).await
    }

    pub async fn save_colors(
        &self,
        colors: &HomeAwayBundle<TeamColors>,
    ) -> Result<Ack, CommandError> {
        self.post("/api/customization", json!(colors)).await
    }

    /// Opacity and scale are clamped to their allowed ranges before sending
    pub async fn save_scoreboard_style(
        &self,
        style: &ScoreboardStyle,
    ) -> Result<Ack, CommandError> {
        let style = style.clone().clamped();
        self.post("/api/scoreboard-style", json!({ "style": style }))
            .await
    }

    pub async fn save_match_info(&self, match_info: &str) -> Result<Ack, CommandError> {
        self.post("/api/match-info", json!({ "matchInfo": match_info }))
            .await
    }

    pub async fn save_layout(&self, timer_position: TimerPosition) -> Result<Ack, CommandError> {
        self.post("/api/layout", json!({ "timerPosition": timer_position }))
            .await
    }

    pub async fn set_visibility(
        &self,
        kind: VisibilityKind,
        is_visible: bool,
    ) -> Result<Ack, CommandError> {
        let endpoint = format!("/api/visibility/{}", kind.path_segment());
        self.post(&endpoint, json!({ "isVisible": is_visible }))
            .await
    }

    pub async fn add_player(
        &self,
        side: TeamSide,
        player: &PlayerState,
    ) -> Result<Ack, CommandError> {
        self.post("/api/players/add", json!({ "team": side, "player": player }))
            .await
    }

    pub async fn replace_player(
        &self,
        side: TeamSide,
        player: &PlayerState,
    ) -> Result<Ack, CommandError> {
        self.post(
            "/api/players/replace",
            json!({ "team": side, "player": player }),
        )
        .await
    }

    pub async fn delete_player(&self, side: TeamSide, number: u8) -> Result<Ack, CommandError> {
        self.post("/api/players/delete", json!({ "team": side, "number": number }))
            .await
    }

    pub async fn edit_player(
        &self,
        side: TeamSide,
        original_number: u8,
        player: &PlayerState,
    ) -> Result<Ack, CommandError> {
        self.post(
            "/api/players/edit",
            json!({ "team": side, "originalNumber": original_number, "player": player }),
        )
        .await
    }

    pub async fn reset_player_stats(&self, side: TeamSide) -> Result<Ack, CommandError> {
        self.post("/api/players/reset-stats", json!({ "team": side }))
            .await
    }

    pub async fn clear_players(&self, side: TeamSide) -> Result<Ack, CommandError> {
        self.post("/api/players/clear", json!({ "team": side })).await
    }

    pub async fn add_goal(
        &self,
        side: TeamSide,
        number: u8,
        goal: Goal,
    ) -> Result<Ack, CommandError> {
        self.post(
            "/api/players/goal",
            json!({ "team": side, "number": number, "goal": goal }),
        )
        .await
    }

    pub async fn add_card(
        &self,
        side: TeamSide,
        number: u8,
        kind: CardKind,
        card: Card,
    ) -> Result<Ack, CommandError> {
        self.post(
            "/api/players/card",
            json!({ "team": side, "number": number, "cardType": kind, "card": card }),
        )
        .await
    }

    pub async fn toggle_on_field(&self, side: TeamSide, number: u8) -> Result<Ack, CommandError> {
        self.post(
            "/api/players/toggle-on-field",
            json!({ "team": side, "number": number }),
        )
        .await
    }

    pub async fn get_periods(&self) -> Result<PeriodSchedule, CommandError> {
        self.get("/api/periods").await
    }

    pub async fn set_period(&self, name: &str) -> Result<Ack, CommandError> {
        self.post("/api/periods/set", json!({ "name": name })).await
    }

    pub async fn set_extra_time(&self, minutes: u8) -> Result<Ack, CommandError> {
        self.post("/api/extra-time", json!({ "minutes": minutes.min(99) }))
            .await
    }

    pub async fn set_extra_time_visibility(&self, is_visible: bool) -> Result<Ack, CommandError> {
        self.post(
            "/api/extra-time/visibility",
            json!({ "isVisible": is_visible }),
        )
        .await
    }

    pub async fn set_futsal_clock(&self, is_on: bool) -> Result<Ack, CommandError> {
        self.post("/api/futsal-clock", json!({ "isOn": is_on })).await
    }

    /// The raw text of a persisted document, for backup
    pub async fn download_document(
        &self,
        document: ConfigDocument,
    ) -> Result<String, CommandError> {
        let endpoint = format!("/api/json/{}", document.file_name());
        self.send(Method::GET, &endpoint, None).await
    }

    /// Replaces a persisted document wholesale
    pub async fn upload_document(
        &self,
        document: ConfigDocument,
        contents: Value,
    ) -> Result<Ack, CommandError> {
        let endpoint = format!("/api/json/{}", document.file_name());
        info!("Uploading {document}");
        self.post(&endpoint, contents).await
    }
}
