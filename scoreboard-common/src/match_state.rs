use crate::{
    bundles::HomeAwayBundle,
    match_time::MatchTime,
    push::{PushMessage, VisibilityKind},
    side::TeamSide,
};
use derivative::Derivative;
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::skip_serializing_none;

pub const MAX_PLAYER_NUMBER: u8 = 99;
pub const MAX_YELLOW_CARDS: usize = 2;
pub const MAX_RED_CARDS: usize = 1;

pub const MIN_OPACITY: u8 = 50;
pub const MAX_OPACITY: u8 = 100;
pub const MIN_SCALE: u16 = 50;
pub const MAX_SCALE: u16 = 150;

/// The root object replicated from the authority
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAggregate {
    #[serde(flatten)]
    pub teams: HomeAwayBundle<TeamState>,
    #[serde(rename = "currentPeriod", default)]
    pub current_period: String,
}

impl MatchAggregate {
    pub fn team(&self, side: TeamSide) -> &TeamState {
        &self.teams[side]
    }

    pub fn scores(&self) -> HomeAwayBundle<u32> {
        self.teams.map(|team| team.score)
    }
}

#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Debug, Clone, PartialEq, Eq, Default)]
pub struct TeamColors {
    #[derivative(Default(value = "\"#000000\".to_string()"))]
    pub primary: String,
    #[derivative(Default(value = "\"#FFFFFF\".to_string()"))]
    pub secondary: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamState {
    pub name: String,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default, deserialize_with = "non_negative_score")]
    pub score: u32,
    #[serde(default)]
    pub colors: TeamColors,
    #[serde(default)]
    pub players: Vec<PlayerState>,
}

// Older authorities let scores go negative on the wire; never show that
fn non_negative_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = i64::deserialize(deserializer)?;
    Ok(u32::try_from(raw.max(0)).unwrap_or(u32::MAX))
}

impl TeamState {
    pub fn player(&self, number: u8) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.number == number)
    }

    pub fn player_mut(&mut self, number: u8) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| p.number == number)
    }

    /// On-field players first, each group by ascending number
    pub fn sorted_roster(&self) -> Vec<&PlayerState> {
        let mut roster: Vec<_> = self.players.iter().collect();
        roster.sort_by_key(|p| (!p.on_field, p.number));
        roster
    }

    pub fn regular_goal_total(&self) -> usize {
        self.players.iter().map(PlayerState::regular_goal_count).sum()
    }

    pub fn own_goal_total(&self) -> usize {
        self.players.iter().map(PlayerState::own_goal_count).sum()
    }

    pub fn yellow_card_total(&self) -> usize {
        self.players.iter().map(|p| p.yellow_cards.len()).sum()
    }

    pub fn red_card_total(&self) -> usize {
        self.players.iter().map(|p| p.red_cards.len()).sum()
    }

    pub fn display_code(&self) -> &str {
        if self.abbreviation.is_empty() {
            &self.name
        } else {
            &self.abbreviation
        }
    }

    pub fn formatted_score(&self) -> String {
        format!("{:02}", self.score)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub number: u8,
    pub name: String,
    #[serde(rename = "onField", default)]
    pub on_field: bool,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(rename = "yellowCards", default)]
    pub yellow_cards: Vec<Card>,
    #[serde(rename = "redCards", default)]
    pub red_cards: Vec<Card>,
}

impl PlayerState {
    pub fn new(number: u8, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn regular_goal_count(&self) -> usize {
        self.goals.iter().filter(|g| !g.is_own_goal).count()
    }

    pub fn own_goal_count(&self) -> usize {
        self.goals.iter().filter(|g| g.is_own_goal).count()
    }

    pub fn cards(&self, kind: CardKind) -> &[Card] {
        match kind {
            CardKind::Yellow => &self.yellow_cards,
            CardKind::Red => &self.red_cards,
        }
    }

    pub fn cards_mut(&mut self, kind: CardKind) -> &mut Vec<Card> {
        match kind {
            CardKind::Yellow => &mut self.yellow_cards,
            CardKind::Red => &mut self.red_cards,
        }
    }

    /// Clears goals and cards, keeping identity and field status
    pub fn reset_stats(&mut self) {
        self.goals.clear();
        self.yellow_cards.clear();
        self.red_cards.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(rename = "regMinute")]
    pub regulation_minute: u16,
    #[serde(rename = "addMinute", default)]
    pub stoppage_minute: u16,
    #[serde(rename = "isOwnGoal", default)]
    pub is_own_goal: bool,
}

impl Goal {
    pub fn at(time: MatchTime, is_own_goal: bool) -> Self {
        Self {
            regulation_minute: time.regulation_minute,
            stoppage_minute: time.stoppage_minute,
            is_own_goal,
        }
    }

    pub fn time(&self) -> MatchTime {
        MatchTime::new(self.regulation_minute, self.stoppage_minute)
    }
}

/// A booking. Decodes from either the two-field form or the legacy bare
/// minute number, always encodes in the two-field form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CardWire")]
pub struct Card {
    #[serde(rename = "regMinute")]
    pub regulation_minute: u16,
    #[serde(rename = "addMinute")]
    pub stoppage_minute: u16,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CardWire {
    Minute(u16),
    Timed {
        #[serde(rename = "regMinute")]
        regulation_minute: u16,
        #[serde(rename = "addMinute", default)]
        stoppage_minute: u16,
    },
}

impl From<CardWire> for Card {
    fn from(wire: CardWire) -> Self {
        match wire {
            CardWire::Minute(regulation_minute) => Self {
                regulation_minute,
                stoppage_minute: 0,
            },
            CardWire::Timed {
                regulation_minute,
                stoppage_minute,
            } => Self {
                regulation_minute,
                stoppage_minute,
            },
        }
    }
}

impl Card {
    pub fn at(time: MatchTime) -> Self {
        Self {
            regulation_minute: time.regulation_minute,
            stoppage_minute: time.stoppage_minute,
        }
    }

    pub fn time(&self) -> MatchTime {
        MatchTime::new(self.regulation_minute, self.stoppage_minute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Yellow,
    Red,
}

impl CardKind {
    pub fn limit(self) -> usize {
        match self {
            Self::Yellow => MAX_YELLOW_CARDS,
            Self::Red => MAX_RED_CARDS,
        }
    }
}

impl core::fmt::Display for CardKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Yellow => write!(f, "yellow"),
            Self::Red => write!(f, "red"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStatus {
    #[serde(rename = "isRunning")]
    pub is_running: bool,
    #[serde(rename = "seconds")]
    pub elapsed_seconds: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraTimeStatus {
    pub minutes: u8,
    #[serde(rename = "isVisible")]
    pub is_visible: bool,
}

#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TimerPosition {
    #[derivative(Default)]
    Under,
    Right,
}

#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ScoreboardStyle {
    #[derivative(Default(value = "\"#000000\".to_string()"))]
    pub primary: String,
    #[derivative(Default(value = "\"#FFFFFF\".to_string()"))]
    pub secondary: String,
    #[derivative(Default(value = "\"#ffd700\".to_string()"))]
    pub tertiary: String,
    #[derivative(Default(value = "75"))]
    pub opacity: u8,
    #[derivative(Default(value = "100"))]
    pub scale: u16,
    #[serde(rename = "matchInfo")]
    pub match_info: String,
    #[serde(rename = "timerPosition")]
    pub timer_position: TimerPosition,
    #[derivative(Default(value = "true"))]
    #[serde(rename = "showCards")]
    pub show_cards: bool,
}

impl ScoreboardStyle {
    pub fn clamped(mut self) -> Self {
        self.opacity = self.opacity.clamp(MIN_OPACITY, MAX_OPACITY);
        self.scale = self.scale.clamp(MIN_SCALE, MAX_SCALE);
        self
    }
}

/// A `scoreboard_style` payload. Every absent field keeps its last known
/// value.
#[skip_serializing_none]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreboardStylePatch {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub tertiary: Option<String>,
    pub opacity: Option<u8>,
    pub scale: Option<u16>,
    #[serde(rename = "matchInfo")]
    pub match_info: Option<String>,
    #[serde(rename = "timerPosition")]
    pub timer_position: Option<TimerPosition>,
    #[serde(rename = "showCards")]
    pub show_cards: Option<bool>,
}

impl ScoreboardStylePatch {
    pub fn apply_to(self, base: ScoreboardStyle) -> ScoreboardStyle {
        ScoreboardStyle {
            primary: self.primary.unwrap_or(base.primary),
            secondary: self.secondary.unwrap_or(base.secondary),
            tertiary: self.tertiary.unwrap_or(base.tertiary),
            opacity: self.opacity.unwrap_or(base.opacity),
            scale: self.scale.unwrap_or(base.scale),
            match_info: self.match_info.unwrap_or(base.match_info),
            timer_position: self.timer_position.unwrap_or(base.timer_position),
            show_cards: self.show_cards.unwrap_or(base.show_cards),
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub game_report: bool,
    #[derivative(Default(value = "true"))]
    pub scoreboard: bool,
    pub players_list: bool,
    pub match_info: bool,
}

impl Visibility {
    pub fn get(&self, kind: VisibilityKind) -> bool {
        match kind {
            VisibilityKind::GameReport => self.game_report,
            VisibilityKind::Scoreboard => self.scoreboard,
            VisibilityKind::PlayersList => self.players_list,
            VisibilityKind::MatchInfo => self.match_info,
        }
    }

    fn set(&mut self, kind: VisibilityKind, value: bool) {
        match kind {
            VisibilityKind::GameReport => self.game_report = value,
            VisibilityKind::Scoreboard => self.scoreboard = value,
            VisibilityKind::PlayersList => self.players_list = value,
            VisibilityKind::MatchInfo => self.match_info = value,
        }
    }
}

/// Everything a display surface mirrors from the authority.
///
/// `config` stays `None` until the first `config` push arrives; consumers
/// treat that as "not yet connected".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MatchState {
    pub config: Option<MatchAggregate>,
    pub timer: TimerStatus,
    pub extra_time: ExtraTimeStatus,
    pub style: ScoreboardStyle,
    pub visibility: Visibility,
    pub futsal_clock_on: bool,
    pub version: u64,
}

impl MatchState {
    /// Folds one push into the state. Returns `false` for messages that
    /// carry nothing to apply, in which case the state is untouched.
    pub fn apply(&mut self, message: PushMessage) -> bool {
        match message {
            PushMessage::Status {
                is_running: None,
                seconds: None,
            }
            | PushMessage::ExtraTimeStatus {
                minutes: None,
                is_visible: None,
            }
            | PushMessage::Unknown => return false,
            PushMessage::Time { seconds } => self.timer.elapsed_seconds = seconds,
            PushMessage::Status {
                is_running,
                seconds,
            } => {
                if let Some(is_running) = is_running {
                    self.timer.is_running = is_running;
                }
                if let Some(seconds) = seconds {
                    self.timer.elapsed_seconds = seconds;
                }
            }
            PushMessage::Config { config } => self.config = Some(config),
            PushMessage::ScoreboardStyle { style } => {
                self.style = style.apply_to(core::mem::take(&mut self.style));
            }
            PushMessage::Visibility { kind, is_visible } => {
                self.visibility.set(kind, is_visible)
            }
            PushMessage::ExtraTimeStatus {
                minutes,
                is_visible,
            } => {
                if let Some(minutes) = minutes {
                    self.extra_time.minutes = minutes;
                }
                if let Some(is_visible) = is_visible {
                    self.extra_time.is_visible = is_visible;
                }
            }
            PushMessage::FutsalClockStatus { is_on } => self.futsal_clock_on = is_on,
        }
        self.version += 1;
        true
    }

    pub fn is_synced(&self) -> bool {
        self.config.is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn sample_team() -> serde_json::Value {
        json!({
            "name": "Riverside",
            "abbreviation": "RIV",
            "score": 2,
            "colors": {"primary": "#112233", "secondary": "#FFFFFF"},
            "players": [
                {
                    "number": 9,
                    "name": "Ada",
                    "onField": true,
                    "goals": [
                        {"regMinute": 12, "addMinute": 0, "isOwnGoal": false},
                        {"regMinute": 45, "addMinute": 2, "isOwnGoal": true}
                    ],
                    "yellowCards": [30],
                    "redCards": [{"regMinute": 45, "addMinute": 1}]
                },
                {"number": 4, "name": "Bo"}
            ]
        })
    }

    #[test]
    fn test_decode_aggregate() {
        let aggregate: MatchAggregate = serde_json::from_value(json!({
            "teamA": sample_team(),
            "teamB": {"name": "Hillside", "abbreviation": "HIL", "score": 0,
                      "colors": {"primary": "#000000", "secondary": "#FFFFFF"}},
            "currentPeriod": "First Half"
        }))
        .unwrap();

        assert_eq!(aggregate.current_period, "First Half");
        let home = aggregate.team(TeamSide::Home);
        assert_eq!(home.score, 2);
        assert_eq!(home.players.len(), 2);

        let ada = home.player(9).unwrap();
        assert_eq!(ada.regular_goal_count(), 1);
        assert_eq!(ada.own_goal_count(), 1);
        assert_eq!(ada.yellow_cards, vec![Card::at(MatchTime::new(30, 0))]);
        assert_eq!(ada.red_cards[0].time(), MatchTime::new(45, 1));

        let bo = home.player(4).unwrap();
        assert!(!bo.on_field);
        assert!(bo.goals.is_empty());

        assert!(aggregate.team(TeamSide::Away).players.is_empty());
    }

    #[test]
    fn test_card_encodes_two_field_form() {
        let card: Card = serde_json::from_value(json!(17)).unwrap();
        assert_eq!(
            serde_json::to_value(card).unwrap(),
            json!({"regMinute": 17, "addMinute": 0})
        );
    }

    #[test]
    fn test_negative_score_is_clamped() {
        let team: TeamState =
            serde_json::from_value(json!({"name": "X", "score": -3})).unwrap();
        assert_eq!(team.score, 0);
        assert_eq!(team.formatted_score(), "00");
    }

    #[test]
    fn test_sorted_roster() {
        let mut team: TeamState = serde_json::from_value(sample_team()).unwrap();
        team.players.push(PlayerState {
            on_field: true,
            ..PlayerState::new(2, "Cy")
        });
        let numbers: Vec<u8> = team.sorted_roster().iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![2, 9, 4]);
    }

    #[test]
    fn test_team_totals() {
        let team: TeamState = serde_json::from_value(sample_team()).unwrap();
        assert_eq!(team.regular_goal_total(), 1);
        assert_eq!(team.own_goal_total(), 1);
        assert_eq!(team.yellow_card_total(), 1);
        assert_eq!(team.red_card_total(), 1);
        assert_eq!(team.display_code(), "RIV");
    }

    #[test]
    fn test_style_defaults_and_clamp() {
        let style: ScoreboardStyle = serde_json::from_value(json!({"opacity": 20})).unwrap();
        assert_eq!(style.primary, "#000000");
        assert_eq!(style.tertiary, "#ffd700");
        assert_eq!(style.scale, 100);
        assert!(style.show_cards);
        assert_eq!(style.clamped().opacity, MIN_OPACITY);
    }

    #[test]
    fn test_style_patch_keeps_last_known() {
        let base = ScoreboardStyle {
            match_info: "Cup Final".to_string(),
            opacity: 90,
            ..Default::default()
        };
        let patch: ScoreboardStylePatch =
            serde_json::from_value(json!({"primary": "#ff0000"})).unwrap();
        let merged = patch.apply_to(base);
        assert_eq!(merged.primary, "#ff0000");
        assert_eq!(merged.match_info, "Cup Final");
        assert_eq!(merged.opacity, 90);
    }

    #[test]
    fn test_apply_bumps_version() {
        let mut state = MatchState::default();
        assert!(!state.is_synced());

        assert!(state.apply(PushMessage::Time { seconds: 61 }));
        assert!(state.apply(PushMessage::Status {
            is_running: Some(true),
            seconds: None,
        }));
        assert_eq!(state.timer.elapsed_seconds, 61);
        assert!(state.timer.is_running);
        assert_eq!(state.version, 2);

        assert!(!state.apply(PushMessage::Unknown));
        assert_eq!(state.version, 2);
    }

    #[test]
    fn test_empty_status_changes_nothing() {
        let mut state = MatchState::default();
        state.apply(PushMessage::Time { seconds: 300 });
        let before = state.clone();

        assert!(!state.apply(PushMessage::Status {
            is_running: None,
            seconds: None,
        }));
        assert!(!state.apply(PushMessage::ExtraTimeStatus {
            minutes: None,
            is_visible: None,
        }));
        assert_eq!(state, before);
        assert_eq!(state.version, 1);
    }

    #[test]
    fn test_apply_visibility_and_extra_time() {
        let mut state = MatchState::default();
        assert!(state.visibility.scoreboard);

        state.apply(PushMessage::Visibility {
            kind: VisibilityKind::Scoreboard,
            is_visible: false,
        });
        state.apply(PushMessage::ExtraTimeStatus {
            minutes: Some(4),
            is_visible: None,
        });
        state.apply(PushMessage::ExtraTimeStatus {
            minutes: None,
            is_visible: Some(true),
        });

        assert!(!state.visibility.get(VisibilityKind::Scoreboard));
        assert_eq!(
            state.extra_time,
            ExtraTimeStatus {
                minutes: 4,
                is_visible: true
            }
        );
    }
}
