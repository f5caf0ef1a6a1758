//! The operations a control surface calls. Each one validates against the
//! last pushed state, sends its primary command, then sends whatever the
//! enabled rules derive from it.

use crate::{
    commands::{Ack, CommandClient, CommandError},
    rules::{DerivedCommand, EventKind, derive_effects},
    settings::Settings,
    store::StateStore,
};
use log::*;
use scoreboard_common::{
    documents::{ConfigDocument, ImportError, ImportPayload, classify_import},
    match_state::{
        Card, CardKind, Goal, MAX_PLAYER_NUMBER, MatchAggregate, MatchState, PlayerState,
        TeamState,
    },
    match_time::{ClockReading, MatchTime, to_elapsed_seconds, to_match_time},
    periods::PeriodSchedule,
    side::TeamSide,
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("player number must be between 0 and 99, got {0}")]
    NumberOutOfRange(u8),
    #[error("player name cannot be empty")]
    EmptyName,
    #[error("{side} already has a player #{number}")]
    DuplicateNumber { side: TeamSide, number: u8 },
    #[error("{side} has no player #{number}")]
    UnknownPlayer { side: TeamSide, number: u8 },
    #[error("player #{number} already has the maximum of {limit} {kind} card(s)")]
    CardLimit {
        number: u8,
        kind: CardKind,
        limit: usize,
    },
    #[error("unknown period {0:?}")]
    UnknownPeriod(String),
    #[error(transparent)]
    Import(#[from] ImportError),
}

#[derive(Debug)]
pub struct DerivedOutcome {
    pub command: DerivedCommand,
    pub result: Result<Ack, CommandError>,
}

/// What the authority acknowledged for one operation
#[derive(Debug)]
pub struct CommandOutcome {
    pub ack: Ack,
    pub derived: Vec<DerivedOutcome>,
}

impl CommandOutcome {
    fn primary(ack: Ack) -> Self {
        Self {
            ack,
            derived: Vec::new(),
        }
    }

    pub fn all_acknowledged(&self) -> bool {
        self.derived.iter().all(|d| d.result.is_ok())
    }
}

#[derive(Debug)]
pub enum ImportOutcome {
    Uploaded(Ack),
    /// A single team was supplied; finish with
    /// [`MatchControl::import_single_team`] once a side is chosen
    NeedsSide(TeamState),
}

pub struct MatchControl {
    store: StateStore,
    client: CommandClient,
    settings: Settings,
    schedule: PeriodSchedule,
}

impl MatchControl {
    pub fn new(store: StateStore, client: CommandClient, settings: Settings) -> Self {
        Self {
            store,
            client,
            settings,
            schedule: PeriodSchedule::default(),
        }
    }

    pub fn with_schedule(mut self, schedule: PeriodSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn client(&self) -> &CommandClient {
        &self.client
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        info!("Settings changed to {settings:?}");
        self.settings = settings;
    }

    pub fn schedule(&self) -> &PeriodSchedule {
        &self.schedule
    }

    pub async fn refresh_periods(&mut self) -> Result<&PeriodSchedule, CommandError> {
        self.schedule = self.client.get_periods().await?;
        debug!("Loaded {} periods", self.schedule.periods().len());
        Ok(&self.schedule)
    }

    fn synced(&self) -> Result<(Arc<MatchState>, MatchAggregate), CommandError> {
        let state = self.store.snapshot();
        let aggregate = state.config.clone().ok_or(CommandError::NotSynced)?;
        Ok((state, aggregate))
    }

    fn boundary(&self, aggregate: &MatchAggregate) -> u16 {
        self.schedule.boundary_for(&aggregate.current_period)
    }

    /// The match time an event recorded now would get
    pub fn current_match_time(&self) -> Result<MatchTime, CommandError> {
        let (state, aggregate) = self.synced()?;
        Ok(to_match_time(
            state.timer.elapsed_seconds,
            self.boundary(&aggregate),
        ))
    }

    pub async fn record_goal(
        &self,
        side: TeamSide,
        number: u8,
        is_own_goal: bool,
    ) -> Result<CommandOutcome, CommandError> {
        let (state, before) = self.synced()?;
        let time = to_match_time(state.timer.elapsed_seconds, self.boundary(&before));
        let goal = Goal::at(time, is_own_goal);

        let mut after = before.clone();
        existing_player(&mut after, side, number)?.goals.push(goal);

        info!("Recording goal for {side} #{number} at {time} (own goal: {is_own_goal})");
        let ack = self.client.add_goal(side, number, goal).await?;
        let event = EventKind::Goal { side, number };
        Ok(self.follow_up(ack, &event, &before, &after).await)
    }

    pub async fn record_card(
        &self,
        side: TeamSide,
        number: u8,
        kind: CardKind,
    ) -> Result<CommandOutcome, CommandError> {
        let (state, before) = self.synced()?;
        let time = to_match_time(state.timer.elapsed_seconds, self.boundary(&before));
        let card = Card::at(time);

        let mut after = before.clone();
        let player = existing_player(&mut after, side, number)?;
        if player.cards(kind).len() >= kind.limit() {
            return Err(ValidationError::CardLimit {
                number,
                kind,
                limit: kind.limit(),
            }
            .into());
        }
        player.cards_mut(kind).push(card);

        info!("Recording {kind} card for {side} #{number} at {time}");
        let ack = self.client.add_card(side, number, kind, card).await?;
        let event = EventKind::Card { side, number, kind };
        Ok(self.follow_up(ack, &event, &before, &after).await)
    }

    /// Saves a player's edited details and stats. Score and card rules see
    /// the difference against the player as last pushed.
    pub async fn edit_player(
        &self,
        side: TeamSide,
        original_number: u8,
        mut edited: PlayerState,
    ) -> Result<CommandOutcome, CommandError> {
        let (_, before) = self.synced()?;
        edited.name = edited.name.trim().to_string();
        validate_identity(&edited)?;
        for kind in [CardKind::Yellow, CardKind::Red] {
            if edited.cards(kind).len() > kind.limit() {
                return Err(ValidationError::CardLimit {
                    number: edited.number,
                    kind,
                    limit: kind.limit(),
                }
                .into());
            }
        }
        if edited.number != original_number && before.team(side).player(edited.number).is_some() {
            return Err(ValidationError::DuplicateNumber {
                side,
                number: edited.number,
            }
            .into());
        }

        let mut after = before.clone();
        *existing_player(&mut after, side, original_number)? = edited.clone();

        info!("Editing {side} #{original_number}");
        let ack = self
            .client
            .edit_player(side, original_number, &edited)
            .await?;
        let event = EventKind::PlayerEdit {
            side,
            original_number,
            number: edited.number,
        };
        Ok(self.follow_up(ack, &event, &before, &after).await)
    }

    pub async fn set_clock_to_period_end(
        &self,
        period_name: &str,
    ) -> Result<CommandOutcome, CommandError> {
        let period = self
            .schedule
            .find(period_name)
            .ok_or_else(|| ValidationError::UnknownPeriod(period_name.to_string()))?;

        info!("Setting clock to the end of {period_name}");
        let ack = self.client.set_timer(period.end_time_seconds()).await?;

        let current = self.store.snapshot().config.clone().unwrap_or_default();
        let event = EventKind::ClockSetToPeriodEnd {
            next_period: self
                .schedule
                .next_after(period_name)
                .map(|p| p.name.clone()),
        };
        Ok(self.follow_up(ack, &event, &current, &current).await)
    }

    /// Sets the clock from the manual main + additional time input
    pub async fn set_clock(&self, reading: ClockReading) -> Result<CommandOutcome, CommandError> {
        let seconds = reading.to_elapsed_seconds();
        info!("Setting clock to {seconds}s");
        Ok(CommandOutcome::primary(self.client.set_timer(seconds).await?))
    }

    /// Sets the clock to the start of a literal match time in the active
    /// period
    pub async fn set_clock_to_match_time(
        &self,
        time: MatchTime,
    ) -> Result<CommandOutcome, CommandError> {
        let boundary = self
            .store
            .snapshot()
            .config
            .as_ref()
            .map_or_else(|| self.schedule.boundary_for(""), |c| self.boundary(c));
        let seconds = to_elapsed_seconds(time.regulation_minute, time.stoppage_minute, boundary);
        info!("Setting clock to {time} ({seconds}s)");
        Ok(CommandOutcome::primary(self.client.set_timer(seconds).await?))
    }

    /// The score buttons. The score never goes below zero.
    pub async fn adjust_score(
        &self,
        side: TeamSide,
        delta: i32,
    ) -> Result<CommandOutcome, CommandError> {
        let (_, aggregate) = self.synced()?;
        let current = i64::from(aggregate.team(side).score);
        let score = u32::try_from((current + i64::from(delta)).max(0)).unwrap_or(u32::MAX);
        Ok(CommandOutcome::primary(
            self.client.set_score(side, score).await?,
        ))
    }

    pub async fn add_player(
        &self,
        side: TeamSide,
        mut player: PlayerState,
    ) -> Result<CommandOutcome, CommandError> {
        let (_, aggregate) = self.synced()?;
        player.name = player.name.trim().to_string();
        validate_identity(&player)?;
        if aggregate.team(side).player(player.number).is_some() {
            return Err(ValidationError::DuplicateNumber {
                side,
                number: player.number,
            }
            .into());
        }
        Ok(CommandOutcome::primary(
            self.client.add_player(side, &player).await?,
        ))
    }

    /// Overwrites whoever holds `player.number`, starting with clean stats
    pub async fn replace_player(
        &self,
        side: TeamSide,
        mut player: PlayerState,
    ) -> Result<CommandOutcome, CommandError> {
        player.name = player.name.trim().to_string();
        validate_identity(&player)?;
        player.reset_stats();
        warn!("Replacing {side} #{} with {}", player.number, player.name);
        Ok(CommandOutcome::primary(
            self.client.replace_player(side, &player).await?,
        ))
    }

    pub async fn import_document(
        &self,
        document: ConfigDocument,
        text: &str,
    ) -> Result<ImportOutcome, CommandError> {
        match classify_import(document, text).map_err(ValidationError::from)? {
            ImportPayload::FullDocument(contents) => Ok(ImportOutcome::Uploaded(
                self.client.upload_document(document, contents).await?,
            )),
            ImportPayload::SingleTeam(team) => {
                info!("Import holds the single team {:?}", team.name);
                Ok(ImportOutcome::NeedsSide(team))
            }
        }
    }

    /// Puts an imported team on `side`, keeping the other team and the
    /// active period as last pushed, and uploads the whole team document
    pub async fn import_single_team(
        &self,
        side: TeamSide,
        team: TeamState,
    ) -> Result<Ack, CommandError> {
        let (_, mut aggregate) = self.synced()?;
        aggregate.teams[side] = team;
        let contents = serde_json::to_value(&aggregate).map_err(|source| CommandError::Decode {
            endpoint: ConfigDocument::TeamInfo.file_name().to_string(),
            source,
        })?;
        self.client
            .upload_document(ConfigDocument::TeamInfo, contents)
            .await
    }

    async fn follow_up(
        &self,
        ack: Ack,
        event: &EventKind,
        before: &MatchAggregate,
        after: &MatchAggregate,
    ) -> CommandOutcome {
        let mut outcome = CommandOutcome::primary(ack);
        for command in derive_effects(event, before, after, &self.settings) {
            info!("Issuing derived {command:?}");
            let result = match &command {
                DerivedCommand::SetScore { side, score } => {
                    self.client.set_score(*side, *score).await
                }
                DerivedCommand::AddCard {
                    side,
                    number,
                    kind,
                    card,
                } => self.client.add_card(*side, *number, *kind, *card).await,
                DerivedCommand::SetPeriod { name } => self.client.set_period(name).await,
            };
            if let Err(e) = &result {
                error!("Derived {command:?} failed: {e}");
            }
            outcome.derived.push(DerivedOutcome { command, result });
        }
        outcome
    }
}

fn validate_identity(player: &PlayerState) -> Result<(), ValidationError> {
    if player.number > MAX_PLAYER_NUMBER {
        return Err(ValidationError::NumberOutOfRange(player.number));
    }
    if player.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

fn existing_player(
    aggregate: &mut MatchAggregate,
    side: TeamSide,
    number: u8,
) -> Result<&mut PlayerState, ValidationError> {
    aggregate.teams[side]
        .player_mut(number)
        .ok_or(ValidationError::UnknownPlayer { side, number })
}
