//! Secondary commands implied by a recorded event.
//!
//! Every rule is computed as a difference between the last committed state
//! and the state the event produces, so re-evaluating after an edit corrects
//! by exactly the change instead of applying the effect again.

use crate::settings::Settings;
use scoreboard_common::{
    match_state::{Card, CardKind, MatchAggregate, PlayerState},
    side::TeamSide,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Goal {
        side: TeamSide,
        number: u8,
    },
    Card {
        side: TeamSide,
        number: u8,
        kind: CardKind,
    },
    PlayerEdit {
        side: TeamSide,
        original_number: u8,
        number: u8,
    },
    ClockSetToPeriodEnd {
        /// The period after the one whose end was reached, if any
        next_period: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedCommand {
    SetScore {
        side: TeamSide,
        score: u32,
    },
    AddCard {
        side: TeamSide,
        number: u8,
        kind: CardKind,
        card: Card,
    },
    SetPeriod {
        name: String,
    },
}

pub fn derive_effects(
    event: &EventKind,
    before: &MatchAggregate,
    after: &MatchAggregate,
    settings: &Settings,
) -> Vec<DerivedCommand> {
    let mut effects = Vec::new();

    match event {
        EventKind::Goal { .. } | EventKind::PlayerEdit { .. } => {
            if settings.auto_add_score {
                effects.extend(score_corrections(before, after));
            }
        }
        EventKind::Card { .. } | EventKind::ClockSetToPeriodEnd { .. } => {}
    }

    let booked = match *event {
        EventKind::Card {
            side,
            number,
            kind: CardKind::Yellow,
        } => Some((side, number, number)),
        EventKind::PlayerEdit {
            side,
            original_number,
            number,
        } => Some((side, original_number, number)),
        _ => None,
    };
    if let Some((side, original_number, number)) = booked {
        if settings.auto_convert_yellow_to_red {
            let before = before.team(side).player(original_number);
            let after = after.team(side).player(number);
            if let Some(effect) = second_yellow_red(side, before, after) {
                effects.push(effect);
            }
        }
    }

    if let EventKind::ClockSetToPeriodEnd {
        next_period: Some(name),
    } = event
    {
        if settings.auto_advance_period {
            effects.push(DerivedCommand::SetPeriod { name: name.clone() });
        }
    }

    effects
}

/// Regular goals count for the scorer's team, own goals for the opponent
fn score_corrections(before: &MatchAggregate, after: &MatchAggregate) -> Vec<DerivedCommand> {
    let count = |aggregate: &MatchAggregate, side: TeamSide, own: bool| {
        let team = aggregate.team(side);
        let total = if own {
            team.own_goal_total()
        } else {
            team.regular_goal_total()
        };
        i64::try_from(total).unwrap_or(i64::MAX)
    };

    [TeamSide::Home, TeamSide::Away]
        .into_iter()
        .filter_map(|side| {
            let delta = count(after, side, false) - count(before, side, false)
                + count(after, side.other(), true)
                - count(before, side.other(), true);
            if delta == 0 {
                return None;
            }
            let score = (i64::from(before.team(side).score) + delta).max(0);
            Some(DerivedCommand::SetScore {
                side,
                score: u32::try_from(score).unwrap_or(u32::MAX),
            })
        })
        .collect()
}

fn second_yellow_red(
    side: TeamSide,
    before: Option<&PlayerState>,
    after: Option<&PlayerState>,
) -> Option<DerivedCommand> {
    let after = after?;
    let yellows_before = before.map_or(0, |p| p.yellow_cards.len());
    let limit = CardKind::Yellow.limit();

    if yellows_before < limit && after.yellow_cards.len() == limit && after.red_cards.is_empty() {
        let second_yellow = after.yellow_cards[limit - 1];
        Some(DerivedCommand::AddCard {
            side,
            number: after.number,
            kind: CardKind::Red,
            card: second_yellow,
        })
    } else {
        None
    }
}
