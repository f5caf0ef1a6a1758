use derivative::Derivative;
use serde::{Deserialize, Serialize};

/// One of the two fixed team roles. On the wire the home side is `teamA`
/// and the away side is `teamB`.
#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TeamSide {
    #[derivative(Default)]
    #[serde(rename = "teamA")]
    Home,
    #[serde(rename = "teamB")]
    Away,
}

impl TeamSide {
    pub fn other(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }

    /// The key used for this side in command bodies and JSON documents
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Home => "teamA",
            Self::Away => "teamB",
        }
    }
}

impl core::fmt::Display for TeamSide {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Self::Home => write!(f, "Home"),
            Self::Away => write!(f, "Away"),
        }
    }
}
