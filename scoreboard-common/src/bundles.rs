use crate::side::TeamSide;
use core::ops::{Index, IndexMut};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A value held once per team. Serializes with the authority's `teamA` /
/// `teamB` keys.
#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeAwayBundle<T> {
    #[serde(rename = "teamA")]
    pub home: T,
    #[serde(rename = "teamB")]
    pub away: T,
}

impl<T> HomeAwayBundle<T> {
    pub fn iter(&self) -> impl Iterator<Item = (TeamSide, &T)> {
        self.into_iter()
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, mut f: F) -> HomeAwayBundle<U> {
        HomeAwayBundle {
            home: f(&self.home),
            away: f(&self.away),
        }
    }
}

impl<T> Index<TeamSide> for HomeAwayBundle<T> {
    type Output = T;

    fn index(&self, side: TeamSide) -> &Self::Output {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }
}

impl<T> IndexMut<TeamSide> for HomeAwayBundle<T> {
    fn index_mut(&mut self, side: TeamSide) -> &mut Self::Output {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }
}

impl<T: Display> Display for HomeAwayBundle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Home: {}, Away: {}", self.home, self.away)
    }
}

pub struct HomeAwayBundleIterator<'a, T> {
    bundle: &'a HomeAwayBundle<T>,
    index: usize,
}

impl<'a, T> Iterator for HomeAwayBundleIterator<'a, T> {
    type Item = (TeamSide, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let value = match self.index {
            0 => (TeamSide::Home, &self.bundle.home),
            1 => (TeamSide::Away, &self.bundle.away),
            _ => return None,
        };

        self.index += 1;
        Some(value)
    }
}

impl<'a, T> IntoIterator for &'a HomeAwayBundle<T> {
    type Item = (TeamSide, &'a T);
    type IntoIter = HomeAwayBundleIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        HomeAwayBundleIterator {
            bundle: self,
            index: 0,
        }
    }
}

impl<T> IntoIterator for HomeAwayBundle<T> {
    type Item = (TeamSide, T);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        vec![(TeamSide::Home, self.home), (TeamSide::Away, self.away)].into_iter()
    }
}

impl<T: Default> FromIterator<(TeamSide, T)> for HomeAwayBundle<T> {
    fn from_iter<I: IntoIterator<Item = (TeamSide, T)>>(iter: I) -> Self {
        let mut bundle = HomeAwayBundle::default();
        for (side, value) in iter {
            bundle[side] = value;
        }
        bundle
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_index() {
        let mut bundle = HomeAwayBundle { home: 1, away: 2 };
        assert_eq!(bundle[TeamSide::Home], 1);
        assert_eq!(bundle[TeamSide::Away], 2);
        bundle[TeamSide::Away] += 3;
        assert_eq!(bundle.away, 5);
    }

    #[test]
    fn test_iter_order() {
        let bundle = HomeAwayBundle {
            home: "h",
            away: "a",
        };
        let collected: Vec<_> = bundle.iter().collect();
        assert_eq!(collected, vec![(TeamSide::Home, &"h"), (TeamSide::Away, &"a")]);
    }

    #[test]
    fn test_from_iter() {
        let bundle: HomeAwayBundle<u8> = vec![(TeamSide::Away, 7)].into_iter().collect();
        assert_eq!(bundle, HomeAwayBundle { home: 0, away: 7 });
    }

    #[test]
    fn test_serde_keys() {
        let bundle = HomeAwayBundle { home: 3u8, away: 4 };
        let json = serde_json::to_value(bundle).unwrap();
        assert_eq!(json, serde_json::json!({"teamA": 3, "teamB": 4}));
    }
}
