use serde::{Deserialize, Serialize};

/// Used when the active period is not in the schedule
pub const DEFAULT_PERIOD_END_MINUTES: u16 = 45;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSetting {
    pub name: String,
    /// The regulation minute at which stoppage time begins
    #[serde(rename = "endTime")]
    pub end_time_minutes: u16,
}

impl PeriodSetting {
    pub fn new(name: impl Into<String>, end_time_minutes: u16) -> Self {
        Self {
            name: name.into(),
            end_time_minutes,
        }
    }

    pub fn end_time_seconds(&self) -> u32 {
        u32::from(self.end_time_minutes) * crate::match_time::SECS_PER_MIN
    }
}

/// The ordered list of periods in a match
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodSchedule {
    periods: Vec<PeriodSetting>,
}

impl PeriodSchedule {
    pub fn new(periods: Vec<PeriodSetting>) -> Self {
        Self { periods }
    }

    pub fn periods(&self) -> &[PeriodSetting] {
        &self.periods
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&PeriodSetting> {
        self.periods.iter().find(|p| p.name == name)
    }

    /// `None` when `name` is the last period or not in the schedule
    pub fn next_after(&self, name: &str) -> Option<&PeriodSetting> {
        let index = self.periods.iter().position(|p| p.name == name)?;
        self.periods.get(index + 1)
    }

    pub fn boundary_for(&self, name: &str) -> u16 {
        self.find(name)
            .map_or(DEFAULT_PERIOD_END_MINUTES, |p| p.end_time_minutes)
    }
}

impl From<Vec<PeriodSetting>> for PeriodSchedule {
    fn from(periods: Vec<PeriodSetting>) -> Self {
        Self::new(periods)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn football() -> PeriodSchedule {
        vec![
            PeriodSetting::new("First Half", 45),
            PeriodSetting::new("Second Half", 90),
            PeriodSetting::new("Extra Time", 105),
        ]
        .into()
    }

    #[test]
    fn test_next_after() {
        let schedule = football();
        assert_eq!(schedule.next_after("First Half").unwrap().name, "Second Half");
        assert_eq!(schedule.next_after("Second Half").unwrap().name, "Extra Time");
        assert_eq!(schedule.next_after("Extra Time"), None);
        assert_eq!(schedule.next_after("Penalties"), None);
    }

    #[test]
    fn test_boundary_for() {
        let schedule = football();
        assert_eq!(schedule.boundary_for("Second Half"), 90);
        assert_eq!(schedule.boundary_for("Unknown"), DEFAULT_PERIOD_END_MINUTES);
        assert_eq!(
            PeriodSchedule::default().boundary_for(""),
            DEFAULT_PERIOD_END_MINUTES
        );
    }

    #[test]
    fn test_wire_form() {
        let schedule: PeriodSchedule =
            serde_json::from_str(r#"[{"name": "First Half", "endTime": 45}]"#).unwrap();
        assert_eq!(schedule.periods()[0].end_time_seconds(), 2700);
        assert_eq!(
            serde_json::to_value(&schedule).unwrap(),
            serde_json::json!([{"name": "First Half", "endTime": 45}])
        );
    }
}
