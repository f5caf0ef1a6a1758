use crate::config::APP_NAME;
use log::*;
use serde::{Deserialize, Serialize};

const SETTINGS_NAME: &str = "settings";

/// Operator toggles kept on this machine only. Two control surfaces may
/// run with different settings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Recording or editing goals also corrects the score
    pub auto_add_score: bool,
    /// A second yellow also books a red
    pub auto_convert_yellow_to_red: bool,
    /// Setting the clock to a period's end moves on to the next period
    pub auto_advance_period: bool,
    /// Show the clock counting down to the period end
    pub futsal_clock: bool,
}

impl Settings {
    pub fn load_or_default() -> Self {
        match confy::load(APP_NAME, SETTINGS_NAME) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to read settings file, using defaults. Error: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, SETTINGS_NAME, self)?;
        info!("Saved settings: {self:?}");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ser_settings() {
        let settings = Settings {
            auto_add_score: true,
            futsal_clock: true,
            ..Default::default()
        };
        let serialized = toml::to_string(&settings).unwrap();
        let deser = toml::from_str(&serialized);
        assert_eq!(deser, Ok(settings));
    }

    #[test]
    fn test_all_off_by_default() {
        let settings = Settings::default();
        assert!(!settings.auto_add_score);
        assert!(!settings.auto_convert_yellow_to_red);
        assert!(!settings.auto_advance_period);
        assert!(!settings.futsal_clock);
    }

    #[test]
    fn test_missing_toggles_fall_back() {
        let settings: Settings = toml::from_str("auto_convert_yellow_to_red = true").unwrap();
        assert!(settings.auto_convert_yellow_to_red);
        assert!(!settings.auto_add_score);

        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }
}
