use serde::{Deserialize, Serialize};

use super::PieceSeed;

/// Score awarded for every cleared row unless configured otherwise.
pub const DEFAULT_LINE_CLEAR_BONUS: u32 = 10;

/// Engine settings, loadable from JSON.
///
/// Missing fields take their default values:
///
/// ```
/// use blockfall_engine::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str("{}").unwrap();
/// assert_eq!(config, EngineConfig::default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Score per cleared row.
    pub line_clear_bonus: u32,
    /// Seed for the piece factory. A random seed is used when absent.
    pub seed: Option<PieceSeed>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            line_clear_bonus: DEFAULT_LINE_CLEAR_BONUS,
            seed: None,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("line clear bonus must be greater than zero")]
    ZeroLineClearBonus,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_clear_bonus == 0 {
            return Err(ConfigError::ZeroLineClearBonus);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.line_clear_bonus, 10);
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_bonus_is_rejected() {
        let config = EngineConfig {
            line_clear_bonus: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroLineClearBonus)
        ));
    }

    #[test]
    fn test_parse_partial_json() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"seed": "000000000000000000000000000000ff"}"#).unwrap();
        assert_eq!(config.line_clear_bonus, DEFAULT_LINE_CLEAR_BONUS);
        assert_eq!(
            config.seed.map(|seed| seed.to_string()).as_deref(),
            Some("000000000000000000000000000000ff")
        );
    }
}
