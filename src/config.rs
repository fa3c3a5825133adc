use serde::{Deserialize, Serialize};

use crate::errors::{Result, TrackerError};
use crate::types::CardColor;

/// tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub currency: CurrencyFormat,
    pub calendar: CalendarConfig,
    pub default_card_color: CardColor,
}

/// how amounts are shown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

/// first column of the month grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

/// calendar labels and layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub week_start: WeekStart,
    /// january first
    pub month_names: Vec<String>,
    /// sunday first, regardless of `week_start`
    pub weekday_names: Vec<String>,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "$".to_string(),
            thousands_separator: ',',
            decimal_separator: '.',
        }
    }
}

impl CalendarConfig {
    /// label for a 1-based month
    pub fn month_name(&self, month: u32) -> &str {
        self.month_names
            .get(month.saturating_sub(1) as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// weekday header labels in grid order
    pub fn header(&self) -> Vec<&str> {
        let offset = match self.week_start {
            WeekStart::Sunday => 0,
            WeekStart::Monday => 1,
        };
        (0..7)
            .map(|i| {
                self.weekday_names
                    .get((i + offset) % 7)
                    .map(String::as_str)
                    .unwrap_or("")
            })
            .collect()
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::es_mx()
    }
}

impl TrackerConfig {
    /// spanish (mexico) labels and peso formatting
    pub fn es_mx() -> Self {
        Self {
            currency: CurrencyFormat::default(),
            calendar: CalendarConfig {
                week_start: WeekStart::Sunday,
                month_names: to_strings(&[
                    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio",
                    "Julio", "Agosto", "Septiembre", "Octubre", "Noviembre", "Diciembre",
                ]),
                weekday_names: to_strings(&["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"]),
            },
            default_card_color: CardColor::Blue,
        }
    }

    /// english labels, monday-first weeks
    pub fn en_us() -> Self {
        Self {
            currency: CurrencyFormat::default(),
            calendar: CalendarConfig {
                week_start: WeekStart::Monday,
                month_names: to_strings(&[
                    "January", "February", "March", "April", "May", "June",
                    "July", "August", "September", "October", "November", "December",
                ]),
                weekday_names: to_strings(&["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]),
            },
            default_card_color: CardColor::Blue,
        }
    }

    /// parse and validate a json config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrackerConfig = serde_json::from_str(json).map_err(|e| {
            TrackerError::InvalidConfiguration {
                message: e.to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TrackerError::InvalidConfiguration {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.calendar.month_names.len() != 12 {
            return Err(TrackerError::InvalidConfiguration {
                message: format!(
                    "expected 12 month names, got {}",
                    self.calendar.month_names.len()
                ),
            });
        }
        if self.calendar.weekday_names.len() != 7 {
            return Err(TrackerError::InvalidConfiguration {
                message: format!(
                    "expected 7 weekday names, got {}",
                    self.calendar.weekday_names.len()
                ),
            });
        }
        if self.currency.thousands_separator == self.currency.decimal_separator {
            return Err(TrackerError::InvalidConfiguration {
                message: "thousands and decimal separators must differ".to_string(),
            });
        }
        Ok(())
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(TrackerConfig::es_mx().validate().is_ok());
        assert!(TrackerConfig::en_us().validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = TrackerConfig::en_us();
        let json = config.to_json().unwrap();
        let parsed = TrackerConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_short_month_list() {
        let mut config = TrackerConfig::es_mx();
        config.calendar.month_names.pop();
        let json = serde_json::to_string(&config).unwrap();
        let err = TrackerConfig::from_json(&json).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(TrackerConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_header_order() {
        let es = TrackerConfig::es_mx();
        assert_eq!(es.calendar.header()[0], "Dom");
        let en = TrackerConfig::en_us();
        assert_eq!(en.calendar.header(), vec!["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);
        assert_eq!(en.calendar.month_name(2), "February");
        assert_eq!(en.calendar.month_name(13), "");
    }
}
