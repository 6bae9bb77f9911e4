use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    LoanOut,
    LoanIn,
    ReturnIn,
    ReturnOut,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Self::LoanOut => "loan out",
            Self::LoanIn => "loan in",
            Self::ReturnIn => "return in",
            Self::ReturnOut => "return out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanHeader {
    pub date: String,
    pub counterparty: String,
    pub direction: Direction,
    pub adjust_stock: bool,
    pub note: Option<String>,
}

impl LoanHeader {
    pub fn fresh(config: &LoanHeaderConfig) -> Self {
        Self {
            date: today_iso(),
            counterparty: String::new(),
            direction: config.direction,
            adjust_stock: config.adjust_stock,
            note: None,
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.counterparty.trim().is_empty() {
            return Err("counterparty is required");
        }
        if self.date.is_empty() {
            return Err("transaction date is required");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanHeaderConfig {
    pub direction: Direction,
    pub adjust_stock: bool,
}

impl Default for LoanHeaderConfig {
    fn default() -> Self {
        Self {
            direction: Direction::LoanOut,
            adjust_stock: true,
        }
    }
}

fn today_iso() -> String {
    let format = format_description!("[year]-[month]-[day]");
    OffsetDateTime::now_utc()
        .date()
        .format(&format)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_serializes_with_wire_names() {
        let json = serde_json::to_string(&Direction::ReturnOut).expect("serialize direction");
        assert_eq!(json, "\"return_out\"");

        let parsed: Direction = serde_json::from_str("\"loan_in\"").expect("parse direction");
        assert_eq!(parsed, Direction::LoanIn);
    }

    #[test]
    fn fresh_header_carries_config_defaults_and_todays_date() {
        let header = LoanHeader::fresh(&LoanHeaderConfig::default());

        assert_eq!(header.direction, Direction::LoanOut);
        assert!(header.adjust_stock);
        assert!(header.counterparty.is_empty());
        assert!(header.note.is_none());
        assert_eq!(header.date.len(), 10);
        assert_eq!(&header.date[4..5], "-");
    }

    #[test]
    fn validate_requires_counterparty_then_date() {
        let mut header = LoanHeader::fresh(&LoanHeaderConfig::default());
        header.counterparty = "   ".to_owned();
        assert_eq!(header.validate(), Err("counterparty is required"));

        header.counterparty = "Xu Li".to_owned();
        header.date.clear();
        assert_eq!(header.validate(), Err("transaction date is required"));

        header.date = "2026-08-05".to_owned();
        assert_eq!(header.validate(), Ok(()));
    }

    #[test]
    fn header_config_deserializes_from_empty_object() {
        let config: LoanHeaderConfig = serde_json::from_str("{}").expect("parse config");
        assert_eq!(config, LoanHeaderConfig::default());
    }
}
