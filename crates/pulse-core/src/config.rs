use crate::error::PulseResult;
use crate::trace::TraceLevel;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DispatcherConfig {
    #[serde(default, deserialize_with = "nullable_debug")]
    pub debug: DebugMode,
}

impl DispatcherConfig {
    pub fn new(debug: DebugMode) -> Self {
        Self { debug }
    }

    pub fn from_json(raw: &str) -> PulseResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Which trace levels reach the sink. Fixed for the lifetime of a dispatcher.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DebugMode {
    #[default]
    Off,
    #[serde(alias = "error-only")]
    Error,
    All,
}

impl DebugMode {
    pub fn allows(self, level: TraceLevel) -> bool {
        match (self, level) {
            (DebugMode::Off, _) => false,
            (DebugMode::Error, TraceLevel::Info) => false,
            (DebugMode::Error, TraceLevel::Error) => true,
            (DebugMode::All, _) => true,
        }
    }
}

impl FromStr for DebugMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "off" | "none" => Ok(DebugMode::Off),
            "error" | "error-only" => Ok(DebugMode::Error),
            "all" => Ok(DebugMode::All),
            _ => Err(format!(
                "Invalid debug mode: {}. Valid options: off, error, all",
                s
            )),
        }
    }
}

fn nullable_debug<'de, D>(deserializer: D) -> Result<DebugMode, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<DebugMode>::deserialize(deserializer)?.unwrap_or_default())
}
