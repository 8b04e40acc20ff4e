use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{ConnectorType, PlugName};

/// Query-string shape of a station search. Every field is optional and an
/// empty value is the same as an absent one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationFilterRequest {
    pub company: Option<String>,
    #[serde(rename = "type")]
    pub connector_type: Option<String>,
    pub search: Option<String>,
    pub plug_name: Option<String>,
    pub status: Option<String>,
}

/// Parsed criteria, all AND-combined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationFilter {
    pub company: Option<String>,
    pub search: Option<String>,
    pub is_open: Option<bool>,
    pub connector_type: Option<ConnectorType>,
    pub plug_name: Option<PlugName>,
}

impl StationFilterRequest {
    pub fn parse(&self) -> Result<StationFilter, AppError> {
        Ok(StationFilter {
            company: non_empty(&self.company),
            search: non_empty(&self.search),
            is_open: parse_status(self.status.as_deref().unwrap_or(""))?,
            connector_type: non_empty(&self.connector_type)
                .map(|t| ConnectorType::parse(&t))
                .transpose()?,
            plug_name: non_empty(&self.plug_name)
                .map(|p| PlugName::parse(&p))
                .transpose()?,
        })
    }
}

/// Maps the external status token onto `is_open`. An empty token places no
/// restriction on status.
pub fn parse_status(token: &str) -> Result<Option<bool>, AppError> {
    match token {
        "" => Ok(None),
        "open" => Ok(Some(true)),
        "closed" => Ok(Some(false)),
        other => Err(AppError::validation(format!("invalid status value: {other}"))),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
