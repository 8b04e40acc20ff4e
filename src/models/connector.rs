use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Booking;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub connector_id: String,
    #[serde(rename = "type")]
    pub connector_type: ConnectorType,
    pub plug_name: PlugName,
    pub price_per_unit: f64,
    pub power_output: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking: Option<Booking>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorType {
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "DC")]
    Dc,
}

impl ConnectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorType::Ac => "AC",
            ConnectorType::Dc => "DC",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "AC" => Ok(ConnectorType::Ac),
            "DC" => Ok(ConnectorType::Dc),
            other => Err(AppError::validation(format!("invalid connector type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlugName {
    #[serde(rename = "J1772 TYPE 1")]
    J1772,
    #[serde(rename = "TYPE 2")]
    Type2,
    #[serde(rename = "CCS TYPE 1")]
    CcsType1,
    #[serde(rename = "CCS TYPE 2")]
    CcsType2,
    #[serde(rename = "CHAdeMO")]
    Chademo,
    #[serde(rename = "GB/T AC")]
    GbtAc,
    #[serde(rename = "GB/T DC")]
    GbtDc,
}

impl PlugName {
    pub const ALL: [PlugName; 7] = [
        PlugName::J1772,
        PlugName::Type2,
        PlugName::CcsType1,
        PlugName::CcsType2,
        PlugName::Chademo,
        PlugName::GbtAc,
        PlugName::GbtDc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlugName::J1772 => "J1772 TYPE 1",
            PlugName::Type2 => "TYPE 2",
            PlugName::CcsType1 => "CCS TYPE 1",
            PlugName::CcsType2 => "CCS TYPE 2",
            PlugName::Chademo => "CHAdeMO",
            PlugName::GbtAc => "GB/T AC",
            PlugName::GbtDc => "GB/T DC",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|plug| plug.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("invalid plug name: {s}")))
    }
}

impl ToSql for ConnectorType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ConnectorType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        ConnectorType::parse(raw).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for PlugName {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PlugName {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        PlugName::parse(raw).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
