use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Connector, ConnectorType, PlugName};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub company: String,
    pub status: StationStatus,
    pub connectors: Vec<Connector>,
}

impl Station {
    pub fn connector(&self, connector_id: &str) -> Option<&Connector> {
        self.connectors
            .iter()
            .find(|c| c.connector_id == connector_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationStatus {
    pub open_hours: String,
    pub close_hours: String,
    pub is_open: bool,
}

/// Station attributes as supplied on create/edit. Connector ids are never
/// accepted from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct StationRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub company: String,
    pub status: StationStatus,
    pub connectors: Vec<ConnectorRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorRequest {
    #[serde(rename = "type")]
    pub connector_type: String,
    pub plug_name: String,
    pub price_per_unit: f64,
    pub power_output: i64,
}

/// A validated station ready to be stored.
#[derive(Debug, Clone)]
pub struct NewStation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub company: String,
    pub status: StationStatus,
    pub connectors: Vec<NewConnector>,
}

#[derive(Debug, Clone)]
pub struct NewConnector {
    pub connector_type: ConnectorType,
    pub plug_name: PlugName,
    pub price_per_unit: f64,
    pub power_output: i64,
}

impl StationRequest {
    pub fn validate(self) -> Result<NewStation, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name is required"));
        }
        if self.company.trim().is_empty() {
            return Err(AppError::validation("company is required"));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AppError::validation("latitude must be between -90 and 90"));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AppError::validation(
                "longitude must be between -180 and 180",
            ));
        }
        if self.connectors.is_empty() {
            return Err(AppError::validation("at least one connector is required"));
        }

        let connectors = self
            .connectors
            .into_iter()
            .map(ConnectorRequest::validate)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewStation {
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            company: self.company,
            status: self.status,
            connectors,
        })
    }
}

impl ConnectorRequest {
    fn validate(self) -> Result<NewConnector, AppError> {
        let connector_type = ConnectorType::parse(&self.connector_type)?;
        let plug_name = PlugName::parse(&self.plug_name)?;
        if !self.price_per_unit.is_finite() || self.price_per_unit < 0.0 {
            return Err(AppError::validation(
                "price_per_unit must be a non-negative number",
            ));
        }
        if self.power_output < 0 {
            return Err(AppError::validation("power_output must be non-negative"));
        }

        Ok(NewConnector {
            connector_type,
            plug_name,
            price_per_unit: self.price_per_unit,
            power_output: self.power_output,
        })
    }
}
