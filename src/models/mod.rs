pub mod booking;
pub mod connector;
pub mod filter;
pub mod station;

pub use booking::{Booking, SetBookingRequest, BOOKING_TIME_FORMAT};
pub use connector::{Connector, ConnectorType, PlugName};
pub use filter::{StationFilter, StationFilterRequest};
pub use station::{ConnectorRequest, NewConnector, NewStation, Station, StationRequest, StationStatus};
