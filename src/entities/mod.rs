//! Aviation records and their filter registries

pub mod macros;

pub mod aircraft;
pub mod assessment;
pub mod flight;
pub mod user;

pub use aircraft::{Aircraft, aircraft_filters};
pub use assessment::{Assessment, assessment_filters, retire_assessment};
pub use flight::{Flight, flight_filters};
pub use user::{User, user_filters};
