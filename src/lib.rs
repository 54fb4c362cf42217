pub mod calendar;
pub mod error;
pub mod group;
pub mod profile;
pub mod projection;
pub mod scenario;
pub mod session;
pub mod snapshot;
pub mod transition;

pub use calendar::YearMonth;
pub use error::{ConfigError, ProjectionError};
pub use group::{Group, GroupId};
pub use projection::{ProjectionSettings, Projector};
pub use snapshot::Snapshot;
pub use transition::{transition, PopulationState};
