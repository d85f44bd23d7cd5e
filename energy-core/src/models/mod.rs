mod energy_record;
mod energy_source;
mod session;
mod usage_pattern;
mod user_type;

pub use energy_record::{Appliance, EnergyRecord, NewEnergyRecord};
pub use energy_source::EnergySource;
pub use session::{Session, UserId};
pub use usage_pattern::{PeakUsageTime, Season};
pub use user_type::UserType;
