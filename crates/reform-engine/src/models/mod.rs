//! 领域模型定义

pub mod enums;
pub mod shipment;
pub mod stats;
pub mod submission;

pub use enums::ShipmentStatus;
pub use shipment::{ReturnEvent, Shipment};
pub use stats::{BonusStats, StatusBreakdown, Tally, BONUS_THRESHOLD};
pub use submission::ReturnSubmission;
