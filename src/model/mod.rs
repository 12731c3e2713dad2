mod district;
mod event;
mod position;
mod tension;

pub use district::{
    District, DistrictId, DistrictState, FactionId, FactionStanding, OWNERSHIP_EPSILON,
};
pub use event::{EventLog, WorldEvent, WorldEventKind};
pub use position::{Bounds, Position};
pub use tension::{EscalationStage, IncidentKind, Stance, TensionKey, TensionRecord};
