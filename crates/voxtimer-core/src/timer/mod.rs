mod clock;
mod engine;
mod model;
mod request;
mod store;

pub use clock::{ExpirationClock, ManualTime, SystemTime, TickOutcome, TimeSource};
pub use engine::{PendingRequest, TimerEngine};
pub use model::{Timer, TimerStatus};
pub use request::{
    CancelOutcome, CancelRequest, StartOutcome, StartRequest, StatusOutcome, StatusRequest,
    StopOutcome,
};
pub use store::TimerStore;
