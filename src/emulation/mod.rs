pub mod schedule;
pub mod cache;
pub mod rate;
pub mod player;

pub use schedule::ScheduleBuilder;
pub use cache::ScheduleCache;
pub use rate::RateState;
pub use player::{PlayerState, TracePlayer};
