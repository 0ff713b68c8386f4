mod booking;
mod business;
mod schedule;
mod timeslot;

pub use booking::*;
pub use business::*;
pub use schedule::*;
pub use timeslot::*;
