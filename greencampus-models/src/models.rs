//! Row types for the GreenCampus tables.

mod action;
pub use action::*;
mod badge_award;
pub use badge_award::*;
mod mission;
pub use mission::*;
mod user;
pub use user::*;
mod user_mission;
pub use user_mission::*;
