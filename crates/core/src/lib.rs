#![forbid(unsafe_code)]

pub mod calendar;
pub mod model;
pub mod reminder;
pub mod time;
pub mod zakat;

pub use time::Clock;
