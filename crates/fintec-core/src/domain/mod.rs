//! Time types shared across fintec.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`UtcDateTime`] | RFC3339 instant normalised to UTC |
//! | [`DayKey`] | Caracas calendar day used to key rate history |

mod day;
mod timestamp;

pub use day::{DayKey, CARACAS_UTC_OFFSET_HOURS};
pub use timestamp::UtcDateTime;
