pub mod period;

pub use period::{reference_date, Period, PeriodFilter, ReferenceDate};
