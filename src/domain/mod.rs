//! Pure donor lifecycle rules: the status state machine, calendar
//! arithmetic for due dates and input validation.

pub mod calendar;
pub mod transitions;
pub mod validation;

pub use calendar::{add_one_month, month_bounds};
pub use transitions::{can_transition, plan_transition, TransitionPlan};
