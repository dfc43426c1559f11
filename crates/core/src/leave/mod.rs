//! Leave status state machine and typed record views.

mod leave_model;

pub use leave_model::*;
