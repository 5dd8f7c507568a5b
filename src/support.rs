//! Supporting utilities shared by the domain, entities and processes.

pub mod constraint;
pub mod logging;
pub mod units;
