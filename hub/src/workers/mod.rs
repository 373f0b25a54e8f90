//! Background workers

pub mod bus;
pub mod sweeper;
