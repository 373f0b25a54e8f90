//! Integration tests for the fleet hub

mod test_dispatch;
mod test_registry;
mod test_stats;
