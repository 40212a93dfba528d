//! Integration tests for the doctree node cache

mod support;

mod config_wiring;
mod counter_consistency;
mod import_flows;
mod restore_flows;
mod store_adapter;
mod view_cache;
