///! CLI command handlers

pub mod cluster;
