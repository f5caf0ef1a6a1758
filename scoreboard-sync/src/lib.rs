pub mod commands;

pub mod config;

pub mod control;

pub mod rules;

pub mod settings;

pub mod store;

pub mod transport;

#[cfg(test)]
mod mock_authority;
