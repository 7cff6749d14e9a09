//! Internal library for the ssync tools - shared configuration, wire types,
//! tracing setup and filesystem glob expansion.

pub mod config;
pub mod fsglob;
pub mod trace;
pub mod wire;
