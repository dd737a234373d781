//! External system adapters

pub mod gateway;
