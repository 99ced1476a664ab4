//! Journalkollen core: behaviour behind the chat widget and the assistant
//! proxy, written against the port traits in [`ports`].

pub mod controller;
pub mod event_bus;
pub mod export;
pub mod markup;
pub mod normalizer;
pub mod ports;
pub mod proxy;

#[cfg(test)]
mod tests;
