//! Handling of events and notifications.

mod events;
mod service;

pub use self::{
    events::*,
    service::{Channel, Dispatcher, Logger},
};
