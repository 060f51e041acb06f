//! # outbound-adapters
//!
//! HTTP collaborators the relay calls out to: the chat webhook that receives
//! notifications and the geo-IP service used for location text.

pub mod discord;
pub mod geoip;
pub mod log;

pub use discord::DiscordNotifier;
pub use geoip::{DisabledLookup, FreeGeoIpLookup};
pub use log::LogNotifier;
