//! Domain handlers
//!
//! Each handler answers one query end to end: slot resolution, provider
//! call and spoken reply. Provider failures are spoken, not returned.

pub mod fx;
pub mod weather;

pub use fx::{FxQueryHandler, Quote};
pub use weather::{WeatherQueryHandler, WeatherTopic};
