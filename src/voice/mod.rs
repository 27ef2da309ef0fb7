//! Speech output sinks
//!
//! Speech synthesis itself is an external engine; the router only needs a
//! one-way `speak(text)` sink.

mod speaker;

pub use speaker::{CommandSpeaker, ConsoleSpeaker, Speaker, speaker_from_config};
