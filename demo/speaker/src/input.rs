//! Maps stdin lines onto bus events.
//!
//! - `/start`, `/stop`, `/emergency` publish the control events
//! - a line starting with `{` is parsed as a JSON event
//! - anything else is spoken

use herald_audio::component::{EVENT_EMERGENCY_STOP, EVENT_SPEAK, EVENT_START, EVENT_STOP};
use herald_core::Event;
use tracing::warn;

pub fn parse_line(line: &str, source: &str) -> Option<Event> {
    let line = line.trim();
    match line {
        "" => None,
        "/start" => Some(Event::new(EVENT_START, source)),
        "/stop" => Some(Event::new(EVENT_STOP, source)),
        "/emergency" => Some(Event::new(EVENT_EMERGENCY_STOP, source)),
        json if json.starts_with('{') => match Event::from_json(json) {
            Ok(ev) => Some(ev),
            Err(e) => {
                warn!(target = "speaker", error = %e, "Ignoring malformed JSON event");
                None
            }
        },
        text => Some(Event::new(EVENT_SPEAK, source).with_payload(text)),
    }
}
