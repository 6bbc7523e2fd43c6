//! MIDI output port.
//!
//! The mapper hands events to a [`MidiOutput`], which forwards the raw
//! bytes to a `midir` connection.  When no suitable port exists the
//! output degrades to a null backend: events are counted and dropped, and
//! the mapper never finds out.

use skeleton_midi::{MidiEvent, MidiSink};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// OutputError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum OutputError {
    /// No backend, no matching port, or the connection was refused.
    #[error("MIDI transport unavailable: {0}")]
    TransportUnavailable(String),
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut: Send {
    fn send(&mut self, bytes: &[u8]);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn send(&mut self, bytes: &[u8]) {
        if let Err(e) = self.conn.send(bytes) {
            log::warn!("[output] send failed: {}", e);
        }
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

struct NullOut;
impl MidiOut for NullOut {
    fn send(&mut self, _bytes: &[u8]) {}
}

// ════════════════════════════════════════════════════════════════════════════
// Port selection
// ════════════════════════════════════════════════════════════════════════════

/// Index of the first port whose name contains `hint` (case-insensitive).
/// An empty hint accepts the first port.
pub fn choose_port<S: AsRef<str>>(names: &[S], hint: &str) -> Option<usize> {
    let hint = hint.to_lowercase();
    names.iter().position(|n| n.as_ref().to_lowercase().contains(&hint))
}

/// Open the first output port matching `hint`, else the first port.
fn open_midir(client_name: &str, hint: &str) -> Result<(MidirOut, String), OutputError> {
    let midi_out = midir::MidiOutput::new(client_name)
        .map_err(|e| OutputError::TransportUnavailable(e.to_string()))?;

    let ports = midi_out.ports();
    let names: Vec<String> = ports.iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();
    log::info!("[output] available ports: {:?}", names);

    let idx = match choose_port(&names, hint) {
        Some(i) => i,
        None if !names.is_empty() => {
            log::info!("[output] no port matching \"{}\", taking the first one", hint);
            0
        }
        None => return Err(OutputError::TransportUnavailable("no MIDI output ports".to_string())),
    };

    let name = names[idx].clone();
    let conn = midi_out.connect(&ports[idx], "kinect-midi-out")
        .map_err(|e| OutputError::TransportUnavailable(e.to_string()))?;
    Ok((MidirOut { conn }, name))
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOutput
// ════════════════════════════════════════════════════════════════════════════

/// A [`MidiSink`] that writes to a hardware or virtual MIDI port.
pub struct MidiOutput {
    backend:   Box<dyn MidiOut>,
    port_name: Option<String>,
    sent:      usize,
    last:      Option<MidiEvent>,
}

impl MidiOutput {
    /// Connect to the first port matching `hint`, falling back to a null
    /// output with a warning.
    pub fn open(hint: &str) -> Self {
        match open_midir("kinect_midi", hint) {
            Ok((backend, name)) => {
                log::info!("[output] opened MIDI port: {}", name);
                MidiOutput { backend: Box::new(backend), port_name: Some(name), sent: 0, last: None }
            }
            Err(e) => {
                log::warn!("[output] {}; using null output", e);
                log::warn!("[output] create a virtual port whose name contains \"{}\"", hint);
                log::warn!("         • Windows: loopMIDI");
                log::warn!("         • macOS: IAC Driver");
                log::warn!("         • Linux: `modprobe snd-virmidi` or a JACK/ALSA bridge");
                MidiOutput::null()
            }
        }
    }

    /// An output that drops every event.
    pub fn null() -> Self {
        MidiOutput { backend: Box::new(NullOut), port_name: None, sent: 0, last: None }
    }

    pub fn port_name(&self) -> Option<&str> { self.port_name.as_deref() }
    pub fn is_connected(&self) -> bool    { self.port_name.is_some() }
    pub fn sent(&self) -> usize           { self.sent }
    pub fn last(&self) -> Option<MidiEvent> { self.last }
}

impl MidiSink for MidiOutput {
    fn send(&mut self, event: MidiEvent) {
        self.backend.send(&event.to_bytes());
        self.sent += 1;
        self.last = Some(event);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
