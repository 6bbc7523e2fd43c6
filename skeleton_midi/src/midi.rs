//! MIDI events produced by the mapper and the sink they are handed to.
//!
//! The mapper never talks to a port.  It pushes [`MidiEvent`]s into a
//! [`MidiSink`] in emission order; the sink decides what "send" means
//! (a `midir` connection, a log line, or a `Vec` in tests).

// ════════════════════════════════════════════════════════════════════════════
// MidiEvent
// ════════════════════════════════════════════════════════════════════════════

/// Largest value of a 7-bit MIDI data byte.
pub const DATA_MAX: u8 = 127;

/// Largest MIDI channel number (channels are 0-indexed on the wire).
pub const CHANNEL_MAX: u8 = 15;

/// A channel voice message.
///
/// Build these with [`MidiEvent::control_change`] and
/// [`MidiEvent::note_on`], which clamp every field into range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiEvent {
    ControlChange { channel: u8, controller: u8, value: u8 },
    NoteOn        { channel: u8, note: u8, velocity: u8 },
}

impl MidiEvent {
    pub fn control_change(channel: u8, controller: u8, value: u8) -> Self {
        MidiEvent::ControlChange {
            channel:    channel.min(CHANNEL_MAX),
            controller: controller.min(DATA_MAX),
            value:      value.min(DATA_MAX),
        }
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        MidiEvent::NoteOn {
            channel:  channel.min(CHANNEL_MAX),
            note:     note.min(DATA_MAX),
            velocity: velocity.min(DATA_MAX),
        }
    }

    /// High nibble of the status byte.
    pub fn kind(&self) -> u8 {
        match self {
            MidiEvent::ControlChange { .. } => 0xB,
            MidiEvent::NoteOn { .. }        => 0x9,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::ControlChange { channel, .. } | MidiEvent::NoteOn { channel, .. } => channel,
        }
    }

    /// Wire bytes: `[(kind << 4) | channel, data1, data2]`.
    ///
    /// Data bytes are clamped again here, so an event built directly from
    /// the variant fields can never put a status byte on the wire.
    pub fn to_bytes(&self) -> [u8; 3] {
        let status = (self.kind() << 4) | self.channel().min(CHANNEL_MAX);
        let (d1, d2) = match *self {
            MidiEvent::ControlChange { controller, value, .. } => (controller, value),
            MidiEvent::NoteOn { note, velocity, .. }           => (note, velocity),
        };
        [status, d1.min(DATA_MAX), d2.min(DATA_MAX)]
    }
}

impl std::fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [s, d1, d2] = self.to_bytes();
        match *self {
            MidiEvent::ControlChange { channel, controller, value } =>
                write!(f, "CC   ch={:<2} cc={:<3} val={:<3} [{:02X} {:02X} {:02X}]",
                       channel, controller, value, s, d1, d2),
            MidiEvent::NoteOn { channel, note, velocity } =>
                write!(f, "NOTE ch={:<2} n={:<4} vel={:<3} [{:02X} {:02X} {:02X}]",
                       channel, note, velocity, s, d1, d2),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiSink
// ════════════════════════════════════════════════════════════════════════════

/// Receives events in the order the mapper emits them.
pub trait MidiSink {
    fn send(&mut self, event: MidiEvent);
}

/// Collects events; used by the headless replay tool and in tests.
impl MidiSink for Vec<MidiEvent> {
    fn send(&mut self, event: MidiEvent) {
        self.push(event);
    }
}

impl<S: MidiSink + ?Sized> MidiSink for &mut S {
    fn send(&mut self, event: MidiEvent) {
        (**self).send(event);
    }
}

impl<S: MidiSink + ?Sized> MidiSink for Box<S> {
    fn send(&mut self, event: MidiEvent) {
        (**self).send(event);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_change_status_byte() {
        // Role select on channel 4, controller 81
        assert_eq!(MidiEvent::control_change(4, 81, 127).to_bytes(), [0xB4, 81, 127]);
    }

    #[test]
    fn note_on_status_byte() {
        assert_eq!(MidiEvent::note_on(0, 60, 100).to_bytes(), [0x90, 60, 100]);
    }

    #[test]
    fn constructors_clamp_out_of_range_fields() {
        assert_eq!(
            MidiEvent::control_change(200, 255, 128),
            MidiEvent::ControlChange { channel: 15, controller: 127, value: 127 },
        );
        assert_eq!(
            MidiEvent::note_on(16, 130, 200),
            MidiEvent::NoteOn { channel: 15, note: 127, velocity: 127 },
        );
    }

    #[test]
    fn hand_built_event_still_encodes_data_bytes() {
        let cc = MidiEvent::ControlChange { channel: 3, controller: 200, value: 255 };
        assert_eq!(cc.to_bytes(), [0xB3, 127, 127]);

        let note = MidiEvent::NoteOn { channel: 99, note: 128, velocity: 130 };
        let [status, d1, d2] = note.to_bytes();
        assert_eq!(status, 0x9F);
        assert!(d1 < 0x80 && d2 < 0x80);
    }

    #[test]
    fn vec_sink_preserves_order() {
        let mut sink: Vec<MidiEvent> = Vec::new();
        sink.send(MidiEvent::control_change(0, 1, 10));
        sink.send(MidiEvent::control_change(0, 2, 20));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].to_bytes()[1], 2);
    }

    #[test]
    fn display_shows_hex_bytes() {
        let text = MidiEvent::control_change(4, 80, 127).to_string();
        assert!(text.contains("[B4 50 7F]"), "{}", text);
    }
}
