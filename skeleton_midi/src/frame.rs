//! Per-frame tracker output and JSON-lines recordings of it.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::error::RecordingError;
use crate::joint::Skeleton;

// ════════════════════════════════════════════════════════════════════════════
// Tracker states
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserState {
    /// First frame the tracker reports this user.
    New,
    #[default]
    Visible,
    Lost,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkeletonState {
    None,
    Calibrating,
    #[default]
    Tracked,
}

// ════════════════════════════════════════════════════════════════════════════
// TrackedUser / SkeletonFrame
// ════════════════════════════════════════════════════════════════════════════

/// One user as reported in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedUser {
    /// Sensor-assigned id, starting at 1.
    pub id:             u16,
    #[serde(default)]
    pub user_state:     UserState,
    #[serde(default)]
    pub skeleton_state: SkeletonState,
    pub skeleton:       Skeleton,
}

impl TrackedUser {
    pub fn new(id: u16, skeleton: Skeleton) -> Self {
        TrackedUser {
            id,
            user_state:     UserState::Visible,
            skeleton_state: SkeletonState::Tracked,
            skeleton,
        }
    }

    /// Visible with a resolved skeleton: the only users the mapper may be
    /// invoked for.
    pub fn is_fully_tracked(&self) -> bool {
        self.user_state == UserState::Visible && self.skeleton_state == SkeletonState::Tracked
    }
}

/// Everything the tracker reported for one depth frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkeletonFrame {
    #[serde(default)]
    pub users: Vec<TrackedUser>,
}

impl SkeletonFrame {
    pub fn tracked_users(&self) -> impl Iterator<Item = &TrackedUser> {
        self.users.iter().filter(|u| u.is_fully_tracked())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Recordings — one JSON frame per line
// ════════════════════════════════════════════════════════════════════════════

/// Read every frame from a JSON-lines recording.  Blank lines are skipped.
pub fn read_recording<R: BufRead>(reader: R) -> Result<Vec<SkeletonFrame>, RecordingError> {
    let mut frames = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let frame = serde_json::from_str(&line)
            .map_err(|source| RecordingError::Json { line: i + 1, source })?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Append one frame to a JSON-lines recording.
pub fn write_frame<W: Write>(writer: &mut W, frame: &SkeletonFrame) -> Result<(), RecordingError> {
    serde_json::to_writer(&mut *writer, frame)
        .map_err(RecordingError::Encode)?;
    writer.write_all(b"\n")?;
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::{Joint, JointKind};

    #[test]
    fn only_visible_tracked_users_pass() {
        let mut calibrating = TrackedUser::new(2, Skeleton::default());
        calibrating.skeleton_state = SkeletonState::Calibrating;
        let mut lost = TrackedUser::new(3, Skeleton::default());
        lost.user_state = UserState::Lost;

        let frame = SkeletonFrame {
            users: vec![TrackedUser::new(1, Skeleton::default()), calibrating, lost],
        };
        let ids: Vec<u16> = frame.tracked_users().map(|u| u.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn recording_lines_parse_in_order() {
        let text = concat!(
            r#"{"users":[{"id":1,"skeleton":{"torso":{"position":[0.0,0.0,2000.0],"confidence":1.0}}}]}"#, "\n",
            "\n",
            r#"{"users":[]}"#, "\n",
        );
        let frames = read_recording(text.as_bytes()).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].users[0].is_fully_tracked());
        assert_eq!(frames[0].users[0].skeleton.get(JointKind::Torso).position.z, 2000.0);
        assert!(frames[1].users.is_empty());
    }

    #[test]
    fn bad_line_reports_its_number() {
        let text = "{\"users\":[]}\nnot json\n";
        match read_recording(text.as_bytes()) {
            Err(RecordingError::Json { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected json error, got {:?}", other),
        }
    }

    #[test]
    fn written_frames_read_back() {
        let frame = SkeletonFrame {
            users: vec![TrackedUser::new(
                4,
                Skeleton::default().with(JointKind::LeftHand, Joint::at(1.0, 2.0, 3.0)),
            )],
        };
        let mut buf = Vec::new();
        write_frame(&mut buf, &frame).unwrap();
        write_frame(&mut buf, &frame).unwrap();
        let frames = read_recording(buf.as_slice()).unwrap();
        assert_eq!(frames, vec![frame.clone(), frame]);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
    }

    #[test]
    fn write_failure_has_no_line_number() {
        let frame = SkeletonFrame { users: vec![TrackedUser::new(1, Skeleton::default())] };
        let err = write_frame(&mut BrokenPipe, &frame).unwrap_err();
        assert!(matches!(err, RecordingError::Encode(_)));
        assert!(!err.to_string().contains("line"), "{}", err);
    }
}
