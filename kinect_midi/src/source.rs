//! Skeleton sources — keyboard simulation and recording replay.
//!
//! The public interface is [`SkeletonFrame`] delivered over a `mpsc`
//! channel.  The frame loop doesn't need to know whether frames came from
//! a recording or the simulator.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use nalgebra::Vector3;
use skeleton_midi::{
    read_recording, Arm, Joint, JointKind, RecordingError, Skeleton, SkeletonFrame,
    SkeletonState, TrackedUser, UserState,
};

// ════════════════════════════════════════════════════════════════════════════
// SkeletonSource trait — unified interface for replay and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SkeletonFrame`]s over a channel.
pub trait SkeletonSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SkeletonFrame>);
}

/// Spawn a skeleton source on its own thread and return the receiving end.
pub fn spawn_skeleton_source<S: SkeletonSource>(source: S) -> Receiver<SkeletonFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// ReplaySource — JSON-lines recording
// ════════════════════════════════════════════════════════════════════════════

/// Plays back a recorded session at a fixed frame interval.
pub struct ReplaySource {
    frames:   Vec<SkeletonFrame>,
    interval: Duration,
    looping:  bool,
}

impl ReplaySource {
    pub fn new(frames: Vec<SkeletonFrame>, interval: Duration, looping: bool) -> Self {
        ReplaySource { frames, interval, looping }
    }

    pub fn open(path: &Path, interval: Duration, looping: bool) -> Result<Self, RecordingError> {
        let frames = read_recording(BufReader::new(File::open(path)?))?;
        log::info!("[replay] {} frames from {}", frames.len(), path.display());
        Ok(ReplaySource::new(frames, interval, looping))
    }

    pub fn len(&self) -> usize { self.frames.len() }
    pub fn is_empty(&self) -> bool { self.frames.is_empty() }
}

impl SkeletonSource for ReplaySource {
    fn run(self: Box<Self>, tx: Sender<SkeletonFrame>) {
        if self.frames.is_empty() { return; }
        loop {
            for frame in &self.frames {
                if tx.send(frame.clone()).is_err() { return; }
                thread::sleep(self.interval);
            }
            if !self.looping {
                log::info!("[replay] end of recording");
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Simulation input
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the preview window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    KeyDown(SimKey),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Out,
    In,
    Forward,
    Back,
}

/// Simulated key codes (mapped from minifb Key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    /// Move one hand of the driven user.
    Move(Arm, Direction),
    /// Bring the hands together / back apart.
    Clap,
    /// Show or hide the second simulated user.
    SecondUser,
    /// Switch which simulated user the keys drive.
    SwitchUser,
    Quit,
}

/// Distance one key press moves a hand, in mm.
pub const SIM_STEP: f32 = 40.0;

// ════════════════════════════════════════════════════════════════════════════
// SimBody — one simulated person
// ════════════════════════════════════════════════════════════════════════════

/// Frames spent in each tracker state before the skeleton resolves.
pub const SIM_CALIBRATION_FRAMES: u32 = 10;

/// A standing figure whose hands can be moved around.
#[derive(Clone, Debug)]
pub struct SimBody {
    pub id:      u16,
    centre:      Vector3<f32>,
    left_hand:   Vector3<f32>,
    right_hand:  Vector3<f32>,
    /// Hand positions to restore when a clap is released.
    clapped:     Option<(Vector3<f32>, Vector3<f32>)>,
    frames_seen: u32,
}

impl SimBody {
    /// A figure centred at `x` mm, 2 m from the sensor, hands at waist height.
    pub fn new(id: u16, x: f32) -> Self {
        let centre = Vector3::new(x, 0.0, 2000.0);
        SimBody {
            id,
            centre,
            left_hand:   centre + Vector3::new(-250.0, -100.0, -200.0),
            right_hand:  centre + Vector3::new(250.0, -100.0, -200.0),
            clapped:     None,
            frames_seen: 0,
        }
    }

    fn left_shoulder(&self)  -> Vector3<f32> { self.centre + Vector3::new(-180.0, 300.0, 0.0) }
    fn right_shoulder(&self) -> Vector3<f32> { self.centre + Vector3::new(180.0, 300.0, 0.0) }

    pub fn hand(&self, arm: Arm) -> Vector3<f32> {
        match arm {
            Arm::Left  => self.left_hand,
            Arm::Right => self.right_hand,
        }
    }

    pub fn is_clapped(&self) -> bool { self.clapped.is_some() }

    pub fn move_hand(&mut self, arm: Arm, dir: Direction) {
        let mirror = if arm == Arm::Left { -1.0 } else { 1.0 };
        let delta = match dir {
            Direction::Up      => Vector3::new(0.0, SIM_STEP, 0.0),
            Direction::Down    => Vector3::new(0.0, -SIM_STEP, 0.0),
            Direction::Out     => Vector3::new(mirror * SIM_STEP, 0.0, 0.0),
            Direction::In      => Vector3::new(-mirror * SIM_STEP, 0.0, 0.0),
            Direction::Forward => Vector3::new(0.0, 0.0, -SIM_STEP),
            Direction::Back    => Vector3::new(0.0, 0.0, SIM_STEP),
        };
        match arm {
            Arm::Left  => self.left_hand += delta,
            Arm::Right => self.right_hand += delta,
        }
    }

    /// Toggle a clap: hands meet at their midpoint, 60 mm apart, or go
    /// back to where they were.
    pub fn toggle_clap(&mut self) {
        match self.clapped.take() {
            Some((l, r)) => {
                self.left_hand = l;
                self.right_hand = r;
            }
            None => {
                self.clapped = Some((self.left_hand, self.right_hand));
                let mid = (self.left_hand + self.right_hand) / 2.0;
                self.left_hand = mid - Vector3::new(30.0, 0.0, 0.0);
                self.right_hand = mid + Vector3::new(30.0, 0.0, 0.0);
            }
        }
    }

    /// Elbow halfway along the arm, dropped a little.
    fn elbow(shoulder: Vector3<f32>, hand: Vector3<f32>) -> Vector3<f32> {
        (shoulder + hand) / 2.0 + Vector3::new(0.0, -80.0, 0.0)
    }

    pub fn skeleton(&self) -> Skeleton {
        let c = self.centre;
        let at = |v: Vector3<f32>| Joint::new(v, 1.0);
        let (ls, rs) = (self.left_shoulder(), self.right_shoulder());
        Skeleton::default()
            .with(JointKind::Head,          at(c + Vector3::new(0.0, 550.0, 0.0)))
            .with(JointKind::Neck,          at(c + Vector3::new(0.0, 350.0, 0.0)))
            .with(JointKind::LeftShoulder,  at(ls))
            .with(JointKind::RightShoulder, at(rs))
            .with(JointKind::LeftElbow,     at(Self::elbow(ls, self.left_hand)))
            .with(JointKind::RightElbow,    at(Self::elbow(rs, self.right_hand)))
            .with(JointKind::LeftHand,      at(self.left_hand))
            .with(JointKind::RightHand,     at(self.right_hand))
            .with(JointKind::Torso,         at(c + Vector3::new(0.0, 100.0, 0.0)))
            .with(JointKind::LeftHip,       at(c + Vector3::new(-110.0, -150.0, 0.0)))
            .with(JointKind::RightHip,      at(c + Vector3::new(110.0, -150.0, 0.0)))
            // Legs are reported at half confidence, as a real tracker often does.
            .with(JointKind::LeftKnee,      Joint::new(c + Vector3::new(-120.0, -550.0, 0.0), 0.5))
            .with(JointKind::RightKnee,     Joint::new(c + Vector3::new(120.0, -550.0, 0.0), 0.5))
            .with(JointKind::LeftFoot,      Joint::new(c + Vector3::new(-130.0, -950.0, 0.0), 0.5))
            .with(JointKind::RightFoot,     Joint::new(c + Vector3::new(130.0, -950.0, 0.0), 0.5))
    }

    /// Next frame's report: new, then calibrating, then tracked.
    pub fn next_user(&mut self) -> TrackedUser {
        let (user_state, skeleton_state) = match self.frames_seen {
            0                            => (UserState::New, SkeletonState::None),
            n if n <= SIM_CALIBRATION_FRAMES => (UserState::Visible, SkeletonState::Calibrating),
            _                            => (UserState::Visible, SkeletonState::Tracked),
        };
        self.frames_seen = self.frames_seen.saturating_add(1);
        TrackedUser { id: self.id, user_state, skeleton_state, skeleton: self.skeleton() }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimSkeletonSource — keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Skeleton source driven by [`SimInput`] events from the preview window.
pub struct SimSkeletonSource {
    pub rx:       Receiver<SimInput>,
    pub interval: Duration,
}

/// State of the simulated scene; separated from the thread for testing.
#[derive(Clone, Debug)]
pub struct SimScene {
    users:      Vec<SimBody>,
    second:     bool,
    driven:     usize,
}

impl Default for SimScene {
    fn default() -> Self {
        SimScene {
            users:  vec![SimBody::new(1, -400.0), SimBody::new(2, 400.0)],
            second: false,
            driven: 0,
        }
    }
}

impl SimScene {
    pub fn driven(&self) -> &SimBody { &self.users[self.driven] }

    /// Apply one input.  Returns `false` on quit.
    pub fn apply(&mut self, input: SimInput) -> bool {
        let SimInput::KeyDown(key) = input;
        match key {
            SimKey::Move(arm, dir) => self.users[self.driven].move_hand(arm, dir),
            SimKey::Clap           => self.users[self.driven].toggle_clap(),
            SimKey::SecondUser     => {
                self.second = !self.second;
                if self.second {
                    self.users[1].frames_seen = 0;
                } else {
                    self.driven = 0;
                }
            }
            SimKey::SwitchUser     => {
                if self.second { self.driven = 1 - self.driven; }
            }
            SimKey::Quit           => return false,
        }
        true
    }

    pub fn frame(&mut self) -> SkeletonFrame {
        let visible = if self.second { 2 } else { 1 };
        SkeletonFrame {
            users: self.users.iter_mut().take(visible).map(SimBody::next_user).collect(),
        }
    }
}

impl SkeletonSource for SimSkeletonSource {
    fn run(self: Box<Self>, tx: Sender<SkeletonFrame>) {
        let mut scene = SimScene::default();
        loop {
            loop {
                match self.rx.try_recv() {
                    Ok(input) => {
                        if !scene.apply(input) { return; }
                    }
                    Err(TryRecvError::Empty)        => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
            if tx.send(scene.frame()).is_err() { return; }
            thread::sleep(self.interval);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use skeleton_midi::{MidiEvent, Session};

    fn tracked_frame(scene: &mut SimScene) -> SkeletonFrame {
        for _ in 0..=SIM_CALIBRATION_FRAMES { scene.frame(); }
        scene.frame()
    }

    #[test]
    fn sim_user_goes_new_calibrating_tracked() {
        let mut body = SimBody::new(1, 0.0);
        assert_eq!(body.next_user().user_state, UserState::New);
        assert_eq!(body.next_user().skeleton_state, SkeletonState::Calibrating);
        for _ in 0..SIM_CALIBRATION_FRAMES { body.next_user(); }
        assert!(body.next_user().is_fully_tracked());
    }

    #[test]
    fn clap_toggle_brings_hands_together_and_back() {
        let mut body = SimBody::new(1, 0.0);
        let before = (body.hand(Arm::Left), body.hand(Arm::Right));
        body.toggle_clap();
        assert!((body.hand(Arm::Left) - body.hand(Arm::Right)).norm() < 100.0);
        body.toggle_clap();
        assert_eq!((body.hand(Arm::Left), body.hand(Arm::Right)), before);
    }

    #[test]
    fn out_moves_hands_away_from_body() {
        let mut body = SimBody::new(1, 0.0);
        let (l0, r0) = (body.hand(Arm::Left).x, body.hand(Arm::Right).x);
        body.move_hand(Arm::Left, Direction::Out);
        body.move_hand(Arm::Right, Direction::Out);
        assert!(body.hand(Arm::Left).x < l0);
        assert!(body.hand(Arm::Right).x > r0);
    }

    #[test]
    fn second_user_toggles_visibility() {
        let mut scene = SimScene::default();
        assert_eq!(scene.frame().users.len(), 1);
        scene.apply(SimInput::KeyDown(SimKey::SecondUser));
        assert_eq!(scene.frame().users.len(), 2);
        scene.apply(SimInput::KeyDown(SimKey::SwitchUser));
        assert_eq!(scene.driven().id, 2);
        scene.apply(SimInput::KeyDown(SimKey::SecondUser));
        assert_eq!(scene.driven().id, 1);
    }

    #[test]
    fn quit_stops_the_scene() {
        let mut scene = SimScene::default();
        assert!(!scene.apply(SimInput::KeyDown(SimKey::Quit)));
    }

    #[test]
    fn simulated_clap_selects_a_role() {
        let mut scene = SimScene::default();
        let mut session = Session::default();
        let mut sink: Vec<MidiEvent> = Vec::new();

        session.map_frame(&tracked_frame(&mut scene), &mut sink).unwrap();
        assert_eq!(sink.len(), 6);

        scene.apply(SimInput::KeyDown(SimKey::Clap));
        sink.clear();
        session.map_frame(&scene.frame(), &mut sink).unwrap();
        // Hands meet below the shoulders, centred: role 2.
        assert_eq!(sink[0], MidiEvent::control_change(4, 82, 127));
        assert_eq!(session.focus_role().index(), 2);
    }

    #[test]
    fn replay_source_sends_every_frame_then_stops() {
        let frames = vec![SkeletonFrame::default(); 3];
        let rx = spawn_skeleton_source(ReplaySource::new(frames, Duration::from_millis(1), false));
        let received: Vec<_> = rx.iter().collect();
        assert_eq!(received.len(), 3);
    }
}
