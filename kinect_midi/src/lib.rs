//! # kinect_midi
//!
//! Body-tracking MIDI controller built on `skeleton_midi`: a clap picks
//! which role (MIDI channel) is in focus, and both arms drive six
//! continuous controllers on that channel.  A preview window shows the
//! tracked skeletons next to the role and parameter panel.
//!
//! ## Gesture → MIDI mapping
//!
//! | Gesture | MIDI |
//! |---|---|
//! | Clap above shoulders, left of body | CC 80 = 127 on channel 4, focus role 0 |
//! | Clap above shoulders, right of body | CC 81 = 127 on channel 4, focus role 1 |
//! | Clap below shoulders, left of body | CC 82 = 127 on channel 4, focus role 2 |
//! | Clap below shoulders, right of body | CC 83 = 127 on channel 4, focus role 3 |
//! | Left hand x / y / z | CC 1 / 2 / 3 on the focus channel |
//! | Right hand x / y / z | CC 4 / 5 / 6 on the focus channel |
//!
//! ## Skeleton sources
//!
//! * (default) **Simulation**: keyboard shortcuts move a simulated figure.
//! * `--replay <file.jsonl>`: plays back a recorded session.
//!
//! ### Keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `W` / `S` | Left hand up / down (forward / back with Shift) |
//! | `A` / `D` | Left hand out / in |
//! | `I` / `K` | Right hand up / down (forward / back with Shift) |
//! | `L` / `J` | Right hand out / in |
//! | `C` | Clap / un-clap |
//! | `2` | Show / hide a second user |
//! | `U` | Switch which user the keys drive |
//! | `F1`–`F4`, `Tab` | Focus a role |
//! | `P` | Next parameter |
//! | `R` | Send the focused role's role-select controller |
//! | `M` | Send the selected parameter's controller |
//! | `N` | Send a test note |
//! | `E` | Rename the focused role |
//! | `Q` / `Escape` | Quit |

pub mod source;
pub mod output;
pub mod panel;
pub mod visualizer;
pub mod app;
