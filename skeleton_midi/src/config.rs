//! Mapping constants, overridable from a JSON file.

use serde::Deserialize;

use crate::error::ConfigError;

/// Thresholds and MIDI numbering used by the mapper.
///
/// `Default` gives the stock layout: claps closer than 100 mm select a
/// role on channel 4 (controllers 80–83, value 127), and arm poses go out
/// on controllers 1–6 of the focused role's channel.
///
/// ```rust
/// use skeleton_midi::MappingConfig;
///
/// let cfg = MappingConfig::from_json(r#"{ "clap_distance": 80.0 }"#).unwrap();
/// assert_eq!(cfg.clap_distance, 80.0);
/// assert_eq!(cfg.role_select_channel, 4);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Hands closer than this (sensor units, mm) count as a clap.
    pub clap_distance:               f32,
    /// Channel that carries role-select controllers.
    pub role_select_channel:         u8,
    /// Value sent with a role-select controller.
    pub role_select_value:           u8,
    /// Controller for role 0; roles 1–3 follow consecutively.
    pub role_select_base_controller: u8,
    /// Controller for left-arm X; the other five axes follow consecutively.
    pub pose_base_controller:        u8,
}

impl Default for MappingConfig {
    fn default() -> Self {
        MappingConfig {
            clap_distance:               100.0,
            role_select_channel:         4,
            role_select_value:           127,
            role_select_base_controller: 80,
            pose_base_controller:        1,
        }
    }
}

impl MappingConfig {
    // ── setters (builder pattern) ─────────────────────────────────────────

    pub fn clap_distance(mut self, distance: f32) -> Self {
        self.clap_distance = distance;
        self
    }

    pub fn role_select_channel(mut self, channel: u8) -> Self {
        self.role_select_channel = channel.min(15);
        self
    }

    pub fn role_select_value(mut self, value: u8) -> Self {
        self.role_select_value = value.min(127);
        self
    }

    pub fn role_select_base_controller(mut self, controller: u8) -> Self {
        self.role_select_base_controller = controller.min(127 - 3);
        self
    }

    pub fn pose_base_controller(mut self, controller: u8) -> Self {
        self.pose_base_controller = controller.min(127 - 5);
        self
    }

    /// Parse a JSON object; missing keys keep their defaults.
    ///
    /// Channel and controller numbers are clamped as the setters clamp
    /// them; a `clap_distance` that is not a positive number is an error.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: MappingConfig = serde_json::from_str(text)?;
        raw.validated()
    }

    /// Run every field through its setter and check the clap distance.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if !self.clap_distance.is_finite() || self.clap_distance <= 0.0 {
            return Err(ConfigError::ClapDistance(self.clap_distance));
        }
        Ok(MappingConfig::default()
            .clap_distance(self.clap_distance)
            .role_select_channel(self.role_select_channel)
            .role_select_value(self.role_select_value)
            .role_select_base_controller(self.role_select_base_controller)
            .pose_base_controller(self.pose_base_controller))
    }
}
