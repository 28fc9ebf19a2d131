// Vessel spawn configuration as edited by the operator
use super::geo::{GeoPoint, LatLongPosition};
use serde::{Deserialize, Serialize};

/// An optional block that keeps its edited value while switched off.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Toggle<T> {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub value: T,
}

impl<T> Toggle<T> {
    pub fn on(value: T) -> Self {
        Self {
            enabled: true,
            value,
        }
    }

    pub fn off(value: T) -> Self {
        Self {
            enabled: false,
            value,
        }
    }

    /// The value, only if the block is enabled
    pub fn active(&self) -> Option<&T> {
        self.enabled.then_some(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VesselSpawnConfig {
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub vessel_name: String,
    #[serde(default)]
    pub position: LatLongPosition,
    #[serde(default)]
    pub render: Toggle<RenderBlock>,
    #[serde(default)]
    pub physics: Toggle<PhysicsBlock>,
    #[serde(default)]
    pub waypoint_follower: Toggle<WaypointFollowerBlock>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderBlock {
    #[serde(default)]
    pub publish_render: bool,
    #[serde(default)]
    pub renderer_type_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysicsMode {
    Aerial,
    Surface,
    Underwater,
}

impl PhysicsMode {
    /// Emission order in the parameter document
    pub const ALL: [PhysicsMode; 3] = [Self::Aerial, Self::Surface, Self::Underwater];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aerial => "aerial",
            Self::Surface => "surface",
            Self::Underwater => "underwater",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionType {
    #[default]
    #[serde(rename = "TCPIP")]
    TcpIp,
    #[serde(rename = "ROS2")]
    Ros2,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TcpIp => "TCPIP",
            Self::Ros2 => "ROS2",
        }
    }
}

/// How the physics engine reaches one mode's plugin
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModeLink {
    #[serde(default)]
    pub connection_type: ConnectionType,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub thrusters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhysicsBlock {
    #[serde(default)]
    pub aerial: Toggle<ModeLink>,
    #[serde(default)]
    pub surface: Toggle<ModeLink>,
    #[serde(default)]
    pub underwater: Toggle<ModeLink>,
    #[serde(default)]
    pub init_state: Option<PhysicsMode>,
}

impl PhysicsBlock {
    pub fn mode(&self, mode: PhysicsMode) -> &Toggle<ModeLink> {
        match mode {
            PhysicsMode::Aerial => &self.aerial,
            PhysicsMode::Surface => &self.surface,
            PhysicsMode::Underwater => &self.underwater,
        }
    }

    pub fn mode_mut(&mut self, mode: PhysicsMode) -> &mut Toggle<ModeLink> {
        match mode {
            PhysicsMode::Aerial => &mut self.aerial,
            PhysicsMode::Surface => &mut self.surface,
            PhysicsMode::Underwater => &mut self.underwater,
        }
    }

    /// Enabled modes in emission order
    pub fn enabled_modes(&self) -> impl Iterator<Item = (PhysicsMode, &ModeLink)> {
        PhysicsMode::ALL
            .into_iter()
            .filter_map(move |mode| self.mode(mode).active().map(|link| (mode, link)))
    }

    /// Initial state, only when it names an enabled mode
    pub fn effective_init_state(&self) -> Option<PhysicsMode> {
        self.init_state.filter(|mode| self.mode(*mode).enabled)
    }
}

/// Path the follower plugin drives along. Only one variant can ever be active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FollowerPattern {
    Waypoints {
        #[serde(default)]
        waypoints: Vec<GeoPoint>,
    },
    Line {
        #[serde(default)]
        direction: f64,
        #[serde(default)]
        length: f64,
    },
    Circle {
        #[serde(default)]
        radius: f64,
    },
}

impl Default for FollowerPattern {
    fn default() -> Self {
        Self::Waypoints {
            waypoints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WaypointFollowerBlock {
    #[serde(default, rename = "loop")]
    pub loop_path: bool,
    #[serde(default)]
    pub linear_acc_limit: f64,
    #[serde(default)]
    pub angular_acc_limit: f64,
    #[serde(default)]
    pub angular_vel_limit: f64,
    #[serde(default)]
    pub pattern: FollowerPattern,
}

impl VesselSpawnConfig {
    pub fn new(model_name: impl Into<String>, vessel_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            vessel_name: vessel_name.into(),
            ..Default::default()
        }
    }

    /// Blank config whose position is the given map coordinate
    pub fn seeded_at(point: GeoPoint) -> Self {
        Self {
            position: LatLongPosition::at(point),
            ..Default::default()
        }
    }

    pub fn set_heading(&mut self, heading: f64) {
        self.position.heading = heading;
    }

    pub fn set_elevation(&mut self, elevation: f64) {
        self.position.elevation = elevation;
    }

    pub fn add_thruster(&mut self, mode: PhysicsMode, name: impl Into<String>) {
        self.physics
            .value
            .mode_mut(mode)
            .value
            .thrusters
            .push(name.into());
    }

    pub fn remove_thruster(&mut self, mode: PhysicsMode, index: usize) -> Option<String> {
        let thrusters = &mut self.physics.value.mode_mut(mode).value.thrusters;
        (index < thrusters.len()).then(|| thrusters.remove(index))
    }

    /// Appends a waypoint, switching the follower to waypoints mode if needed
    pub fn add_waypoint(&mut self, point: GeoPoint) {
        let follower = &mut self.waypoint_follower.value;
        match &mut follower.pattern {
            FollowerPattern::Waypoints { waypoints } => waypoints.push(point),
            _ => {
                follower.pattern = FollowerPattern::Waypoints {
                    waypoints: vec![point],
                }
            }
        }
    }

    pub fn set_pattern(&mut self, pattern: FollowerPattern) {
        self.waypoint_follower.value.pattern = pattern;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_hides_value_when_off() {
        let toggle = Toggle::off(RenderBlock {
            publish_render: true,
            renderer_type_name: "ogre".to_string(),
        });
        assert!(toggle.active().is_none());
        assert_eq!(toggle.value.renderer_type_name, "ogre");
    }

    #[test]
    fn test_enabled_modes_follow_fixed_order() {
        let mut physics = PhysicsBlock::default();
        physics.underwater.enabled = true;
        physics.aerial.enabled = true;

        let modes: Vec<PhysicsMode> = physics.enabled_modes().map(|(m, _)| m).collect();
        assert_eq!(modes, vec![PhysicsMode::Aerial, PhysicsMode::Underwater]);
    }

    #[test]
    fn test_init_state_requires_enabled_mode() {
        let mut physics = PhysicsBlock {
            init_state: Some(PhysicsMode::Surface),
            ..Default::default()
        };
        assert_eq!(physics.effective_init_state(), None);

        physics.surface.enabled = true;
        assert_eq!(physics.effective_init_state(), Some(PhysicsMode::Surface));
    }

    #[test]
    fn test_add_waypoint_switches_pattern() {
        let mut config = VesselSpawnConfig::new("boat", "v1");
        config.set_pattern(FollowerPattern::Circle { radius: 10.0 });
        config.add_waypoint(GeoPoint::new(1.0, 2.0));
        config.add_waypoint(GeoPoint::new(3.0, 4.0));

        assert_eq!(
            config.waypoint_follower.value.pattern,
            FollowerPattern::Waypoints {
                waypoints: vec![GeoPoint::new(1.0, 2.0), GeoPoint::new(3.0, 4.0)]
            }
        );
    }

    #[test]
    fn test_thruster_edits_keep_order() {
        let mut config = VesselSpawnConfig::new("boat", "v1");
        for name in ["A", "B", "C"] {
            config.add_thruster(PhysicsMode::Surface, name);
        }
        assert_eq!(config.remove_thruster(PhysicsMode::Surface, 1), Some("B".to_string()));
        assert_eq!(config.remove_thruster(PhysicsMode::Surface, 5), None);
        assert_eq!(config.physics.value.surface.value.thrusters, vec!["A", "C"]);
    }

    #[test]
    fn test_deserialize_operator_request() {
        let json = r#"{
            "model_name": "wamv",
            "vessel_name": "v1",
            "position": {"latitude": 1.24, "longitude": 103.71, "heading": 90},
            "physics": {"enabled": true, "value": {
                "surface": {"enabled": true, "value": {"connection_type": "ROS2", "uri": "ros://x", "thrusters": ["left", "right"]}},
                "init_state": "surface"
            }},
            "waypoint_follower": {"enabled": true, "value": {"loop": true, "pattern": {"mode": "circle", "radius": 25}}}
        }"#;
        let config: VesselSpawnConfig = serde_json::from_str(json).unwrap();

        assert!(config.render.active().is_none());
        let surface = config.physics.value.surface.active().unwrap();
        assert_eq!(surface.connection_type, ConnectionType::Ros2);
        assert_eq!(surface.thrusters, vec!["left", "right"]);
        assert!(config.waypoint_follower.value.loop_path);
        assert_eq!(
            config.waypoint_follower.value.pattern,
            FollowerPattern::Circle { radius: 25.0 }
        );
    }
}
