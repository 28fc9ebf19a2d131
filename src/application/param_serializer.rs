// Parameter serializer - VesselSpawnConfig to the backend's <lotus_param> document
use crate::domain::spawn_config::{
    FollowerPattern, ModeLink, PhysicsBlock, RenderBlock, VesselSpawnConfig, WaypointFollowerBlock,
};
use std::fmt::Write;

const ROOT: &str = "lotus_param";

/// Render a spawn config as a parameter document.
///
/// Blocks that are switched off produce no element at all. Free text is escaped,
/// numbers and booleans are written as-is, and the result is whitespace-normalized
/// in a single final pass.
pub fn serialize(config: &VesselSpawnConfig) -> String {
    let mut doc = String::new();
    let _ = writeln!(doc, "<{}>", ROOT);

    if let Some(render) = config.render.active() {
        write_render(&mut doc, render);
    }
    if let Some(physics) = config.physics.active() {
        write_physics(&mut doc, physics);
    }
    if let Some(follower) = config.waypoint_follower.active() {
        write_waypoint_follower(&mut doc, follower);
    }

    let _ = writeln!(doc, "</{}>", ROOT);
    normalize_whitespace(&doc)
}

fn write_render(doc: &mut String, render: &RenderBlock) {
    let _ = writeln!(doc, "  <render_interface>");
    let _ = writeln!(doc, "    <publish_render>{}</publish_render>", render.publish_render);
    let _ = writeln!(
        doc,
        "    <renderer_type_name>{}</renderer_type_name>",
        escape_markup(&render.renderer_type_name)
    );
    let _ = writeln!(doc, "  </render_interface>");
}

fn write_physics(doc: &mut String, physics: &PhysicsBlock) {
    let _ = writeln!(doc, "  <physics_engine_interface>");
    for (mode, link) in physics.enabled_modes() {
        write_mode_link(doc, mode.as_str(), link);
    }
    let init_state = physics
        .effective_init_state()
        .map(|mode| mode.as_str())
        .unwrap_or_default();
    let _ = writeln!(doc, "    <init_state>{}</init_state>", init_state);
    let _ = writeln!(doc, "  </physics_engine_interface>");
}

fn write_mode_link(doc: &mut String, tag: &str, link: &ModeLink) {
    let _ = writeln!(doc, "    <{}>", tag);
    let _ = writeln!(
        doc,
        "      <ConnectionType>{}</ConnectionType>",
        link.connection_type.as_str()
    );
    let _ = writeln!(doc, "      <uri>{}</uri>", escape_markup(&link.uri));
    let _ = writeln!(doc, "      <thrusters>");
    for (i, name) in link.thrusters.iter().enumerate() {
        let n = i + 1;
        let _ = writeln!(
            doc,
            "        <thrusters{n}>{}</thrusters{n}>",
            escape_markup(name)
        );
    }
    let _ = writeln!(doc, "      </thrusters>");
    let _ = writeln!(doc, "    </{}>", tag);
}

fn write_waypoint_follower(doc: &mut String, follower: &WaypointFollowerBlock) {
    // An empty waypoint list has nothing to follow; leave the section out entirely.
    if let FollowerPattern::Waypoints { waypoints } = &follower.pattern {
        if waypoints.is_empty() {
            return;
        }
    }

    let _ = writeln!(doc, "  <waypoint_follower>");
    let _ = writeln!(doc, "    <follower>");
    write_follower_limits(doc, follower);

    match &follower.pattern {
        FollowerPattern::Waypoints { waypoints } => {
            let _ = writeln!(doc, "      <waypoints>");
            for point in waypoints {
                let _ = writeln!(doc, "        <waypoint>{} {}</waypoint>", point.lat, point.lng);
            }
            let _ = writeln!(doc, "      </waypoints>");
        }
        FollowerPattern::Line { direction, length } => {
            let _ = writeln!(doc, "      <line>");
            let _ = writeln!(doc, "        <direction>{}</direction>", direction);
            let _ = writeln!(doc, "        <length>{}</length>", length);
            let _ = writeln!(doc, "      </line>");
        }
        FollowerPattern::Circle { radius } => {
            let _ = writeln!(doc, "      <circle>");
            let _ = writeln!(doc, "        <radius>{}</radius>", radius);
            let _ = writeln!(doc, "      </circle>");
        }
    }

    let _ = writeln!(doc, "    </follower>");
    let _ = writeln!(doc, "  </waypoint_follower>");
}

fn write_follower_limits(doc: &mut String, follower: &WaypointFollowerBlock) {
    let _ = writeln!(doc, "      <loop>{}</loop>", follower.loop_path);
    let _ = writeln!(
        doc,
        "      <linear_acceleration_limit>{}</linear_acceleration_limit>",
        follower.linear_acc_limit
    );
    let _ = writeln!(
        doc,
        "      <angular_acceleration_limit>{}</angular_acceleration_limit>",
        follower.angular_acc_limit
    );
    let _ = writeln!(
        doc,
        "      <angular_velocity_limit>{}</angular_velocity_limit>",
        follower.angular_vel_limit
    );
}

/// Escape the five reserved markup characters
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strip newlines and tabs, collapse runs of spaces, and join adjacent tags (`> <` becomes `><`).
pub fn normalize_whitespace(doc: &str) -> String {
    let mut collapsed = String::with_capacity(doc.len());
    for c in doc.chars() {
        match c {
            '\n' | '\r' | '\t' => {}
            ' ' if collapsed.ends_with(' ') => {}
            _ => collapsed.push(c),
        }
    }
    collapsed.replace("> <", "><")
}
