//! Turn-by-turn instructions.
//!
//! Converts the maneuvers of a directions response into instruction
//! records the host can list or announce. The service's localized text
//! wins when present; otherwise a sentence is generated from the turn
//! category and the distance travelled to reach it.

use serde::{Deserialize, Serialize};

use crate::coord::Position;
use crate::directions::RouteStep;

/// A single turn-by-turn instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Index of the step within the route (across all legs).
    pub step_index: usize,
    /// Distance travelled since the previous maneuver, in meters.
    pub distance_m: f64,
    pub turn: Turn,
    pub text: String,
    /// Where the maneuver happens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Position>,
}

/// Turn direction categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    Start,
    Straight,
    SlightLeft,
    Left,
    SharpLeft,
    SlightRight,
    Right,
    SharpRight,
    UTurn,
    Arrive,
}

/// Build one instruction per step.
pub fn from_steps(steps: &[RouteStep]) -> Vec<Instruction> {
    let mut instructions = Vec::with_capacity(steps.len());
    let mut approach_m = 0.0;

    for (i, step) in steps.iter().enumerate() {
        let turn = step_turn(step);
        let text = match step.maneuver.instruction.as_deref() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => generated_text(turn, approach_m),
        };

        instructions.push(Instruction {
            step_index: i,
            distance_m: approach_m,
            turn,
            text,
            location: Position::from_lng_lat(&step.maneuver.location),
        });

        // A step's distance is the stretch after its maneuver
        approach_m = step.distance;
    }

    instructions
}

fn step_turn(step: &RouteStep) -> Turn {
    let maneuver = &step.maneuver;
    match maneuver.kind.as_str() {
        "depart" => return Turn::Start,
        "arrive" => return Turn::Arrive,
        _ => {}
    }

    if let Some(turn) = maneuver.modifier.as_deref().and_then(parse_modifier) {
        return turn;
    }

    match (maneuver.bearing_before, maneuver.bearing_after) {
        (Some(before), Some(after)) => turn_for_angle(relative_angle(before, after)),
        _ => Turn::Straight,
    }
}

fn parse_modifier(modifier: &str) -> Option<Turn> {
    let turn = match modifier {
        "straight" => Turn::Straight,
        "slight left" => Turn::SlightLeft,
        "left" => Turn::Left,
        "sharp left" => Turn::SharpLeft,
        "slight right" => Turn::SlightRight,
        "right" => Turn::Right,
        "sharp right" => Turn::SharpRight,
        "uturn" => Turn::UTurn,
        _ => return None,
    };
    Some(turn)
}

/// Bearing change from `before` to `after` in (-180, 180]. Positive turns
/// right.
fn relative_angle(before: f64, after: f64) -> f64 {
    let angle = (after - before).rem_euclid(360.0);
    if angle > 180.0 {
        angle - 360.0
    } else {
        angle
    }
}

/// Smallest absolute bearing change of each category, widest first, with
/// the left and right variants.
const TURN_BANDS: [(f64, Turn, Turn); 4] = [
    (170.0, Turn::UTurn, Turn::UTurn),
    (120.0, Turn::SharpLeft, Turn::SharpRight),
    (60.0, Turn::Left, Turn::Right),
    (20.0, Turn::SlightLeft, Turn::SlightRight),
];

fn turn_for_angle(angle: f64) -> Turn {
    TURN_BANDS
        .iter()
        .find(|(min, _, _)| angle.abs() > *min)
        .map(|&(_, left, right)| if angle < 0.0 { left } else { right })
        .unwrap_or(Turn::Straight)
}

impl Turn {
    pub fn phrase(self) -> &'static str {
        match self {
            Turn::Start => "start navigation",
            Turn::Straight => "continue straight",
            Turn::SlightLeft => "keep slightly left",
            Turn::Left => "turn left",
            Turn::SharpLeft => "turn sharp left",
            Turn::SlightRight => "keep slightly right",
            Turn::Right => "turn right",
            Turn::SharpRight => "turn sharp right",
            Turn::UTurn => "make a U-turn",
            Turn::Arrive => "arrive at destination",
        }
    }
}

fn generated_text(turn: Turn, approach_m: f64) -> String {
    if turn == Turn::Start {
        return "Start navigation".to_string();
    }
    format!("In {}, {}", spoken_distance(approach_m), turn.phrase())
}

/// Tens of meters below a kilometer, then kilometers to one decimal.
fn spoken_distance(meters: f64) -> String {
    match meters {
        m if m < 1000.0 => format!("{:.0} m", (m / 10.0).round() * 10.0),
        m => format!("{:.1} km", m / 1000.0),
    }
}
