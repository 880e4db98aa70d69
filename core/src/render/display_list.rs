use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const GREEN: Rgba = Rgba([0x00, 0xff, 0x00, 0xff]);
    pub const RED: Rgba = Rgba([0xff, 0x00, 0x00, 0xff]);
    pub const BLUE: Rgba = Rgba([0x00, 0x00, 0xff, 0xff]);
    pub const GOLD: Rgba = Rgba([0xff, 0xd7, 0x00, 0xff]);
    pub const OFFSIDE: Rgba = Rgba([0xe7, 0x4c, 0x3c, 0xff]);
    pub const ONSIDE: Rgba = Rgba([0x2e, 0xcc, 0x71, 0xff]);
    pub const GOAL: Rgba = Rgba([0x27, 0xae, 0x60, 0xff]);
    pub const NO_GOAL: Rgba = Rgba([0xe6, 0x7e, 0x22, 0xff]);

    pub fn to_f32(self) -> [f32; 4] {
        self.0.map(|c| c as f32 / 255.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Drawing primitives in native frame pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear { width: u32, height: u32 },
    Frame { index: u64, timestamp: f64, width: u32, height: u32 },
    Marker { center: Point, radius: f64, color: Rgba },
    Ring { center: Point, radius: f64, color: Rgba, width: f64 },
    Line { from: Point, to: Point, color: Rgba, width: f64 },
}

/// Raster target the overlay renderer draws into.
pub trait Surface {
    fn draw(&mut self, command: DrawCommand);
}

/// Surface that records commands so any backend can replay them later.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DisplayList {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count<F: Fn(&DrawCommand) -> bool>(&self, predicate: F) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }
}

impl Surface for DisplayList {
    fn draw(&mut self, command: DrawCommand) {
        if let DrawCommand::Clear { width, height } = command {
            self.commands.clear();
            self.width = width;
            self.height = height;
        }
        self.commands.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_recorded_commands() {
        let mut list = DisplayList::new();
        list.draw(DrawCommand::Marker {
            center: Point::new(1.0, 1.0),
            radius: 5.0,
            color: Rgba::GREEN,
        });
        list.draw(DrawCommand::Clear {
            width: 640,
            height: 480,
        });
        assert_eq!(list.commands.len(), 1);
        assert_eq!((list.width, list.height), (640, 480));
    }

    #[test]
    fn commands_serialize_with_op_tag() {
        let json = serde_json::to_string(&DrawCommand::Clear {
            width: 1,
            height: 2,
        })
        .unwrap();
        assert!(json.contains("\"op\":\"clear\""));
    }
}
