pub mod display_list;
pub mod overlay;

pub use display_list::{DisplayList, DrawCommand, Point, Rgba, Surface};
pub use overlay::{Badge, BadgeSlot, OverlayRenderer, OverlayRequest};
