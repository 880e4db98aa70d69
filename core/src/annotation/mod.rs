pub mod selection;

pub use selection::{surface_to_frame, AnnotationSelection, AnnotationState, SelectionRole};
