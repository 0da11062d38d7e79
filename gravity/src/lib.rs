use bevy::diagnostic::DiagnosticPath;

mod plugin;
pub use plugin::*;

pub mod attraction;
pub use attraction::*;

pub mod sources;
pub use sources::*;

pub mod orientation;
pub use orientation::*;

pub mod player;
pub use player::*;

pub const GRAVITY_COMPUTE_SYSTEM_DURATION: DiagnosticPath =
    DiagnosticPath::const_new("gravity/attraction_pass");
