mod components;
pub use components::*;

mod systems;
pub use systems::*;
