mod components;
pub use components::*;

mod resources;
pub use resources::*;

mod systems;
pub use systems::*;
