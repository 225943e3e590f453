mod bounds;
mod drag;
mod movement;

pub use bounds::BoundsSystem;
pub use drag::DragSystem;
pub use movement::MovementSystem;
