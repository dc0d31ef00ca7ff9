// Domain layer: the value shapes and the traits user types implement.

pub mod model;
pub mod ports;
