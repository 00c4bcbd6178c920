/// Position-level constraints solved by the fluid solver.
pub mod density;
