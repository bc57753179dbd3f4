pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Add, Cat, Chmod, Cp, Init, Ls, Mkdir, Mv, Rm, Root, Stat, Touch};
