// Model types are part of the public API - some methods/structs may not be used internally yet
#![allow(dead_code)]

mod branch;
mod cart;
mod catalog;
mod order;
mod user;

pub use branch::*;
pub use cart::*;
pub use catalog::*;
pub use order::*;
pub use user::*;
