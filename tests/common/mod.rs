#![allow(dead_code)]

pub mod handlers;
pub mod strategies;

pub use handlers::*;
pub use strategies::*;
