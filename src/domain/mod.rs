pub mod account;
pub mod deal;
pub mod position;

pub use account::*;
pub use deal::*;
pub use position::*;
