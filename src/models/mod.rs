pub mod item;
pub mod recommendation;
pub mod stats;
pub mod transaction;
pub mod user;

pub use item::*;
pub use recommendation::*;
pub use stats::*;
pub use transaction::*;
pub use user::*;
