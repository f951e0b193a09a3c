pub mod duration;
pub mod errors;
pub mod scenario;
pub mod todo;

pub use errors::*;
pub use scenario::*;
pub use todo::*;
