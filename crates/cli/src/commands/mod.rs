pub mod corpus;
pub mod history;
pub mod solve;
pub mod util;

pub use corpus::*;
pub use history::*;
pub use solve::*;
pub use util::*;
