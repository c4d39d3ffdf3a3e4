pub mod entities;
pub mod requests;
pub mod responses;

pub use entities::{Assignment, AssignmentStatus};
pub use requests::*;
pub use responses::*;
