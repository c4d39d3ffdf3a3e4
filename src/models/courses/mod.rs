pub mod entities;
pub mod requests;
pub mod responses;

pub use entities::Course;
pub use requests::*;
pub use responses::*;
