pub mod fixtures;
pub mod mock_repositories;

pub use fixtures::*;
pub use mock_repositories::*;
