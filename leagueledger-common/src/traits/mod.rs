pub mod api;
pub mod directory_traits;
pub mod repository_traits;
