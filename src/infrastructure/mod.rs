pub mod backends;
pub mod fetchers;
