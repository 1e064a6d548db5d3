pub mod figma;
pub mod proxy;
