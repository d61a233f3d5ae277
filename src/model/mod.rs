pub mod gateway;
pub mod geo;
pub mod lorawan;
