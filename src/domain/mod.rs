pub mod errors;
pub mod fetch;
pub mod model;
pub mod ports;
pub mod projection;
