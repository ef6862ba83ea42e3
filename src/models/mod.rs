pub mod stock;
pub mod news;
pub mod prediction;
pub mod response;

pub use stock::*;
pub use news::*;
pub use prediction::*;
pub use response::*;
