pub mod amount;
pub mod config;
pub mod errors;
pub mod positions;
pub mod protocol;
pub mod threshold;

pub use amount::*;
pub use config::*;
pub use errors::*;
pub use positions::*;
pub use protocol::*;
pub use threshold::*;
