pub mod errors;
pub mod ocpp_frame;
pub mod shutdown;

pub use errors::*;
pub use ocpp_frame::*;
pub use shutdown::*;
