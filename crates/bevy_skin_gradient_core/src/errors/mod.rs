mod falloff_error;
mod gradient_error;
mod session_error;

pub use falloff_error::*;
pub use gradient_error::*;
pub use session_error::*;
