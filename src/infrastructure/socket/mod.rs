mod error;
mod mock_socket;
mod traits;

pub use error::*;
pub use mock_socket::*;
pub use traits::*;
