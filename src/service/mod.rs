pub mod aggregate;
pub mod counter;
pub mod frame;
pub mod render;
pub mod worldview;

pub use counter::{CounterArgumentError, CounterArgumentService};
pub use worldview::{WorldviewService, WorldviewServiceError};
