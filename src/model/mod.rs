pub mod attack;
pub mod config;
pub mod counter;
mod de;
pub mod frame;
pub mod mechanism;
pub mod pattern;
pub mod perception;
pub mod worldview;

pub use attack::{AttackLogic, SimilarityQuery};
pub use config::{BackendConfig, Config, ConfigError};
pub use counter::*;
pub use frame::*;
pub use mechanism::Mechanism;
pub use pattern::*;
pub use perception::*;
pub use worldview::*;
