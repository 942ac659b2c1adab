pub mod assumptions;
pub mod brief;
pub mod config_manager;
pub mod error;
pub mod estimator;
pub mod export;
pub mod profile;
pub mod rules;
pub mod session;
pub mod summary;

pub use assumptions::*;
pub use brief::*;
pub use config_manager::*;
pub use error::*;
pub use estimator::*;
pub use export::*;
pub use profile::{
    params, toggles, ProfileCatalog, ProfileDefinition, ProfileOverrides, DEFAULT_PROFILE,
};
pub use rules::*;
pub use session::*;
pub use summary::*;
