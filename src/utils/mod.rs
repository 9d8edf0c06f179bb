//! Process-wide numeric settings, settings validation and the
//! arena linked lists shared by the factorization and GUB layers.

pub(crate) mod atomic;
mod infbounds;
mod lists;
mod settings;
pub use infbounds::*;
pub use lists::*;
pub(crate) use settings::check_immutable_setting;
pub use settings::SettingsError;
