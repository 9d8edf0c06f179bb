use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
/// Error type returned by settings validation
pub enum SettingsError {
    /// An error attributable to one of the fields
    #[error("Bad value for field \"{0}\"")]
    BadFieldValue(&'static str),
    /// A setting that cannot change once the engine has been created
    #[error("Setting \"{0}\" cannot be changed after construction")]
    ImmutableSetting(&'static str),
}

// reject updates to fields that are fixed at construction
macro_rules! check_immutable_setting {
    ($self:expr, $prev:expr, $field:ident) => {
        if $self.$field != $prev.$field {
            return Err($crate::utils::SettingsError::ImmutableSetting(
                stringify!($field),
            ));
        }
    };
}
pub(crate) use check_immutable_setting;
