use crate::algebra::*;
use crate::utils::SettingsError;
use derive_builder::Builder;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Settings for [`GubMatrix`](crate::gub::GubMatrix) and
/// [`DynamicGubMatrix`](crate::gub::DynamicGubMatrix)

#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GubSettings<T: FloatT> {
    /// iterations between full recomputations of the effective rhs
    /// (0 = only when forced)
    #[builder(default = "100")]
    pub refresh_frequency: usize,

    /// sets scanned before partial pricing may give up
    #[builder(default = "5")]
    pub minimum_objects_scan: usize,

    /// improving candidates found before partial pricing may give up
    #[builder(default = "5")]
    pub minimum_good_reduced_costs: usize,

    /// weight given to free and superbasic candidates in pricing
    #[builder(default = "(10.0).as_T()")]
    pub free_bias: T,

    /// multiple of the dual tolerance a free candidate must exceed
    #[builder(default = "(100.0).as_T()")]
    pub free_accept: T,

    /// slots in the dynamic column window.  Defaults to
    /// `sets + rows + 2 * refactor_frequency + 2`
    #[builder(default = "None", setter(strip_option))]
    pub window_size: Option<usize>,

    /// iterations between refactorizations of the driver, used to size
    /// the dynamic window and decide when it is too full
    #[builder(default = "200")]
    pub refactor_frequency: usize,

    /// print key changes and window compactions
    #[builder(default = "false")]
    pub verbose: bool,
}

impl<T> Default for GubSettings<T>
where
    T: FloatT,
{
    fn default() -> GubSettings<T> {
        GubSettingsBuilder::<T>::default().build().unwrap()
    }
}

impl<T> GubSettings<T>
where
    T: FloatT,
{
    /// Checks that the settings are internally consistent.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_bias(self.free_bias, self.free_accept)?;
        if self.window_size == Some(0) {
            return Err(SettingsError::BadFieldValue("window_size"));
        }
        Ok(())
    }

    pub(crate) fn window_size_for(&self, sets: usize, rows: usize) -> usize {
        self.window_size
            .unwrap_or(sets + rows + 2 * self.refactor_frequency + 2)
    }
}

impl From<SettingsError> for GubSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        GubSettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl<T> GubSettingsBuilder<T>
where
    T: FloatT,
{
    pub fn validate(&self) -> Result<(), SettingsError> {
        let bias = self.free_bias.unwrap_or((10.0).as_T());
        let accept = self.free_accept.unwrap_or((100.0).as_T());
        validate_bias(bias, accept)?;
        if let Some(Some(0)) = self.window_size {
            return Err(SettingsError::BadFieldValue("window_size"));
        }
        Ok(())
    }
}

fn validate_bias<T: FloatT>(bias: T, accept: T) -> Result<(), SettingsError> {
    if bias < T::one() {
        return Err(SettingsError::BadFieldValue("free_bias"));
    }
    if accept <= T::zero() {
        return Err(SettingsError::BadFieldValue("free_accept"));
    }
    Ok(())
}

#[test]
fn test_gub_settings_validate() {
    let settings = GubSettings::<f64>::default();
    settings.validate().unwrap();
    assert_eq!(settings.window_size_for(3, 4), 3 + 4 + 402);

    assert!(GubSettingsBuilder::<f64>::default()
        .window_size(0)
        .build()
        .is_err());
    assert!(GubSettingsBuilder::<f64>::default()
        .free_bias(0.5)
        .build()
        .is_err());

    let settings = GubSettingsBuilder::<f64>::default()
        .window_size(5)
        .build()
        .unwrap();
    assert_eq!(settings.window_size_for(3, 4), 5);
}
