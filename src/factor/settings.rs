use crate::algebra::*;
use crate::utils::{check_immutable_setting, SettingsError};
use derive_builder::Builder;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Kernel used for one phase (L, U or their transposes) of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolveStrategy {
    /// full scan of every stored eta / column
    Dense,
    /// bit-masked scan over pivot steps, skipping empty words
    SemiSparse,
    /// depth-first reach computation over the nonzero pattern
    Sparse,
}

/// Settings for [`Factorization`](crate::factor::Factorization)

#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FactorSettings<T: FloatT> {
    /// relative pivot threshold: a pivot must be at least this fraction
    /// of the largest magnitude in its column
    #[builder(default = "(0.1).as_T()")]
    pub pivot_tolerance: T,

    /// entries below this magnitude are dropped
    #[builder(default = "(1e-13).as_T()")]
    pub zero_tolerance: T,

    /// coefficient of a basic slack column
    #[builder(default = "(1.0).as_T()")]
    pub slack_value: T,

    /// updates allowed before `replace_column` asks for a refactorization
    #[builder(default = "200")]
    pub maximum_pivots: usize,

    /// multiplier on the pivot accuracy tolerance
    #[builder(default = "(1.0).as_T()")]
    pub relax_check: T,

    /// storage area size relative to the basis element count
    #[builder(default = "4.0")]
    pub area_factor: f64,

    /// retries with a doubled area before factorize reports out of memory
    #[builder(default = "4")]
    pub maximum_area_retries: u32,

    /// Forrest-Tomlin updates (otherwise product form)
    #[builder(default = "true")]
    pub forrest_tomlin: bool,

    /// switch to dense elimination when the active submatrix fills in
    #[builder(default = "true")]
    pub dense_enable: bool,

    /// fill ratio of the active submatrix that triggers the dense switch
    #[builder(default = "0.5")]
    pub dense_threshold: f64,

    /// smallest active submatrix handed to the dense kernel
    #[builder(default = "8")]
    pub dense_minimum_size: usize,

    /// Markowitz candidates examined before accepting the best so far
    #[builder(default = "4")]
    pub number_trials: usize,

    /// expected density below which solves use depth-first traversal
    #[builder(default = "0.05")]
    pub sparse_threshold: f64,

    /// expected density below which solves use the bit-masked scan
    #[builder(default = "0.3")]
    pub semi_sparse_threshold: f64,

    /// force one solve kernel for every phase
    #[builder(default = "None", setter(strip_option))]
    pub solve_strategy: Option<SolveStrategy>,

    /// print a summary line per factorization
    #[builder(default = "false")]
    pub verbose: bool,
}

impl<T> Default for FactorSettings<T>
where
    T: FloatT,
{
    fn default() -> FactorSettings<T> {
        FactorSettingsBuilder::<T>::default().build().unwrap()
    }
}

impl<T> FactorSettings<T>
where
    T: FloatT,
{
    /// Checks that the settings are internally consistent.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_pivot_tolerance(self.pivot_tolerance)?;
        if self.zero_tolerance <= T::zero() {
            return Err(SettingsError::BadFieldValue("zero_tolerance"));
        }
        if self.slack_value == T::zero() {
            return Err(SettingsError::BadFieldValue("slack_value"));
        }
        if self.relax_check <= T::zero() {
            return Err(SettingsError::BadFieldValue("relax_check"));
        }
        if !(self.area_factor >= 1.0) {
            return Err(SettingsError::BadFieldValue("area_factor"));
        }
        if !(0.0..=1.0).contains(&self.dense_threshold) {
            return Err(SettingsError::BadFieldValue("dense_threshold"));
        }
        validate_solve_thresholds(self.sparse_threshold, self.semi_sparse_threshold)?;
        Ok(())
    }

    /// check that a settings object is a valid replacement for the
    /// settings of an existing factorization.  Storage sizing is fixed
    /// once the first factorization has been allocated.
    pub fn validate_as_update(&self, prev: &Self) -> Result<(), SettingsError> {
        self.validate()?;
        check_immutable_setting!(self, prev, maximum_pivots);
        check_immutable_setting!(self, prev, forrest_tomlin);
        Ok(())
    }
}

// pre build checker (for auto-validation when using the builder)

impl From<SettingsError> for FactorSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        FactorSettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl<T> FactorSettingsBuilder<T>
where
    T: FloatT,
{
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(tol) = self.pivot_tolerance {
            validate_pivot_tolerance(tol)?;
        }
        let sparse = self.sparse_threshold.unwrap_or(0.05);
        let semi = self.semi_sparse_threshold.unwrap_or(0.3);
        validate_solve_thresholds(sparse, semi)?;
        Ok(())
    }
}

// ---------------------------------------------------------
// individual validation functions go here
// ---------------------------------------------------------

fn validate_pivot_tolerance<T: FloatT>(tol: T) -> Result<(), SettingsError> {
    if tol <= T::zero() || tol > T::one() {
        return Err(SettingsError::BadFieldValue("pivot_tolerance"));
    }
    Ok(())
}

fn validate_solve_thresholds(sparse: f64, semi: f64) -> Result<(), SettingsError> {
    if !(0.0..=1.0).contains(&sparse) || !(0.0..=1.0).contains(&semi) || sparse > semi {
        return Err(SettingsError::BadFieldValue("sparse_threshold"));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_factor_settings_validate() {
        // all standard settings
        FactorSettings::<f64>::default().validate().unwrap();

        // fail on out of range pivot tolerance
        assert!(FactorSettingsBuilder::<f64>::default()
            .pivot_tolerance(1.5)
            .build()
            .is_err());

        // fail on inverted thresholds
        assert!(FactorSettingsBuilder::<f64>::default()
            .sparse_threshold(0.5)
            .semi_sparse_threshold(0.1)
            .build()
            .is_err());

        let settings = FactorSettingsBuilder::<f64>::default()
            .solve_strategy(SolveStrategy::Sparse)
            .build()
            .unwrap();
        assert_eq!(settings.solve_strategy, Some(SolveStrategy::Sparse));
    }

    #[test]
    fn test_factor_settings_update() {
        let prev = FactorSettings::<f64>::default();
        let mut next = prev.clone();
        next.pivot_tolerance = 0.5;
        assert!(next.validate_as_update(&prev).is_ok());

        next.maximum_pivots = 10;
        assert_eq!(
            next.validate_as_update(&prev),
            Err(SettingsError::ImmutableSetting("maximum_pivots"))
        );
    }
}
