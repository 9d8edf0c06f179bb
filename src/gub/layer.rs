use super::*;
use crate::algebra::*;
use enum_dispatch::*;

/// Operations a simplex driver calls on a GUB layer once per iteration.
///
/// Implemented by [`GubMatrix`] and [`DynamicGubMatrix`]; a driver that
/// does not know which one it holds uses [`GubLayer`].
#[enum_dispatch]
pub trait GubOps<T>
where
    T: FloatT,
{
    /// Scatter the basis column of `seq` into `column` after clearing it.
    fn unpack(&self, seq: Sequence, column: &mut IndexedVector<T>) -> Result<(), GubError>;

    /// The basis column of `seq`, rows ascending.
    fn unpack_packed(&self, seq: Sequence) -> Result<SparseVector<T>, GubError>;

    /// `column += multiplier * (basis column of seq)`
    fn add(&self, column: &mut IndexedVector<T>, seq: Sequence, multiplier: T) -> Result<(), GubError>;

    fn partial_pricing(
        &mut self,
        model: &mut SimplexModel<T>,
        start: T,
        end: T,
        number_wanted: usize,
    ) -> Result<Option<PricedCandidate<T>>, GubError>;

    fn update_pivot(&mut self, model: &mut SimplexModel<T>, old_in_value: T, old_out_value: T) -> Result<(), GubError>;

    fn use_effective_rhs(&mut self, model: &mut SimplexModel<T>, cheapest: bool) -> Result<(), GubError>;

    fn rhs_offset(&mut self, model: &SimplexModel<T>, force_refresh: bool) -> &[T];

    fn synchronize(&mut self, model: &mut SimplexModel<T>, mode: SyncMode) -> Result<SyncOutcome<T>, GubError>;

    /// Set-row entries of the updated entering column.
    fn extend_updated(&self, model: &SimplexModel<T>, updated: &IndexedVector<T>) -> Result<Vec<SetAlpha<T>>, GubError>;

    fn primal_expanded(&mut self, model: &mut SimplexModel<T>) -> PrimalInfeasibilities<T>;

    /// Tableau row `scalar * pi^T B` over the working columns.
    fn transpose_times(&self, pi: &[T], scalar: T) -> Result<SparseVector<T>, GubError>;
}

/// Either GUB layer behind one [`GubOps`] interface.
#[enum_dispatch(GubOps<T>)]
pub enum GubLayer<T>
where
    T: FloatT,
{
    GubMatrix(GubMatrix<T>),
    DynamicGubMatrix(DynamicGubMatrix<T>),
}

impl<T> GubOps<T> for GubMatrix<T>
where
    T: FloatT,
{
    fn unpack(&self, seq: Sequence, column: &mut IndexedVector<T>) -> Result<(), GubError> {
        GubMatrix::unpack(self, seq, column)
    }

    fn unpack_packed(&self, seq: Sequence) -> Result<SparseVector<T>, GubError> {
        GubMatrix::unpack_packed(self, seq)
    }

    fn add(&self, column: &mut IndexedVector<T>, seq: Sequence, multiplier: T) -> Result<(), GubError> {
        GubMatrix::add(self, column, seq, multiplier)
    }

    fn partial_pricing(
        &mut self,
        model: &mut SimplexModel<T>,
        start: T,
        end: T,
        number_wanted: usize,
    ) -> Result<Option<PricedCandidate<T>>, GubError> {
        GubMatrix::partial_pricing(self, model, start, end, number_wanted)
    }

    fn update_pivot(&mut self, model: &mut SimplexModel<T>, old_in_value: T, old_out_value: T) -> Result<(), GubError> {
        GubMatrix::update_pivot(self, model, old_in_value, old_out_value)
    }

    fn use_effective_rhs(&mut self, model: &mut SimplexModel<T>, cheapest: bool) -> Result<(), GubError> {
        GubMatrix::use_effective_rhs(self, model, cheapest)
    }

    fn rhs_offset(&mut self, model: &SimplexModel<T>, force_refresh: bool) -> &[T] {
        GubMatrix::rhs_offset(self, model, force_refresh)
    }

    fn synchronize(&mut self, model: &mut SimplexModel<T>, mode: SyncMode) -> Result<SyncOutcome<T>, GubError> {
        GubMatrix::synchronize(self, model, mode)
    }

    fn extend_updated(&self, model: &SimplexModel<T>, updated: &IndexedVector<T>) -> Result<Vec<SetAlpha<T>>, GubError> {
        GubMatrix::extend_updated(self, model, updated)
    }

    fn primal_expanded(&mut self, model: &mut SimplexModel<T>) -> PrimalInfeasibilities<T> {
        GubMatrix::primal_expanded(self, model)
    }

    fn transpose_times(&self, pi: &[T], scalar: T) -> Result<SparseVector<T>, GubError> {
        GubMatrix::transpose_times(self, pi, scalar)
    }
}

// column algebra only ever sees working columns
impl<T> GubOps<T> for DynamicGubMatrix<T>
where
    T: FloatT,
{
    fn unpack(&self, seq: Sequence, column: &mut IndexedVector<T>) -> Result<(), GubError> {
        self.base.unpack(seq, column)
    }

    fn unpack_packed(&self, seq: Sequence) -> Result<SparseVector<T>, GubError> {
        self.base.unpack_packed(seq)
    }

    fn add(&self, column: &mut IndexedVector<T>, seq: Sequence, multiplier: T) -> Result<(), GubError> {
        self.base.add(column, seq, multiplier)
    }

    fn partial_pricing(
        &mut self,
        model: &mut SimplexModel<T>,
        start: T,
        end: T,
        number_wanted: usize,
    ) -> Result<Option<PricedCandidate<T>>, GubError> {
        DynamicGubMatrix::partial_pricing(self, model, start, end, number_wanted)
    }

    fn update_pivot(&mut self, model: &mut SimplexModel<T>, old_in_value: T, old_out_value: T) -> Result<(), GubError> {
        DynamicGubMatrix::update_pivot(self, model, old_in_value, old_out_value)
    }

    fn use_effective_rhs(&mut self, model: &mut SimplexModel<T>, cheapest: bool) -> Result<(), GubError> {
        DynamicGubMatrix::use_effective_rhs(self, model, cheapest)
    }

    fn rhs_offset(&mut self, model: &SimplexModel<T>, force_refresh: bool) -> &[T] {
        DynamicGubMatrix::rhs_offset(self, model, force_refresh)
    }

    fn synchronize(&mut self, model: &mut SimplexModel<T>, mode: SyncMode) -> Result<SyncOutcome<T>, GubError> {
        DynamicGubMatrix::synchronize(self, model, mode)
    }

    fn extend_updated(&self, model: &SimplexModel<T>, updated: &IndexedVector<T>) -> Result<Vec<SetAlpha<T>>, GubError> {
        self.base.extend_updated(model, updated)
    }

    fn primal_expanded(&mut self, model: &mut SimplexModel<T>) -> PrimalInfeasibilities<T> {
        self.base.primal_expanded(model)
    }

    fn transpose_times(&self, pi: &[T], scalar: T) -> Result<SparseVector<T>, GubError> {
        self.base.transpose_times(pi, scalar)
    }
}

impl<T> GubLayer<T>
where
    T: FloatT,
{
    /// The static layer underneath, for set and key queries.
    pub fn gub(&self) -> &GubMatrix<T> {
        match self {
            GubLayer::GubMatrix(gub) => gub,
            GubLayer::DynamicGubMatrix(dynamic) => dynamic.base(),
        }
    }
}
