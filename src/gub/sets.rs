use crate::algebra::*;
use crate::utils::{ListArena, ListIter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Basic representative of a GUB set.
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Key {
    /// the set slack is basic and is the key
    Slack,
    /// a basic member column is the key
    Member(usize),
}

impl Key {
    pub fn member(&self) -> Option<usize> {
        match *self {
            Key::Member(j) => Some(j),
            Key::Slack => None,
        }
    }
}

/// Status of the set slack.
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SetStatus {
    /// slack is basic (and therefore the key)
    Basic,
    /// member sum held at the set lower bound
    AtLowerBound,
    /// member sum held at the set upper bound
    AtUpperBound,
    /// lower and upper bound coincide
    IsFixed,
}

/// Position of the member sum relative to the set bounds.  Only
/// meaningful while the slack is key.
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SetFeasibility {
    #[default]
    Feasible,
    Above,
    Below,
}

impl SetFeasibility {
    /// sign of the phase one cost carried by members of an infeasible set
    pub fn weight<T: FloatT>(&self) -> T {
        match self {
            SetFeasibility::Feasible => T::zero(),
            SetFeasibility::Above => T::one(),
            SetFeasibility::Below => -T::one(),
        }
    }

    pub(crate) fn classify<T: FloatT>(sum: T, lower: T, upper: T, tolerance: T) -> Self {
        if sum > upper + tolerance {
            SetFeasibility::Above
        } else if sum < lower - tolerance {
            SetFeasibility::Below
        } else {
            SetFeasibility::Feasible
        }
    }
}

/// Bounds and key bookkeeping of one GUB set.
#[derive(Debug, Clone)]
pub struct GubSet<T> {
    /// effective bounds on the sum of the working members
    pub lower: T,
    pub upper: T,
    pub key: Key,
    pub status: SetStatus,
    pub feasibility: SetFeasibility,
    pub flagged: bool,
}

impl<T> GubSet<T>
where
    T: FloatT,
{
    pub fn new(lower: T, upper: T) -> Self {
        Self {
            lower,
            upper,
            key: Key::Slack,
            status: SetStatus::Basic,
            feasibility: SetFeasibility::Feasible,
            flagged: false,
        }
    }

    /// value the member sum is held at while a structural is key
    pub fn bound_value(&self) -> T {
        match self.status {
            SetStatus::AtLowerBound => self.lower,
            _ => self.upper,
        }
    }

    /// Nonbasic status for a slack leaving at `value`.
    pub(crate) fn status_at(&self, value: T) -> SetStatus {
        if self.upper == self.lower {
            SetStatus::IsFixed
        } else if value == self.upper {
            SetStatus::AtUpperBound
        } else if value == self.lower {
            SetStatus::AtLowerBound
        } else if (value - self.upper).abs() < (value - self.lower).abs() {
            SetStatus::AtUpperBound
        } else {
            SetStatus::AtLowerBound
        }
    }
}

/// Per-set chains of the non-key members.
///
/// Basic members come first, then nonbasic ones.  The order is restored
/// by [`redo`](MemberChains::redo) whenever a pivot touches the set.
#[derive(Debug, Clone)]
pub struct MemberChains {
    lists: ListArena,
}

impl MemberChains {
    pub fn new(ncolumns: usize, nsets: usize) -> Self {
        Self {
            lists: ListArena::new(ncolumns, nsets),
        }
    }

    /// non-key members of `set`, basic ones first
    pub fn members(&self, set: usize) -> ListIter<'_> {
        self.lists.iter(set)
    }

    pub fn len(&self, set: usize) -> usize {
        self.lists.iter(set).count()
    }

    pub fn contains(&self, j: usize) -> bool {
        self.lists.contains(j)
    }

    pub(crate) fn link(&mut self, set: usize, j: usize) {
        self.lists.push_back(set, j);
    }

    pub(crate) fn unlink(&mut self, j: usize) {
        self.lists.remove(j);
    }

    /// Rebuild the chain of `set` around `new_key`.  The previous key
    /// rejoins the chain as an ordinary member.
    pub(crate) fn redo<F>(&mut self, set: usize, new_key: Key, old_key: Key, is_basic: F)
    where
        F: Fn(usize) -> bool,
    {
        let mut members: Vec<usize> = self.lists.iter(set).collect();
        if let Key::Member(k) = old_key {
            if old_key != new_key {
                members.push(k);
            }
        }
        if let Key::Member(k) = new_key {
            members.retain(|&j| j != k);
        }
        self.lists.clear(set);
        let (basic, nonbasic): (Vec<usize>, Vec<usize>) = members.into_iter().partition(|&j| is_basic(j));
        for j in basic.into_iter().chain(nonbasic) {
            self.lists.push_back(set, j);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_redo_orders_basic_first() {
        let mut chains = MemberChains::new(6, 2);
        for j in 0..4 {
            chains.link(0, j);
        }
        let basic = [false, true, false, true, false, false];

        // column 1 becomes key, the slack was key before
        chains.redo(0, Key::Member(1), Key::Slack, |j| basic[j]);
        assert_eq!(chains.members(0).collect::<Vec<_>>(), vec![3, 0, 2]);

        // key moves back to the slack, 1 rejoins the chain
        chains.redo(0, Key::Slack, Key::Member(1), |j| basic[j]);
        assert_eq!(chains.members(0).collect::<Vec<_>>(), vec![3, 1, 0, 2]);
        assert_eq!(chains.len(1), 0);
    }

    #[test]
    fn test_slack_status_at() {
        let set = GubSet::new(1.0, 4.0);
        assert_eq!(set.status_at(4.0), SetStatus::AtUpperBound);
        assert_eq!(set.status_at(1.2), SetStatus::AtLowerBound);
        assert_eq!(set.status_at(3.9), SetStatus::AtUpperBound);
        assert_eq!(GubSet::new(2.0, 2.0).status_at(2.0), SetStatus::IsFixed);
        assert_eq!(
            SetFeasibility::classify(5.0, 1.0, 4.0, 1e-7),
            SetFeasibility::Above
        );
        assert_eq!(SetFeasibility::Below.weight::<f64>(), -1.0);
    }
}
