use crate::utils::ListArena;

/// Raised when a [`PackedArea`] cannot fit a vector even after compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AreaFull;

/// Capacity-bounded storage for a set of growable sparse vectors.
///
/// Vectors live in one contiguous index/value region in an arbitrary order
/// tracked by a storage-order list.  A vector that outgrows its slot is moved
/// to the end of the region; when the region is exhausted the vectors are
/// packed down to reclaim the gaps.

#[derive(Debug, Clone)]
pub(crate) struct PackedArea<V> {
    start: Vec<usize>,
    len: Vec<usize>,
    index: Vec<usize>,
    value: Vec<V>,
    order: ListArena,
    // end of the used region, including room reserved for the last vector
    end: usize,
}

impl<V> PackedArea<V>
where
    V: Copy + Default,
{
    pub fn new(nvec: usize, capacity: usize) -> Self {
        Self {
            start: vec![0; nvec],
            len: vec![0; nvec],
            index: vec![0; capacity],
            value: vec![V::default(); capacity],
            order: ListArena::new(nvec, 1),
            end: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.index.len()
    }

    pub fn len(&self, k: usize) -> usize {
        self.len[k]
    }

    /// live elements across all vectors
    pub fn number_elements(&self) -> usize {
        self.len.iter().sum()
    }

    pub fn indices(&self, k: usize) -> &[usize] {
        &self.index[self.start[k]..self.start[k] + self.len[k]]
    }

    pub fn values(&self, k: usize) -> &[V] {
        &self.value[self.start[k]..self.start[k] + self.len[k]]
    }

    pub fn entries(&self, k: usize) -> impl Iterator<Item = (usize, V)> + '_ {
        let rng = self.start[k]..self.start[k] + self.len[k];
        self.index[rng.clone()]
            .iter()
            .copied()
            .zip(self.value[rng].iter().copied())
    }

    /// position of `idx` within vector `k`
    pub fn find(&self, k: usize, idx: usize) -> Option<usize> {
        self.indices(k).iter().position(|&i| i == idx)
    }

    pub fn value_at(&self, k: usize, pos: usize) -> V {
        self.value[self.start[k] + pos]
    }

    pub fn set_value_at(&mut self, k: usize, pos: usize, v: V) {
        let s = self.start[k];
        self.value[s + pos] = v;
    }

    /// Append one entry to vector `k`.
    pub fn push(&mut self, k: usize, idx: usize, v: V) -> Result<(), AreaFull> {
        self.reserve(k, 1)?;
        let p = self.start[k] + self.len[k];
        self.index[p] = idx;
        self.value[p] = v;
        self.len[k] += 1;
        if self.order.next_of(k).is_none() {
            self.end = self.end.max(p + 1);
        }
        Ok(())
    }

    /// Remove the entry at `pos` of vector `k`.  Order is not preserved.
    pub fn swap_remove(&mut self, k: usize, pos: usize) {
        let s = self.start[k];
        let last = s + self.len[k] - 1;
        self.index[s + pos] = self.index[last];
        self.value[s + pos] = self.value[last];
        self.len[k] -= 1;
    }

    /// Remove the entry with index `idx` from vector `k`, returning its value.
    pub fn remove_index(&mut self, k: usize, idx: usize) -> Option<V> {
        let pos = self.find(k, idx)?;
        let v = self.value_at(k, pos);
        self.swap_remove(k, pos);
        Some(v)
    }

    pub fn clear(&mut self, k: usize) {
        self.len[k] = 0;
    }

    /// Free slots available to vector `k` without relocation.
    fn room_in_place(&self, k: usize) -> usize {
        if !self.order.contains(k) {
            return 0;
        }
        let bound = match self.order.next_of(k) {
            Some(nx) => self.start[nx],
            None => self.capacity(),
        };
        bound - (self.start[k] + self.len[k])
    }

    /// Worst case free space after compaction.
    pub fn free_after_compaction(&self) -> usize {
        self.capacity() - self.number_elements()
    }

    /// Make room for `extra` more entries in vector `k`.  A relocated
    /// vector keeps the room it asked for until the next compaction.
    pub fn reserve(&mut self, k: usize, extra: usize) -> Result<(), AreaFull> {
        if self.room_in_place(k) >= extra {
            return Ok(());
        }
        let (s, l) = (self.start[k], self.len[k]);
        if self.end + l + extra <= self.capacity() {
            // move vector k to the end of the region
            let dest = self.end;
            self.index.copy_within(s..s + l, dest);
            self.value.copy_within(s..s + l, dest);
            self.start[k] = dest;
            self.end = dest + l + extra;
            self.order.push_back(0, k);
            return Ok(());
        }

        // pack everything else, then put vector k last
        let saved_index = self.index[s..s + l].to_vec();
        let saved_value = self.value[s..s + l].to_vec();
        self.order.remove(k);
        self.compact();
        let dest = self.end;
        self.index[dest..dest + l].copy_from_slice(&saved_index);
        self.value[dest..dest + l].copy_from_slice(&saved_value);
        self.start[k] = dest;
        self.end = dest + l;
        self.order.push_back(0, k);

        if self.capacity() - self.end >= extra {
            self.end += extra;
            Ok(())
        } else {
            Err(AreaFull)
        }
    }

    /// Pack all vectors down to the front of the region in storage order.
    pub fn compact(&mut self) {
        let mut pos = 0;
        let mut cursor = self.order.first(0);
        while let Some(k) = cursor {
            let (s, l) = (self.start[k], self.len[k]);
            if s != pos {
                self.index.copy_within(s..s + l, pos);
                self.value.copy_within(s..s + l, pos);
                self.start[k] = pos;
            }
            pos += l;
            cursor = self.order.next_of(k);
        }
        self.end = pos;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_area_grow_and_compact() {
        let mut area = PackedArea::<f64>::new(3, 8);
        area.push(0, 4, 1.0).unwrap();
        area.push(1, 2, 2.0).unwrap();
        // vector 0 is boxed in by vector 1 and must relocate
        area.push(0, 5, 3.0).unwrap();
        assert_eq!(area.indices(0), &[4, 5]);
        assert_eq!(area.values(1), &[2.0]);

        area.push(2, 0, 1.0).unwrap();
        area.push(2, 1, 1.0).unwrap();
        area.push(2, 3, 1.0).unwrap();
        // no room at the end: this push needs a compaction
        area.push(1, 7, 4.0).unwrap();
        assert_eq!(area.free_after_compaction(), 1);
        assert_eq!(area.indices(1), &[2, 7]);
        assert_eq!(area.indices(2), &[0, 1, 3]);
        assert_eq!(area.number_elements(), 7);

        area.push(0, 6, 1.0).unwrap();
        assert_eq!(area.push(2, 6, 1.0), Err(AreaFull));
    }

    #[test]
    fn test_area_remove() {
        let mut area = PackedArea::<f64>::new(1, 4);
        area.push(0, 1, 1.0).unwrap();
        area.push(0, 2, 2.0).unwrap();
        area.push(0, 3, 3.0).unwrap();
        assert_eq!(area.remove_index(0, 1), Some(1.0));
        assert_eq!(area.indices(0), &[3, 2]);
        assert_eq!(area.remove_index(0, 9), None);
    }
}
