/// A family of doubly linked lists over the elements `0..n`.
///
/// Every element belongs to at most one list.  Links are stored in two
/// flat arrays; list `l` has its head sentinel at index `n + l`, so all
/// insertions and removals are O(1) and no element ever owns another.

#[derive(Debug, Clone)]
pub struct ListArena {
    next: Vec<usize>,
    prev: Vec<usize>,
    nelem: usize,
    // list of each element, or NONE
    owner: Vec<usize>,
}

const NONE: usize = usize::MAX;

impl ListArena {
    /// `nelem` elements distributed over `nlists` initially empty lists
    pub fn new(nelem: usize, nlists: usize) -> Self {
        let total = nelem + nlists;
        let mut next = vec![NONE; total];
        let mut prev = vec![NONE; total];
        for h in nelem..total {
            next[h] = h;
            prev[h] = h;
        }
        Self {
            next,
            prev,
            nelem,
            owner: vec![NONE; nelem],
        }
    }

    pub fn number_elements(&self) -> usize {
        self.nelem
    }

    pub fn number_lists(&self) -> usize {
        self.next.len() - self.nelem
    }

    /// the list holding `i`, if any
    pub fn list_of(&self, i: usize) -> Option<usize> {
        match self.owner[i] {
            NONE => None,
            l => Some(l),
        }
    }

    pub fn contains(&self, i: usize) -> bool {
        self.owner[i] != NONE
    }

    pub fn is_empty(&self, list: usize) -> bool {
        let h = self.nelem + list;
        self.next[h] == h
    }

    pub fn first(&self, list: usize) -> Option<usize> {
        let h = self.nelem + list;
        self.element(self.next[h])
    }

    pub fn last(&self, list: usize) -> Option<usize> {
        let h = self.nelem + list;
        self.element(self.prev[h])
    }

    /// successor of `i` within its list
    pub fn next_of(&self, i: usize) -> Option<usize> {
        self.element(self.next[i])
    }

    /// predecessor of `i` within its list
    pub fn prev_of(&self, i: usize) -> Option<usize> {
        self.element(self.prev[i])
    }

    /// Append `i` to the back of `list`, unlinking it first if needed.
    pub fn push_back(&mut self, list: usize, i: usize) {
        self.remove(i);
        let h = self.nelem + list;
        let last = self.prev[h];
        self.next[last] = i;
        self.prev[i] = last;
        self.next[i] = h;
        self.prev[h] = i;
        self.owner[i] = list;
    }

    /// Insert `i` at the front of `list`, unlinking it first if needed.
    pub fn push_front(&mut self, list: usize, i: usize) {
        self.remove(i);
        let h = self.nelem + list;
        let first = self.next[h];
        self.prev[first] = i;
        self.next[i] = first;
        self.prev[i] = h;
        self.next[h] = i;
        self.owner[i] = list;
    }

    /// Insert `i` directly after `after`, which must be linked.
    pub fn insert_after(&mut self, after: usize, i: usize) {
        debug_assert!(self.contains(after));
        self.remove(i);
        let list = self.owner[after];
        let succ = self.next[after];
        self.next[after] = i;
        self.prev[i] = after;
        self.next[i] = succ;
        self.prev[succ] = i;
        self.owner[i] = list;
    }

    /// Unlink `i`.  Does nothing if `i` is in no list.
    pub fn remove(&mut self, i: usize) {
        if self.owner[i] == NONE {
            return;
        }
        let (p, n) = (self.prev[i], self.next[i]);
        self.next[p] = n;
        self.prev[n] = p;
        self.next[i] = NONE;
        self.prev[i] = NONE;
        self.owner[i] = NONE;
    }

    /// Empty `list`, unlinking all of its elements.
    pub fn clear(&mut self, list: usize) {
        while let Some(i) = self.first(list) {
            self.remove(i);
        }
    }

    /// iterate the elements of `list` front to back
    pub fn iter(&self, list: usize) -> ListIter<'_> {
        let h = self.nelem + list;
        ListIter {
            arena: self,
            cursor: self.next[h],
        }
    }

    fn element(&self, link: usize) -> Option<usize> {
        if link < self.nelem {
            Some(link)
        } else {
            None
        }
    }
}

pub struct ListIter<'a> {
    arena: &'a ListArena,
    cursor: usize,
}

impl Iterator for ListIter<'_> {
    type Item = usize;
    fn next(&mut self) -> Option<usize> {
        let i = self.arena.element(self.cursor)?;
        self.cursor = self.arena.next[i];
        Some(i)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lists_push_remove() {
        let mut lists = ListArena::new(6, 2);
        lists.push_back(0, 3);
        lists.push_back(0, 1);
        lists.push_front(0, 5);
        lists.push_back(1, 2);

        assert_eq!(lists.iter(0).collect::<Vec<_>>(), vec![5, 3, 1]);
        assert_eq!(lists.iter(1).collect::<Vec<_>>(), vec![2]);
        assert_eq!(lists.list_of(1), Some(0));

        // moving an element between lists unlinks it first
        lists.push_back(1, 3);
        assert_eq!(lists.iter(0).collect::<Vec<_>>(), vec![5, 1]);
        assert_eq!(lists.iter(1).collect::<Vec<_>>(), vec![2, 3]);

        lists.insert_after(5, 4);
        assert_eq!(lists.iter(0).collect::<Vec<_>>(), vec![5, 4, 1]);
        assert_eq!(lists.prev_of(4), Some(5));
        assert_eq!(lists.next_of(1), None);

        lists.clear(0);
        assert!(lists.is_empty(0));
        assert!(!lists.contains(5));
        assert_eq!(lists.first(1), Some(2));
        assert_eq!(lists.last(1), Some(3));
    }
}
