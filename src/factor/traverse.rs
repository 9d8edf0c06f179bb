//! Index bookkeeping shared by the solve kernels.

/// Bit set over `0..n` that yields its members in increasing or
/// decreasing order, skipping empty 64-bit words.
#[derive(Debug, Clone)]
pub(crate) struct BitScan {
    words: Vec<u64>,
    // words outside lo..hi are zero
    lo: usize,
    hi: usize,
}

impl BitScan {
    pub fn new(n: usize) -> Self {
        Self {
            words: vec![0; (n + 63) / 64],
            lo: usize::MAX,
            hi: 0,
        }
    }

    pub fn insert(&mut self, i: usize) {
        let w = i / 64;
        self.words[w] |= 1u64 << (i % 64);
        self.lo = self.lo.min(w);
        self.hi = self.hi.max(w + 1);
    }

    pub fn pop_lowest(&mut self) -> Option<usize> {
        while self.lo < self.hi && self.words[self.lo] == 0 {
            self.lo += 1;
        }
        if self.lo >= self.hi {
            self.reset();
            return None;
        }
        let word = &mut self.words[self.lo];
        let bit = word.trailing_zeros() as usize;
        *word &= !(1u64 << bit);
        Some(self.lo * 64 + bit)
    }

    pub fn pop_highest(&mut self) -> Option<usize> {
        while self.hi > self.lo && self.words[self.hi - 1] == 0 {
            self.hi -= 1;
        }
        if self.hi <= self.lo {
            self.reset();
            return None;
        }
        let word = &mut self.words[self.hi - 1];
        let bit = 63 - word.leading_zeros() as usize;
        *word &= !(1u64 << bit);
        Some((self.hi - 1) * 64 + bit)
    }

    fn reset(&mut self) {
        self.lo = usize::MAX;
        self.hi = 0;
    }
}

/// List `i` in `indices` unless already marked.
#[inline]
pub(crate) fn touch(mark: &mut [bool], indices: &mut Vec<usize>, i: usize) {
    if !mark[i] {
        mark[i] = true;
        indices.push(i);
    }
}

/// Iterative depth-first search from every node in `starts`.
///
/// On return `postorder` holds the reached nodes, each after all of its
/// successors; processing it in reverse gives a topological order.  Every
/// reached node is left `visited`, and the caller must reset them.
pub(crate) fn depth_first<'a, F>(
    starts: &[usize],
    succ: F,
    visited: &mut [bool],
    stack: &mut Vec<(usize, usize)>,
    postorder: &mut Vec<usize>,
) where
    F: Fn(usize) -> &'a [usize],
{
    postorder.clear();
    for &s in starts {
        if visited[s] {
            continue;
        }
        visited[s] = true;
        stack.push((s, 0));

        while let Some(&mut (node, ref mut next)) = stack.last_mut() {
            let children = succ(node);
            let mut descended = false;
            while *next < children.len() {
                let c = children[*next];
                *next += 1;
                if !visited[c] {
                    visited[c] = true;
                    stack.push((c, 0));
                    descended = true;
                    break;
                }
            }
            if !descended {
                postorder.push(node);
                stack.pop();
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bitscan_order() {
        let mut bits = BitScan::new(200);
        for i in [130, 3, 64, 199] {
            bits.insert(i);
        }
        assert_eq!(bits.pop_lowest(), Some(3));
        // insertions above the cursor are still found
        bits.insert(10);
        assert_eq!(bits.pop_lowest(), Some(10));
        assert_eq!(bits.pop_highest(), Some(199));
        assert_eq!(bits.pop_highest(), Some(130));
        assert_eq!(bits.pop_lowest(), Some(64));
        assert_eq!(bits.pop_lowest(), None);
        assert_eq!(bits.pop_highest(), None);
    }

    #[test]
    fn test_depth_first_topological() {
        // 0 -> 1 -> 3, 0 -> 2 -> 3, 4 isolated
        let graph: Vec<Vec<usize>> = vec![vec![1, 2], vec![3], vec![3], vec![], vec![]];
        let mut visited = vec![false; 5];
        let mut stack = Vec::new();
        let mut post = Vec::new();
        depth_first(
            &[0],
            |i| graph[i].as_slice(),
            &mut visited,
            &mut stack,
            &mut post,
        );
        assert_eq!(post.len(), 4);
        let order: Vec<usize> = post.iter().rev().copied().collect();
        let at = |n: usize| order.iter().position(|&x| x == n).unwrap();
        assert!(at(0) < at(1) && at(1) < at(3));
        assert!(at(0) < at(2) && at(2) < at(3));
        assert!(!visited[4]);
    }
}
