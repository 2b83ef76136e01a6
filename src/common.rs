/* Copyright (C) 2022 Antmicro
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use serde::Serialize;

/// A position in the fabric grid.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /* Manhattan-adjacent or equal */
    pub fn touches(&self, other: &Coord) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() <= 1
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/* Splits a range into `slices` possibly even ranges  */
pub fn split_range_nicely(range: std::ops::Range<usize>, slices: usize)
    -> impl Iterator<Item = std::ops::Range<usize>> where
{
    let len = range.end - range.start;
    let split_sz = len / slices;
    let total = split_sz * slices;
    let left = len - total;

    (0 .. slices)
        .scan((0, left), move |(current_idx, left), _| {
            let my_len = if *left > 0 {
                *left -= 1;
                split_sz + 1
            } else {
                split_sz
            };
            let range = *current_idx .. (*current_idx + my_len);
            *current_idx += my_len;
            return Some(range);
        })
        .filter(|range| range.start != range.end)
}

/// Arena-based disjoint-set forest with path compression and union by rank.
/// Element identity is the element's index in the arena.
pub struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0 .. len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn find(&mut self, elem: usize) -> usize {
        let mut root = elem;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        /* Second pass: point the whole chain at the root */
        let mut walk = elem;
        while self.parent[walk] != root {
            let next = self.parent[walk];
            self.parent[walk] = root;
            walk = next;
        }
        root
    }

    /// Merges the sets containing `a` and `b`. Returns `false` if they
    /// already shared a set.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_range_nicely_covers_the_whole_range() {
        let parts: Vec<_> = split_range_nicely(0 .. 10, 3).collect();
        assert_eq!(parts, vec![0 .. 4, 4 .. 7, 7 .. 10]);
    }

    #[test]
    fn split_range_nicely_drops_empty_slices() {
        let parts: Vec<_> = split_range_nicely(0 .. 2, 4).collect();
        assert_eq!(parts, vec![0 .. 1, 1 .. 2]);
    }

    #[test]
    fn coord_touches_is_manhattan_adjacency() {
        let origin = Coord::new(1, 1);
        assert!(origin.touches(&Coord::new(1, 1)));
        assert!(origin.touches(&Coord::new(2, 1)));
        assert!(origin.touches(&Coord::new(1, 0)));
        assert!(!origin.touches(&Coord::new(2, 2)));
    }

    #[test]
    fn disjoint_sets_merge_and_find() {
        let mut sets = DisjointSets::new(6);
        assert_eq!(sets.len(), 6);

        assert!(sets.union(0, 1));
        assert!(sets.union(2, 3));
        assert!(!sets.union(1, 0));

        assert_eq!(sets.find(0), sets.find(1));
        assert_ne!(sets.find(1), sets.find(2));

        assert!(sets.union(1, 3));
        assert_eq!(sets.find(0), sets.find(2));

        /* Untouched elements stay singletons */
        assert_eq!(sets.find(4), 4);
        assert_eq!(sets.find(5), 5);
    }

    #[test]
    fn disjoint_sets_compress_long_chains() {
        let mut sets = DisjointSets::new(5);
        for elem in 0 .. 4 {
            sets.union(elem, elem + 1);
        }
        let root = sets.find(0);
        for elem in 0 .. 5 {
            assert_eq!(sets.find(elem), root);
        }
    }
}
