//! Append-only commit arena with precomputed ancestor sets.
//!
//! A commit's ancestor set is built once, at insertion, as the union of
//! each parent's ancestor set with the parents themselves. Ancestry
//! queries are then a single set lookup. Commits are never mutated or
//! removed once inserted; a commit no branch points at simply stays in
//! the arena.

use indexmap::IndexSet;
use mergesim_core::{CommitId, RepoError};
use smallvec::SmallVec;

/// An immutable node of the commit DAG.
#[derive(Clone, Debug)]
pub struct Commit {
    id: CommitId,
    parents: SmallVec<[CommitId; 2]>,
    label: String,
    ancestors: IndexSet<CommitId>,
}

impl Commit {
    /// This commit's identifier.
    pub fn id(&self) -> CommitId {
        self.id
    }

    /// Parents in order: first parent is the line the commit was made on.
    pub fn parents(&self) -> &[CommitId] {
        &self.parents
    }

    /// Display label (e.g. `"Merge branch-3"`).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// All transitive ancestors, excluding the commit itself.
    pub fn ancestors(&self) -> &IndexSet<CommitId> {
        &self.ancestors
    }

    /// Whether `other` is a transitive ancestor of this commit.
    ///
    /// A commit is never its own ancestor.
    pub fn has_ancestor(&self, other: CommitId) -> bool {
        self.ancestors.contains(&other)
    }
}

/// Arena of all commits created during a run, indexed by [`CommitId`].
#[derive(Clone, Debug, Default)]
pub struct CommitGraph {
    commits: Vec<Commit>,
}

impl CommitGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parentless commit.
    pub fn root(&mut self, label: impl Into<String>) -> CommitId {
        self.push(SmallVec::new(), IndexSet::new(), label.into())
    }

    /// Append a commit with the given parents and label.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::UnknownCommit`] if a parent is not in the graph.
    pub fn commit(
        &mut self,
        parents: &[CommitId],
        label: impl Into<String>,
    ) -> Result<CommitId, RepoError> {
        let mut ancestors = IndexSet::new();
        for &parent in parents {
            let p = self
                .get(parent)
                .ok_or(RepoError::UnknownCommit { commit: parent })?;
            ancestors.extend(p.ancestors.iter().copied());
            ancestors.insert(parent);
        }
        Ok(self.push(SmallVec::from_slice(parents), ancestors, label.into()))
    }

    fn push(
        &mut self,
        parents: SmallVec<[CommitId; 2]>,
        ancestors: IndexSet<CommitId>,
        label: String,
    ) -> CommitId {
        let id = CommitId(self.commits.len() as u32);
        self.commits.push(Commit {
            id,
            parents,
            label,
            ancestors,
        });
        id
    }

    /// Look up a commit.
    pub fn get(&self, id: CommitId) -> Option<&Commit> {
        self.commits.get(id.0 as usize)
    }

    /// Whether `ancestor` is a transitive ancestor of `descendant`.
    ///
    /// Unknown commits have no ancestors.
    pub fn is_ancestor(&self, ancestor: CommitId, descendant: CommitId) -> bool {
        self.get(descendant).is_some_and(|c| c.has_ancestor(ancestor))
    }

    /// Number of first-parent steps from `id` back to a root commit.
    pub fn first_parent_depth(&self, id: CommitId) -> usize {
        let mut depth = 0;
        let mut cursor = self.get(id);
        while let Some(&first) = cursor.and_then(|c| c.parents.first()) {
            depth += 1;
            cursor = self.get(first);
        }
        depth
    }

    /// Number of commits in the arena.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether the arena holds no commits.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Iterate all commits in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Commit> {
        self.commits.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn diamond() -> (CommitGraph, [CommitId; 4]) {
        let mut g = CommitGraph::new();
        let root = g.root("root");
        let left = g.commit(&[root], "left").unwrap();
        let right = g.commit(&[root], "right").unwrap();
        let merge = g.commit(&[left, right], "merge").unwrap();
        (g, [root, left, right, merge])
    }

    #[test]
    fn root_has_no_ancestors() {
        let (g, [root, ..]) = diamond();
        assert!(g.get(root).unwrap().ancestors().is_empty());
        assert!(g.get(root).unwrap().parents().is_empty());
    }

    #[test]
    fn merge_commit_sees_both_sides() {
        let (g, [root, left, right, merge]) = diamond();
        let m = g.get(merge).unwrap();
        assert_eq!(m.parents(), &[left, right]);
        assert_eq!(m.ancestors().len(), 3);
        for a in [root, left, right] {
            assert!(g.is_ancestor(a, merge));
        }
        assert!(!g.is_ancestor(left, right));
    }

    #[test]
    fn commit_is_never_its_own_ancestor() {
        let (g, ids) = diamond();
        for id in ids {
            assert!(!g.is_ancestor(id, id));
        }
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut g = CommitGraph::new();
        let err = g.commit(&[CommitId(7)], "orphan").unwrap_err();
        assert_eq!(err, RepoError::UnknownCommit { commit: CommitId(7) });
        assert!(g.is_empty());
    }

    #[test]
    fn first_parent_depth_follows_mainline() {
        let (g, [root, left, _, merge]) = diamond();
        assert_eq!(g.first_parent_depth(root), 0);
        assert_eq!(g.first_parent_depth(left), 1);
        assert_eq!(g.first_parent_depth(merge), 2);
    }

    #[test]
    fn labels_are_kept() {
        let (g, [.., merge]) = diamond();
        assert_eq!(g.get(merge).unwrap().label(), "merge");
        assert_eq!(g.iter().count(), 4);
    }

    // Random DAG: each new commit picks up to two parents among earlier ones.
    fn arb_dag() -> impl Strategy<Value = Vec<Vec<usize>>> {
        let parent_picks = proptest::collection::vec(any::<prop::sample::Index>(), 0..=2);
        proptest::collection::vec(parent_picks, 1..40).prop_map(|picks| {
            picks
                .into_iter()
                .enumerate()
                .map(|(i, ps)| {
                    if i == 0 {
                        Vec::new()
                    } else {
                        let mut parents: Vec<usize> =
                            ps.iter().map(|ix| ix.index(i)).collect();
                        parents.dedup();
                        parents
                    }
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn ancestors_are_parents_closure(dag in arb_dag()) {
            let mut g = CommitGraph::new();
            let mut ids = Vec::new();
            for parents in &dag {
                let ps: Vec<CommitId> = parents.iter().map(|&i| ids[i]).collect();
                ids.push(g.commit(&ps, "c").unwrap());
            }
            for &id in &ids {
                let c = g.get(id).unwrap();
                let mut expected = IndexSet::new();
                for &p in c.parents() {
                    expected.insert(p);
                    expected.extend(g.get(p).unwrap().ancestors().iter().copied());
                }
                prop_assert!(!c.has_ancestor(id));
                prop_assert_eq!(c.ancestors().len(), expected.len());
                for a in &expected {
                    prop_assert!(c.has_ancestor(*a));
                    prop_assert!(*a < id);
                }
            }
        }
    }
}
