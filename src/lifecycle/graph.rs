use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::entity_kind::{EntityKind, ParentLink};
use crate::errors::ServiceError;

/// A foreign key seen from the parent side: `child.column` references the
/// parent kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChildLink {
    pub child: EntityKind,
    pub column: &'static str,
    pub nullable: bool,
}

/// Validated, acyclic dependency graph over every [`EntityKind`].
///
/// The deletion order is computed once at construction by peeling childless
/// kinds layer by layer (Kahn's algorithm run from the leaves). A kind's layer
/// is its height: the longest path down to a kind nothing references. Within
/// a layer, later-declared (more derived) kinds go first.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    parents: BTreeMap<EntityKind, Vec<ParentLink>>,
    children: BTreeMap<EntityKind, Vec<ChildLink>>,
    heights: BTreeMap<EntityKind, usize>,
    deletion_order: Vec<EntityKind>,
}

impl DependencyGraph {
    /// Graph built from the foreign keys declared by [`EntityKind::parents`].
    pub fn declared() -> Result<Self, ServiceError> {
        Self::from_links(
            EntityKind::all().flat_map(|kind| kind.parents().iter().map(move |l| (kind, *l))),
        )
    }

    /// Graph built from an explicit `(child, link)` table. Kinds without any
    /// link are still part of the graph.
    pub fn from_links<I>(links: I) -> Result<Self, ServiceError>
    where
        I: IntoIterator<Item = (EntityKind, ParentLink)>,
    {
        let mut parents: BTreeMap<EntityKind, Vec<ParentLink>> =
            EntityKind::all().map(|k| (k, Vec::new())).collect();
        let mut children: BTreeMap<EntityKind, Vec<ChildLink>> =
            EntityKind::all().map(|k| (k, Vec::new())).collect();

        for (child, link) in links {
            parents.entry(child).or_default().push(link);
            children.entry(link.parent).or_default().push(ChildLink {
                child,
                column: link.column,
                nullable: link.nullable,
            });
        }

        // Distinct child kinds still present, per parent
        let mut pending: BTreeMap<EntityKind, BTreeSet<EntityKind>> = children
            .iter()
            .map(|(parent, links)| (*parent, links.iter().map(|l| l.child).collect()))
            .collect();

        let mut heights = BTreeMap::new();
        let mut deletion_order = Vec::with_capacity(pending.len());
        let mut height = 0;

        while !pending.is_empty() {
            let layer: Vec<EntityKind> = pending
                .iter()
                .rev()
                .filter(|(_, remaining)| remaining.is_empty())
                .map(|(kind, _)| *kind)
                .collect();

            if layer.is_empty() {
                let remaining: Vec<EntityKind> = pending.keys().copied().collect();
                return Err(ServiceError::DependencyCycle(remaining));
            }

            for kind in &layer {
                pending.remove(kind);
                heights.insert(*kind, height);
                deletion_order.push(*kind);
            }
            for remaining in pending.values_mut() {
                for kind in &layer {
                    remaining.remove(kind);
                }
            }
            height += 1;
        }

        Ok(Self {
            parents,
            children,
            heights,
            deletion_order,
        })
    }

    /// Every kind, each child before all of its parents.
    pub fn deletion_order(&self) -> &[EntityKind] {
        &self.deletion_order
    }

    pub fn parents_of(&self, kind: EntityKind) -> &[ParentLink] {
        self.parents.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children_of(&self, kind: EntityKind) -> &[ChildLink] {
        self.children.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn height(&self, kind: EntityKind) -> usize {
        self.heights.get(&kind).copied().unwrap_or_default()
    }

    /// Checks that every kind in `preserve` can survive the deletion of every
    /// kind outside it. Nullable links to deleted parents are allowed; they
    /// get detached during the reset.
    pub fn validate_preservation(&self, preserve: &BTreeSet<EntityKind>) -> Result<(), ServiceError> {
        for preserved in preserve {
            if let Some(link) = self
                .parents_of(*preserved)
                .iter()
                .find(|l| !l.nullable && !preserve.contains(&l.parent))
            {
                return Err(ServiceError::PreservationConflict {
                    preserved: *preserved,
                    parent: link.parent,
                });
            }
        }
        Ok(())
    }

    /// Smallest valid preservation set containing `seed`: required parents are
    /// added transitively.
    pub fn preservation_closure(&self, seed: &BTreeSet<EntityKind>) -> BTreeSet<EntityKind> {
        let mut closure = seed.clone();
        let mut stack: Vec<EntityKind> = seed.iter().copied().collect();

        while let Some(kind) = stack.pop() {
            for link in self.parents_of(kind).iter().filter(|l| !l.nullable) {
                if closure.insert(link.parent) {
                    stack.push(link.parent);
                }
            }
        }
        closure
    }

    /// Nullable links from preserved children that must be cleared before
    /// `kind` is deleted.
    pub fn detachments(
        &self,
        kind: EntityKind,
        preserve: &BTreeSet<EntityKind>,
    ) -> Vec<ChildLink> {
        self.children_of(kind)
            .iter()
            .filter(|l| l.nullable && preserve.contains(&l.child))
            .copied()
            .collect()
    }
}
