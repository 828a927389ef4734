use crate::model::{association::AssociationDescriptor, namespace::within_namespace};
use std::{collections::BTreeMap, rc::Rc};

///
/// Boundary
///
/// The resolved aggregate boundary of one entity class: the associations the
/// engines walk and the ones they must never touch, each in declaration
/// order. An empty boundary is a valid leaf.
///

#[derive(Clone, Debug, Default)]
pub struct Boundary {
    pub traversable: Vec<AssociationDescriptor>,
    pub excluded: Vec<AssociationDescriptor>,
}

impl Boundary {
    /// Resolve the boundary of a class within the aggregate rooted at
    /// `root_class`. Pure function of the declared association list.
    ///
    /// Associations are grouped by target table and exactly one per group is
    /// kept as canonical: a to-many wins over any to-one; among equals the
    /// first declared wins (the upstream rule is no stronger than that).
    /// Losers are excluded regardless of their own flags, so the same
    /// physical rows are never walked twice through two different edges.
    #[must_use]
    pub fn resolve(root_class: &str, associations: Vec<AssociationDescriptor>) -> Self {
        let mut table_order: Vec<&str> = Vec::new();
        let mut groups: BTreeMap<&str, Vec<&AssociationDescriptor>> = BTreeMap::new();

        for association in &associations {
            let table = association.target_table.as_str();
            let group = groups.entry(table).or_default();
            if group.is_empty() {
                table_order.push(table);
            }
            group.push(association);
        }

        let mut boundary = Self::default();
        for table in table_order {
            let Some(group) = groups.get(table) else {
                continue;
            };

            let canonical = group
                .iter()
                .find(|association| association.cardinality.is_to_many())
                .unwrap_or(&group[0]);

            for association in group {
                let kept = std::ptr::eq(*association, *canonical)
                    && Self::admits(root_class, association);
                if kept {
                    boundary.traversable.push((*association).clone());
                } else {
                    boundary.excluded.push((*association).clone());
                }
            }
        }

        boundary
    }

    /// Look up a traversable association by name.
    #[must_use]
    pub fn find_traversable(&self, name: &str) -> Option<&AssociationDescriptor> {
        self.traversable
            .iter()
            .find(|association| association.name == name)
    }

    /// Whether `name` is a declared association outside the boundary.
    #[must_use]
    pub fn is_excluded_association(&self, name: &str) -> bool {
        self.excluded
            .iter()
            .any(|association| association.name == name)
    }

    // The four-part predicate: writable, owning, direct, and inside the
    // root's namespace.
    fn admits(root_class: &str, association: &AssociationDescriptor) -> bool {
        !association.readonly
            && association.owning
            && !association.indirect
            && within_namespace(root_class, &association.target_class)
    }
}

///
/// BoundaryResolver
///
/// Per-call memo of resolved boundaries, keyed by class path. Resolution is
/// a pure function of class metadata, so one engine call reuses a single
/// resolution for every entity of the same class. The resolver is a plain
/// value owned by the call; no global state.
///

#[derive(Debug)]
pub struct BoundaryResolver {
    root_class: String,
    cache: BTreeMap<String, Rc<Boundary>>,
}

impl BoundaryResolver {
    #[must_use]
    pub fn new(root_class: impl Into<String>) -> Self {
        Self {
            root_class: root_class.into(),
            cache: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn root_class(&self) -> &str {
        &self.root_class
    }

    /// Resolve (or reuse) the boundary for `class`, fetching declared
    /// associations on a cache miss only.
    pub fn resolve_with(
        &mut self,
        class: &str,
        fetch: impl FnOnce() -> Vec<AssociationDescriptor>,
    ) -> Rc<Boundary> {
        if let Some(found) = self.cache.get(class) {
            return Rc::clone(found);
        }

        let boundary = Rc::new(Boundary::resolve(&self.root_class, fetch()));
        self.cache.insert(class.to_string(), Rc::clone(&boundary));

        boundary
    }
}
