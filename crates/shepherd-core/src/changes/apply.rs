use crate::{
    adapter::EntityAdapter,
    aggregate::Aggregate,
    blob::{self, ChangeBlob, MetaAction},
    boundary::BoundaryResolver,
    error::AggregateError,
    model::AssociationDescriptor,
    obs::metrics,
    traversal::{self, ApplyVisitor},
    value::{Value, ValueMap},
};
use std::collections::BTreeMap;

/// Apply a change blob to the aggregate rooted at `entity` under optimistic
/// concurrency: every `(before, after)` pair must find its `before` equal to
/// the attribute's current value, or the call fails with a conflict naming
/// the attribute and both values.
///
/// Attribute writes at a single entity are buffered, so a conflict leaves
/// that entity untouched. Entities visited earlier in the walk may already be
/// mutated when a nested conflict surfaces; callers wanting all-or-nothing
/// semantics snapshot the graph first and discard it on error.
pub fn apply_changes<A: EntityAdapter>(
    adapter: &A,
    entity: &mut A::Entity,
    changes: &ChangeBlob,
) -> Result<(), AggregateError> {
    metrics::count(|m| m.ops.apply_changes_calls += 1);

    let mut resolver = BoundaryResolver::new(adapter.class_of(entity));
    let aggregate = Aggregate::root(adapter, entity, &mut resolver);

    apply(&aggregate, entity, changes.as_map(), &mut resolver)
}

pub(crate) fn apply<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    entity: &mut A::Entity,
    map: &ValueMap,
    resolver: &mut BoundaryResolver,
) -> Result<(), AggregateError> {
    metrics::count(|m| m.walk.entities_visited += 1);

    let plan = traversal::split_blob(aggregate, map)?;

    // `_destroy` acts here; `_create` only participates in reversal and in
    // index-driven child building on the parent side
    if plan.meta == Some(MetaAction::Destroy) {
        aggregate.adapter().mark_for_destruction(entity);
        metrics::count(|m| m.walk.marked_for_destruction += 1);
    }

    let current = current_values(aggregate, entity);
    let mut visitor = ChangesApply {
        aggregate,
        resolver,
        current,
        pending: Vec::new(),
    };
    traversal::drive_apply(&mut visitor, entity, &plan)
}

fn current_values<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    entity: &A::Entity,
) -> BTreeMap<String, Value> {
    aggregate
        .adapter()
        .attributes(entity)
        .into_iter()
        .map(|attribute| (attribute.name, attribute.value))
        .collect()
}

struct ChangesApply<'a, 'r, A: EntityAdapter> {
    aggregate: &'a Aggregate<'a, A>,
    resolver: &'r mut BoundaryResolver,
    current: BTreeMap<String, Value>,
    /// Conflict-checked writes, committed in `flush` once every pair at this
    /// entity has been checked.
    pending: Vec<(String, Value)>,
}

impl<A: EntityAdapter> ApplyVisitor<A> for ChangesApply<'_, '_, A> {
    fn attribute(
        &mut self,
        _entity: &mut A::Entity,
        name: &str,
        payload: &Value,
    ) -> Result<(), AggregateError> {
        let Some((before, after)) = payload.as_pair() else {
            return Err(AggregateError::Malformed {
                name: name.to_string(),
                expected: "a [before, after] pair",
            });
        };

        let before = self.aggregate.deserialize_value(name, before);
        let after = self.aggregate.deserialize_value(name, after);

        let actual = self.current.get(name).cloned().unwrap_or(Value::Null);
        if actual != before {
            metrics::count(|m| m.walk.conflicts_detected += 1);

            return Err(AggregateError::Conflict {
                attribute: name.to_string(),
                expected: before,
                actual,
            });
        }

        self.pending.push((name.to_string(), after));

        Ok(())
    }

    fn flush(&mut self, entity: &mut A::Entity) -> Result<(), AggregateError> {
        for (name, after) in std::mem::take(&mut self.pending) {
            if !self.aggregate.adapter().set_attribute(entity, &name, after) {
                return Err(self.aggregate.schema_mismatch(&name));
            }
        }

        Ok(())
    }

    fn to_one(
        &mut self,
        entity: &mut A::Entity,
        association: &AssociationDescriptor,
        payload: &Value,
    ) -> Result<(), AggregateError> {
        let Some(changes) = payload.as_map() else {
            return Err(AggregateError::Malformed {
                name: association.name.clone(),
                expected: "a nested change map",
            });
        };

        let adapter = self.aggregate.adapter();
        let Some(child) = adapter.to_one_mut(entity, &association.name) else {
            return Err(AggregateError::Malformed {
                name: association.name.clone(),
                expected: "an existing child to change",
            });
        };

        let class = adapter.class_of(child).to_string();
        let child_aggregate = self.aggregate.descend(association, class, self.resolver)?;

        apply(&child_aggregate, child, changes, self.resolver)
    }

    fn to_many(
        &mut self,
        entity: &mut A::Entity,
        association: &AssociationDescriptor,
        payload: &Value,
    ) -> Result<(), AggregateError> {
        let Some(group) = payload.as_map() else {
            return Err(AggregateError::Malformed {
                name: association.name.clone(),
                expected: "an index-keyed change map",
            });
        };

        // decode positions first; apply in ascending order so building
        // missing children is deterministic
        let mut indexed = Vec::with_capacity(group.len());
        for (key, value) in group {
            let Some(index) = blob::parse_index(key) else {
                return Err(AggregateError::Malformed {
                    name: association.name.clone(),
                    expected: "decimal index keys",
                });
            };
            let Some(changes) = value.as_map() else {
                return Err(AggregateError::Malformed {
                    name: association.name.clone(),
                    expected: "a change map per index",
                }
                .with_index(index));
            };
            indexed.push((index, changes));
        }
        indexed.sort_by_key(|(index, _)| *index);

        let adapter = self.aggregate.adapter();
        for (index, changes) in indexed {
            // a `_create`-tagged child enters the graph here: built empty,
            // then its own changes are applied to it
            while adapter.children_len(entity, &association.name) < index + 1 {
                adapter.build_child(entity, &association.name);
                metrics::count(|m| m.walk.children_built += 1);
            }

            let Some(child) = adapter.child_mut(entity, &association.name, index) else {
                return Err(AggregateError::Malformed {
                    name: association.name.clone(),
                    expected: "a child at the named index",
                }
                .with_index(index));
            };

            let class = adapter.class_of(child).to_string();
            let child_aggregate = self.aggregate.descend(association, class, self.resolver)?;

            apply(&child_aggregate, child, changes, self.resolver)
                .map_err(|err| err.with_index(index))?;
        }

        Ok(())
    }
}
