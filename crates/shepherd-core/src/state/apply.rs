use crate::{
    adapter::EntityAdapter,
    aggregate::Aggregate,
    blob::StateBlob,
    boundary::BoundaryResolver,
    error::AggregateError,
    model::association::{AssociationDescriptor, Cardinality},
    obs::metrics,
    traversal::{self, ApplyPlan, ApplyVisitor},
    value::{Value, ValueMap},
};

/// Apply a state blob to the aggregate rooted at `entity` as an absolute
/// write: attributes missing from the blob return to their class defaults,
/// attached children are marked for destruction and replaced by freshly
/// built ones seeded from the blob.
pub fn apply_state<A: EntityAdapter>(
    adapter: &A,
    entity: &mut A::Entity,
    blob: &StateBlob,
) -> Result<(), AggregateError> {
    metrics::count(|m| m.ops.apply_state_calls += 1);

    let mut resolver = BoundaryResolver::new(adapter.class_of(entity));
    let aggregate = Aggregate::root(adapter, entity, &mut resolver);

    apply(&aggregate, entity, blob.as_map(), &mut resolver)
}

pub(crate) fn apply<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    entity: &mut A::Entity,
    map: &ValueMap,
    resolver: &mut BoundaryResolver,
) -> Result<(), AggregateError> {
    metrics::count(|m| m.walk.entities_visited += 1);

    // lifecycle markers in a state blob carry no meaning here
    let plan = traversal::split_blob(aggregate, map)?;

    reset_absent_attributes(aggregate, entity, &plan)?;
    destroy_attached_children(aggregate, entity);

    let mut visitor = StateApply {
        aggregate,
        resolver,
    };
    traversal::drive_apply(&mut visitor, entity, &plan)
}

/// Reset every non-excluded attribute the blob does not name back to its
/// class default, so application is an absolute write rather than a merge.
fn reset_absent_attributes<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    entity: &mut A::Entity,
    plan: &ApplyPlan,
) -> Result<(), AggregateError> {
    let adapter = aggregate.adapter();

    for attribute in adapter.attributes(entity) {
        if aggregate.is_excluded_attribute(&attribute.name) {
            continue;
        }
        if plan.attributes.iter().any(|(name, _)| *name == attribute.name) {
            continue;
        }

        let Some(default) = adapter.default_value(aggregate.class(), &attribute.name) else {
            continue;
        };

        // a default that cannot survive its own codec is a modeling gap,
        // reported rather than silently skipped
        if aggregate.deserialize_value(&attribute.name, &default) != default {
            return Err(AggregateError::UnsupportedDefault {
                class: aggregate.class().to_string(),
                attribute: attribute.name,
            });
        }

        if attribute.value == default {
            continue;
        }

        if !adapter.set_attribute(entity, &attribute.name, default) {
            return Err(aggregate.schema_mismatch(&attribute.name));
        }
    }

    Ok(())
}

/// Mark every attached child of every traversable association for
/// destruction; the writes that follow either replace them with freshly
/// built children or leave them destroyed.
fn destroy_attached_children<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    entity: &mut A::Entity,
) {
    let adapter = aggregate.adapter();

    for association in &aggregate.boundary().traversable {
        match association.cardinality {
            Cardinality::ToOne => {
                if let Some(child) = adapter.to_one_mut(entity, &association.name) {
                    adapter.mark_for_destruction(child);
                    metrics::count(|m| m.walk.marked_for_destruction += 1);
                }
            }
            Cardinality::ToMany => {
                for index in 0..adapter.children_len(entity, &association.name) {
                    if let Some(child) = adapter.child_mut(entity, &association.name, index) {
                        adapter.mark_for_destruction(child);
                        metrics::count(|m| m.walk.marked_for_destruction += 1);
                    }
                }
            }
        }
    }
}

struct StateApply<'a, 'r, A: EntityAdapter> {
    aggregate: &'a Aggregate<'a, A>,
    resolver: &'r mut BoundaryResolver,
}

impl<A: EntityAdapter> StateApply<'_, '_, A> {
    fn seed_child(
        &mut self,
        entity: &mut A::Entity,
        association: &AssociationDescriptor,
        state: &ValueMap,
    ) -> Result<(), AggregateError> {
        let adapter = self.aggregate.adapter();

        let child = adapter.build_child(entity, &association.name);
        metrics::count(|m| m.walk.children_built += 1);

        let class = adapter.class_of(child).to_string();
        let child_aggregate = self.aggregate.descend(association, class, self.resolver)?;

        apply(&child_aggregate, child, state, self.resolver)
    }
}

impl<A: EntityAdapter> ApplyVisitor<A> for StateApply<'_, '_, A> {
    fn attribute(
        &mut self,
        entity: &mut A::Entity,
        name: &str,
        payload: &Value,
    ) -> Result<(), AggregateError> {
        let value = self.aggregate.deserialize_value(name, payload);
        if !self.aggregate.adapter().set_attribute(entity, name, value) {
            return Err(self.aggregate.schema_mismatch(name));
        }

        Ok(())
    }

    fn to_one(
        &mut self,
        entity: &mut A::Entity,
        association: &AssociationDescriptor,
        payload: &Value,
    ) -> Result<(), AggregateError> {
        let Some(state) = payload.as_map() else {
            return Err(AggregateError::Malformed {
                name: association.name.clone(),
                expected: "a nested state map",
            });
        };

        self.seed_child(entity, association, state)
    }

    fn to_many(
        &mut self,
        entity: &mut A::Entity,
        association: &AssociationDescriptor,
        payload: &Value,
    ) -> Result<(), AggregateError> {
        let Some(items) = payload.as_list() else {
            return Err(AggregateError::Malformed {
                name: association.name.clone(),
                expected: "a list of state maps",
            });
        };

        for (index, item) in items.iter().enumerate() {
            let Some(state) = item.as_map() else {
                return Err(AggregateError::Malformed {
                    name: association.name.clone(),
                    expected: "a state map per element",
                }
                .with_index(index));
            };

            self.seed_child(entity, association, state)
                .map_err(|err| err.with_index(index))?;
        }

        Ok(())
    }
}
