use crate::{
    adapter::EntityAdapter,
    aggregate::Aggregate,
    blob::{ChangeBlob, MetaAction},
    boundary::BoundaryResolver,
    error::AggregateError,
    model::AssociationDescriptor,
    obs::metrics,
    traversal::{self, QueryVisitor},
    value::{Value, ValueMap},
};

/// Extract the pending changes of the aggregate rooted at `entity`: dirty
/// attribute `(before, after)` pairs, lifecycle markers, and the non-empty
/// changes of children, to-many children keyed by their current enumeration
/// position.
pub fn extract_changes<A: EntityAdapter>(
    adapter: &A,
    entity: &A::Entity,
) -> Result<ChangeBlob, AggregateError> {
    metrics::count(|m| m.ops.extract_changes_calls += 1);

    let mut resolver = BoundaryResolver::new(adapter.class_of(entity));
    let aggregate = Aggregate::root(adapter, entity, &mut resolver);

    extract(&aggregate, entity, &mut resolver)
}

pub(crate) fn extract<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    entity: &A::Entity,
    resolver: &mut BoundaryResolver,
) -> Result<ChangeBlob, AggregateError> {
    metrics::count(|m| m.walk.entities_visited += 1);

    let adapter = aggregate.adapter();

    let mut blob = ChangeBlob::new();
    if adapter.is_new(entity) {
        blob.set_meta(MetaAction::Create);
    } else if adapter.is_marked_for_destruction(entity) {
        blob.set_meta(MetaAction::Destroy);
    }

    let attributes = dirty_pairs(aggregate, entity);
    let mut visitor = ChangeQuery {
        aggregate,
        resolver,
        blob,
    };
    traversal::drive_query(&mut visitor, aggregate, entity, &attributes)?;

    Ok(visitor.blob)
}

/// Codec-serialized `(before, after)` pairs for dirty, non-excluded
/// attributes.
fn dirty_pairs<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    entity: &A::Entity,
) -> Vec<(String, Value)> {
    let mut pairs = Vec::new();
    for change in aggregate.adapter().dirty_attributes(entity) {
        if aggregate.is_excluded_attribute(&change.name) {
            continue;
        }

        let before = aggregate.serialize_value(&change.name, &change.before);
        let after = aggregate.serialize_value(&change.name, &change.after);
        pairs.push((change.name, Value::pair(before, after)));
    }

    pairs
}

struct ChangeQuery<'a, 'r, A: EntityAdapter> {
    aggregate: &'a Aggregate<'a, A>,
    resolver: &'r mut BoundaryResolver,
    blob: ChangeBlob,
}

impl<A: EntityAdapter> QueryVisitor<A> for ChangeQuery<'_, '_, A> {
    fn attribute(&mut self, name: &str, value: &Value) {
        self.blob.insert(name.to_string(), value.clone());
    }

    fn to_one(
        &mut self,
        association: &AssociationDescriptor,
        child: &A::Entity,
    ) -> Result<(), AggregateError> {
        let class = self.aggregate.adapter().class_of(child).to_string();
        let child_aggregate = self.aggregate.descend(association, class, self.resolver)?;
        let child_changes = extract(&child_aggregate, child, self.resolver)?;

        if !child_changes.is_empty() {
            self.blob
                .insert(association.name.clone(), child_changes.into_value());
        }

        Ok(())
    }

    fn to_many(
        &mut self,
        association: &AssociationDescriptor,
        children: &[&A::Entity],
    ) -> Result<(), AggregateError> {
        let mut group = ValueMap::new();
        for (index, child) in children.iter().enumerate() {
            let class = self.aggregate.adapter().class_of(child).to_string();
            let child_aggregate = self.aggregate.descend(association, class, self.resolver)?;
            let child_changes = extract(&child_aggregate, child, self.resolver)
                .map_err(|err| err.with_index(index))?;

            // only positions with pending changes appear in the group
            if !child_changes.is_empty() {
                group.insert(index.to_string(), child_changes.into_value());
            }
        }

        if !group.is_empty() {
            self.blob
                .insert(association.name.clone(), Value::Map(group));
        }

        Ok(())
    }
}
