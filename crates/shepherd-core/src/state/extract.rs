use crate::{
    adapter::EntityAdapter,
    aggregate::Aggregate,
    blob::StateBlob,
    boundary::BoundaryResolver,
    error::AggregateError,
    model::AssociationDescriptor,
    obs::metrics,
    traversal::{self, QueryVisitor},
    value::Value,
};

/// Extract the full state of the aggregate rooted at `entity` as a portable
/// nested map. Attributes equal to their class default are suppressed;
/// associations outside the boundary are never touched.
pub fn extract_state<A: EntityAdapter>(
    adapter: &A,
    entity: &A::Entity,
) -> Result<StateBlob, AggregateError> {
    metrics::count(|m| m.ops.extract_state_calls += 1);

    let mut resolver = BoundaryResolver::new(adapter.class_of(entity));
    let aggregate = Aggregate::root(adapter, entity, &mut resolver);

    extract(&aggregate, entity, &mut resolver)
}

pub(crate) fn extract<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    entity: &A::Entity,
    resolver: &mut BoundaryResolver,
) -> Result<StateBlob, AggregateError> {
    metrics::count(|m| m.walk.entities_visited += 1);

    let attributes = significant_attributes(aggregate, entity);
    let mut visitor = StateQuery {
        aggregate,
        resolver,
        blob: StateBlob::new(),
    };
    traversal::drive_query(&mut visitor, aggregate, entity, &attributes)?;

    Ok(visitor.blob)
}

/// Serialized attribute values that differ from the serialized class
/// default, excluded names dropped.
fn significant_attributes<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    entity: &A::Entity,
) -> Vec<(String, Value)> {
    let adapter = aggregate.adapter();

    let mut attributes = Vec::new();
    for attribute in adapter.attributes(entity) {
        if aggregate.is_excluded_attribute(&attribute.name) {
            continue;
        }

        let serialized = aggregate.serialize_value(&attribute.name, &attribute.raw);
        let default = adapter
            .default_value(aggregate.class(), &attribute.name)
            .unwrap_or(Value::Null);
        if serialized != aggregate.serialize_value(&attribute.name, &default) {
            attributes.push((attribute.name, serialized));
        }
    }

    attributes
}

struct StateQuery<'a, 'r, A: EntityAdapter> {
    aggregate: &'a Aggregate<'a, A>,
    resolver: &'r mut BoundaryResolver,
    blob: StateBlob,
}

impl<A: EntityAdapter> QueryVisitor<A> for StateQuery<'_, '_, A> {
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
        let child_state = extract(&child_aggregate, child, self.resolver)?;

        if !child_state.is_empty() {
            self.blob
                .insert(association.name.clone(), child_state.into_value());
        }

        Ok(())
    }

    fn to_many(
        &mut self,
        association: &AssociationDescriptor,
        children: &[&A::Entity],
    ) -> Result<(), AggregateError> {
        let mut collection = Vec::with_capacity(children.len());
        for (index, child) in children.iter().enumerate() {
            let class = self.aggregate.adapter().class_of(child).to_string();
            let child_aggregate = self.aggregate.descend(association, class, self.resolver)?;
            let child_state = extract(&child_aggregate, child, self.resolver)
                .map_err(|err| err.with_index(index))?;

            // empty child states stay in the list; position is caller-visible
            collection.push(child_state.into_value());
        }

        if !collection.is_empty() {
            self.blob
                .insert(association.name.clone(), Value::List(collection));
        }

        Ok(())
    }
}
