use crate::core::{
    adapter::EntityAdapter,
    blob::{ChangeBlob, StateBlob},
    changes,
    error::{AggregateError, ValidationError},
    state,
};

///
/// AggregateRoot
///
/// Caller-facing binding of one adapter, offering the engine operations as
/// methods. Each operation is an explicit, named entry point; callers pick
/// the operation, never a dispatcher.
///
/// The binding holds nothing but the adapter reference; entities stay owned
/// by the caller and are passed per call.
///

pub struct AggregateRoot<'a, A: EntityAdapter> {
    adapter: &'a A,
}

impl<'a, A: EntityAdapter> AggregateRoot<'a, A> {
    #[must_use]
    pub const fn new(adapter: &'a A) -> Self {
        Self { adapter }
    }

    /// Snapshot the aggregate rooted at `entity` as a portable nested map.
    pub fn state(&self, entity: &A::Entity) -> Result<StateBlob, AggregateError> {
        state::extract_state(self.adapter, entity)
    }

    /// Inject an entire aggregate state; an absolute write, not a merge.
    pub fn set_state(
        &self,
        entity: &mut A::Entity,
        blob: &StateBlob,
    ) -> Result<(), AggregateError> {
        state::apply_state(self.adapter, entity, blob)
    }

    /// The changes that would persist if the aggregate were saved now.
    pub fn changes(&self, entity: &A::Entity) -> Result<ChangeBlob, AggregateError> {
        changes::extract_changes(self.adapter, entity)
    }

    /// Replay a change blob under optimistic-concurrency checks.
    pub fn apply_changes(
        &self,
        entity: &mut A::Entity,
        blob: &ChangeBlob,
    ) -> Result<(), AggregateError> {
        changes::apply_changes(self.adapter, entity, blob)
    }

    /// Undo a previously applied change blob.
    pub fn revert_changes(
        &self,
        entity: &mut A::Entity,
        blob: &ChangeBlob,
    ) -> Result<(), AggregateError> {
        changes::apply_changes(self.adapter, entity, &changes::reverse_changes(blob))
    }

    /// Losslessly invert a change blob; involutive.
    #[must_use]
    pub fn reverse_changes(blob: &ChangeBlob) -> ChangeBlob {
        changes::reverse_changes(blob)
    }

    /// Run the pre-apply checks without touching the caller's graph.
    pub fn validate_changes(&self, entity: &A::Entity, blob: &ChangeBlob) -> Vec<ValidationError>
    where
        A::Entity: Clone,
    {
        changes::validate_changes(self.adapter, entity, blob)
    }

    /// Validate first, then apply; a blob that fails validation never
    /// touches the graph.
    pub fn apply_checked_changes(
        &self,
        entity: &mut A::Entity,
        blob: &ChangeBlob,
    ) -> Result<(), AggregateError>
    where
        A::Entity: Clone,
    {
        let errors = self.validate_changes(entity, blob);
        if !errors.is_empty() {
            return Err(AggregateError::InvalidChanges { errors });
        }

        self.apply_changes(entity, blob)
    }
}
