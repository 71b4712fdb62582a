#[derive(Debug, Clone, Copy, PartialEq)]
struct CollectableRecord {
    kind: CollectableKind,
    value: f32,
    heal_amount: f32,
    consumed: bool,
}

impl CollectableRecord {
    fn new(tuning: CollectableTuning) -> Self {
        Self {
            kind: tuning.kind,
            value: tuning.value,
            heal_amount: tuning.heal_amount,
            consumed: false,
        }
    }

    /// `true` only for the first caller.
    fn consume(&mut self) -> bool {
        if self.consumed {
            return false;
        }
        self.consumed = true;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CollectedItem {
    item_id: EntityId,
    kind: CollectableKind,
    value: f32,
    heal_amount: f32,
}

#[derive(Debug, Clone)]
struct CollectionResolver {
    tuning: CollectorTuning,
}

impl CollectionResolver {
    fn new(tuning: CollectorTuning) -> Self {
        Self { tuning }
    }

    /// Consumes every unconsumed collectable within the radius, in query order.
    fn resolve(
        &self,
        position: Vec3,
        spatial: &dyn SpatialQuery,
        collectables: &mut HashMap<EntityId, CollectableRecord>,
    ) -> Vec<CollectedItem> {
        spatial
            .query_entities_with_capability(
                CapabilityTag::Collectable,
                position,
                self.tuning.collect_radius,
            )
            .into_iter()
            .filter_map(|item_id| {
                let record = collectables.get_mut(&item_id)?;
                record.consume().then_some(CollectedItem {
                    item_id,
                    kind: record.kind,
                    value: record.value,
                    heal_amount: record.heal_amount,
                })
            })
            .collect()
    }

    fn special_pause_seconds(&self) -> Option<f32> {
        self.tuning
            .stop_movement_on_special_collect
            .then_some(self.tuning.stop_duration_on_special_collect_seconds)
    }
}
