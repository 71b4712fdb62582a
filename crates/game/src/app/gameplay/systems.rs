struct WorldCombatView<'a> {
    world: &'a SimWorld,
    damage_by_entity: &'a HashMap<EntityId, DamageReceiver>,
}

impl SpatialQuery for WorldCombatView<'_> {
    fn query_entities_with_capability(
        &self,
        tag: CapabilityTag,
        center: Vec3,
        radius: f32,
    ) -> Vec<EntityId> {
        self.world.query_entities_with_capability(tag, center, radius)
    }
}

impl CombatView for WorldCombatView<'_> {
    fn is_living(&self, entity_id: EntityId) -> bool {
        self.world.is_active(entity_id)
            && self
                .damage_by_entity
                .get(&entity_id)
                .is_some_and(Damageable::is_alive)
    }

    fn position_of(&self, entity_id: EntityId) -> Option<Vec3> {
        self.world.position_of(entity_id)
    }

    fn capabilities_of(&self, entity_id: EntityId) -> CapabilitySet {
        self.world
            .find_entity(entity_id)
            .map_or_else(CapabilitySet::default, |entity| entity.capabilities)
    }
}

struct GameplaySystemContext<'a> {
    fixed_dt_seconds: f32,
    input: &'a InputSnapshot,
    world: &'a mut SimWorld,
    player_id: Option<EntityId>,
    components: &'a mut GameplayComponents,
    events: &'a mut GameplayEventBus,
    intents: &'a mut GameplayIntentQueue,
    animation: &'a mut dyn AnimationSink,
    stop_requested: &'a mut bool,
}

#[derive(Default)]
struct GameplaySystemsHost {
    last_tick_order: Vec<GameplaySystemId>,
    tick_apply_stats: GameplayIntentApplyStats,
}

impl GameplaySystemsHost {
    fn run_once_per_tick(&mut self, context: &mut GameplaySystemContext<'_>) {
        self.last_tick_order.clear();
        self.tick_apply_stats = GameplayIntentApplyStats::default();
        for system_id in GAMEPLAY_SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            self.run_system(system_id, context);
        }
    }

    #[cfg(test)]
    fn last_tick_order(&self) -> &[GameplaySystemId] {
        &self.last_tick_order
    }

    fn run_system(&mut self, system_id: GameplaySystemId, context: &mut GameplaySystemContext<'_>) {
        match system_id {
            GameplaySystemId::InputIntent => self.run_input_intent_system(context),
            GameplaySystemId::Movement => self.run_movement_system(context),
            GameplaySystemId::Targeting => self.run_targeting_system(context),
            GameplaySystemId::CombatResolution => self.apply_pending_intents(context),
            GameplaySystemId::Collection => self.run_collection_system(context),
            GameplaySystemId::Interaction => self.run_interaction_system(context),
            GameplaySystemId::Lifecycle => self.run_lifecycle_system(context),
            GameplaySystemId::Camera => self.run_camera_system(context),
            GameplaySystemId::Cleanup => {
                self.apply_pending_intents(context);
                context.intents.set_last_tick_apply_stats(self.tick_apply_stats);
                context.events.finish_tick_rollover();
            }
        }
    }

    fn run_input_intent_system(&self, context: &mut GameplaySystemContext<'_>) {
        let Some(player_id) = context.player_id else {
            return;
        };
        if let Some(movement) = context.components.movement_by_entity.get_mut(&player_id) {
            movement.set_input_vector(context.input.move_vector());
        }
    }

    fn run_movement_system(&self, context: &mut GameplaySystemContext<'_>) {
        let dt = context.fixed_dt_seconds;
        for entity_id in sorted_ids(&context.components.movement_by_entity) {
            if !context.world.is_active(entity_id) {
                continue;
            }
            let (Some(movement), Some(entity)) = (
                context.components.movement_by_entity.get_mut(&entity_id),
                context.world.find_entity_mut(entity_id),
            ) else {
                continue;
            };
            movement.tick(dt, &mut entity.transform);
            context
                .animation
                .set_speed(entity_id, movement.speed_fraction());
        }
    }

    fn run_targeting_system(&self, context: &mut GameplaySystemContext<'_>) {
        let dt = context.fixed_dt_seconds;
        let GameplayComponents {
            movement_by_entity,
            damage_by_entity,
            attack_by_entity,
            ..
        } = &mut *context.components;

        for attacker_id in sorted_ids(attack_by_entity) {
            let Some(entity) = context.world.find_entity(attacker_id) else {
                continue;
            };
            if !entity.active {
                continue;
            }
            let (Some(attack), Some(movement)) = (
                attack_by_entity.get_mut(&attacker_id),
                movement_by_entity.get(&attacker_id),
            ) else {
                continue;
            };
            let attacker = AttackerState {
                entity_id: attacker_id,
                position: entity.transform.position,
                yaw_degrees: entity.transform.yaw_degrees,
                speed_fraction: movement.speed_fraction(),
                alive: damage_by_entity
                    .get(&attacker_id)
                    .map_or(true, Damageable::is_alive),
            };
            let view = WorldCombatView {
                world: &*context.world,
                damage_by_entity: &*damage_by_entity,
            };
            let outcome = attack.tick(dt, attacker, &view);

            if let Some(target) = outcome.committed {
                debug!(
                    attacker = attacker_id.0,
                    target = target.entity_id.0,
                    distance = target.distance,
                    "attack_committed"
                );
                context.animation.play_attack(attacker_id);
                context.events.emit(GameplayEvent::AttackCommitted {
                    attacker_id,
                    target_id: target.entity_id,
                    distance: target.distance,
                });
            }
            if let Some(point) = outcome.face_towards {
                let fraction = attack.tuning.face_target_speed * dt;
                if let Some(entity) = context.world.find_entity_mut(attacker_id) {
                    movement.turn_towards(&mut entity.transform, point, fraction.clamp(0.0, 1.0));
                }
            }
            if let Some(struck) = outcome.struck {
                for target_id in &struck {
                    context.intents.enqueue(GameplayIntent::ApplyDamage {
                        source_id: attacker_id,
                        target_id: *target_id,
                        amount: attack.tuning.damage_amount,
                    });
                }
                context.events.emit(GameplayEvent::StrikeResolved {
                    attacker_id,
                    struck_count: struck.len() as u32,
                });
            }
            if outcome.finished {
                context.animation.stop_attack(attacker_id);
            }
            if outcome.aborted {
                context.animation.stop_attack(attacker_id);
                context
                    .events
                    .emit(GameplayEvent::AttackAborted { attacker_id });
            }
        }
    }

    fn run_collection_system(&self, context: &mut GameplaySystemContext<'_>) {
        let GameplayComponents {
            damage_by_entity,
            collector_by_entity,
            collectable_by_entity,
            ..
        } = &mut *context.components;

        for collector_id in sorted_ids(collector_by_entity) {
            let Some(position) = context
                .world
                .find_entity(collector_id)
                .filter(|entity| entity.active)
                .map(|entity| entity.transform.position)
            else {
                continue;
            };
            if !damage_by_entity
                .get(&collector_id)
                .map_or(true, Damageable::is_alive)
            {
                continue;
            }
            let Some(resolver) = collector_by_entity.get(&collector_id) else {
                continue;
            };

            let collected = resolver.resolve(position, &*context.world, collectable_by_entity);
            for item in collected {
                context
                    .world
                    .remove_capability(item.item_id, CapabilityTag::Collectable);
                if context.world.set_active(item.item_id, false) {
                    context.events.emit(GameplayEvent::EntityDeactivated {
                        entity_id: item.item_id,
                    });
                }
                info!(
                    collector = collector_id.0,
                    item = item.item_id.0,
                    kind = ?item.kind,
                    value = item.value,
                    "item_collected"
                );
                context.events.emit(GameplayEvent::ItemCollected {
                    collector_id,
                    item_id: item.item_id,
                    kind: item.kind,
                    value: item.value,
                });
                if item.heal_amount > 0.0 {
                    context.intents.enqueue(GameplayIntent::Heal {
                        entity_id: collector_id,
                        amount: item.heal_amount,
                    });
                }
                if item.kind == CollectableKind::Special {
                    context.events.emit(GameplayEvent::SpecialCollected {
                        collector_id,
                        item_id: item.item_id,
                    });
                    context.animation.play_win(collector_id);
                    if let Some(seconds) = resolver.special_pause_seconds() {
                        context.intents.enqueue(GameplayIntent::PauseMovement {
                            entity_id: collector_id,
                            seconds,
                        });
                    }
                }
            }
        }
    }

    fn run_interaction_system(&self, context: &mut GameplaySystemContext<'_>) {
        let dt = context.fixed_dt_seconds;
        let GameplayComponents {
            damage_by_entity,
            interactor_by_entity,
            interactable_by_entity,
            ..
        } = &mut *context.components;

        // Countdowns advance before proximity so a fresh claim starts full.
        for target_id in sorted_ids(interactable_by_entity) {
            if !context.world.is_active(target_id) {
                continue;
            }
            let Some(record) = interactable_by_entity.get_mut(&target_id) else {
                continue;
            };
            match record.tick(dt) {
                Some(InteractionTransition::Completed { claimant }) => {
                    context
                        .world
                        .remove_capability(target_id, CapabilityTag::Interactable);
                    if let Some(interactor) = interactor_by_entity.get_mut(&claimant) {
                        if interactor.current == Some(target_id) {
                            interactor.current = None;
                        }
                    }
                    info!(
                        interactor = claimant.0,
                        target = target_id.0,
                        "interaction_completed"
                    );
                    context.events.emit(GameplayEvent::InteractionCompleted {
                        interactor_id: claimant,
                        target_id,
                    });
                }
                Some(InteractionTransition::Deactivate) => {
                    context.intents.enqueue(GameplayIntent::Deactivate {
                        entity_id: target_id,
                    });
                }
                None => {}
            }
        }

        for interactor_id in sorted_ids(interactor_by_entity) {
            let Some(position) = context
                .world
                .find_entity(interactor_id)
                .filter(|entity| entity.active)
                .map(|entity| entity.transform.position)
            else {
                continue;
            };
            if !damage_by_entity
                .get(&interactor_id)
                .map_or(true, Damageable::is_alive)
            {
                continue;
            }
            let Some(interactor) = interactor_by_entity.get_mut(&interactor_id) else {
                continue;
            };
            let radius = interactor.tuning.interaction_radius;

            if let Some(target_id) = interactor.current {
                let still_claimed = interactable_by_entity.get(&target_id).is_some_and(|record| {
                    record.state() == InteractionState::Interacting
                        && record.claimant() == Some(interactor_id)
                });
                let in_range = context.world.is_active(target_id)
                    && context
                        .world
                        .position_of(target_id)
                        .is_some_and(|target| position.distance(target) <= radius);
                if !(still_claimed && in_range) {
                    if still_claimed {
                        cancel_claim(context.events, interactable_by_entity, interactor_id, target_id);
                    }
                    interactor.current = None;
                }
            }

            // The held claim competes with idle interactables; ties keep it.
            let current = interactor.current;
            let mut candidates = context
                .world
                .query_entities_with_capability(CapabilityTag::Interactable, position, radius)
                .into_iter()
                .filter(|id| {
                    Some(*id) == current
                        || interactable_by_entity
                            .get(id)
                            .is_some_and(|record| record.state() == InteractionState::Idle)
                })
                .filter_map(|id| {
                    context
                        .world
                        .position_of(id)
                        .map(|target| (id, position.distance(target)))
                })
                .collect::<Vec<_>>();
            candidates.sort_by(|a, b| {
                a.1.total_cmp(&b.1)
                    .then_with(|| (Some(b.0) == current).cmp(&(Some(a.0) == current)))
            });

            let Some(&(closest_id, _)) = candidates.first() else {
                continue;
            };
            if Some(closest_id) == current {
                continue;
            }
            if let Some(previous_id) = current {
                cancel_claim(context.events, interactable_by_entity, interactor_id, previous_id);
                interactor.current = None;
            }

            for (target_id, _) in candidates {
                let Some(record) = interactable_by_entity.get_mut(&target_id) else {
                    continue;
                };
                if record.start_interaction(interactor_id) {
                    interactor.current = Some(target_id);
                    debug!(
                        interactor = interactor_id.0,
                        target = target_id.0,
                        "interaction_started"
                    );
                    context.events.emit(GameplayEvent::InteractionStarted {
                        interactor_id,
                        target_id,
                    });
                    break;
                }
            }
        }
    }

    fn run_lifecycle_system(&self, context: &mut GameplaySystemContext<'_>) {
        let dt = context.fixed_dt_seconds;
        // A death gate armed this tick starts counting on the next one.
        let died_this_tick = context
            .events
            .iter_emitted_so_far()
            .filter_map(|event| match event {
                GameplayEvent::EntityDied { entity_id } => Some(*entity_id),
                _ => None,
            })
            .collect::<Vec<_>>();
        for entity_id in sorted_ids(&context.components.damage_by_entity) {
            if !context.world.is_active(entity_id) || died_this_tick.contains(&entity_id) {
                continue;
            }
            let Some(receiver) = context.components.damage_by_entity.get_mut(&entity_id) else {
                continue;
            };
            match receiver.tick(dt) {
                Some(LifecycleTransition::Deactivate) => {
                    context
                        .intents
                        .enqueue(GameplayIntent::Deactivate { entity_id });
                }
                Some(LifecycleTransition::Respawned) => {
                    let health = *receiver.health();
                    info!(entity = entity_id.0, "entity_respawned");
                    context
                        .events
                        .emit(GameplayEvent::EntityRespawned { entity_id });
                    context.events.emit(GameplayEvent::HealthChanged {
                        entity_id,
                        current: health.current(),
                        max: health.max(),
                    });
                }
                None => {}
            }
        }
    }

    fn run_camera_system(&self, context: &mut GameplaySystemContext<'_>) {
        let (Some(camera), Some(player_id)) =
            (context.components.camera.as_mut(), context.player_id)
        else {
            return;
        };
        let Some(target) = context.world.position_of(player_id) else {
            return;
        };
        let speed_fraction = context
            .components
            .movement_by_entity
            .get(&player_id)
            .map_or(0.0, MovementIntegrator::speed_fraction);
        camera.tick(context.fixed_dt_seconds, target, speed_fraction);
    }

    /// Drains the intent queue. Applying an intent may enqueue follow-ups
    /// (damage requests a pause), which are applied in the same call.
    fn apply_pending_intents(&mut self, context: &mut GameplaySystemContext<'_>) {
        let mut stats = GameplayIntentApplyStats::default();
        for _ in 0..MAX_INTENT_PASSES {
            if context.intents.is_empty() {
                break;
            }
            for intent in context.intents.drain_current_tick() {
                stats.record_intent(&intent);
                if !Self::apply_intent(intent, context) {
                    stats.record_invalid_target();
                }
            }
        }
        if !context.intents.is_empty() {
            warn!(
                pending = context.intents.drain_current_tick().len(),
                "intent_cascade_truncated"
            );
        }
        self.tick_apply_stats.merge(stats);
    }

    fn apply_intent(intent: GameplayIntent, context: &mut GameplaySystemContext<'_>) -> bool {
        match intent {
            GameplayIntent::ApplyDamage {
                source_id,
                target_id,
                amount,
            } => {
                if !context.world.is_active(target_id) {
                    return false;
                }
                let Some(receiver) = context.components.damage_by_entity.get_mut(&target_id)
                else {
                    return false;
                };
                let Some(report) = receiver.receive_damage(amount) else {
                    debug!(
                        source = source_id.0,
                        target = target_id.0,
                        "damage_ignored_target_dead"
                    );
                    return true;
                };
                let stop_duration = receiver.stop_duration_on_damage();
                debug!(
                    source = source_id.0,
                    target = target_id.0,
                    amount,
                    current = report.current,
                    max = report.max,
                    "damage_applied"
                );
                context.events.emit(GameplayEvent::HealthChanged {
                    entity_id: target_id,
                    current: report.current,
                    max: report.max,
                });
                if report.died {
                    Self::handle_death(target_id, context);
                    return true;
                }
                context.animation.play_hurt(target_id);
                if let Some(seconds) = stop_duration {
                    context.intents.enqueue(GameplayIntent::PauseMovement {
                        entity_id: target_id,
                        seconds,
                    });
                }
                true
            }
            GameplayIntent::PauseMovement { entity_id, seconds } => {
                let Some(movement) = context.components.movement_by_entity.get_mut(&entity_id)
                else {
                    return false;
                };
                if movement.pause_movement(seconds) {
                    context
                        .events
                        .emit(GameplayEvent::MovementPaused { entity_id, seconds });
                }
                true
            }
            GameplayIntent::Deactivate { entity_id } => {
                if context.world.find_entity(entity_id).is_none() {
                    return false;
                }
                if context.world.set_active(entity_id, false) {
                    info!(entity = entity_id.0, "entity_deactivated");
                    context
                        .events
                        .emit(GameplayEvent::EntityDeactivated { entity_id });
                    if Some(entity_id) == context.player_id {
                        *context.stop_requested = true;
                    }
                }
                true
            }
            GameplayIntent::Heal { entity_id, amount } => {
                if !context.world.is_active(entity_id) {
                    return false;
                }
                let Some(receiver) = context.components.damage_by_entity.get_mut(&entity_id)
                else {
                    return false;
                };
                let Some(report) = receiver.heal(amount) else {
                    debug!(entity = entity_id.0, "heal_ignored_target_dead");
                    return true;
                };
                debug!(
                    entity = entity_id.0,
                    amount,
                    current = report.current,
                    "health_restored"
                );
                context.events.emit(GameplayEvent::HealthChanged {
                    entity_id,
                    current: report.current,
                    max: report.max,
                });
                true
            }
        }
    }

    /// Side effects of a death transition. Callers guarantee it runs once.
    fn handle_death(entity_id: EntityId, context: &mut GameplaySystemContext<'_>) {
        info!(entity = entity_id.0, "entity_died");
        context.events.emit(GameplayEvent::EntityDied { entity_id });
        context.animation.play_dead(entity_id);
        if let Some(movement) = context.components.movement_by_entity.get_mut(&entity_id) {
            movement.set_enabled(false);
        }
        if let Some(attack) = context.components.attack_by_entity.get_mut(&entity_id) {
            if attack.abort() {
                context.animation.stop_attack(entity_id);
                context.events.emit(GameplayEvent::AttackAborted {
                    attacker_id: entity_id,
                });
            }
        }
        if let Some(interactor) = context.components.interactor_by_entity.get_mut(&entity_id) {
            if let Some(target_id) = interactor.current.take() {
                let cancelled = context
                    .components
                    .interactable_by_entity
                    .get_mut(&target_id)
                    .is_some_and(|record| record.cancel_interaction(entity_id));
                if cancelled {
                    context.events.emit(GameplayEvent::InteractionCancelled {
                        interactor_id: entity_id,
                        target_id,
                    });
                }
            }
        }
    }
}

fn cancel_claim(
    events: &mut GameplayEventBus,
    interactable_by_entity: &mut HashMap<EntityId, InteractionStateMachine>,
    interactor_id: EntityId,
    target_id: EntityId,
) {
    let cancelled = interactable_by_entity
        .get_mut(&target_id)
        .is_some_and(|record| record.cancel_interaction(interactor_id));
    if !cancelled {
        return;
    }
    debug!(
        interactor = interactor_id.0,
        target = target_id.0,
        "interaction_cancelled"
    );
    events.emit(GameplayEvent::InteractionCancelled {
        interactor_id,
        target_id,
    });
}

fn sorted_ids<T>(store: &HashMap<EntityId, T>) -> Vec<EntityId> {
    let mut ids = store.keys().copied().collect::<Vec<_>>();
    ids.sort();
    ids
}
