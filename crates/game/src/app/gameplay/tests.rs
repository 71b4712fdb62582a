    use super::*;
    use arcade_engine::{ConfigDatabase, ConfigurationAssetBuilder};
    use std::cell::RefCell;
    use std::rc::Rc;
use std::time::Duration;

    const DT: f32 = 0.25;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum AnimationCue {
        Hurt(EntityId),
        Dead(EntityId),
        Attack(EntityId),
        Win(EntityId),
        StopAttack(EntityId),
    }

    #[derive(Clone, Default)]
    struct RecordingAnimationSink {
        cues: Rc<RefCell<Vec<AnimationCue>>>,
    }

    impl AnimationSink for RecordingAnimationSink {
        fn play_hurt(&mut self, entity_id: EntityId) {
            self.cues.borrow_mut().push(AnimationCue::Hurt(entity_id));
        }

        fn play_dead(&mut self, entity_id: EntityId) {
            self.cues.borrow_mut().push(AnimationCue::Dead(entity_id));
        }

        fn play_attack(&mut self, entity_id: EntityId) {
            self.cues.borrow_mut().push(AnimationCue::Attack(entity_id));
        }

        fn play_win(&mut self, entity_id: EntityId) {
            self.cues.borrow_mut().push(AnimationCue::Win(entity_id));
        }

        fn stop_attack(&mut self, entity_id: EntityId) {
            self.cues.borrow_mut().push(AnimationCue::StopAttack(entity_id));
        }

        fn set_speed(&mut self, _entity_id: EntityId, _speed_fraction: f32) {}
    }

    struct Harness {
        scene: GameplayScene,
        world: SimWorld,
        cues: Rc<RefCell<Vec<AnimationCue>>>,
        events: Rc<RefCell<Vec<GameplayEvent>>>,
        dt: f32,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_dt(DT)
        }

        /// Harness stepping at the loop's own step for `tps`.
        fn at_tick_rate(tps: u32) -> Self {
            Self::with_dt(Duration::from_secs_f64(1.0 / f64::from(tps)).as_secs_f32())
        }

        fn with_dt(dt: f32) -> Self {
            let sink = RecordingAnimationSink::default();
            let cues = Rc::clone(&sink.cues);
            let mut scene = GameplayScene::new("test", Box::new(sink));
            let events = Rc::new(RefCell::new(Vec::new()));
            let recorder = Rc::clone(&events);
            scene
                .system_events
                .subscribe(move |event| recorder.borrow_mut().push(*event));
            Self {
                scene,
                world: SimWorld::default(),
                cues,
                events,
                dt,
            }
        }

        fn spawn(&mut self, asset: ConfigurationAsset, position: Vec3, is_player: bool) -> EntityId {
            self.scene
                .spawn_from_asset(&mut self.world, Arc::new(asset), position, is_player)
                .expect("spawn archetype")
        }

        fn load(&mut self) {
            self.scene.load(&mut self.world);
        }

        fn tick(&mut self, input: InputSnapshot) -> SimCommand {
            let command = self.scene.update(self.dt, &input, &mut self.world);
            self.world.apply_pending();
            command
        }

        fn idle_ticks(&mut self, count: usize) {
            for _ in 0..count {
                self.tick(InputSnapshot::empty());
            }
        }

        fn count(&self, kind: GameplayEventKind) -> usize {
            self.events
                .borrow()
                .iter()
                .filter(|event| event.kind() == kind)
                .count()
        }

        fn cue_count(&self, cue: AnimationCue) -> usize {
            self.cues.borrow().iter().filter(|seen| **seen == cue).count()
        }

        fn health_of(&self, entity_id: EntityId) -> HealthModel {
            *self
                .scene
                .components
                .damage_by_entity
                .get(&entity_id)
                .expect("damage receiver")
                .health()
        }

        fn movement_of(&self, entity_id: EntityId) -> &MovementIntegrator {
            self.scene
                .components
                .movement_by_entity
                .get(&entity_id)
                .expect("movement")
        }

        fn interactable_of(&self, entity_id: EntityId) -> &InteractionStateMachine {
            self.scene
                .components
                .interactable_by_entity
                .get(&entity_id)
                .expect("interactable")
        }

        fn place(&mut self, entity_id: EntityId, position: Vec3) {
            self.world
                .find_entity_mut(entity_id)
                .expect("entity")
                .transform
                .position = position;
        }
    }

    fn tags(tags: &[CapabilityTag]) -> CapabilitySet {
        CapabilitySet::from_tags(tags)
    }

    fn moving(x: f32, y: f32) -> InputSnapshot {
        InputSnapshot::empty().with_move_vector(Vec2::new(x, y))
    }

    fn fighter_asset() -> ConfigurationAsset {
        ConfigurationAssetBuilder::new("test.fighter")
            .capabilities(tags(&[CapabilityTag::Damageable]))
            .float("maxSpeed", 5.0)
            .float("maxHealth", 10.0)
            .float("detectionRadius", 5.0)
            .float("attackRange", 1.5)
            .float("damageAmount", 2.0)
            .build()
    }

    fn training_dummy_asset(max_health: f32) -> ConfigurationAsset {
        ConfigurationAssetBuilder::new("test.dummy")
            .capabilities(tags(&[CapabilityTag::Damageable]))
            .float("maxHealth", max_health)
            .float("respawnDelay", 1.0)
            .build()
    }

    fn collector_asset() -> ConfigurationAsset {
        ConfigurationAssetBuilder::new("test.collector")
            .float("maxSpeed", 5.0)
            .float("collectRadius", 1.0)
            .build()
    }

    fn collectable_asset(kind: &str) -> ConfigurationAsset {
        ConfigurationAssetBuilder::new(format!("test.{kind}"))
            .capabilities(tags(&[CapabilityTag::Collectable]))
            .text("collectableKind", kind)
            .build()
    }

    fn interactor_asset() -> ConfigurationAsset {
        ConfigurationAssetBuilder::new("test.interactor")
            .float("interactionRadius", 2.0)
            .build()
    }

    fn chest_asset() -> ConfigurationAsset {
        ConfigurationAssetBuilder::new("test.chest")
            .capabilities(tags(&[CapabilityTag::Interactable]))
            .float("interactionDuration", 5.0)
            .float("deactivateDelay", 1.0)
            .build()
    }

    struct StaticCombatView {
        entries: Vec<(EntityId, Vec3, CapabilitySet, bool)>,
    }

    impl SpatialQuery for StaticCombatView {
        fn query_entities_with_capability(
            &self,
            tag: CapabilityTag,
            center: Vec3,
            radius: f32,
        ) -> Vec<EntityId> {
            self.entries
                .iter()
                .filter(|(_, position, capabilities, _)| {
                    capabilities.contains(tag) && position.distance(center) <= radius
                })
                .map(|(id, ..)| *id)
                .collect()
        }
    }

    impl CombatView for StaticCombatView {
        fn is_living(&self, entity_id: EntityId) -> bool {
            self.entries
                .iter()
                .any(|(id, _, _, living)| *id == entity_id && *living)
        }

        fn position_of(&self, entity_id: EntityId) -> Option<Vec3> {
            self.entries
                .iter()
                .find(|(id, ..)| *id == entity_id)
                .map(|(_, position, ..)| *position)
        }

        fn capabilities_of(&self, entity_id: EntityId) -> CapabilitySet {
            self.entries
                .iter()
                .find(|(id, ..)| *id == entity_id)
                .map_or_else(CapabilitySet::default, |(_, _, capabilities, _)| *capabilities)
        }
    }

    fn attack_tuning() -> AttackTuning {
        let asset = fighter_asset();
        TuningReader::new(&asset).attack().expect("attack tuning")
    }

    fn standing_attacker(entity_id: EntityId) -> AttackerState {
        AttackerState {
            entity_id,
            position: Vec3::ZERO,
            yaw_degrees: 0.0,
            speed_fraction: 0.0,
            alive: true,
        }
    }

    #[test]
    fn health_stays_within_bounds_for_any_damage_and_heal_interleaving() {
        let mut health = HealthModel::new(5.0);
        let mut seed = 17_u32;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let amount = (seed >> 16) as f32 / 4096.0 - 2.0;
            if seed & 1 == 0 {
                health.take_damage(amount);
            } else {
                health.heal(amount);
            }
            assert!(health.current() >= 0.0);
            assert!(health.current() <= health.max());
        }
    }

    #[test]
    fn health_scenario_clamps_at_zero_and_ignores_damage_after_death() {
        let mut health = HealthModel::new(5.0);

        let first = health.take_damage(3.0).expect("alive");
        assert_eq!(first.current, 2.0);
        assert_eq!(first.max, 5.0);
        assert!(!first.died);
        assert!(!health.is_dead());

        let second = health.take_damage(3.0).expect("still alive before hit");
        assert_eq!(second.current, 0.0);
        assert!(second.died);
        assert!(health.is_dead());

        assert_eq!(health.take_damage(1.0), None);
        assert_eq!(health.heal(1.0), None);
        assert_eq!(health.current(), 0.0);
    }

    #[test]
    fn health_treats_negative_and_non_finite_amounts_as_zero() {
        let mut health = HealthModel::new(5.0);
        health.take_damage(-3.0);
        health.take_damage(f32::NAN);
        assert_eq!(health.current(), 5.0);
        health.take_damage(2.0);
        health.heal(f32::INFINITY);
        assert_eq!(health.current(), 3.0);
    }

    #[test]
    fn repeated_die_produces_one_death_transition() {
        let asset = ConfigurationAssetBuilder::new("test.character")
            .float("maxHealth", 5.0)
            .float("deathWaitTime", 1.0)
            .build();
        let tuning = TuningReader::new(&asset).health().expect("health tuning");
        let mut receiver = DamageReceiver::new(tuning);

        assert!(receiver.die());
        assert!(!receiver.die());
        assert!(!receiver.die());
        assert_eq!(receiver.receive_damage(3.0), None);

        let transitions = (0..20)
            .filter_map(|_| receiver.tick(DT))
            .collect::<Vec<_>>();
        assert_eq!(transitions, vec![LifecycleTransition::Deactivate]);
    }

    #[test]
    fn lethal_damage_applied_several_times_in_one_tick_dies_once() {
        let mut harness = Harness::new();
        let dummy = harness.spawn(training_dummy_asset(5.0), Vec3::ZERO, false);
        harness.load();
        for _ in 0..3 {
            harness
                .scene
                .system_intents
                .enqueue(GameplayIntent::ApplyDamage {
                    source_id: EntityId(99),
                    target_id: dummy,
                    amount: 10.0,
                });
        }
        harness.idle_ticks(1);

        assert_eq!(harness.count(GameplayEventKind::EntityDied), 1);
        assert_eq!(harness.count(GameplayEventKind::HealthChanged), 1);
        assert_eq!(harness.cue_count(AnimationCue::Dead(dummy)), 1);
        assert_eq!(harness.cue_count(AnimationCue::Hurt(dummy)), 0);
    }

    #[test]
    fn velocity_approaches_max_speed_monotonically_without_exceeding_it() {
        let tuning = TuningReader::new(&collector_asset())
            .movement()
            .expect("movement tuning");
        assert_eq!(tuning.acceleration, 2.0);
        let mut movement = MovementIntegrator::new(tuning);
        let mut transform = Transform::default();
        movement.set_input_vector(Vec2::new(3.0, 4.0));

        let mut previous = 0.0;
        for _ in 0..60 {
            movement.tick(DT, &mut transform);
            let speed = movement.velocity().length();
            assert!(speed >= previous - 1e-5, "speed dropped: {speed} < {previous}");
            assert!(speed <= 5.0 + 1e-4, "speed overshot: {speed}");
            previous = speed;
        }
        assert!(previous > 4.99);
        assert!(movement.speed_fraction() <= 1.0);
    }

    #[test]
    fn rotation_follows_velocity_without_overshooting() {
        let asset = ConfigurationAssetBuilder::new("test.turner")
            .float("maxSpeed", 5.0)
            .float("rotationSpeed", 90.0)
            .build();
        let mut movement = MovementIntegrator::new(TuningReader::new(&asset).movement().expect("movement"));
        let mut transform = Transform::default();
        movement.set_input_vector(Vec2::new(1.0, 0.0));

        movement.tick(DT, &mut transform);
        assert!((transform.yaw_degrees - 22.5).abs() < 1e-3);
        for _ in 0..10 {
            movement.tick(DT, &mut transform);
            assert!(transform.yaw_degrees <= 90.0 + 1e-3);
        }
        assert!((transform.yaw_degrees - 90.0).abs() < 1e-3);
    }

    #[test]
    fn gravity_settles_entities_on_the_ground() {
        let tuning = TuningReader::new(&collector_asset())
            .movement()
            .expect("movement tuning");
        let mut movement = MovementIntegrator::new(tuning);
        let mut transform = Transform::at(Vec3::new(0.0, 3.0, 0.0));
        assert!(movement.pause_movement(10.0));
        for _ in 0..20 {
            movement.tick(DT, &mut transform);
        }
        assert_eq!(transform.position.y, 0.0);
    }

    #[test]
    fn pausing_while_paused_neither_shortens_nor_extends_the_pause() {
        let tuning = TuningReader::new(&collector_asset())
            .movement()
            .expect("movement tuning");
        let mut movement = MovementIntegrator::new(tuning);
        let mut transform = Transform::default();
        movement.set_input_vector(Vec2::new(1.0, 0.0));

        assert!(movement.pause_movement(2.0));
        movement.tick(DT, &mut transform);
        assert!(!movement.pause_movement(0.25));
        assert!(!movement.pause_movement(10.0));

        for _ in 0..6 {
            movement.tick(DT, &mut transform);
            assert!(movement.is_paused());
            assert_eq!(movement.velocity(), Vec3::ZERO);
        }
        movement.tick(DT, &mut transform);
        assert!(!movement.is_paused());
        assert!(movement.velocity().length() > 0.0);
    }

    #[test]
    fn no_target_in_detection_radius_arms_no_gate() {
        let mut attack = TargetingAndAttack::new(attack_tuning());
        let view = StaticCombatView {
            entries: vec![(
                EntityId(2),
                Vec3::new(0.0, 0.0, 10.0),
                tags(&[CapabilityTag::Damageable]),
                true,
            )],
        };
        for _ in 0..20 {
            let outcome = attack.tick(DT, standing_attacker(EntityId(1)), &view);
            assert_eq!(outcome, AttackTickOutcome::default());
        }
        assert_eq!(attack.phase(), AttackPhase::Idle);
        assert!(!attack.any_gate_active());
    }

    #[test]
    fn detection_skips_self_and_dead_and_keeps_first_on_ties() {
        let mut attack = TargetingAndAttack::new(attack_tuning());
        let damageable = tags(&[CapabilityTag::Damageable]);
        let view = StaticCombatView {
            entries: vec![
                (EntityId(1), Vec3::ZERO, damageable, true),
                (EntityId(2), Vec3::new(0.0, 0.0, 1.0), damageable, false),
                (EntityId(3), Vec3::new(2.0, 0.0, 0.0), damageable, true),
                (EntityId(4), Vec3::new(-2.0, 0.0, 0.0), damageable, true),
            ],
        };
        let outcome = attack.tick(DT, standing_attacker(EntityId(1)), &view);
        let committed = outcome.committed.expect("target");
        assert_eq!(committed.entity_id, EntityId(3));
        assert_eq!(committed.distance, 2.0);
        assert_eq!(attack.current_target(), Some(committed));
        assert_eq!(attack.phase(), AttackPhase::DelayedStrike);
    }

    #[test]
    fn dead_attacker_does_not_scan() {
        let mut attack = TargetingAndAttack::new(attack_tuning());
        let view = StaticCombatView {
            entries: vec![(
                EntityId(2),
                Vec3::new(0.0, 0.0, 1.0),
                tags(&[CapabilityTag::Damageable]),
                true,
            )],
        };
        let mut attacker = standing_attacker(EntityId(1));
        attacker.alive = false;
        let outcome = attack.tick(DT, attacker, &view);
        assert_eq!(outcome.committed, None);
        assert!(!attack.any_gate_active());
    }

    #[test]
    fn strike_lands_after_delay_on_every_living_damageable_in_range() {
        let mut harness = Harness::new();
        let fighter = harness.spawn(fighter_asset(), Vec3::ZERO, true);
        let near = harness.spawn(training_dummy_asset(5.0), Vec3::new(0.0, 0.0, 1.0), false);
        let side = harness.spawn(training_dummy_asset(5.0), Vec3::new(0.5, 0.0, 1.2), false);
        harness.load();

        harness.idle_ticks(1);
        assert_eq!(harness.count(GameplayEventKind::AttackCommitted), 1);
        assert_eq!(harness.cue_count(AnimationCue::Attack(fighter)), 1);
        assert!(harness.events.borrow().contains(&GameplayEvent::AttackCommitted {
            attacker_id: fighter,
            target_id: near,
            distance: 1.0,
        }));

        harness.idle_ticks(3);
        assert_eq!(harness.count(GameplayEventKind::HealthChanged), 0);

        harness.idle_ticks(1);
        assert!(harness.events.borrow().contains(&GameplayEvent::StrikeResolved {
            attacker_id: fighter,
            struck_count: 2,
        }));
        assert_eq!(harness.health_of(near).current(), 3.0);
        assert_eq!(harness.health_of(side).current(), 3.0);
        assert_eq!(harness.cue_count(AnimationCue::Hurt(near)), 1);
        assert_eq!(harness.cue_count(AnimationCue::Hurt(side)), 1);
        assert_eq!(harness.health_of(fighter).current(), 10.0);

        harness.idle_ticks(1);
        assert_eq!(harness.cue_count(AnimationCue::StopAttack(fighter)), 1);
    }

    #[test]
    fn strike_spares_damageables_outside_the_target_tags() {
        let mut harness = Harness::new();
        let player_def = ConfigurationAssetBuilder::new("test.sturdy")
            .capabilities(tags(&[CapabilityTag::Damageable]))
            .float("maxSpeed", 5.0)
            .float("maxHealth", 10.0)
            .build();
        let enemy_def = ConfigurationAssetBuilder::new("test.enemy")
            .float("maxSpeed", 0.0)
            .float("detectionRadius", 3.0)
            .float("attackRange", 1.5)
            .float("damageAmount", 2.0)
            .mask("targetCapabilities", tags(&[CapabilityTag::Player]))
            .build();
        let player = harness.spawn(player_def, Vec3::ZERO, true);
        let enemy = harness.spawn(enemy_def, Vec3::new(0.0, 0.0, -1.0), false);
        let bystander = harness.spawn(training_dummy_asset(6.0), Vec3::new(0.3, 0.0, 0.0), false);
        harness.load();

        harness.idle_ticks(5);
        assert!(harness.events.borrow().contains(&GameplayEvent::StrikeResolved {
            attacker_id: enemy,
            struck_count: 1,
        }));
        assert_eq!(harness.health_of(player).current(), 8.0);
        assert_eq!(harness.health_of(bystander).current(), 6.0);
        assert_eq!(harness.cue_count(AnimationCue::Hurt(bystander)), 0);
    }

    #[test]
    fn attacker_turns_to_face_committed_target() {
        let mut harness = Harness::new();
        let fighter = harness.spawn(fighter_asset(), Vec3::ZERO, true);
        harness.spawn(training_dummy_asset(5.0), Vec3::new(1.0, 0.0, 0.0), false);
        harness.load();

        harness.idle_ticks(1);
        let yaw = harness
            .world
            .find_entity(fighter)
            .expect("fighter")
            .transform
            .yaw_degrees;
        assert!((yaw - 90.0).abs() < 1e-3, "yaw was {yaw}");
    }

    #[test]
    fn moving_attacker_aborts_without_partial_strike() {
        let mut harness = Harness::new();
        let fighter = harness.spawn(fighter_asset(), Vec3::ZERO, true);
        let dummy = harness.spawn(training_dummy_asset(5.0), Vec3::new(0.0, 0.0, 1.0), false);
        harness.load();

        harness.idle_ticks(1);
        assert_eq!(harness.count(GameplayEventKind::AttackCommitted), 1);

        for _ in 0..8 {
            harness.tick(moving(1.0, 0.0));
        }
        assert_eq!(harness.count(GameplayEventKind::AttackAborted), 1);
        assert_eq!(harness.cue_count(AnimationCue::StopAttack(fighter)), 1);
        assert_eq!(harness.count(GameplayEventKind::StrikeResolved), 0);
        assert_eq!(harness.health_of(dummy).current(), 5.0);
    }

    #[test]
    fn training_target_respawns_after_delay() {
        let mut harness = Harness::new();
        let fighter_def = ConfigurationAssetBuilder::new("test.heavy")
            .capabilities(tags(&[CapabilityTag::Damageable]))
            .float("maxSpeed", 5.0)
            .float("maxHealth", 10.0)
            .float("detectionRadius", 5.0)
            .float("attackRange", 1.5)
            .float("damageAmount", 5.0)
            .build();
        harness.spawn(fighter_def, Vec3::ZERO, true);
        let dummy = harness.spawn(training_dummy_asset(5.0), Vec3::new(0.0, 0.0, 1.0), false);
        harness.load();

        harness.idle_ticks(5);
        assert!(harness.health_of(dummy).is_dead());
        assert_eq!(harness.cue_count(AnimationCue::Dead(dummy)), 1);

        harness.idle_ticks(3);
        assert_eq!(harness.count(GameplayEventKind::EntityRespawned), 0);

        harness.idle_ticks(1);
        assert_eq!(harness.count(GameplayEventKind::EntityRespawned), 1);
        assert!(!harness.health_of(dummy).is_dead());
        assert_eq!(harness.health_of(dummy).current(), 5.0);
        assert!(harness.world.is_active(dummy));
        assert_eq!(
            harness.events.borrow().last(),
            Some(&GameplayEvent::HealthChanged {
                entity_id: dummy,
                current: 5.0,
                max: 5.0,
            })
        );
    }

    #[test]
    fn player_death_deactivates_after_wait_and_stops_simulation() {
        let mut harness = Harness::new();
        let player_def = ConfigurationAssetBuilder::new("test.fragile")
            .capabilities(tags(&[CapabilityTag::Damageable]))
            .float("maxSpeed", 5.0)
            .float("maxHealth", 2.0)
            .float("deathWaitTime", 1.0)
            .build();
        let enemy_def = ConfigurationAssetBuilder::new("test.enemy")
            .float("maxSpeed", 0.0)
            .float("detectionRadius", 3.0)
            .float("attackRange", 1.5)
            .float("damageAmount", 2.0)
            .mask("targetCapabilities", tags(&[CapabilityTag::Player]))
            .build();
        let player = harness.spawn(player_def, Vec3::ZERO, true);
        let enemy = harness.spawn(enemy_def, Vec3::new(0.0, 0.0, -1.0), false);
        harness.load();

        let mut stopped_at = None;
        for tick in 1..=20 {
            if harness.tick(InputSnapshot::empty()) == SimCommand::Stop {
                stopped_at = Some(tick);
                break;
            }
        }

        assert_eq!(stopped_at, Some(9));
        assert!(!harness.world.is_active(player));
        assert_eq!(harness.count(GameplayEventKind::EntityDied), 1);
        assert_eq!(harness.cue_count(AnimationCue::Dead(player)), 1);
        assert_eq!(harness.cue_count(AnimationCue::Hurt(player)), 0);
        assert_eq!(harness.count(GameplayEventKind::MovementPaused), 0);
        assert_eq!(harness.cue_count(AnimationCue::Attack(enemy)), 1);
    }

    #[test]
    fn non_lethal_hit_on_character_pauses_movement() {
        let mut harness = Harness::new();
        let player = harness.spawn(fighter_asset(), Vec3::ZERO, true);
        harness.load();
        harness
            .scene
            .system_intents
            .enqueue(GameplayIntent::ApplyDamage {
                source_id: EntityId(99),
                target_id: player,
                amount: 1.0,
            });
        harness.tick(moving(1.0, 0.0));

        assert_eq!(harness.cue_count(AnimationCue::Hurt(player)), 1);
        assert!(harness.events.borrow().contains(&GameplayEvent::MovementPaused {
            entity_id: player,
            seconds: DEFAULT_STOP_DURATION_ON_DAMAGE_SECONDS,
        }));
        assert!(harness.movement_of(player).is_paused());
    }

    #[test]
    fn intents_against_missing_components_count_as_invalid_targets() {
        let mut harness = Harness::new();
        let chest = harness.spawn(chest_asset(), Vec3::ZERO, false);
        harness.load();
        harness
            .scene
            .system_intents
            .enqueue(GameplayIntent::ApplyDamage {
                source_id: EntityId(99),
                target_id: chest,
                amount: 1.0,
            });
        harness.idle_ticks(1);

        let stats = harness.scene.system_intents.last_tick_apply_stats();
        assert_eq!(stats.apply_damage, 1);
        assert_eq!(stats.invalid_target_count, 1);
        assert!(harness.scene.system_intents.is_empty());
    }

    #[test]
    fn interaction_state_machine_restarts_countdown_after_cancel() {
        let mut record = InteractionStateMachine::new(
            TuningReader::new(&chest_asset()).interactable(),
        );
        let first = EntityId(1);
        let second = EntityId(2);

        assert!(record.start_interaction(first));
        for _ in 0..49 {
            assert_eq!(record.tick(0.1), None);
        }
        assert_eq!(record.state(), InteractionState::Interacting);
        assert!(!record.start_interaction(second));
        assert!(!record.cancel_interaction(second));

        assert!(record.cancel_interaction(first));
        assert_eq!(record.state(), InteractionState::Idle);
        assert_eq!(record.claimant(), None);

        assert!(record.start_interaction(first));
        assert_eq!(record.remaining(), 5.0);
    }

    #[test]
    fn interactor_leaving_cancels_and_returning_restarts_full_countdown() {
        let mut harness = Harness::new();
        let interactor = harness.spawn(interactor_asset(), Vec3::ZERO, true);
        let chest = harness.spawn(chest_asset(), Vec3::new(0.0, 0.0, 1.0), false);
        harness.load();

        harness.idle_ticks(1);
        assert_eq!(harness.count(GameplayEventKind::InteractionStarted), 1);
        assert_eq!(harness.interactable_of(chest).remaining(), 5.0);

        harness.idle_ticks(18);
        assert_eq!(
            harness.interactable_of(chest).state(),
            InteractionState::Interacting
        );

        harness.place(interactor, Vec3::new(0.0, 0.0, 10.0));
        harness.idle_ticks(1);
        assert_eq!(harness.interactable_of(chest).state(), InteractionState::Idle);
        assert_eq!(harness.count(GameplayEventKind::InteractionCancelled), 1);

        harness.place(interactor, Vec3::ZERO);
        harness.idle_ticks(1);
        assert_eq!(harness.count(GameplayEventKind::InteractionStarted), 2);
        assert_eq!(harness.interactable_of(chest).remaining(), 5.0);

        harness.idle_ticks(19);
        assert_eq!(harness.count(GameplayEventKind::InteractionCompleted), 0);
        harness.idle_ticks(1);
        assert_eq!(harness.count(GameplayEventKind::InteractionCompleted), 1);
        let entity = harness.world.find_entity(chest).expect("chest");
        assert!(entity.active);
        assert!(!entity.capabilities.contains(CapabilityTag::Interactable));

        harness.idle_ticks(3);
        assert!(harness.world.is_active(chest));
        harness.idle_ticks(1);
        assert!(!harness.world.is_active(chest));
        assert_eq!(harness.count(GameplayEventKind::InteractionStarted), 2);
    }

    #[test]
    fn second_interactor_is_rejected_while_first_holds_the_claim() {
        let mut harness = Harness::new();
        let first = harness.spawn(interactor_asset(), Vec3::ZERO, false);
        let second = harness.spawn(interactor_asset(), Vec3::new(0.0, 0.0, 0.5), false);
        let chest = harness.spawn(chest_asset(), Vec3::new(0.0, 0.0, 1.0), false);
        harness.load();

        harness.idle_ticks(4);
        assert_eq!(harness.count(GameplayEventKind::InteractionStarted), 1);
        assert_eq!(harness.interactable_of(chest).claimant(), Some(first));
        assert_eq!(
            harness
                .scene
                .components
                .interactor_by_entity
                .get(&second)
                .expect("second")
                .current,
            None
        );
    }

    #[test]
    fn interactor_picks_the_closest_idle_interactable() {
        let mut harness = Harness::new();
        harness.spawn(interactor_asset(), Vec3::ZERO, true);
        let far = harness.spawn(chest_asset(), Vec3::new(0.0, 0.0, 1.5), false);
        let near = harness.spawn(chest_asset(), Vec3::new(0.0, 0.0, -0.5), false);
        harness.load();

        harness.idle_ticks(1);
        assert_eq!(
            harness.interactable_of(near).state(),
            InteractionState::Interacting
        );
        assert_eq!(harness.interactable_of(far).state(), InteractionState::Idle);
    }

    #[test]
    fn interactor_switches_to_a_closer_idle_interactable() {
        let mut harness = Harness::new();
        let interactor = harness.spawn(interactor_asset(), Vec3::ZERO, true);
        let far = harness.spawn(chest_asset(), Vec3::new(0.0, 0.0, 1.5), false);
        let near = harness.spawn(chest_asset(), Vec3::new(0.0, 0.0, 10.0), false);
        harness.load();

        harness.idle_ticks(2);
        assert_eq!(harness.interactable_of(far).claimant(), Some(interactor));

        harness.place(near, Vec3::new(0.0, 0.0, -0.5));
        harness.idle_ticks(1);
        assert!(harness.events.borrow().contains(&GameplayEvent::InteractionCancelled {
            interactor_id: interactor,
            target_id: far,
        }));
        assert_eq!(harness.interactable_of(far).state(), InteractionState::Idle);
        assert_eq!(harness.interactable_of(near).claimant(), Some(interactor));
        assert_eq!(harness.interactable_of(near).remaining(), 5.0);

        harness.idle_ticks(3);
        assert_eq!(harness.count(GameplayEventKind::InteractionStarted), 2);
        assert_eq!(harness.count(GameplayEventKind::InteractionCancelled), 1);
    }

    #[test]
    fn ordinary_collect_only_notifies() {
        let mut harness = Harness::new();
        let collector = harness.spawn(collector_asset(), Vec3::ZERO, true);
        let coin = harness.spawn(collectable_asset("ordinary"), Vec3::new(0.0, 0.0, 0.5), false);
        harness.load();

        harness.idle_ticks(3);
        assert_eq!(harness.count(GameplayEventKind::ItemCollected), 1);
        assert_eq!(harness.count(GameplayEventKind::SpecialCollected), 0);
        assert_eq!(harness.cue_count(AnimationCue::Win(collector)), 0);
        assert_eq!(harness.count(GameplayEventKind::MovementPaused), 0);
        assert!(!harness.movement_of(collector).is_paused());

        let entity = harness.world.find_entity(coin).expect("coin");
        assert!(!entity.active);
        assert!(!entity.capabilities.contains(CapabilityTag::Collectable));
    }

    #[test]
    fn special_collect_wins_and_holds_velocity_at_zero_for_stop_duration() {
        let mut harness = Harness::new();
        let collector = harness.spawn(collector_asset(), Vec3::ZERO, true);
        let special = harness.spawn(collectable_asset("special"), Vec3::new(0.0, 0.0, 0.5), false);
        harness.load();

        harness.tick(moving(1.0, 0.0));
        assert!(harness.events.borrow().contains(&GameplayEvent::SpecialCollected {
            collector_id: collector,
            item_id: special,
        }));
        assert_eq!(harness.cue_count(AnimationCue::Win(collector)), 1);
        assert_eq!(harness.count(GameplayEventKind::MovementPaused), 1);
        assert_eq!(harness.movement_of(collector).velocity(), Vec3::ZERO);

        for _ in 0..11 {
            harness.tick(moving(1.0, 0.0));
            assert_eq!(harness.movement_of(collector).velocity(), Vec3::ZERO);
        }
        harness.tick(moving(1.0, 0.0));
        assert!(!harness.movement_of(collector).is_paused());
        assert!(harness.movement_of(collector).velocity().length() > 0.0);
        assert_eq!(harness.count(GameplayEventKind::ItemCollected), 1);
    }

    #[test]
    fn special_collect_pause_lasts_exactly_its_window_at_thirty_tps() {
        let mut harness = Harness::at_tick_rate(30);
        let collector = harness.spawn(collector_asset(), Vec3::ZERO, true);
        harness.spawn(collectable_asset("special"), Vec3::new(0.0, 0.0, 0.5), false);
        harness.load();

        harness.tick(moving(1.0, 0.0));
        assert_eq!(harness.count(GameplayEventKind::SpecialCollected), 1);
        assert!(harness.movement_of(collector).is_paused());

        let window_ticks = (DEFAULT_STOP_DURATION_ON_SPECIAL_COLLECT_SECONDS * 30.0).round() as usize;
        for tick in 1..window_ticks {
            harness.tick(moving(1.0, 0.0));
            assert_eq!(
                harness.movement_of(collector).velocity(),
                Vec3::ZERO,
                "still paused on tick {tick}"
            );
        }
        harness.tick(moving(1.0, 0.0));
        assert!(!harness.movement_of(collector).is_paused());
        assert!(harness.movement_of(collector).velocity().length() > 0.0);
    }

    #[test]
    fn healing_pickup_restores_health_up_to_max() {
        let mut harness = Harness::new();
        let collector_def = ConfigurationAssetBuilder::new("test.wounded_collector")
            .capabilities(tags(&[CapabilityTag::Damageable]))
            .float("maxSpeed", 5.0)
            .float("collectRadius", 1.0)
            .float("maxHealth", 10.0)
            .build();
        let heart = || {
            ConfigurationAssetBuilder::new("test.heart")
                .capabilities(tags(&[CapabilityTag::Collectable]))
                .float("healAmount", 3.0)
                .build()
        };
        let collector = harness.spawn(collector_def, Vec3::ZERO, true);
        let first = harness.spawn(heart(), Vec3::new(0.0, 0.0, 10.0), false);
        let second = harness.spawn(heart(), Vec3::new(0.0, 0.0, 20.0), false);
        harness.load();

        harness
            .scene
            .system_intents
            .enqueue(GameplayIntent::ApplyDamage {
                source_id: EntityId(99),
                target_id: collector,
                amount: 4.0,
            });
        harness.idle_ticks(1);
        assert_eq!(harness.health_of(collector).current(), 6.0);

        harness.place(first, Vec3::new(0.0, 0.0, 0.5));
        harness.idle_ticks(1);
        assert_eq!(harness.health_of(collector).current(), 9.0);
        assert_eq!(harness.scene.system_intents.last_tick_apply_stats().heal, 1);
        assert!(harness.events.borrow().contains(&GameplayEvent::HealthChanged {
            entity_id: collector,
            current: 9.0,
            max: 10.0,
        }));

        harness.place(second, Vec3::new(0.0, 0.0, -0.5));
        harness.idle_ticks(1);
        assert_eq!(harness.health_of(collector).current(), 10.0);
    }

    #[test]
    fn collectable_records_are_consumed_once() {
        let mut record = CollectableRecord::new(CollectableTuning {
            kind: CollectableKind::Ordinary,
            value: 1.0,
            heal_amount: 0.0,
        });
        assert!(record.consume());
        assert!(!record.consume());
    }

    #[test]
    fn camera_widens_fov_and_follows_moving_player() {
        let mut harness = Harness::new();
        let camera_def = ConfigurationAssetBuilder::new("test.camera")
            .float("smoothSpeed", 0.5)
            .build();
        harness
            .world
            .set_def_database(ConfigDatabase::from_assets(vec![camera_def]));
        let player = harness.spawn(collector_asset(), Vec3::ZERO, true);
        harness
            .scene
            .attach_camera(&harness.world, "test.camera")
            .expect("camera def");
        harness.load();

        let initial = harness.scene.components.camera.as_ref().expect("camera").pose();
        assert_eq!(initial.position, DEFAULT_CAMERA_OFFSET);
        assert_eq!(initial.fov, DEFAULT_CAMERA_FOV);

        for _ in 0..8 {
            harness.tick(moving(0.0, 1.0));
        }
        let pose = harness.scene.components.camera.as_ref().expect("camera").pose();
        assert!(pose.fov > DEFAULT_CAMERA_FOV);
        assert!(pose.fov <= DEFAULT_CAMERA_MAX_FOV);
        assert!(pose.position.z > DEFAULT_CAMERA_OFFSET.z);
        let player_z = harness.world.position_of(player).expect("player").z;
        assert!(pose.position.z < player_z + DEFAULT_CAMERA_OFFSET.z);
    }

    #[test]
    fn systems_run_in_fixed_order_every_tick() {
        let mut harness = Harness::new();
        harness.load();
        harness.idle_ticks(2);

        let order = harness.scene.systems_host.last_tick_order();
        assert_eq!(order, GAMEPLAY_SYSTEM_ORDER.as_slice());
        let text = order
            .iter()
            .map(|system| system.name())
            .collect::<Vec<_>>()
            .join(">");
        assert_eq!(text, GAMEPLAY_SYSTEM_ORDER_TEXT);
    }

    #[test]
    fn event_counts_roll_over_per_tick_and_accumulate_run_totals() {
        let mut harness = Harness::new();
        harness.spawn(collector_asset(), Vec3::ZERO, true);
        harness.spawn(collectable_asset("ordinary"), Vec3::new(0.0, 0.0, 0.5), false);
        harness.load();

        harness.idle_ticks(1);
        let last = harness.scene.system_events.last_tick_counts();
        assert_eq!(last.get(GameplayEventKind::ItemCollected), 1);
        assert_eq!(harness.scene.system_events.iter_emitted_so_far().count(), 0);

        harness.idle_ticks(1);
        assert_eq!(harness.scene.system_events.last_tick_counts().total, 0);
        let totals = harness.scene.system_events.run_totals().to_named_map();
        assert_eq!(totals.get("item_collected"), Some(&1));
        assert_eq!(totals.len(), GameplayEventKind::COUNT);
    }

    #[test]
    fn combat_archetype_without_movement_is_rejected() {
        let asset = ConfigurationAssetBuilder::new("test.turret")
            .float("detectionRadius", 5.0)
            .float("attackRange", 1.0)
            .float("damageAmount", 1.0)
            .build();
        let error = EntityBlueprint::from_asset(Arc::new(asset)).expect_err("must fail");
        assert!(matches!(
            error,
            GameplayError::MissingMovementForCombat { ref def_name } if def_name == "test.turret"
        ));
    }

    #[test]
    fn incomplete_sections_degrade_to_inert_behaviors() {
        let asset = ConfigurationAssetBuilder::new("test.partial")
            .capabilities(tags(&[CapabilityTag::Damageable, CapabilityTag::Collectable]))
            .float("maxSpeed", 3.0)
            .float("detectionRadius", 5.0)
            .text("collectableKind", "legendary")
            .build();
        let blueprint = EntityBlueprint::from_asset(Arc::new(asset)).expect("blueprint");
        assert!(blueprint.movement.is_some());
        assert!(blueprint.attack.is_none());
        assert!(blueprint.health.is_none());
        assert!(blueprint.collectable.is_none());
        assert!(!blueprint.capabilities.contains(CapabilityTag::Damageable));
        assert!(!blueprint.capabilities.contains(CapabilityTag::Collectable));
    }

    #[test]
    fn spawn_by_name_reports_unknown_archetypes_and_missing_database() {
        let mut scene = GameplayScene::new("test", Box::new(RecordingAnimationSink::default()));
        let mut world = SimWorld::default();
        assert!(matches!(
            scene.spawn_archetype(&mut world, "test.chest", Vec3::ZERO, false),
            Err(GameplayError::MissingConfigDatabase)
        ));

        world.set_def_database(ConfigDatabase::from_assets(vec![chest_asset()]));
        let chest = scene
            .spawn_archetype(&mut world, "test.chest", Vec3::ZERO, false)
            .expect("known def");
        assert!(scene.components.interactable_by_entity.contains_key(&chest));
        assert!(matches!(
            scene.spawn_archetype(&mut world, "test.dragon", Vec3::ZERO, false),
            Err(GameplayError::UnknownArchetype { .. })
        ));
    }

    #[test]
    fn report_serializes_player_state_and_event_totals() {
        let mut harness = Harness::new();
        let player = harness.spawn(fighter_asset(), Vec3::ZERO, true);
        harness.load();
        harness.idle_ticks(2);

        let report = serde_json::to_value(harness.scene.report(&harness.world)).expect("json");
        assert_eq!(report["scenario"], "test");
        assert_eq!(report["ticks"], 2);
        assert_eq!(report["player"]["entity_id"], player.0);
        assert_eq!(report["player"]["health"], 10.0);
        assert_eq!(report["event_totals"]["entity_died"], 0);
        assert!(harness
            .scene
            .debug_title(&harness.world)
            .expect("title")
            .contains("HP: 10/10"));
    }
