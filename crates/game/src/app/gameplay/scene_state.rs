#[derive(Default)]
struct GameplayComponents {
    movement_by_entity: HashMap<EntityId, MovementIntegrator>,
    damage_by_entity: HashMap<EntityId, DamageReceiver>,
    attack_by_entity: HashMap<EntityId, TargetingAndAttack>,
    collector_by_entity: HashMap<EntityId, CollectionResolver>,
    collectable_by_entity: HashMap<EntityId, CollectableRecord>,
    interactor_by_entity: HashMap<EntityId, Interactor>,
    interactable_by_entity: HashMap<EntityId, InteractionStateMachine>,
    camera: Option<CameraFollow>,
}

impl GameplayComponents {
    fn attach(&mut self, entity_id: EntityId, blueprint: &EntityBlueprint) {
        if let Some(tuning) = blueprint.movement {
            self.movement_by_entity
                .insert(entity_id, MovementIntegrator::new(tuning));
        }
        if let Some(tuning) = blueprint.attack {
            self.attack_by_entity
                .insert(entity_id, TargetingAndAttack::new(tuning));
        }
        if let Some(tuning) = blueprint.health {
            self.damage_by_entity
                .insert(entity_id, DamageReceiver::new(tuning));
        }
        if let Some(tuning) = blueprint.collector {
            self.collector_by_entity
                .insert(entity_id, CollectionResolver::new(tuning));
        }
        if let Some(tuning) = blueprint.collectable {
            self.collectable_by_entity
                .insert(entity_id, CollectableRecord::new(tuning));
        }
        if let Some(tuning) = blueprint.interactor {
            self.interactor_by_entity
                .insert(entity_id, Interactor::new(tuning));
        }
        if let Some(tuning) = blueprint.interactable {
            self.interactable_by_entity
                .insert(entity_id, InteractionStateMachine::new(tuning));
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PlayerReport {
    entity_id: u64,
    position: Vec3,
    yaw_degrees: f32,
    active: bool,
    alive: bool,
    health: Option<f32>,
    max_health: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct GameplayReport {
    scenario: String,
    ticks: u64,
    active_entities: usize,
    player: Option<PlayerReport>,
    camera: Option<CameraPose>,
    event_totals: BTreeMap<&'static str, u32>,
}

pub(crate) struct GameplayScene {
    scenario_name: String,
    player_id: Option<EntityId>,
    pending_camera: Option<CameraTuning>,
    components: GameplayComponents,
    systems_host: GameplaySystemsHost,
    system_events: GameplayEventBus,
    system_intents: GameplayIntentQueue,
    system_order_text: String,
    animation: Box<dyn AnimationSink>,
    stop_requested: bool,
    ticks: u64,
}

impl GameplayScene {
    pub(crate) fn new(scenario_name: impl Into<String>, animation: Box<dyn AnimationSink>) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            player_id: None,
            pending_camera: None,
            components: GameplayComponents::default(),
            systems_host: GameplaySystemsHost::default(),
            system_events: GameplayEventBus::default(),
            system_intents: GameplayIntentQueue::default(),
            system_order_text: String::new(),
            animation,
            stop_requested: false,
            ticks: 0,
        }
    }

    /// Spawns a configured archetype by def name. The entity joins the world
    /// at the next `apply_pending`; its components are attached right away.
    pub(crate) fn spawn_archetype(
        &mut self,
        world: &mut SimWorld,
        def_name: &str,
        position: Vec3,
        is_player: bool,
    ) -> Result<EntityId, GameplayError> {
        let asset = world
            .def_database()
            .ok_or(GameplayError::MissingConfigDatabase)?
            .load_configuration(def_name)
            .ok_or_else(|| GameplayError::UnknownArchetype {
                def_name: def_name.to_string(),
            })?;
        self.spawn_from_asset(world, asset, position, is_player)
    }

    fn spawn_from_asset(
        &mut self,
        world: &mut SimWorld,
        asset: Arc<ConfigurationAsset>,
        position: Vec3,
        is_player: bool,
    ) -> Result<EntityId, GameplayError> {
        let blueprint = EntityBlueprint::from_asset(asset)?;
        let mut capabilities = blueprint.capabilities;
        if is_player {
            capabilities.insert(CapabilityTag::Player);
        }
        let entity_id = world.spawn(
            Transform::at(position),
            capabilities,
            blueprint.asset.def_name(),
        );
        self.components.attach(entity_id, &blueprint);
        if is_player {
            if let Some(previous) = self.player_id.replace(entity_id) {
                warn!(
                    previous = previous.0,
                    current = entity_id.0,
                    "player_replaced"
                );
            }
        }
        debug!(
            entity = entity_id.0,
            def_name = blueprint.asset.def_name(),
            capabilities = %capabilities,
            "archetype_spawned"
        );
        Ok(entity_id)
    }

    /// Reads camera tuning now; the rig is placed behind the player on load.
    pub(crate) fn attach_camera(
        &mut self,
        world: &SimWorld,
        def_name: &str,
    ) -> Result<(), GameplayError> {
        let asset = world
            .def_database()
            .ok_or(GameplayError::MissingConfigDatabase)?
            .load_configuration(def_name)
            .ok_or_else(|| GameplayError::UnknownArchetype {
                def_name: def_name.to_string(),
            })?;
        self.pending_camera = Some(TuningReader::new(&asset).camera());
        Ok(())
    }

    fn run_gameplay_systems_once(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SimWorld,
    ) {
        let mut context = GameplaySystemContext {
            fixed_dt_seconds,
            input,
            world,
            player_id: self.player_id,
            components: &mut self.components,
            events: &mut self.system_events,
            intents: &mut self.system_intents,
            animation: self.animation.as_mut(),
            stop_requested: &mut self.stop_requested,
        };
        self.systems_host.run_once_per_tick(&mut context);
    }

    pub(crate) fn report(&self, world: &SimWorld) -> GameplayReport {
        let player = self.player_id.and_then(|player_id| {
            let entity = world.find_entity(player_id)?;
            let health = self.components.damage_by_entity.get(&player_id);
            Some(PlayerReport {
                entity_id: player_id.0,
                position: entity.transform.position,
                yaw_degrees: entity.transform.yaw_degrees,
                active: entity.active,
                alive: health.map_or(true, Damageable::is_alive),
                health: health.map(|receiver| receiver.health().current()),
                max_health: health.map(|receiver| receiver.health().max()),
            })
        });
        GameplayReport {
            scenario: self.scenario_name.clone(),
            ticks: self.ticks,
            active_entities: world.entities().iter().filter(|entity| entity.active).count(),
            player,
            camera: self.components.camera.as_ref().map(CameraFollow::pose),
            event_totals: self.system_events.run_totals().to_named_map(),
        }
    }
}

impl fmt::Display for GameplayEventCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for kind in GameplayEventKind::ALL {
            let count = self.get(kind);
            if count == 0 {
                continue;
            }
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", kind.name(), count)?;
            first = false;
        }
        if first {
            f.write_str("-")?;
        }
        Ok(())
    }
}
