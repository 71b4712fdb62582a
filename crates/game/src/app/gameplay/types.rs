#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CollectableKind {
    Ordinary,
    Special,
}

impl CollectableKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ordinary" => Some(Self::Ordinary),
            "special" => Some(Self::Special),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GameplayEvent {
    HealthChanged {
        entity_id: EntityId,
        current: f32,
        max: f32,
    },
    EntityDied {
        entity_id: EntityId,
    },
    EntityRespawned {
        entity_id: EntityId,
    },
    EntityDeactivated {
        entity_id: EntityId,
    },
    MovementPaused {
        entity_id: EntityId,
        seconds: f32,
    },
    AttackCommitted {
        attacker_id: EntityId,
        target_id: EntityId,
        distance: f32,
    },
    StrikeResolved {
        attacker_id: EntityId,
        struck_count: u32,
    },
    AttackAborted {
        attacker_id: EntityId,
    },
    ItemCollected {
        collector_id: EntityId,
        item_id: EntityId,
        kind: CollectableKind,
        value: f32,
    },
    SpecialCollected {
        collector_id: EntityId,
        item_id: EntityId,
    },
    InteractionStarted {
        interactor_id: EntityId,
        target_id: EntityId,
    },
    InteractionCancelled {
        interactor_id: EntityId,
        target_id: EntityId,
    },
    InteractionCompleted {
        interactor_id: EntityId,
        target_id: EntityId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameplayEventKind {
    HealthChanged,
    EntityDied,
    EntityRespawned,
    EntityDeactivated,
    MovementPaused,
    AttackCommitted,
    StrikeResolved,
    AttackAborted,
    ItemCollected,
    SpecialCollected,
    InteractionStarted,
    InteractionCancelled,
    InteractionCompleted,
}

impl GameplayEventKind {
    const COUNT: usize = 13;

    const ALL: [GameplayEventKind; Self::COUNT] = [
        Self::HealthChanged,
        Self::EntityDied,
        Self::EntityRespawned,
        Self::EntityDeactivated,
        Self::MovementPaused,
        Self::AttackCommitted,
        Self::StrikeResolved,
        Self::AttackAborted,
        Self::ItemCollected,
        Self::SpecialCollected,
        Self::InteractionStarted,
        Self::InteractionCancelled,
        Self::InteractionCompleted,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    const fn name(self) -> &'static str {
        match self {
            Self::HealthChanged => "health_changed",
            Self::EntityDied => "entity_died",
            Self::EntityRespawned => "entity_respawned",
            Self::EntityDeactivated => "entity_deactivated",
            Self::MovementPaused => "movement_paused",
            Self::AttackCommitted => "attack_committed",
            Self::StrikeResolved => "strike_resolved",
            Self::AttackAborted => "attack_aborted",
            Self::ItemCollected => "item_collected",
            Self::SpecialCollected => "special_collected",
            Self::InteractionStarted => "interaction_started",
            Self::InteractionCancelled => "interaction_cancelled",
            Self::InteractionCompleted => "interaction_completed",
        }
    }
}

impl GameplayEvent {
    fn kind(self) -> GameplayEventKind {
        match self {
            Self::HealthChanged { .. } => GameplayEventKind::HealthChanged,
            Self::EntityDied { .. } => GameplayEventKind::EntityDied,
            Self::EntityRespawned { .. } => GameplayEventKind::EntityRespawned,
            Self::EntityDeactivated { .. } => GameplayEventKind::EntityDeactivated,
            Self::MovementPaused { .. } => GameplayEventKind::MovementPaused,
            Self::AttackCommitted { .. } => GameplayEventKind::AttackCommitted,
            Self::StrikeResolved { .. } => GameplayEventKind::StrikeResolved,
            Self::AttackAborted { .. } => GameplayEventKind::AttackAborted,
            Self::ItemCollected { .. } => GameplayEventKind::ItemCollected,
            Self::SpecialCollected { .. } => GameplayEventKind::SpecialCollected,
            Self::InteractionStarted { .. } => GameplayEventKind::InteractionStarted,
            Self::InteractionCancelled { .. } => GameplayEventKind::InteractionCancelled,
            Self::InteractionCompleted { .. } => GameplayEventKind::InteractionCompleted,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GameplayEventCounts {
    total: u32,
    by_kind: [u32; GameplayEventKind::COUNT],
}

impl GameplayEventCounts {
    fn record(&mut self, kind: GameplayEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = &mut self.by_kind[kind.index()];
        *slot = slot.saturating_add(1);
    }

    fn get(&self, kind: GameplayEventKind) -> u32 {
        self.by_kind[kind.index()]
    }

    fn add(&mut self, other: &GameplayEventCounts) {
        self.total = self.total.saturating_add(other.total);
        for kind in GameplayEventKind::ALL {
            let slot = &mut self.by_kind[kind.index()];
            *slot = slot.saturating_add(other.get(kind));
        }
    }

    fn to_named_map(self) -> BTreeMap<&'static str, u32> {
        GameplayEventKind::ALL
            .into_iter()
            .map(|kind| (kind.name(), self.get(kind)))
            .collect()
    }
}

type GameplayEventSubscriber = Box<dyn FnMut(&GameplayEvent)>;

/// Events are handed to subscribers synchronously at emission and kept until
/// the tick rolls over so later systems in the same tick can read them.
#[derive(Default)]
struct GameplayEventBus {
    subscribers: Vec<GameplayEventSubscriber>,
    current_tick_events: Vec<GameplayEvent>,
    last_tick_counts: GameplayEventCounts,
    run_totals: GameplayEventCounts,
}

impl GameplayEventBus {
    fn subscribe(&mut self, subscriber: impl FnMut(&GameplayEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn emit(&mut self, event: GameplayEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
        self.current_tick_events.push(event);
    }

    fn iter_emitted_so_far(&self) -> impl Iterator<Item = &GameplayEvent> {
        self.current_tick_events.iter()
    }

    fn finish_tick_rollover(&mut self) {
        let mut counts = GameplayEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.run_totals.add(&counts);
        self.last_tick_counts = counts;
        self.current_tick_events.clear();
    }

    fn last_tick_counts(&self) -> GameplayEventCounts {
        self.last_tick_counts
    }

    fn run_totals(&self) -> GameplayEventCounts {
        self.run_totals
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GameplayIntent {
    ApplyDamage {
        source_id: EntityId,
        target_id: EntityId,
        amount: f32,
    },
    PauseMovement {
        entity_id: EntityId,
        seconds: f32,
    },
    Deactivate {
        entity_id: EntityId,
    },
    Heal {
        entity_id: EntityId,
        amount: f32,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GameplayIntentApplyStats {
    total: u32,
    apply_damage: u32,
    pause_movement: u32,
    deactivate: u32,
    heal: u32,
    invalid_target_count: u32,
}

impl GameplayIntentApplyStats {
    fn record_intent(&mut self, intent: &GameplayIntent) {
        self.total = self.total.saturating_add(1);
        match intent {
            GameplayIntent::ApplyDamage { .. } => {
                self.apply_damage = self.apply_damage.saturating_add(1)
            }
            GameplayIntent::PauseMovement { .. } => {
                self.pause_movement = self.pause_movement.saturating_add(1)
            }
            GameplayIntent::Deactivate { .. } => self.deactivate = self.deactivate.saturating_add(1),
            GameplayIntent::Heal { .. } => self.heal = self.heal.saturating_add(1),
        }
    }

    fn record_invalid_target(&mut self) {
        self.invalid_target_count = self.invalid_target_count.saturating_add(1);
    }

    fn merge(&mut self, other: GameplayIntentApplyStats) {
        self.total = self.total.saturating_add(other.total);
        self.apply_damage = self.apply_damage.saturating_add(other.apply_damage);
        self.pause_movement = self.pause_movement.saturating_add(other.pause_movement);
        self.deactivate = self.deactivate.saturating_add(other.deactivate);
        self.heal = self.heal.saturating_add(other.heal);
        self.invalid_target_count = self
            .invalid_target_count
            .saturating_add(other.invalid_target_count);
    }
}

#[derive(Default)]
struct GameplayIntentQueue {
    intents: Vec<GameplayIntent>,
    last_tick_apply_stats: GameplayIntentApplyStats,
}

impl GameplayIntentQueue {
    fn enqueue(&mut self, intent: GameplayIntent) {
        self.intents.push(intent);
    }

    fn drain_current_tick(&mut self) -> Vec<GameplayIntent> {
        std::mem::take(&mut self.intents)
    }

    fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    fn set_last_tick_apply_stats(&mut self, stats: GameplayIntentApplyStats) {
        self.last_tick_apply_stats = stats;
    }

    fn last_tick_apply_stats(&self) -> GameplayIntentApplyStats {
        self.last_tick_apply_stats
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameplaySystemId {
    InputIntent,
    Movement,
    Targeting,
    CombatResolution,
    Collection,
    Interaction,
    Lifecycle,
    Camera,
    Cleanup,
}

impl GameplaySystemId {
    fn name(self) -> &'static str {
        match self {
            Self::InputIntent => "InputIntent",
            Self::Movement => "Movement",
            Self::Targeting => "Targeting",
            Self::CombatResolution => "CombatResolution",
            Self::Collection => "Collection",
            Self::Interaction => "Interaction",
            Self::Lifecycle => "Lifecycle",
            Self::Camera => "Camera",
            Self::Cleanup => "Cleanup",
        }
    }
}

const GAMEPLAY_SYSTEM_ORDER: [GameplaySystemId; 9] = [
    GameplaySystemId::InputIntent,
    GameplaySystemId::Movement,
    GameplaySystemId::Targeting,
    GameplaySystemId::CombatResolution,
    GameplaySystemId::Collection,
    GameplaySystemId::Interaction,
    GameplaySystemId::Lifecycle,
    GameplaySystemId::Camera,
    GameplaySystemId::Cleanup,
];

/// Fire-and-forget presentation cues. Nothing is awaited or read back.
pub(crate) trait AnimationSink {
    fn play_hurt(&mut self, entity_id: EntityId);
    fn play_dead(&mut self, entity_id: EntityId);
    fn play_attack(&mut self, entity_id: EntityId);
    fn play_win(&mut self, entity_id: EntityId);
    fn stop_attack(&mut self, _entity_id: EntityId) {}
    fn set_speed(&mut self, entity_id: EntityId, speed_fraction: f32);
}

/// Writes every cue to the log. Used by the binary, which has no renderer.
#[derive(Debug, Default)]
pub(crate) struct TracingAnimationSink;

impl AnimationSink for TracingAnimationSink {
    fn play_hurt(&mut self, entity_id: EntityId) {
        debug!(entity = entity_id.0, cue = "hurt", "animation_cue");
    }

    fn play_dead(&mut self, entity_id: EntityId) {
        debug!(entity = entity_id.0, cue = "dead", "animation_cue");
    }

    fn play_attack(&mut self, entity_id: EntityId) {
        debug!(entity = entity_id.0, cue = "attack", "animation_cue");
    }

    fn play_win(&mut self, entity_id: EntityId) {
        info!(entity = entity_id.0, cue = "win", "animation_cue");
    }

    fn stop_attack(&mut self, entity_id: EntityId) {
        debug!(entity = entity_id.0, cue = "stop_attack", "animation_cue");
    }

    fn set_speed(&mut self, entity_id: EntityId, speed_fraction: f32) {
        trace!(entity = entity_id.0, speed_fraction, "animation_speed");
    }
}
