#[derive(Debug, Error)]
pub(crate) enum GameplayError {
    #[error("archetype '{def_name}' can attack but has no movement section (maxSpeed)")]
    MissingMovementForCombat { def_name: String },
    #[error("unknown archetype '{def_name}'")]
    UnknownArchetype { def_name: String },
    #[error("no configuration database attached to the world")]
    MissingConfigDatabase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MovementTuning {
    max_speed: f32,
    acceleration: f32,
    rotation_threshold: f32,
    rotation_speed_degrees: f32,
    gravity: f32,
    ground_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AttackTuning {
    detection_radius: f32,
    attack_range: f32,
    damage_amount: f32,
    attack_delay_seconds: f32,
    attack_duration_seconds: f32,
    attack_offset: f32,
    attack_interval_seconds: f32,
    min_movement_speed_for_attack: f32,
    face_target_speed: f32,
    target_capabilities: CapabilitySet,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DamageProfile {
    Character {
        stop_duration_on_damage_seconds: f32,
        death_wait_seconds: f32,
    },
    TrainingTarget {
        respawn_delay_seconds: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HealthTuning {
    max_health: f32,
    profile: DamageProfile,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CollectorTuning {
    collect_radius: f32,
    stop_movement_on_special_collect: bool,
    stop_duration_on_special_collect_seconds: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CollectableTuning {
    kind: CollectableKind,
    value: f32,
    heal_amount: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct InteractorTuning {
    interaction_radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct InteractableTuning {
    interaction_duration_seconds: f32,
    deactivate_delay_seconds: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CameraTuning {
    default_fov: f32,
    max_fov: f32,
    zoom_speed: f32,
    smooth_speed: f32,
    offset: Vec3,
}

/// Everything a spawn needs, read once from the shared asset.
#[derive(Debug, Clone)]
struct EntityBlueprint {
    asset: Arc<ConfigurationAsset>,
    capabilities: CapabilitySet,
    movement: Option<MovementTuning>,
    attack: Option<AttackTuning>,
    health: Option<HealthTuning>,
    collector: Option<CollectorTuning>,
    collectable: Option<CollectableTuning>,
    interactor: Option<InteractorTuning>,
    interactable: Option<InteractableTuning>,
}

impl EntityBlueprint {
    fn from_asset(asset: Arc<ConfigurationAsset>) -> Result<Self, GameplayError> {
        let reader = TuningReader::new(&asset);
        let mut capabilities = asset.capabilities();

        let movement = reader.movement();
        let attack = reader.attack();
        if attack.is_some() && movement.is_none() {
            return Err(GameplayError::MissingMovementForCombat {
                def_name: asset.def_name().to_string(),
            });
        }

        let health = reader.health();
        if capabilities.contains(CapabilityTag::Damageable) && health.is_none() {
            warn!(
                def_name = asset.def_name(),
                "damageable_without_health; capability dropped"
            );
            capabilities.remove(CapabilityTag::Damageable);
        }

        let collectable = if capabilities.contains(CapabilityTag::Collectable) {
            let parsed = reader.collectable();
            if parsed.is_none() {
                capabilities.remove(CapabilityTag::Collectable);
            }
            parsed
        } else {
            None
        };

        let interactable = capabilities
            .contains(CapabilityTag::Interactable)
            .then(|| reader.interactable());

        Ok(Self {
            capabilities,
            movement,
            attack,
            health,
            collector: reader.collector(),
            collectable,
            interactor: reader.interactor(),
            interactable,
            asset,
        })
    }
}

/// Typed access to optional tuning keys with fallbacks and diagnostics.
struct TuningReader<'a> {
    asset: &'a ConfigurationAsset,
}

impl<'a> TuningReader<'a> {
    fn new(asset: &'a ConfigurationAsset) -> Self {
        Self { asset }
    }

    fn float_or(&self, key: &str, default: f32) -> f32 {
        self.non_negative(key).unwrap_or(default)
    }

    fn non_negative(&self, key: &str) -> Option<f32> {
        let value = self.asset.float(key)?;
        if value < 0.0 {
            warn!(
                def_name = self.asset.def_name(),
                key, value, "negative_tuning_value; using default"
            );
            return None;
        }
        Some(value)
    }

    /// Reads a group of keys that must be present together. Returns `None`
    /// (with a warning when the group is only partly present) if any is missing.
    fn required_group<const N: usize>(&self, section: &str, keys: [&str; N]) -> Option<[f32; N]> {
        let values = keys.map(|key| self.non_negative(key));
        let present = values.iter().filter(|value| value.is_some()).count();
        if present == N {
            return Some(values.map(|value| value.unwrap_or_default()));
        }
        if present > 0 {
            let missing = keys
                .iter()
                .zip(values.iter())
                .filter(|(_, value)| value.is_none())
                .map(|(key, _)| *key)
                .collect::<Vec<_>>()
                .join(", ");
            warn!(
                def_name = self.asset.def_name(),
                section, missing = %missing, "incomplete_tuning_section; behavior disabled"
            );
        }
        None
    }

    fn movement(&self) -> Option<MovementTuning> {
        let [max_speed] = self.required_group("movement", ["maxSpeed"])?;
        Some(MovementTuning {
            max_speed,
            acceleration: self.float_or("acceleration", DEFAULT_ACCELERATION),
            rotation_threshold: self.float_or("rotationThreshold", DEFAULT_ROTATION_THRESHOLD),
            rotation_speed_degrees: self.float_or("rotationSpeed", DEFAULT_ROTATION_SPEED_DEGREES),
            gravity: self.asset.float("gravity").unwrap_or(DEFAULT_GRAVITY),
            ground_height: self
                .asset
                .float("groundHeight")
                .unwrap_or(DEFAULT_GROUND_HEIGHT),
        })
    }

    fn attack(&self) -> Option<AttackTuning> {
        let [detection_radius, attack_range, damage_amount] = self.required_group(
            "attack",
            ["detectionRadius", "attackRange", "damageAmount"],
        )?;
        Some(AttackTuning {
            detection_radius,
            attack_range,
            damage_amount,
            attack_delay_seconds: self.float_or("attackDelay", DEFAULT_ATTACK_DELAY_SECONDS),
            attack_duration_seconds: self
                .float_or("attackDuration", DEFAULT_ATTACK_DURATION_SECONDS),
            attack_offset: self.float_or("attackOffset", DEFAULT_ATTACK_OFFSET),
            attack_interval_seconds: self
                .float_or("attackInterval", DEFAULT_ATTACK_INTERVAL_SECONDS),
            min_movement_speed_for_attack: self.float_or(
                "minimumMovementSpeedForAttack",
                DEFAULT_MIN_MOVEMENT_SPEED_FOR_ATTACK,
            ),
            face_target_speed: self.float_or(
                "rotationSpeedForFaceToNearestTarget",
                DEFAULT_FACE_TARGET_SPEED,
            ),
            target_capabilities: self
                .asset
                .mask("targetCapabilities")
                .filter(|mask| !mask.is_empty())
                .unwrap_or_else(|| CapabilitySet::from_tags(&[CapabilityTag::Damageable])),
        })
    }

    fn health(&self) -> Option<HealthTuning> {
        let [max_health] = self.required_group("health", ["maxHealth"])?;
        if max_health <= 0.0 {
            warn!(
                def_name = self.asset.def_name(),
                max_health, "non_positive_max_health; health disabled"
            );
            return None;
        }
        let profile = match self.non_negative("respawnDelay") {
            Some(respawn_delay_seconds) => DamageProfile::TrainingTarget {
                respawn_delay_seconds,
            },
            None => DamageProfile::Character {
                stop_duration_on_damage_seconds: self.float_or(
                    "stopDurationOnDamage",
                    DEFAULT_STOP_DURATION_ON_DAMAGE_SECONDS,
                ),
                death_wait_seconds: self.float_or("deathWaitTime", DEFAULT_DEATH_WAIT_SECONDS),
            },
        };
        Some(HealthTuning {
            max_health,
            profile,
        })
    }

    fn collector(&self) -> Option<CollectorTuning> {
        let [collect_radius] = self.required_group("collector", ["collectRadius"])?;
        Some(CollectorTuning {
            collect_radius,
            stop_movement_on_special_collect: self
                .asset
                .flag("stopMovementOnSpecialCollect")
                .unwrap_or(true),
            stop_duration_on_special_collect_seconds: self.float_or(
                "stopDurationOnSpecialCollect",
                DEFAULT_STOP_DURATION_ON_SPECIAL_COLLECT_SECONDS,
            ),
        })
    }

    fn collectable(&self) -> Option<CollectableTuning> {
        let kind = match self.asset.text("collectableKind") {
            None => CollectableKind::Ordinary,
            Some(raw) => match CollectableKind::parse(raw) {
                Some(kind) => kind,
                None => {
                    warn!(
                        def_name = self.asset.def_name(),
                        value = raw,
                        "invalid_collectable_kind; capability dropped"
                    );
                    return None;
                }
            },
        };
        Some(CollectableTuning {
            kind,
            value: self.float_or("collectableValue", DEFAULT_COLLECTABLE_VALUE),
            heal_amount: self.float_or("healAmount", 0.0).max(0.0),
        })
    }

    fn interactor(&self) -> Option<InteractorTuning> {
        let [interaction_radius] = self.required_group("interactor", ["interactionRadius"])?;
        Some(InteractorTuning { interaction_radius })
    }

    fn interactable(&self) -> InteractableTuning {
        InteractableTuning {
            interaction_duration_seconds: self.float_or(
                "interactionDuration",
                DEFAULT_INTERACTION_DURATION_SECONDS,
            ),
            deactivate_delay_seconds: self
                .float_or("deactivateDelay", DEFAULT_DEACTIVATE_DELAY_SECONDS),
        }
    }

    fn camera(&self) -> CameraTuning {
        let default_fov = self.float_or("defaultFov", DEFAULT_CAMERA_FOV);
        CameraTuning {
            default_fov,
            max_fov: self.float_or("maxFov", DEFAULT_CAMERA_MAX_FOV.max(default_fov)),
            zoom_speed: self.float_or("zoomSpeed", DEFAULT_CAMERA_ZOOM_SPEED),
            smooth_speed: self.float_or("smoothSpeed", DEFAULT_CAMERA_SMOOTH_SPEED),
            offset: Vec3 {
                x: self.asset.float("offsetX").unwrap_or(DEFAULT_CAMERA_OFFSET.x),
                y: self.asset.float("offsetY").unwrap_or(DEFAULT_CAMERA_OFFSET.y),
                z: self.asset.float("offsetZ").unwrap_or(DEFAULT_CAMERA_OFFSET.z),
            },
        }
    }
}
