/// Read-only view of the world that combat needs on top of spatial queries.
trait CombatView: SpatialQuery {
    fn is_living(&self, entity_id: EntityId) -> bool;
    fn position_of(&self, entity_id: EntityId) -> Option<Vec3>;
    fn capabilities_of(&self, entity_id: EntityId) -> CapabilitySet;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TargetHandle {
    entity_id: EntityId,
    distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttackPhase {
    Idle,
    DelayedStrike,
    Recovering,
}

#[derive(Debug, Clone, Copy)]
struct AttackerState {
    entity_id: EntityId,
    position: Vec3,
    yaw_degrees: f32,
    speed_fraction: f32,
    alive: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AttackTickOutcome {
    committed: Option<TargetHandle>,
    face_towards: Option<Vec3>,
    struck: Option<Vec<EntityId>>,
    finished: bool,
    aborted: bool,
}

#[derive(Debug, Clone)]
struct TargetingAndAttack {
    tuning: AttackTuning,
    phase: AttackPhase,
    target: Option<TargetHandle>,
    cooldown: TimerGate,
    strike_gate: TimerGate,
    recovery_gate: TimerGate,
}

impl TargetingAndAttack {
    fn new(tuning: AttackTuning) -> Self {
        Self {
            tuning,
            phase: AttackPhase::Idle,
            target: None,
            cooldown: TimerGate::idle(),
            strike_gate: TimerGate::idle(),
            recovery_gate: TimerGate::idle(),
        }
    }

    fn tick(
        &mut self,
        dt: f32,
        attacker: AttackerState,
        view: &dyn CombatView,
    ) -> AttackTickOutcome {
        let mut outcome = AttackTickOutcome::default();
        self.cooldown.tick(dt);

        if !attacker.alive
            || attacker.speed_fraction >= self.tuning.min_movement_speed_for_attack
        {
            outcome.aborted = self.abort();
            return outcome;
        }

        match self.phase {
            AttackPhase::Idle => {
                if self.cooldown.is_active() {
                    return outcome;
                }
                let Some(target) = self.detect(&attacker, view) else {
                    return outcome;
                };
                self.cooldown.arm(self.tuning.attack_interval_seconds);
                self.strike_gate.arm(self.tuning.attack_delay_seconds);
                self.phase = AttackPhase::DelayedStrike;
                self.target = Some(target);
                outcome.committed = Some(target);
                outcome.face_towards = view.position_of(target.entity_id);
            }
            AttackPhase::DelayedStrike => {
                outcome.face_towards = self
                    .target
                    .and_then(|target| view.position_of(target.entity_id));
                if self.strike_gate.tick(dt) {
                    outcome.struck = Some(self.resolve_strike(&attacker, view));
                    self.recovery_gate.arm(self.tuning.attack_duration_seconds);
                    self.phase = AttackPhase::Recovering;
                }
            }
            AttackPhase::Recovering => {
                if self.recovery_gate.tick(dt) {
                    self.phase = AttackPhase::Idle;
                    self.target = None;
                    outcome.finished = true;
                }
            }
        }
        outcome
    }

    /// Nearest living target carrying any of the target tags. Ties keep the
    /// first entity in query order.
    fn detect(&self, attacker: &AttackerState, view: &dyn CombatView) -> Option<TargetHandle> {
        let mut best: Option<TargetHandle> = None;
        for tag in self.tuning.target_capabilities.iter() {
            for candidate in view.query_entities_with_capability(
                tag,
                attacker.position,
                self.tuning.detection_radius,
            ) {
                if candidate == attacker.entity_id || !view.is_living(candidate) {
                    continue;
                }
                let Some(position) = view.position_of(candidate) else {
                    continue;
                };
                let distance = attacker.position.distance(position);
                if best.map_or(true, |current| distance < current.distance) {
                    best = Some(TargetHandle {
                        entity_id: candidate,
                        distance,
                    });
                }
            }
        }
        best
    }

    /// Every living damageable in the strike sphere that carries a target tag.
    fn resolve_strike(&self, attacker: &AttackerState, view: &dyn CombatView) -> Vec<EntityId> {
        let center =
            attacker.position + forward_from_yaw(attacker.yaw_degrees) * self.tuning.attack_offset;
        view.query_entities_with_capability(
            CapabilityTag::Damageable,
            center,
            self.tuning.attack_range,
        )
        .into_iter()
        .filter(|id| {
            *id != attacker.entity_id
                && view.is_living(*id)
                && view
                    .capabilities_of(*id)
                    .intersects(self.tuning.target_capabilities)
        })
        .collect()
    }

    /// Cancels an in-flight sequence. The cooldown keeps running.
    fn abort(&mut self) -> bool {
        let in_flight = self.phase != AttackPhase::Idle;
        self.strike_gate.cancel();
        self.recovery_gate.cancel();
        self.phase = AttackPhase::Idle;
        self.target = None;
        in_flight
    }

    #[cfg(test)]
    fn phase(&self) -> AttackPhase {
        self.phase
    }

    #[cfg(test)]
    fn current_target(&self) -> Option<TargetHandle> {
        self.target
    }

    #[cfg(test)]
    fn any_gate_active(&self) -> bool {
        self.cooldown.is_active() || self.strike_gate.is_active() || self.recovery_gate.is_active()
    }
}
