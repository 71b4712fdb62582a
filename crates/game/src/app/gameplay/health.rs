#[derive(Debug, Clone, Copy, PartialEq)]
struct HealthReport {
    current: f32,
    max: f32,
    died: bool,
}

/// Invariant: `0 <= current <= max`; `dead` flips once and only `reset` clears it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HealthModel {
    current: f32,
    max: f32,
    dead: bool,
}

impl HealthModel {
    fn new(max: f32) -> Self {
        let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };
        Self {
            current: max,
            max,
            dead: false,
        }
    }

    fn take_damage(&mut self, amount: f32) -> Option<HealthReport> {
        if self.dead {
            return None;
        }
        self.current = (self.current - sanitize_amount(amount)).max(0.0);
        let died = self.current <= 0.0 && self.die();
        Some(self.report(died))
    }

    fn heal(&mut self, amount: f32) -> Option<HealthReport> {
        if self.dead {
            return None;
        }
        self.current = (self.current + sanitize_amount(amount)).min(self.max);
        Some(self.report(false))
    }

    /// Only the first call has an effect.
    fn die(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.current = 0.0;
        self.dead = true;
        true
    }

    fn reset(&mut self) {
        self.current = self.max;
        self.dead = false;
    }

    fn report(&self, died: bool) -> HealthReport {
        HealthReport {
            current: self.current,
            max: self.max,
            died,
        }
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn current(&self) -> f32 {
        self.current
    }

    fn max(&self) -> f32 {
        self.max
    }
}

fn sanitize_amount(amount: f32) -> f32 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

trait Damageable {
    fn is_alive(&self) -> bool;
    fn receive_damage(&mut self, amount: f32) -> Option<HealthReport>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleTransition {
    Deactivate,
    Respawned,
}

/// Health plus what dying means for this archetype.
#[derive(Debug, Clone)]
struct DamageReceiver {
    health: HealthModel,
    profile: DamageProfile,
    death_gate: TimerGate,
}

impl DamageReceiver {
    fn new(tuning: HealthTuning) -> Self {
        Self {
            health: HealthModel::new(tuning.max_health),
            profile: tuning.profile,
            death_gate: TimerGate::idle(),
        }
    }

    /// Kills outright. Returns `false` when already dead.
    #[cfg(test)]
    fn die(&mut self) -> bool {
        if !self.health.die() {
            return false;
        }
        self.arm_death_gate();
        true
    }

    /// Dead receivers stay dead until respawn.
    fn heal(&mut self, amount: f32) -> Option<HealthReport> {
        self.health.heal(amount)
    }

    fn arm_death_gate(&mut self) {
        let wait = match self.profile {
            DamageProfile::Character {
                death_wait_seconds, ..
            } => death_wait_seconds,
            DamageProfile::TrainingTarget {
                respawn_delay_seconds,
            } => respawn_delay_seconds,
        };
        self.death_gate.arm(wait);
    }

    fn tick(&mut self, dt: f32) -> Option<LifecycleTransition> {
        if !self.death_gate.tick(dt) {
            return None;
        }
        match self.profile {
            DamageProfile::Character { .. } => Some(LifecycleTransition::Deactivate),
            DamageProfile::TrainingTarget { .. } => {
                self.health.reset();
                Some(LifecycleTransition::Respawned)
            }
        }
    }

    fn stop_duration_on_damage(&self) -> Option<f32> {
        match self.profile {
            DamageProfile::Character {
                stop_duration_on_damage_seconds,
                ..
            } => Some(stop_duration_on_damage_seconds),
            DamageProfile::TrainingTarget { .. } => None,
        }
    }

    fn health(&self) -> &HealthModel {
        &self.health
    }
}

impl Damageable for DamageReceiver {
    fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    fn receive_damage(&mut self, amount: f32) -> Option<HealthReport> {
        let report = self.health.take_damage(amount)?;
        if report.died {
            self.arm_death_gate();
        }
        Some(report)
    }
}
