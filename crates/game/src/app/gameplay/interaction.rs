#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InteractionState {
    Idle,
    Interacting,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InteractionTransition {
    Completed { claimant: EntityId },
    Deactivate,
}

/// Idle -> Interacting -> Completed, with a cancel path back to Idle.
/// Completed is terminal.
#[derive(Debug, Clone)]
struct InteractionStateMachine {
    tuning: InteractableTuning,
    state: InteractionState,
    countdown: TimerGate,
    deactivate_gate: TimerGate,
    claimant: Option<EntityId>,
}

impl InteractionStateMachine {
    fn new(tuning: InteractableTuning) -> Self {
        Self {
            tuning,
            state: InteractionState::Idle,
            countdown: TimerGate::idle(),
            deactivate_gate: TimerGate::idle(),
            claimant: None,
        }
    }

    fn start_interaction(&mut self, interactor: EntityId) -> bool {
        if self.state != InteractionState::Idle {
            return false;
        }
        self.state = InteractionState::Interacting;
        self.claimant = Some(interactor);
        self.countdown.arm(self.tuning.interaction_duration_seconds);
        true
    }

    fn cancel_interaction(&mut self, interactor: EntityId) -> bool {
        if self.state != InteractionState::Interacting || self.claimant != Some(interactor) {
            return false;
        }
        self.state = InteractionState::Idle;
        self.claimant = None;
        self.countdown.cancel();
        true
    }

    fn tick(&mut self, dt: f32) -> Option<InteractionTransition> {
        match self.state {
            InteractionState::Idle => None,
            InteractionState::Interacting => {
                if !self.countdown.tick(dt) {
                    return None;
                }
                self.state = InteractionState::Completed;
                self.deactivate_gate.arm(self.tuning.deactivate_delay_seconds);
                let claimant = self.claimant?;
                Some(InteractionTransition::Completed { claimant })
            }
            InteractionState::Completed => self
                .deactivate_gate
                .tick(dt)
                .then_some(InteractionTransition::Deactivate),
        }
    }

    fn state(&self) -> InteractionState {
        self.state
    }

    fn claimant(&self) -> Option<EntityId> {
        self.claimant
    }

    #[cfg(test)]
    fn remaining(&self) -> f32 {
        self.countdown.remaining()
    }
}

#[derive(Debug, Clone)]
struct Interactor {
    tuning: InteractorTuning,
    current: Option<EntityId>,
}

impl Interactor {
    fn new(tuning: InteractorTuning) -> Self {
        Self {
            tuning,
            current: None,
        }
    }
}
