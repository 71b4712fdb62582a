impl Simulation for GameplayScene {
    fn load(&mut self, world: &mut SimWorld) {
        self.system_order_text = GAMEPLAY_SYSTEM_ORDER_TEXT.to_string();
        self.stop_requested = false;
        self.ticks = 0;
        world.apply_pending();

        if let Some(tuning) = self.pending_camera.take() {
            let initial_target = self
                .player_id
                .and_then(|player_id| world.position_of(player_id))
                .unwrap_or(Vec3::ZERO);
            self.components.camera = Some(CameraFollow::new(tuning, initial_target));
        }

        info!(
            scenario = %self.scenario_name,
            entity_count = world.entity_count(),
            player = ?self.player_id.map(|id| id.0),
            sys = %self.system_order_text,
            "scene_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SimWorld,
    ) -> SimCommand {
        self.run_gameplay_systems_once(fixed_dt_seconds, input, world);
        self.ticks = self.ticks.saturating_add(1);

        let counts = self.system_events.last_tick_counts();
        if counts.total > 0 {
            debug!(
                tick = self.ticks,
                events = %counts,
                intents = ?self.system_intents.last_tick_apply_stats(),
                "gameplay_tick"
            );
        }

        if self.stop_requested {
            info!(scenario = %self.scenario_name, tick = self.ticks, "player_deactivated");
            return SimCommand::Stop;
        }
        SimCommand::Continue
    }

    fn unload(&mut self, world: &mut SimWorld) {
        info!(
            scenario = %self.scenario_name,
            ticks = self.ticks,
            events = %self.system_events.run_totals(),
            active_entities = world.entities().iter().filter(|entity| entity.active).count(),
            "scene_unloaded"
        );
    }

    fn debug_title(&self, world: &SimWorld) -> Option<String> {
        let health = self
            .player_id
            .and_then(|player_id| self.components.damage_by_entity.get(&player_id))
            .map(|receiver| format!("{:.0}/{:.0}", receiver.health().current(), receiver.health().max()))
            .unwrap_or_else(|| "-".to_string());
        Some(format!(
            "{} | Entities: {} | HP: {} | {}",
            self.scenario_name,
            world.entity_count(),
            health,
            self.system_order_text
        ))
    }
}
