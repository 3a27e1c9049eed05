#[derive(Debug, Clone, Copy, PartialEq)]
struct Nest {
    position: Vec2,
}

/// Owns the singleton nest anchor.
#[derive(Debug, Default)]
struct NestEntityManager {
    nest: Option<Nest>,
    render_id: Option<EntityId>,
}

impl NestEntityManager {
    /// Places the nest; a second call keeps the existing one.
    fn create(&mut self, position: Vec2) -> bool {
        if self.nest.is_some() {
            return false;
        }
        self.nest = Some(Nest { position });
        true
    }

    fn position(&self) -> Vec2 {
        self.nest.map(|nest| nest.position).unwrap_or(NEST_POSITION)
    }

    fn clear(&mut self) {
        self.nest = None;
    }

    fn sync_visuals(&mut self, world: &mut SceneWorld, catalog: &ColonyCatalog) {
        let Some(nest) = self.nest else {
            if let Some(render_id) = self.render_id.take() {
                world.despawn(render_id);
            }
            return;
        };
        let visual = EntityVisual {
            layer: RenderLayer::Ground,
            ..EntityVisual::default()
        };
        let transform = Transform::at(nest.position);
        match self.render_id {
            Some(render_id) => {
                world.update_entity(render_id, transform, visual);
            }
            None => {
                self.render_id = Some(world.spawn_with_visual(
                    transform,
                    renderable_for(&catalog.nest, NEST_DEF_NAME),
                    visual,
                ));
            }
        }
    }
}
