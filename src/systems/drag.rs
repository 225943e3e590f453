use anyhow::Result;

use crate::{
    components::{PhysicsConstants, Velocity},
    ecs::{Args, ParamDecl, System},
};

/// Bleeds off a fraction of every velocity per run. Does nothing until
/// `PhysicsConstants` is registered.
pub struct DragSystem;

impl DragSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DragSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for DragSystem {
    fn name(&self) -> &str {
        "drag"
    }

    fn params(&self) -> Vec<ParamDecl> {
        vec![
            ParamDecl::Text("Res<PhysicsConstants>".into()),
            ParamDecl::Text("Query<&mut Velocity>".into()),
        ]
    }

    fn run(&mut self, args: &Args<'_>) -> Result<()> {
        let retained = 1.0 - args.resource::<PhysicsConstants>(0)?.air_drag.clamp(0.0, 1.0);
        for row in args.query(1)? {
            let mut velocity = row.fetch_mut::<Velocity>()?;
            velocity.x *= retained;
            velocity.y *= retained;
        }
        Ok(())
    }
}
