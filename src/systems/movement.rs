use anyhow::Result;

use crate::{
    components::{Position, Velocity},
    ecs::{Args, ParamDecl, ParamShape, QuerySpec, System},
};

/// Adds each body's velocity to its position once per run.
pub struct MovementSystem;

impl MovementSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MovementSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn params(&self) -> Vec<ParamDecl> {
        vec![ParamDecl::Shape(ParamShape::Query(
            QuerySpec::new().with::<Position>().with::<Velocity>(),
        ))]
    }

    fn run(&mut self, args: &Args<'_>) -> Result<()> {
        for row in args.query(0)? {
            let mut position = row.fetch_mut::<Position>()?;
            let velocity = row.fetch::<Velocity>()?;
            position.x += velocity.x;
            position.y += velocity.y;
        }
        Ok(())
    }
}
