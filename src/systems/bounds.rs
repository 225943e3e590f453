use anyhow::Result;

use crate::{
    components::{Bounds, Position},
    ecs::{Args, ParamDecl, System},
};

pub struct BoundsSystem;

impl BoundsSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BoundsSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BoundsSystem {
    fn name(&self) -> &str {
        "bounds"
    }

    fn params(&self) -> Vec<ParamDecl> {
        vec![
            ParamDecl::Text("Option<Res<Bounds>>".into()),
            ParamDecl::Text("Query<Position>".into()),
            ParamDecl::Text("Commands".into()),
        ]
    }

    fn run(&mut self, args: &Args<'_>) -> Result<()> {
        let Some(bounds) = args.optional_resource::<Bounds>(0)? else {
            return Ok(());
        };
        let commands = args.commands(2)?;
        for row in args.query(1)? {
            let position = row.fetch::<Position>()?;
            if !bounds.contains(&position) {
                log::debug!("{} left the playfield", row.entity());
                commands.despawn(row.entity());
            }
        }
        Ok(())
    }
}
