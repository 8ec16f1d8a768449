//! Operator listing command.

use crate::OpsArgs;
use anyhow::Result;
use imgduo_engine::{Operator, Slot};
use imgduo_io::ColorMode;

/// Loads the given images and prints every operator with its enablement.
pub fn run(args: OpsArgs) -> Result<()> {
    let mut session = super::session(ColorMode::Color);
    if let Some(path) = &args.primary {
        super::load(&mut session, Slot::Primary, path)?;
    }
    if let Some(path) = &args.secondary {
        super::load(&mut session, Slot::Secondary, path)?;
    }

    let enabled = session.enablement();
    for op in Operator::ALL {
        let state = if enabled.is_enabled(op) { "enabled" } else { "disabled" };
        let needs = if op.is_dual() { "both images" } else { "primary image" };
        println!("  {:<18} {:<9} needs {}", op.name(), state, needs);
    }
    for slot in Slot::ALL {
        if !session.store().is_valid(slot) {
            println!("  ({})", slot.placeholder());
        }
    }
    Ok(())
}
