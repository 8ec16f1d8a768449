//! Run command: load, apply operators, save.

use crate::RunArgs;
use anyhow::{bail, Context, Result};
use imgduo_engine::Slot;
use tracing::{info, warn};

/// Applies `args.ops` in order and writes the primary image.
///
/// A rejected or failed operator stops the run unless `--keep-going` is set,
/// in which case it is reported and the next operator runs on the unchanged
/// slots.
pub fn run(args: RunArgs, verbose: bool) -> Result<()> {
    let mut session = super::session(args.mode.into());
    super::load(&mut session, Slot::Primary, &args.primary)?;
    if let Some(path) = &args.secondary {
        super::load(&mut session, Slot::Secondary, path)?;
    }

    let mut failures = 0usize;
    for &op in &args.ops {
        if verbose {
            println!("Applying {op}");
        }
        match session.apply(op) {
            Ok(()) => info!(operator = %op, "applied"),
            Err(err) if args.keep_going => {
                warn!(operator = %op, error = %err, "skipped");
                eprintln!("warning: {err}");
                failures += 1;
            }
            Err(err) => return Err(err).with_context(|| format!("Operator '{op}' did not apply")),
        }
    }

    let primary = session.image(Slot::Primary);
    if primary.is_empty() {
        bail!("Nothing to save: the primary image is empty");
    }
    super::save_image(&args.output, primary, args.quality)?;

    if verbose {
        let (w, h) = primary.dimensions();
        println!("Wrote {} ({w}x{h} {})", args.output.display(), primary.pixel_type());
        if failures > 0 {
            println!("{failures} operator(s) skipped");
        }
    }
    Ok(())
}
