//! Setup command: convert, seed, verify.

use super::{convert, seed, verify};
use crate::config::PipelineConfig;

pub fn run(
    config: &PipelineConfig,
    skip_convert: bool,
    fresh: bool,
    strict: bool,
    progress: bool,
) -> anyhow::Result<()> {
    eprintln!("Step 1/3: convert");
    if skip_convert {
        eprintln!("  skipped (--skip-convert)");
    } else if config.dump_path().is_file() {
        convert::convert_dump(config, None, None, false, progress)?;
    } else {
        log::warn!(
            "dump {} not found, seeding from existing seed files",
            config.dump_path().display()
        );
    }

    eprintln!();
    eprintln!("Step 2/3: seed");
    seed::run(config, None, fresh, progress)?;

    eprintln!();
    eprintln!("Step 3/3: verify");
    let report = verify::verify_store(config, None, false, true)?;
    if strict && !report.is_healthy() {
        anyhow::bail!(
            "integrity check failed with {} violation(s)",
            report.violations.len()
        );
    }

    eprintln!();
    eprintln!("Setup complete: {}", config.store_path().display());
    Ok(())
}
