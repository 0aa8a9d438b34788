use std::fs;

use anyhow::{Context, bail};

use farmstock_farm::{Fixture, run_fixture};
use farmstock_infra::StockSettings;

fn main() -> anyhow::Result<()> {
    farmstock_observability::init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: farmstock <fixture.json>");
    };

    let raw = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let fixture: Fixture =
        serde_json::from_str(&raw).with_context(|| format!("parsing fixture {path}"))?;

    let settings = fixture
        .settings_or_else(StockSettings::from_env)
        .context("loading stock settings")?;

    tracing::info!(fixture = %path, records = fixture.records.len(), "replaying fixture");
    let report = run_fixture(fixture, settings)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
