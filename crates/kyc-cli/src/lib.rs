use anyhow::Context;
use kyc_core::models::StepId;
use kyc_core::StepFlow;
use serde::Serialize;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Step list, slot states and gate status of a flow, for display.
pub fn progress_report(flow: &StepFlow) -> serde_json::Value {
    let (uploaded, total) = flow.upload_summary();
    let current: StepId = flow.current();
    serde_json::json!({
        "currentStep": current,
        "canProceed": flow.can_proceed(current),
        "readOnly": flow.is_read_only(),
        "steps": flow.step_views(),
        "uploads": flow.uploads(),
        "uploadSummary": format!("{} of {} documents uploaded", uploaded, total),
    })
}
