// Workload registry

mod oltp;

pub use oltp::OltpWorkload;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::bail;

use benchpress_core::application::Workload;

/// Construct the workload named in the configuration.
pub fn create(
    name: &str,
    parameters: &HashMap<String, String>,
) -> anyhow::Result<Arc<dyn Workload>> {
    match name {
        "oltp" => Ok(Arc::new(OltpWorkload::new(parameters))),
        other => bail!("unknown workload '{other}' (available: oltp)"),
    }
}
