//! Prints the AlertRule CustomResourceDefinition as YAML.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/alertrule.yaml
//! ```

use alertrule_controller::crd::AlertRule;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&AlertRule::crd())?);
    Ok(())
}
