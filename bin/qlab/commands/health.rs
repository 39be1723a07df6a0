//! Health command

use crate::style::*;
use anyhow::Result;
use quantum_lab::{HttpGateway, LabConfig};

pub async fn run(config: &LabConfig) -> Result<()> {
    let gateway = HttpGateway::new(&config.api)?;
    print_header("Service Health");
    print_key_value("URL", gateway.base_url());

    match gateway.health().await {
        Ok(health) => {
            print_success(&format!("Status: {}", health.status));
            if health.using_mock {
                print_warning("Service is running its mock quantum backend");
            }
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Unreachable: {}", e));
            Err(e.into())
        }
    }
}
