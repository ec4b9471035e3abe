// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::parse_hex_payload;
use crate::domain::constants::DEPLOY_GAS_LIMIT;
use crate::services::account::AccountContext;
use crate::services::execution::builder::{ActionDescriptor, GasLimit};
use crate::services::execution::scheduler::WorkflowFactory;
use crate::services::execution::sequencer::{AmountSource, StepContext, Workflow, WorkflowStep};
use alloy::primitives::{Bytes, hex};
use std::fs;
use std::path::Path;

/// Init code for a contract whose runtime returns the word `42`.
pub const BUILTIN_INIT_CODE: [u8; 22] =
    hex!("600a600c600039600a6000f3602a60005260206000f3");

pub fn load_init_code(path: &Path) -> Result<Bytes, AppError> {
    let body = fs::read_to_string(path).map_err(|e| AppError::ConfigurationMissing {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let code = parse_hex_payload(&body).ok_or_else(|| {
        AppError::Config(format!("{} does not contain hex bytecode", path.display()))
    })?;
    if code.is_empty() {
        return Err(AppError::ConfigurationMissing {
            path: path.display().to_string(),
            reason: "bytecode file is empty".into(),
        });
    }
    Ok(code)
}

pub fn deploy(init_code: Bytes) -> ActionDescriptor {
    ActionDescriptor::create(
        "deploy contract",
        init_code,
        GasLimit::Estimate {
            buffer_bps: 2_000,
            fallback: DEPLOY_GAS_LIMIT,
        },
    )
}

pub struct Deploy {
    init_code: Bytes,
}

impl Deploy {
    pub fn new(init_code: Option<Bytes>) -> Self {
        Self {
            init_code: init_code.unwrap_or_else(|| Bytes::from_static(&BUILTIN_INIT_CODE)),
        }
    }
}

impl WorkflowFactory for Deploy {
    fn name(&self) -> &str {
        "deploy"
    }

    fn build(&self, _account: &AccountContext, _cycle: u32) -> Result<Workflow, AppError> {
        let code = self.init_code.clone();
        Ok(Workflow::new("deploy").step(WorkflowStep::call(
            "deploy",
            AmountSource::None,
            move |_ctx: &StepContext<'_>| Ok(deploy(code.clone())),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::TxKind;
    use std::io::Write;

    #[test]
    fn loads_hex_file_with_whitespace() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "0x6080\n6040").unwrap();
        assert_eq!(load_init_code(f.path()).unwrap().as_ref(), &[0x60, 0x80, 0x60, 0x40]);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "solidity source").unwrap();
        assert!(matches!(load_init_code(bad.path()), Err(AppError::Config(_))));
    }

    #[test]
    fn deploy_is_a_create_with_estimated_gas() {
        let d = deploy(Bytes::from_static(&BUILTIN_INIT_CODE));
        assert_eq!(d.target, TxKind::Create);
        assert!(matches!(d.gas, GasLimit::Estimate { fallback: DEPLOY_GAS_LIMIT, .. }));
    }
}
