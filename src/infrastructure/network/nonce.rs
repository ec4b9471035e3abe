// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::network::provider::ChainClient;
use alloy::primitives::Address;
use std::sync::Arc;

/// Reads the pending nonce on every call; nothing is cached between submissions.
#[derive(Clone)]
pub struct NonceReader {
    client: Arc<dyn ChainClient>,
}

impl NonceReader {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    pub async fn next_nonce(&self, address: Address) -> Result<u64, AppError> {
        let nonce = self.client.transaction_count(address).await?;
        tracing::debug!(target: "nonce", %address, nonce, "Fetched pending nonce");
        Ok(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::simulated::SimulatedChain;

    #[tokio::test]
    async fn every_read_hits_the_network() {
        let chain = Arc::new(SimulatedChain::default());
        let reader = NonceReader::new(chain.clone());
        let addr = Address::repeat_byte(7);

        assert_eq!(reader.next_nonce(addr).await.unwrap(), 0);
        assert_eq!(reader.next_nonce(addr).await.unwrap(), 0);
        assert_eq!(chain.nonce_queries(), 2);
    }
}
