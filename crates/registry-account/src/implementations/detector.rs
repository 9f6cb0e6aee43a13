//! Wallet detection from configuration.

use crate::implementations::local::LocalWallet;
use crate::implementations::rpc::RpcWallet;
use crate::{WalletDetector, WalletInterface};
use async_trait::async_trait;
use registry_config::WalletConfig;
use std::time::Duration;

/// Detects the wallet described in the `[wallet]` configuration section.
///
/// No section means no wallet. A configured wallet that cannot be built or
/// reached is treated the same way: detection never fails, it only finds
/// nothing.
pub struct ConfiguredWalletDetector {
	config: Option<WalletConfig>,
	poll_interval: Duration,
}

impl ConfiguredWalletDetector {
	pub fn new(config: Option<WalletConfig>, poll_interval: Duration) -> Self {
		Self {
			config,
			poll_interval,
		}
	}
}

#[async_trait]
impl WalletDetector for ConfiguredWalletDetector {
	async fn detect(&self) -> Option<Box<dyn WalletInterface>> {
		match self.config.as_ref()? {
			WalletConfig::Local { private_key } => {
				match LocalWallet::new(private_key, self.poll_interval) {
					Ok(wallet) => Some(Box::new(wallet)),
					Err(e) => {
						tracing::warn!("Ignoring local wallet: {}", e);
						None
					}
				}
			}
			WalletConfig::Rpc { url } => {
				let wallet = match RpcWallet::new(url, self.poll_interval) {
					Ok(wallet) => wallet,
					Err(e) => {
						tracing::warn!("Ignoring wallet endpoint: {}", e);
						return None;
					}
				};
				if wallet.is_reachable().await {
					Some(Box::new(wallet))
				} else {
					None
				}
			}
		}
	}
}
