use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::amount::TokenAmount;
use crate::error::AppResult;
use crate::ledger::{LedgerClient, Receipt};
use crate::report;
use crate::signer::{SenderIdentity, SignerPool};

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Compute budget for a standard transfer call.
    pub gas_limit: u64,
    /// Bounds of the random pause after each confirmed transfer.
    pub pacing_min: Duration,
    pub pacing_max: Duration,
    /// Fixed pause after a failed attempt, letting congestion clear before
    /// the next recipient.
    pub failure_cooldown: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            gas_limit: 210_000,
            pacing_min: Duration::from_millis(3_000),
            pacing_max: Duration::from_millis(7_000),
            failure_cooldown: Duration::from_secs(60),
        }
    }
}

/// Terminal state of one recipient's pass through the loop.
#[derive(Debug)]
pub enum TransferOutcome {
    Succeeded { tx_hash: String },
    Skipped,
    Failed { reason: String },
}

/// Progress accounting for a run. Mutated only by the dispatcher; the final
/// snapshot goes to the reporter. The success-rate denominator is always
/// `total`, the full recipient list length.
#[derive(Debug)]
pub struct DispatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<(String, TransferOutcome)>,
}

impl DispatchResult {
    fn new(total: usize) -> Self {
        Self {
            total,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            outcomes: Vec::with_capacity(total),
        }
    }

    fn record(&mut self, recipient: &str, outcome: TransferOutcome) {
        match outcome {
            TransferOutcome::Succeeded { .. } => self.succeeded += 1,
            TransferOutcome::Skipped => self.skipped += 1,
            TransferOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push((recipient.to_string(), outcome));
    }
}

/// Sequential transfer dispatcher. One in-flight transfer at a time: sequence
/// numbers are assigned per sender, and concurrent submission would race on
/// them for any sender the rotation reuses.
pub struct Dispatcher {
    client: Arc<dyn LedgerClient>,
    signers: SignerPool,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn LedgerClient>, signers: SignerPool, config: DispatchConfig) -> Self {
        Self {
            client,
            signers,
            config,
        }
    }

    /// Processes recipients strictly in list order, one transfer per
    /// recipient. A failed recipient is logged and left behind; re-running
    /// with a filtered list is the retry mechanism.
    pub async fn run(&self, recipients: &[String], amount: &TokenAmount) -> DispatchResult {
        let mut state = DispatchResult::new(recipients.len());

        info!(
            "Sending {} tokens to each of {} recipients from a pool of {} wallets",
            amount,
            recipients.len(),
            self.signers.len()
        );

        for (index, recipient) in recipients.iter().enumerate() {
            if !self.client.is_valid_address(recipient) {
                error!("Address {} is not valid, skipping", recipient);
                state.record(recipient, TransferOutcome::Skipped);
                continue;
            }

            let sender_index = index % self.signers.len();
            let sender = self.signers.sender_for(index);

            info!(
                "[{}/{}] Sending {} tokens from wallet {} to {}",
                state.succeeded + 1,
                state.total,
                amount,
                sender_index,
                recipient
            );

            match self.transfer(sender, recipient, amount).await {
                Ok(receipt) => {
                    match receipt.block_height {
                        Some(height) => info!(
                            "Transfer confirmed in block {}. Tx hash: {}",
                            height, receipt.tx_hash
                        ),
                        None => info!("Transfer confirmed. Tx hash: {}", receipt.tx_hash),
                    }
                    state.record(
                        recipient,
                        TransferOutcome::Succeeded {
                            tx_hash: receipt.tx_hash,
                        },
                    );
                    info!(
                        "Status: {} of {} transfers complete ({:.2}%)",
                        state.succeeded,
                        state.total,
                        report::success_percentage(state.succeeded, state.total)
                    );

                    let delay = self.pacing_delay();
                    info!("Waiting {:.1}s before the next transfer...", delay.as_secs_f64());
                    sleep(delay).await;
                }
                Err(e) => {
                    error!("Failed to send to {} from wallet {}: {}", recipient, sender_index, e);
                    state.record(
                        recipient,
                        TransferOutcome::Failed {
                            reason: e.to_string(),
                        },
                    );
                    warn!(
                        "Cooling down for {}s before the next recipient...",
                        self.config.failure_cooldown.as_secs()
                    );
                    sleep(self.config.failure_cooldown).await;
                }
            }
        }

        state
    }

    async fn transfer(
        &self,
        sender: &SenderIdentity,
        recipient: &str,
        amount: &TokenAmount,
    ) -> AppResult<Receipt> {
        let sequence = self.client.get_sequence_number(sender.address()).await?;
        let fee_rate = self.client.get_fee_rate().await?;
        let tx_hash = self
            .client
            .submit_transfer(
                sender,
                recipient,
                amount.base_units(),
                self.config.gas_limit,
                fee_rate,
                sequence,
            )
            .await?;
        self.client.wait_for_confirmation(&tx_hash).await
    }

    fn pacing_delay(&self) -> Duration {
        let min = self.config.pacing_min.as_millis() as u64;
        let max = self.config.pacing_max.as_millis() as u64;
        if max <= min {
            return self.config.pacing_min;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct Submission {
        sender: String,
        recipient: String,
        amount: u128,
        gas_limit: u64,
        fee_rate: u64,
        sequence: u64,
    }

    #[derive(Default)]
    struct MockLedger {
        sequences: Mutex<HashMap<String, u64>>,
        submissions: Mutex<Vec<Submission>>,
        fail_submit_to: Mutex<HashSet<String>>,
        timeout_confirm: Mutex<HashSet<String>>,
    }

    impl MockLedger {
        fn failing_submit_to(recipient: &str) -> Self {
            let mock = Self::default();
            mock.fail_submit_to.lock().unwrap().insert(recipient.to_string());
            mock
        }

        fn submissions(&self) -> Vec<Submission> {
            self.submissions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LedgerClient for MockLedger {
        async fn get_sequence_number(&self, address: &str) -> AppResult<u64> {
            Ok(*self.sequences.lock().unwrap().entry(address.to_string()).or_insert(0))
        }

        async fn get_fee_rate(&self) -> AppResult<u64> {
            Ok(11)
        }

        async fn submit_transfer(
            &self,
            sender: &SenderIdentity,
            recipient: &str,
            amount: u128,
            gas_limit: u64,
            fee_rate: u64,
            sequence: u64,
        ) -> AppResult<String> {
            self.submissions.lock().unwrap().push(Submission {
                sender: sender.address().to_string(),
                recipient: recipient.to_string(),
                amount,
                gas_limit,
                fee_rate,
                sequence,
            });

            if self.fail_submit_to.lock().unwrap().contains(recipient) {
                return Err(crate::error::LedgerError::Rejected(
                    "node is overloaded".to_string(),
                )
                .into());
            }

            // The submitted transaction now occupies this sequence slot.
            *self
                .sequences
                .lock()
                .unwrap()
                .entry(sender.address().to_string())
                .or_insert(0) += 1;

            let hash = format!("0xtx{}", self.submissions.lock().unwrap().len());
            Ok(hash)
        }

        async fn wait_for_confirmation(&self, tx_hash: &str) -> AppResult<Receipt> {
            if self.timeout_confirm.lock().unwrap().contains(tx_hash) {
                return Err(crate::error::LedgerError::ConfirmationTimeout(60).into());
            }
            Ok(Receipt {
                tx_hash: tx_hash.to_string(),
                block_height: Some(42),
            })
        }
    }

    fn pool(size: usize) -> SignerPool {
        let keys: Vec<String> = (0..size)
            .map(|i| format!("{:02x}", i + 1).repeat(32))
            .collect();
        SignerPool::load(&keys).unwrap()
    }

    fn recipients(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("0x{:064x}", i + 0xd00d)).collect()
    }

    fn no_delays() -> DispatchConfig {
        DispatchConfig {
            gas_limit: 210_000,
            pacing_min: Duration::ZERO,
            pacing_max: Duration::ZERO,
            failure_cooldown: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_round_robin_dispatch_succeeds_for_every_recipient() {
        let client = Arc::new(MockLedger::default());
        let dispatcher = Dispatcher::new(client.clone(), pool(2), no_delays());
        let amount = TokenAmount::parse("10").unwrap();

        let result = dispatcher.run(&recipients(3), &amount).await;

        assert_eq!(result.total, 3);
        assert_eq!(result.succeeded, 3);
        assert_eq!(result.failed, 0);
        assert_eq!(result.skipped, 0);

        let subs = client.submissions();
        assert_eq!(subs.len(), 3);
        // Senders rotate by recipient index: wallet 0, wallet 1, wallet 0.
        assert_eq!(subs[0].sender, subs[2].sender);
        assert_ne!(subs[0].sender, subs[1].sender);
        for sub in &subs {
            assert_eq!(sub.amount, 10 * 10u128.pow(18));
            assert_eq!(sub.gas_limit, 210_000);
            assert_eq!(sub.fee_rate, 11);
        }

        match &result.outcomes[0].1 {
            TransferOutcome::Succeeded { tx_hash } => assert!(tx_hash.starts_with("0xtx")),
            other => panic!("expected a successful outcome, got {:?}", other),
        }

        assert_eq!(
            format!("{:.2}", report::success_percentage(result.succeeded, result.total)),
            "100.00"
        );
    }

    #[tokio::test]
    async fn test_invalid_address_is_skipped_but_still_counts_in_the_denominator() {
        let client = Arc::new(MockLedger::default());
        let dispatcher = Dispatcher::new(client.clone(), pool(2), no_delays());
        let amount = TokenAmount::parse("1").unwrap();

        let mut list = recipients(3);
        list[1] = "not-an-address".to_string();
        let result = dispatcher.run(&list, &amount).await;

        assert_eq!(result.total, 3);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.skipped, 1);

        let subs = client.submissions();
        assert_eq!(subs.len(), 2);
        // Sender assignment follows the list index, so positions 0 and 2 both
        // land on wallet 0 of a two-wallet pool.
        assert_eq!(subs[0].sender, subs[1].sender);

        assert_eq!(
            format!("{:.2}", report::success_percentage(result.succeeded, result.total)),
            "66.67"
        );
    }

    #[tokio::test]
    async fn test_failed_submission_is_not_reattempted() {
        let list = recipients(3);
        let client = Arc::new(MockLedger::failing_submit_to(&list[1]));
        let dispatcher = Dispatcher::new(client.clone(), pool(1), no_delays());
        let amount = TokenAmount::parse("1").unwrap();

        let result = dispatcher.run(&list, &amount).await;

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);

        // Exactly one attempt per recipient, including the failed one.
        let subs = client.submissions();
        assert_eq!(subs.len(), 3);
        for recipient in &list {
            assert_eq!(subs.iter().filter(|s| &s.recipient == recipient).count(), 1);
        }
    }

    #[tokio::test]
    async fn test_confirmation_timeout_fails_only_that_recipient() {
        let client = Arc::new(MockLedger::default());
        // First submission gets hash 0xtx1.
        client.timeout_confirm.lock().unwrap().insert("0xtx1".to_string());
        let dispatcher = Dispatcher::new(client.clone(), pool(1), no_delays());
        let amount = TokenAmount::parse("1").unwrap();

        let result = dispatcher.run(&recipients(2), &amount).await;

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 1);
        match &result.outcomes[0].1 {
            TransferOutcome::Failed { reason } => assert!(reason.contains("timed out")),
            other => panic!("expected a failed outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sequence_numbers_increase_per_sender() {
        let client = Arc::new(MockLedger::default());
        let dispatcher = Dispatcher::new(client.clone(), pool(1), no_delays());
        let amount = TokenAmount::parse("2").unwrap();

        dispatcher.run(&recipients(3), &amount).await;

        let sequences: Vec<u64> = client.submissions().iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }
}
