//! Async orchestration around the [`ActionController`].
//!
//! [`DepositDapp`] owns the wallet session, the contract service, the balance
//! cache and the controller. Each user action takes the controller's single
//! slot, submits through the contract service, waits for the receipt and then
//! applies the resolution. The controller lock is never held across an
//! `.await`.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::{Address, TxHash};
use tokio_util::sync::CancellationToken;

use crate::common::error::{DappError, Result};
use crate::common::logging::{self, LogLevel};
use crate::config::{Connector, DappConfig};
use crate::contract::ContractDescriptor;
use crate::core::controller::ActionController;
use crate::core::view::PageView;
use crate::rpc::{JsonRpcWallet, RpcContractService};
use crate::session::{SessionRecord, SessionStore};
use crate::sources::{BlockSource, IntervalSource, WebSocketSource};
use crate::types::action::{AbiValue, ActionKind, Resolution};
use crate::types::balance::BalanceSnapshot;
use crate::types::traits::{ContractCallService, WalletSessionProvider};

const WS_RECONNECT_DELAY_SECS: u64 = 2;

/// The deposit dapp: wallet session, balances and the action lifecycle.
pub struct DepositDapp {
    config: DappConfig,
    wallet: Arc<dyn WalletSessionProvider>,
    contract: Arc<dyn ContractCallService>,
    controller: Mutex<ActionController>,
    balances: Mutex<BalanceSnapshot>,
    session_store: Option<SessionStore>,
    shutdown: CancellationToken,
}

impl DepositDapp {
    /// Wires the dapp to arbitrary collaborators.
    pub fn new(
        config: DappConfig,
        wallet: Arc<dyn WalletSessionProvider>,
        contract: Arc<dyn ContractCallService>,
    ) -> Self {
        let session_store = config.session_file.clone().map(SessionStore::new);
        Self {
            config,
            wallet,
            contract,
            controller: Mutex::new(ActionController::new()),
            balances: Mutex::new(BalanceSnapshot::default()),
            session_store,
            shutdown: CancellationToken::new(),
        }
    }

    /// Builds the JSON-RPC wallet and contract service from `config`.
    pub fn from_config(config: DappConfig) -> Result<Self> {
        let descriptor = ContractDescriptor::deposit_contract(config.contract_address)?;
        let wallet = Arc::new(JsonRpcWallet::new(config.chain_id));
        let service = RpcContractService::new(config.rpc_url.clone(), descriptor, wallet.clone())?;
        Ok(Self::new(config, wallet, Arc::new(service)))
    }

    #[must_use]
    pub fn config(&self) -> &DappConfig {
        &self.config
    }

    /// Cancelling this token aborts any confirmation wait in progress.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn controller(&self) -> Result<MutexGuard<'_, ActionController>> {
        self.controller
            .lock()
            .map_err(|_| DappError::InternalError("controller lock poisoned".to_string()))
    }

    fn balance_cache(&self) -> Result<MutexGuard<'_, BalanceSnapshot>> {
        self.balances
            .lock()
            .map_err(|_| DappError::InternalError("balance lock poisoned".to_string()))
    }

    #[must_use]
    pub fn account(&self) -> Option<Address> {
        self.wallet.account()
    }

    // ---------------------------------------------------------------------
    // Wallet session
    // ---------------------------------------------------------------------

    /// Connects through the first configured connector.
    pub async fn connect(&self) -> Result<Address> {
        let connector = self
            .config
            .default_connector()
            .cloned()
            .ok_or_else(|| DappError::ConfigError("no wallet connector configured".to_string()))?;
        self.connect_with(&connector).await
    }

    /// Connects through `connector`, persists the session and loads balances.
    pub async fn connect_with(&self, connector: &Connector) -> Result<Address> {
        let address = self.wallet.connect(connector).await?;
        // The previous account's balances must not survive a failed read.
        self.balance_cache()?.clear();

        if let Some(store) = &self.session_store {
            let record = SessionRecord::new(&connector.id, address, self.config.chain_id);
            if let Err(e) = store.save(&record).await {
                logging::log(
                    LogLevel::Warning,
                    &format!("Could not persist session to {}: {e}", store.path().display()),
                );
            }
        }

        if let Err(e) = self.refresh_balances().await {
            logging::log(LogLevel::Warning, &format!("Balance refresh failed: {e}"));
        }
        Ok(address)
    }

    /// Reconnects the persisted session, if there is one for this chain and a
    /// known connector.
    pub async fn restore_session(&self) -> Result<Option<Address>> {
        let Some(store) = &self.session_store else {
            return Ok(None);
        };
        let Some(record) = store.load().await? else {
            return Ok(None);
        };

        if record.chain_id != self.config.chain_id {
            logging::log(
                LogLevel::Info,
                &format!(
                    "Discarding session for chain {} (configured chain is {})",
                    record.chain_id, self.config.chain_id
                ),
            );
            store.clear().await?;
            return Ok(None);
        }
        let Some(connector) = self.config.connector(&record.connector_id).cloned() else {
            logging::log(
                LogLevel::Info,
                &format!("Session connector `{}` is no longer configured", record.connector_id),
            );
            return Ok(None);
        };

        match self.connect_with(&connector).await {
            Ok(address) => {
                if address != record.address {
                    logging::log(
                        LogLevel::Warning,
                        &format!("Wallet switched account from {} to {address}", record.address),
                    );
                }
                Ok(Some(address))
            }
            Err(e) => {
                logging::log(LogLevel::Warning, &format!("Could not restore session: {e}"));
                store.clear().await?;
                Ok(None)
            }
        }
    }

    /// Disconnects the wallet, clears both balances and forgets the persisted
    /// session. An action already in flight keeps running.
    pub async fn disconnect(&self) -> Result<()> {
        self.wallet.disconnect().await?;
        self.balance_cache()?.clear();
        if let Some(store) = &self.session_store {
            store.clear().await?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Balances
    // ---------------------------------------------------------------------

    /// Re-reads the contract-held and native balances of the connected
    /// account. Each value is cached independently, so one failing read does
    /// not discard the other.
    pub async fn refresh_balances(&self) -> Result<BalanceSnapshot> {
        let account = self.wallet.account().ok_or(DappError::WalletNotConnected)?;

        let args = [AbiValue::Address(account)];
        let (contract_balance, wallet_balance) = tokio::join!(
            self.contract.read_view("balanceOf", &args),
            self.contract.read_native_balance(account),
        );

        // Skip the write if the account went away while reading.
        if self.wallet.account() == Some(account) {
            let mut cache = self.balance_cache()?;
            if let Ok(value) = &contract_balance {
                cache.contract = Some(*value);
            }
            if let Ok(value) = &wallet_balance {
                cache.wallet = Some(*value);
            }
        }

        contract_balance?;
        wallet_balance?;
        self.balances()
    }

    pub fn balances(&self) -> Result<BalanceSnapshot> {
        Ok(*self.balance_cache()?)
    }

    // ---------------------------------------------------------------------
    // Amount fields
    // ---------------------------------------------------------------------

    pub fn set_deposit_amount(&self, value: impl Into<String>) -> Result<()> {
        self.controller()?.set_deposit_amount(value);
        Ok(())
    }

    pub fn set_withdraw_amount(&self, value: impl Into<String>) -> Result<()> {
        self.controller()?.set_withdraw_amount(value);
        Ok(())
    }

    /// Sets the amount for `kind` unless an action is in flight.
    pub fn stage(&self, kind: ActionKind, amount: Option<String>) -> Result<()> {
        self.controller()?.stage(kind, amount)
    }

    pub fn status(&self) -> Result<String> {
        Ok(self.controller()?.status().to_string())
    }

    // ---------------------------------------------------------------------
    // Actions
    // ---------------------------------------------------------------------

    pub async fn deposit(&self) -> Result<Resolution> {
        self.execute(ActionKind::Deposit).await
    }

    pub async fn withdraw(&self) -> Result<Resolution> {
        self.execute(ActionKind::Withdraw).await
    }

    pub async fn owner_withdraw(&self) -> Result<Resolution> {
        self.execute(ActionKind::OwnerWithdraw).await
    }

    /// Runs `kind` through its whole lifecycle.
    ///
    /// Returns `Err` only when the action could not start (`Busy`,
    /// `EmptyAmount`, `InvalidAmount`, `WalletNotConnected`, or `Cancelled`
    /// after shutdown) or the wait was cancelled, which frees the slot.
    /// Submission failures, reverts and timeouts come back as a failed
    /// [`Resolution`].
    pub async fn execute(&self, kind: ActionKind) -> Result<Resolution> {
        let from = self.wallet.account().ok_or(DappError::WalletNotConnected)?;
        if self.shutdown.is_cancelled() {
            return Err(DappError::Cancelled);
        }
        let request = self.controller()?.begin(kind)?;
        logging::log(LogLevel::Info, &format!("Submitting {kind} from {from}"));

        let handle = match self.contract.submit(from, &request).await {
            Ok(handle) => handle,
            Err(e) => {
                let message = e.status_text();
                logging::log(LogLevel::Error, &format!("{kind} submission failed: {message}"));
                let resolution = self.controller()?.on_submission_failed(message);
                return resolution.ok_or_else(|| {
                    DappError::InternalError(format!("{kind} was no longer submitting"))
                });
            }
        };
        self.controller()?.on_submitted(handle)?;
        logging::log(LogLevel::Info, &format!("Waiting for confirmation of {handle}"));

        let resolution = self.await_confirmation(handle).await?;
        if resolution.refresh_balances {
            if let Err(e) = self.refresh_balances().await {
                logging::log(LogLevel::Warning, &format!("Balance refresh failed: {e}"));
            }
        }

        if resolution.is_success() {
            logging::log(LogLevel::Success, &format!("{kind} confirmed ({handle})"));
        } else {
            logging::log(LogLevel::Error, &format!("{kind} failed ({handle})"));
        }
        Ok(resolution)
    }

    async fn await_confirmation(&self, handle: TxHash) -> Result<Resolution> {
        let wait = tokio::time::timeout(
            self.config.confirmation_timeout,
            self.poll_until_resolved(handle),
        );

        tokio::select! {
            () = self.shutdown.cancelled() => {
                logging::log(
                    LogLevel::Warning,
                    &format!("Shutdown while waiting for {handle}"),
                );
                self.controller()?.on_cancelled(handle);
                Err(DappError::Cancelled)
            }
            outcome = wait => match outcome {
                Ok(resolution) => resolution,
                Err(_) => {
                    logging::log(
                        LogLevel::Warning,
                        &format!(
                            "No receipt for {handle} after {}s",
                            self.config.confirmation_timeout.as_secs()
                        ),
                    );
                    let resolution = self.controller()?.on_confirmation_timeout(handle);
                    resolution.ok_or_else(|| {
                        DappError::InternalError(format!("{handle} resolved during timeout"))
                    })
                }
            },
        }
    }

    async fn poll_until_resolved(&self, handle: TxHash) -> Result<Resolution> {
        let mut source = self.block_source().await;
        loop {
            match self.contract.poll_receipt(&handle).await {
                Ok(receipt) => {
                    let resolution = self.controller()?.on_receipt(handle, &receipt);
                    if let Some(resolution) = resolution {
                        return Ok(resolution);
                    }
                }
                Err(e) => logging::log(
                    LogLevel::Warning,
                    &format!("Receipt poll for {handle} failed: {e}"),
                ),
            }

            match source.next_block().await {
                Ok(Some(block)) => {
                    logging::log(LogLevel::Debug, &format!("New head {block}"));
                }
                Ok(None) => {}
                Err(e) => {
                    logging::log(
                        LogLevel::Warning,
                        &format!("{} source failed ({e}), falling back to polling", source.source_name()),
                    );
                    source = Box::new(IntervalSource::new(self.config.poll_interval));
                }
            }
        }
    }

    async fn block_source(&self) -> Box<dyn BlockSource> {
        if let Some(ws_url) = &self.config.ws_url {
            let mut source = WebSocketSource::new(ws_url.clone(), WS_RECONNECT_DELAY_SECS);
            match source.ensure_connected().await {
                Ok(()) => return Box::new(source),
                Err(e) => logging::log(
                    LogLevel::Warning,
                    &format!("WebSocket unavailable ({e}), polling every {:?}", self.config.poll_interval),
                ),
            }
        }
        Box::new(IntervalSource::new(self.config.poll_interval))
    }

    // ---------------------------------------------------------------------
    // View
    // ---------------------------------------------------------------------

    /// Snapshot of everything the page renders.
    pub fn view(&self) -> Result<PageView> {
        let account = self.wallet.account();
        let balances = self.balances()?;
        let controller = self.controller()?;
        let connected = account.is_some();

        Ok(PageView {
            account,
            contract_balance: connected.then(|| balances.contract_display()),
            wallet_balance: connected.then(|| balances.wallet_display()),
            deposit_amount: controller.inputs().deposit.clone(),
            withdraw_amount: controller.inputs().withdraw.clone(),
            status: controller.status().to_string(),
            phase: controller.phase(),
            active: controller.active_kind(),
            pending_handle: controller.active_handle(),
            can_deposit: connected && controller.can_submit(ActionKind::Deposit),
            can_withdraw: connected && controller.can_submit(ActionKind::Withdraw),
            can_owner_withdraw: connected && controller.can_submit(ActionKind::OwnerWithdraw),
        })
    }
}
