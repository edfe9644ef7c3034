use crate::error::{Error, Result};
use crate::event::ControllerEvent;
use azorius::access::{AccessPolicy, Ownable, Unauthorized};
use azorius::avatar::Avatar;
use azorius::config::InitializerBlob;
use azorius::{Address, Transaction};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractalModuleConfig {
    /// Usually the parent organization
    pub owner: Address,

    /// The child multisig
    pub avatar: Address,

    /// Account transactions are forwarded to, usually the avatar
    pub target: Address,

    /// Accounts besides the owner that may execute through the module
    pub controllers: Vec<Address>,
}

impl InitializerBlob for FractalModuleConfig {}

#[derive(Debug)]
struct ControllerState {
    access: Box<dyn AccessPolicy>,
    controllers: BTreeSet<Address>,
}

/// Module on a child multisig that lets the owner and its controllers
/// execute transactions directly, without a proposal.
#[derive(Debug)]
pub struct FractalModule {
    address: Address,
    avatar: Address,
    target: Arc<dyn Avatar>,
    state: RwLock<ControllerState>,
    events: Mutex<VecDeque<ControllerEvent>>,
}

impl FractalModule {
    pub fn new(address: Address, config: FractalModuleConfig, target: Arc<dyn Avatar>) -> Self {
        let mut events = VecDeque::from([ControllerEvent::FractalModuleSetUp {
            owner: config.owner,
            avatar: config.avatar,
            target: config.target,
        }]);
        if !config.controllers.is_empty() {
            events.push_back(ControllerEvent::ControllersAdded {
                controllers: config.controllers.clone(),
            });
        }
        info!(%address, owner = %config.owner, avatar = %config.avatar, "fractal module set up");

        Self {
            address,
            avatar: config.avatar,
            target,
            state: RwLock::new(ControllerState {
                access: Box::new(Ownable::new(config.owner)),
                controllers: config.controllers.into_iter().collect(),
            }),
            events: Mutex::new(events),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn avatar(&self) -> Address {
        self.avatar
    }

    pub fn is_controller(&self, account: &Address) -> bool {
        self.state.read().controllers.contains(account)
    }

    pub fn drain_events(&self) -> Vec<ControllerEvent> {
        self.events.lock().drain(..).collect()
    }

    pub fn add_controllers(&self, caller: &Address, controllers: Vec<Address>) -> Result<()> {
        let mut state = self.state.write();
        state.access.ensure_authorized(caller)?;
        state.controllers.extend(controllers.iter().copied());
        self.events
            .lock()
            .push_back(ControllerEvent::ControllersAdded { controllers });
        Ok(())
    }

    pub fn remove_controllers(&self, caller: &Address, controllers: Vec<Address>) -> Result<()> {
        let mut state = self.state.write();
        state.access.ensure_authorized(caller)?;
        for controller in &controllers {
            state.controllers.remove(controller);
        }
        self.events
            .lock()
            .push_back(ControllerEvent::ControllersRemoved { controllers });
        Ok(())
    }

    pub fn set_access_policy(&self, caller: &Address, access: Box<dyn AccessPolicy>) -> Result<()> {
        let mut state = self.state.write();
        state.access.ensure_authorized(caller)?;
        state.access = access;
        self.events
            .lock()
            .push_back(ControllerEvent::AccessPolicyChanged);
        Ok(())
    }

    /// Execute `transaction` on the target as this module. Only the owner
    /// and controllers may call it.
    #[tracing::instrument(skip(self, transaction), fields(to = %transaction.to))]
    pub fn exec_tx(&self, caller: &Address, transaction: Transaction) -> Result<()> {
        {
            let state = self.state.read();
            if !state.access.is_authorized(caller) && !state.controllers.contains(caller) {
                return Err(Unauthorized(*caller).into());
            }
        }

        self.target
            .exec_transactions_from_module(&self.address, &[transaction])
            .map_err(|err| {
                warn!(error = %err, "controller transaction failed");
                Error::TxFailed(err)
            })
    }
}
