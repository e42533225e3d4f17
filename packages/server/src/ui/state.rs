//! Server state shared by the handlers.

use std::sync::Arc;

use crate::{
    config::RelayConfig,
    hub::HubHandle,
    usecase::{ConnectUseCase, DisconnectUseCase, DispatchUseCase},
};

/// Shared application state
pub struct AppState {
    pub config: RelayConfig,
    /// Hub（接続とルームのディレクトリ）
    pub hub: HubHandle,
    pub connect_usecase: Arc<ConnectUseCase>,
    pub dispatch_usecase: Arc<DispatchUseCase>,
    pub disconnect_usecase: Arc<DisconnectUseCase>,
}

impl AppState {
    /// Wire the use cases around `hub`.
    pub fn new(config: RelayConfig, hub: HubHandle) -> Self {
        let connect_usecase = Arc::new(ConnectUseCase::new(
            hub.clone(),
            config.limits.mailbox_capacity,
        ));
        let dispatch_usecase = Arc::new(DispatchUseCase::new(Arc::new(hub.clone())));
        let disconnect_usecase = Arc::new(DisconnectUseCase::new(hub.clone()));
        Self {
            config,
            hub,
            connect_usecase,
            dispatch_usecase,
            disconnect_usecase,
        }
    }
}
