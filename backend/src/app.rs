// Application state shared by the HTTP and websocket handlers.

use std::sync::Arc;

use gesture_core::CodeTable;
use tokio::sync::watch;

use crate::hub::Hub;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
    pub codes: Arc<CodeTable>,
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(hub: Arc<Hub>, codes: Arc<CodeTable>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            hub,
            codes,
            shutdown,
        }
    }
}
