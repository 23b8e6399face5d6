use std::sync::Arc;

use crate::fetch::ShiftSource;
use crate::sync::RefreshCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RefreshCoordinator>,
    pub source: Arc<dyn ShiftSource>,
}
