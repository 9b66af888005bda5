use crate::controller::Controller;
use crate::loader::DashboardSource;
use crate::view::SnapshotView;
use std::{path::PathBuf, sync::Arc};

pub type DashboardController = Controller<Box<dyn DashboardSource>, SnapshotView>;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<DashboardController>,
    /// Served under `/assets/data` so the page can also be pointed at itself.
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(source: Box<dyn DashboardSource>, data_dir: PathBuf) -> Self {
        Self {
            controller: Arc::new(Controller::new(source, SnapshotView::default())),
            data_dir,
        }
    }
}
