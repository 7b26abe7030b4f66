//! Per-call options for pipe operations

use serde::{Deserialize, Serialize};

use crate::params::{Params, ParamsContainer};
use crate::route::Route;

/// Query parameter carrying the forceful-termination signal on stop
pub const SHOULD_KILL_PARAM: &str = "should-kill";

/// Options that may be provided when creating a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOptions {
    /// Send the request straight to the in-cluster endpoint
    pub is_in_cluster: bool,
}

/// Options that may be provided when stopping a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOptions {
    /// Send the request straight to the in-cluster endpoint
    pub is_in_cluster: bool,
    /// Terminate forcefully instead of asking the run to stop gracefully
    pub should_kill: bool,
}

impl CreateOptions {
    pub fn in_cluster() -> Self {
        Self {
            is_in_cluster: true,
        }
    }

    pub fn route(&self) -> Route {
        Route::from_in_cluster(self.is_in_cluster)
    }
}

impl DeleteOptions {
    pub fn route(&self) -> Route {
        Route::from_in_cluster(self.is_in_cluster)
    }
}

impl ParamsContainer for CreateOptions {
    fn params(&self) -> Params {
        Params::new()
    }
}

impl ParamsContainer for DeleteOptions {
    fn params(&self) -> Params {
        let mut params = Params::new();
        params.set(SHOULD_KILL_PARAM, self.should_kill.to_string());
        params
    }
}
