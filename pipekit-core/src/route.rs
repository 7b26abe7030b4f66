//! Routing target of a call
//!
//! Every Pipekit operation can be served either by the hosted control plane
//! or directly by the execution engine inside the cluster. The target is
//! chosen explicitly by the caller and travels alongside the request path.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which backend endpoint a request is sent to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    /// The public control-plane API
    #[default]
    Hosted,
    /// The cluster-local execution API
    InCluster,
}

impl Route {
    /// Picks the route from an `is_in_cluster` flag
    pub fn from_in_cluster(is_in_cluster: bool) -> Self {
        if is_in_cluster {
            Route::InCluster
        } else {
            Route::Hosted
        }
    }

    /// Leading path segment served by this route
    pub fn prefix(self) -> &'static str {
        match self {
            Route::Hosted => "events-handler",
            Route::InCluster => "plumbing",
        }
    }

    pub fn is_in_cluster(self) -> bool {
        matches!(self, Route::InCluster)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Hosted => write!(f, "hosted"),
            Route::InCluster => write!(f, "in-cluster"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_from_flag() {
        assert_eq!(Route::from_in_cluster(true), Route::InCluster);
        assert_eq!(Route::from_in_cluster(false), Route::Hosted);
    }

    #[test]
    fn test_route_prefix() {
        assert_eq!(Route::Hosted.prefix(), "events-handler");
        assert_eq!(Route::InCluster.prefix(), "plumbing");
    }

    #[test]
    fn test_default_is_hosted() {
        assert_eq!(Route::default(), Route::Hosted);
        assert!(!Route::default().is_in_cluster());
    }
}
