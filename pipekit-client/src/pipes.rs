//! Pipe-related API endpoints
//!
//! Starting and stopping runs of a pipe. Each call is routed either through
//! the hosted control plane or straight to the in-cluster execution API,
//! depending on the options passed in.

use std::sync::Arc;

use async_trait::async_trait;
use pipekit_core::Route;
use pipekit_core::domain::pipe::Pipe;
use pipekit_core::dto::options::{CreateOptions, DeleteOptions};
use reqwest::Method;

use crate::backend::{Backend, NO_BODY};
use crate::context::CallContext;
use crate::error::{ClientError, Result};
use crate::path::ApiPath;

const RUNS_TEMPLATE: &str = "v1/users/{user}/pipes/{pipe}/runs";
const RUN_TEMPLATE: &str = "v1/users/{user}/pipes/{pipe}/runs/{run}";

/// Operations on pipe runs
#[async_trait]
pub trait PipesClient: Send + Sync {
    /// Starts a run of `pipe`
    ///
    /// The user and pipe ids are taken from the pipe's own metadata. On
    /// success the fields present in the service's response, if it sent one,
    /// are written over the pipe; fields the response omits keep their
    /// values. On error the pipe is left exactly as it was passed in.
    async fn create(&self, ctx: &CallContext, pipe: &mut Pipe, opts: CreateOptions) -> Result<()>;

    /// Stops a running pipe
    ///
    /// `opts.should_kill` selects forceful termination over a graceful stop.
    /// The request is a DELETE with no payload; the run is identified by the
    /// path and the `should-kill` query parameter alone.
    async fn stop(
        &self,
        ctx: &CallContext,
        user_id: &str,
        pipe_id: &str,
        run_id: &str,
        opts: DeleteOptions,
    ) -> Result<()>;
}

/// HTTP implementation of [`PipesClient`]
#[derive(Debug, Clone)]
pub struct PipesApi {
    backend: Arc<Backend>,
}

impl PipesApi {
    pub fn new(backend: Arc<Backend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl PipesClient for PipesApi {
    async fn create(&self, ctx: &CallContext, pipe: &mut Pipe, opts: CreateOptions) -> Result<()> {
        let path = runs_path(opts.route(), pipe.user_id(), pipe.pipe_id())?;

        let response: Option<serde_json::Value> = self
            .backend
            .call_json(ctx, Method::POST, &path, None, Some(&*pipe))
            .await?;

        if let Some(created) = response {
            pipe.merge_response(created).map_err(ClientError::Decode)?;
        }

        Ok(())
    }

    async fn stop(
        &self,
        ctx: &CallContext,
        user_id: &str,
        pipe_id: &str,
        run_id: &str,
        opts: DeleteOptions,
    ) -> Result<()> {
        let path = run_path(opts.route(), user_id, pipe_id, run_id)?;

        self.backend
            .call(ctx, Method::DELETE, &path, Some(&opts), NO_BODY)
            .await?;

        Ok(())
    }
}

/// Path of the runs collection of a pipe
pub fn runs_path(route: Route, user_id: &str, pipe_id: &str) -> Result<ApiPath> {
    ApiPath::new(route, RUNS_TEMPLATE, &[("user", user_id), ("pipe", pipe_id)])
}

/// Path of a single run of a pipe
pub fn run_path(route: Route, user_id: &str, pipe_id: &str, run_id: &str) -> Result<ApiPath> {
    ApiPath::new(
        route,
        RUN_TEMPLATE,
        &[("user", user_id), ("pipe", pipe_id), ("run", run_id)],
    )
}
