// Re-export the proto module from the shared `api-shared` crate so callers
// can continue to reference `api_grpc::service::pb`.
pub use api_shared::pb;

use api_shared::auth;
use api_shared::HealthService;
use futures::Stream;
use std::pin::Pin;
use tonic::{Request, Response, Status};
use triage_core::{wire, TriageError, TriageForm, TriageService};

use api_shared::pb::triage_server::Triage;

/// Builds the authentication interceptor for gRPC requests.
///
/// Every call must carry an `x-api-key` header equal to `expected`. With no key configured all
/// calls pass.
#[allow(clippy::result_large_err)]
pub fn auth_interceptor(
    expected: Option<String>,
) -> impl Fn(Request<()>) -> Result<Request<()>, Status> + Clone {
    move |req: Request<()>| {
        let provided = req.metadata().get("x-api-key").and_then(|v| v.to_str().ok());
        auth::validate_api_key(provided, expected.as_deref())?;
        Ok(req)
    }
}

/// Maps core errors onto gRPC status codes.
fn to_status(e: TriageError) -> Status {
    if e.is_auth() {
        return Status::unauthenticated(e.to_string());
    }
    match e {
        TriageError::InvalidInput(_) => Status::invalid_argument(e.to_string()),
        TriageError::SubmissionInFlight => Status::failed_precondition(e.to_string()),
        TriageError::PersistenceDisabled => Status::unavailable(e.to_string()),
        _ => {
            tracing::error!("internal error: {}", e);
            Status::internal("Internal error")
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[derive(Clone)]
pub struct TriageGrpc {
    service: TriageService,
}

impl TriageGrpc {
    pub fn new(service: TriageService) -> Self {
        Self { service }
    }
}

pub type HistoryStream = Pin<Box<dyn Stream<Item = Result<pb::HistoryRes, Status>> + Send>>;

#[tonic::async_trait]
impl Triage for TriageGrpc {
    async fn health(&self, _req: Request<()>) -> Result<Response<pb::HealthRes>, Status> {
        let health_res = HealthService::check_health(self.service.persistence_enabled());
        Ok(Response::new(health_res))
    }

    async fn sign_in(
        &self,
        req: Request<pb::SignInReq>,
    ) -> Result<Response<pb::SignInRes>, Status> {
        let req = req.into_inner();
        let session = self
            .service
            .sign_in(non_empty(&req.session_id), non_empty(&req.token))
            .map_err(to_status)?;
        Ok(Response::new(session.into()))
    }

    async fn score(
        &self,
        req: Request<pb::ScoreReq>,
    ) -> Result<Response<pb::TriageResult>, Status> {
        let form: TriageForm = req.into_inner().into();
        Ok(Response::new(self.service.score(&form).into()))
    }

    async fn submit(
        &self,
        req: Request<pb::SubmitReq>,
    ) -> Result<Response<pb::SubmitRes>, Status> {
        let req = req.into_inner();
        let form = TriageForm::new(req.symptoms, req.vitals.map(Into::into).unwrap_or_default());

        match self.service.submit(non_empty(&req.user_id), form).await {
            Ok(outcome) => Ok(Response::new(outcome.into())),
            Err(e) => {
                tracing::error!("Submit error: {}", e);
                Err(to_status(e))
            }
        }
    }

    async fn list_history(
        &self,
        req: Request<pb::HistoryReq>,
    ) -> Result<Response<pb::HistoryRes>, Status> {
        let req = req.into_inner();
        let history = self
            .service
            .history(&req.user_id)
            .await
            .map_err(to_status)?;
        Ok(Response::new(wire::history_res(history)))
    }

    type WatchHistoryStream = HistoryStream;

    async fn watch_history(
        &self,
        req: Request<pb::HistoryReq>,
    ) -> Result<Response<Self::WatchHistoryStream>, Status> {
        let req = req.into_inner();
        let feed = self
            .service
            .watch_history(&req.user_id)
            .await
            .map_err(to_status)?;
        tracing::debug!("history watch opened for {}", req.user_id);

        // The feed is dropped, and the store subscription with it, when the client goes away.
        let stream = futures::stream::unfold(feed, |mut feed| async move {
            let history = feed.next().await?;
            Some((Ok(wire::history_res(history)), feed))
        });
        Ok(Response::new(Box::pin(stream)))
    }
}
