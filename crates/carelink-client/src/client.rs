//! Wiring of the data layer from a [`ClientConfig`].

use std::collections::BTreeMap;
use std::sync::Arc;

use carelink_auth::{BiometricGate, SecureVault, SessionConfig, SessionManager};
use carelink_core::models::PatientDocument;
use carelink_core::{ApiResult, Transport, TransportError};

use crate::auth::AuthService;
use crate::collection::{CollectionEndpoint, Resource, SyncCollection};
use crate::config::{ClientConfig, ConfigError};
use crate::dashboard::DashboardAggregator;
use crate::executor::RequestExecutor;
use crate::resources::{
    AppointmentCollection, EvaluationCollection, InquiryCollection, PatientCollection, patients,
};
use crate::transport::ReqwestTransport;
use crate::upload::FileUpload;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP transport: {0}")]
    Transport(#[from] TransportError),
}

/// Builds the services and per-screen controllers that share one session.
///
/// Controllers are created fresh on every call; each screen activation owns
/// its own collection and criteria.
pub struct ClientFactory {
    config: ClientConfig,
    executor: Arc<RequestExecutor>,
}

impl ClientFactory {
    /// Validate `config` and connect over HTTP.
    pub fn new(
        config: ClientConfig,
        vault: Arc<dyn SecureVault>,
        gate: Arc<dyn BiometricGate>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config.api)?);
        Ok(Self::with_transport(config, transport, vault, gate))
    }

    /// Wire the client over an arbitrary transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        vault: Arc<dyn SecureVault>,
        gate: Arc<dyn BiometricGate>,
    ) -> Self {
        let session = Arc::new(SessionManager::new(
            vault,
            transport.clone(),
            gate,
            SessionConfig::default(),
        ));
        let executor = RequestExecutor::new(transport, session)
            .with_refresh_on_unauthorized(config.auth.refresh_on_unauthorized);
        Self {
            config,
            executor: Arc::new(executor),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        self.executor.session()
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.executor.clone())
    }

    pub fn dashboard(&self) -> DashboardAggregator {
        DashboardAggregator::new(self.executor.clone())
    }

    pub fn patients(&self) -> PatientCollection {
        self.collection(self.config.paging.patients)
    }

    pub fn inquiries(&self) -> InquiryCollection {
        self.collection(self.config.paging.inquiries)
    }

    pub fn evaluations(&self) -> EvaluationCollection {
        self.collection(self.config.paging.evaluations)
    }

    pub fn appointments(&self) -> AppointmentCollection {
        self.collection(self.config.paging.appointments)
    }

    pub fn collection<R: Resource>(&self, page_size: u32) -> SyncCollection<R> {
        SyncCollection::new(
            self.executor.clone(),
            CollectionEndpoint::for_resource::<R>(page_size),
        )
    }

    /// Attach a document to a patient's chart.
    pub async fn upload_patient_document(
        &self,
        patient_id: &str,
        file: &FileUpload,
        fields: &BTreeMap<String, String>,
    ) -> ApiResult<PatientDocument> {
        self.executor
            .upload(&patients::documents_path(patient_id), file, fields)
            .await
    }
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("base_url", &self.config.api.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelink_auth::{MemoryVault, NoBiometrics};

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ClientConfig::default();
        config.paging.patients = 0;
        let result =
            ClientFactory::new(config, Arc::new(MemoryVault::new()), Arc::new(NoBiometrics));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_controllers_use_configured_page_sizes() {
        let mut config = ClientConfig::default();
        config.paging.appointments = 7;
        let factory =
            ClientFactory::new(config, Arc::new(MemoryVault::new()), Arc::new(NoBiometrics))
                .unwrap();

        let appointments = factory.appointments();
        assert_eq!(appointments.endpoint().page_size, 7);
        assert_eq!(appointments.endpoint().first_page, 0);
        assert_eq!(appointments.cursor().page_number, 0);
        assert_eq!(factory.patients().endpoint().path, "/patients");
        assert_eq!(factory.inquiries().endpoint().first_page, 1);
    }
}
