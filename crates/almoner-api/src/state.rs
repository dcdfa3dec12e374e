use std::sync::Arc;

use tokio::sync::Mutex;

use almoner_audit::trail::AuditTrail;
use almoner_auth::jwt::TokenVerifier;
use almoner_auth::principal::Authenticator;
use almoner_auth::users::UserDirectory;
use almoner_cases::CaseStore;
use almoner_cases::assignments::AssignmentService;
use almoner_cases::departments::DepartmentService;
use almoner_cases::patients::PatientService;
use almoner_cases::summary::SummaryService;
use almoner_export::styles::DocumentStyles;
use almoner_search::error::SearchError;
use almoner_search::index::PatientIndex;
use almoner_storage::store::DocumentStore;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub auth: Authenticator,
    pub users: UserDirectory,
    pub patients: PatientService,
    pub assignments: AssignmentService,
    pub departments: DepartmentService,
    pub summary: SummaryService,
    pub trail: AuditTrail,
    pub index: Arc<Mutex<PatientIndex>>,
    pub styles: Arc<DocumentStyles>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, verifier: TokenVerifier, index: PatientIndex) -> Self {
        let cases = CaseStore::new(Arc::clone(&store));
        let trail = cases.trail().clone();
        let users = UserDirectory::new(Arc::clone(&store), trail.clone());

        Self {
            auth: Authenticator::new(verifier, users.clone()),
            users,
            patients: PatientService::new(cases.clone()),
            assignments: AssignmentService::new(cases.clone()),
            departments: DepartmentService::new(cases.clone()),
            summary: SummaryService::new(cases),
            trail,
            index: Arc::new(Mutex::new(index)),
            styles: Arc::new(DocumentStyles::default()),
            store,
        }
    }

    /// Run synchronous index work on the blocking pool while holding the
    /// index lock.
    pub async fn with_index<R, F>(&self, work: F) -> Result<R, SearchError>
    where
        R: Send + 'static,
        F: FnOnce(&mut PatientIndex) -> Result<R, SearchError> + Send + 'static,
    {
        let mut index = Arc::clone(&self.index).lock_owned().await;
        tokio::task::spawn_blocking(move || work(&mut *index))
            .await
            .map_err(|e| SearchError::Io(std::io::Error::other(e)))?
    }
}
