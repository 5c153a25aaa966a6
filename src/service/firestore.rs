use crate::api::firestore_api::FirestoreApi;
use crate::config::CONFIG;
use crate::error::FirelinkError;
use crate::google_auth::credentials::ServiceAccountKey;
use crate::google_auth::service::GoogleAuthService;
use crate::service::credential_loader;
use crate::types::firestore::{FirestoreDocument, RunQueryRequest};
use std::sync::Arc;
use tracing::{error, info};
use url::Url;

/// Handle to one Firestore database, authenticated as one service account.
///
/// Cloning shares the underlying session; the process creates the handle
/// once at startup and request handlers borrow it read-only.
#[derive(Clone)]
pub struct FirestoreDb {
    inner: Arc<FirestoreDbInner>,
}

struct FirestoreDbInner {
    project_id: String,
    database_id: String,
    base_url: Url,
    auth: GoogleAuthService,
}

impl FirestoreDb {
    /// One-shot bootstrap: resolve the credential path, load the service
    /// account, authenticate, and bind the handle to its project.
    ///
    /// Each step's failure aborts the whole sequence; no partial client is
    /// ever returned. Must complete before the listener starts accepting
    /// traffic.
    pub async fn initialize() -> Result<Self, FirelinkError> {
        let path = CONFIG.credential_file();
        let result: Result<Self, FirelinkError> = async {
            let key = credential_loader::load_service_account(&path)?;
            let db = Self::new(key, CONFIG.database_id.clone(), CONFIG.firestore_url.clone());
            // Fail fast: a credential the token endpoint rejects must stop
            // the process here, not on the first probe request.
            db.inner.auth.refresh().await?;
            Ok(db)
        }
        .await;

        match result {
            Ok(db) => {
                info!(project_id = %db.project_id(), "Firestore connection initialized");
                Ok(db)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Firestore initialization failed");
                Err(e)
            }
        }
    }

    /// Bind a handle from explicit parts. Performs no I/O; the token
    /// exchange happens on first use (or via [`FirestoreDb::initialize`],
    /// which primes it eagerly).
    pub fn new(key: ServiceAccountKey, database_id: impl Into<String>, base_url: Url) -> Self {
        let project_id = key.project_id.clone();
        Self {
            inner: Arc::new(FirestoreDbInner {
                project_id,
                database_id: database_id.into(),
                base_url,
                auth: GoogleAuthService::new(key),
            }),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    pub fn database_id(&self) -> &str {
        &self.inner.database_id
    }

    /// Reference to a named collection. Creating the handle performs no I/O
    /// and cannot fail; the service sees the name only when the handle is
    /// queried.
    pub fn collection(&self, name: impl Into<String>) -> CollectionRef {
        CollectionRef {
            db: self.clone(),
            collection_id: name.into(),
        }
    }

    fn documents_parent(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.inner.project_id, self.inner.database_id
        )
    }
}

/// Cheap reference to a named collection; not a data snapshot.
#[derive(Clone)]
pub struct CollectionRef {
    db: FirestoreDb,
    collection_id: String,
}

impl CollectionRef {
    pub fn id(&self) -> &str {
        &self.collection_id
    }

    /// Full resource path of the referenced collection.
    pub fn target_path(&self) -> String {
        format!("{}/{}", self.db.documents_parent(), self.collection_id)
    }

    pub fn limit(self, limit: u32) -> BoundedQuery {
        BoundedQuery {
            collection: self,
            limit,
        }
    }
}

/// A collection read capped at a fixed number of documents.
pub struct BoundedQuery {
    collection: CollectionRef,
    limit: u32,
}

impl BoundedQuery {
    /// Execute the query and return the matched documents.
    ///
    /// Firestore reports an empty result set as one response item without a
    /// `document`, so the returned vector is empty for an empty collection.
    pub async fn get(&self) -> Result<Vec<FirestoreDocument>, FirelinkError> {
        let db = &self.collection.db.inner;
        let token = db.auth.access_token().await?;
        let request = RunQueryRequest::bounded(self.collection.collection_id.clone(), self.limit);

        let items = FirestoreApi::run_query(
            db.auth.http_client(),
            &token,
            &db.base_url,
            &self.collection.db.documents_parent(),
            &request,
        )
        .await?;

        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> FirestoreDb {
        let key: ServiceAccountKey = serde_json::from_value(serde_json::json!({
            "project_id": "demo-project",
            "private_key": "pem",
            "client_email": "probe@demo-project.iam.gserviceaccount.com"
        }))
        .expect("test key deserializes");
        FirestoreDb::new(
            key,
            "(default)",
            Url::parse("https://firestore.googleapis.com/v1").expect("url"),
        )
    }

    #[test]
    fn repeated_collection_handles_target_the_same_path() {
        let db = test_db();
        let first = db.collection("x");
        let second = db.collection("x");
        assert_eq!(first.target_path(), second.target_path());
        assert_eq!(
            first.target_path(),
            "projects/demo-project/databases/(default)/documents/x"
        );
    }

    #[test]
    fn handles_for_different_collections_diverge() {
        let db = test_db();
        assert_ne!(
            db.collection("x").target_path(),
            db.collection("y").target_path()
        );
    }

    #[test]
    fn binding_a_handle_performs_no_validation_of_the_name() {
        // Malformed names pass through; the service rejects them at query
        // time, not here.
        let db = test_db();
        let weird = db.collection("spaces and/slashes");
        assert_eq!(weird.id(), "spaces and/slashes");
    }
}
