use crate::error::FirelinkError;
use crate::types::firestore::{RunQueryRequest, RunQueryResponseItem};
use tracing::error;
use url::Url;

pub struct FirestoreApi;

impl FirestoreApi {
    /// POST a bounded structured query against a documents root.
    ///
    /// A failed read surfaces immediately; the probe path never retries.
    pub async fn run_query(
        client: reqwest::Client,
        token: impl AsRef<str>,
        base_url: &Url,
        documents_parent: &str,
        request: &RunQueryRequest,
    ) -> Result<Vec<RunQueryResponseItem>, FirelinkError> {
        let url = format!(
            "{}/{}:runQuery",
            base_url.as_str().trim_end_matches('/'),
            documents_parent
        );

        let resp = client
            .post(url)
            .bearer_auth(token.as_ref())
            .json(request)
            .send()
            .await
            .map_err(|e| FirelinkError::QueryFailure(format!("runQuery request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            error!("Firestore runQuery failed ({}): {}", status, detail);
            return Err(FirelinkError::QueryFailure(format!(
                "runQuery returned {status}: {detail}"
            )));
        }

        resp.json::<Vec<RunQueryResponseItem>>()
            .await
            .map_err(|e| FirelinkError::QueryFailure(format!("unreadable runQuery response: {e}")))
    }
}
