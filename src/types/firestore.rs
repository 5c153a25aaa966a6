use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a `documents:runQuery` call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
}

/// One element of the `runQuery` response stream. An empty result set still
/// yields one element carrying only `readTime`, so consumers must filter on
/// the presence of `document`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponseItem {
    #[serde(default)]
    pub document: Option<FirestoreDocument>,
    #[serde(default)]
    pub read_time: Option<String>,
}

/// A stored document. Fields stay opaque JSON; the probe never inspects
/// document contents.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirestoreDocument {
    pub name: String,
    #[serde(default)]
    pub fields: Option<Value>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

impl RunQueryRequest {
    pub fn bounded(collection_id: impl Into<String>, limit: u32) -> Self {
        Self {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection_id.into(),
                }],
                limit: Some(limit),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_request_serializes_to_the_wire_casing() {
        let request = RunQueryRequest::bounded("test", 1);
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "structuredQuery": {
                    "from": [{"collectionId": "test"}],
                    "limit": 1
                }
            })
        );
    }

    #[test]
    fn empty_result_items_carry_no_document() {
        let items: Vec<RunQueryResponseItem> =
            serde_json::from_str(r#"[{"readTime": "2024-01-01T00:00:00.000000Z"}]"#)
                .expect("deserialize");
        assert_eq!(items.len(), 1);
        assert!(items[0].document.is_none());
    }

    #[test]
    fn matched_documents_deserialize_with_opaque_fields() {
        let items: Vec<RunQueryResponseItem> = serde_json::from_str(
            r#"[{
                "document": {
                    "name": "projects/p/databases/(default)/documents/test/doc1",
                    "fields": {"greeting": {"stringValue": "hola"}},
                    "createTime": "2024-01-01T00:00:00.000000Z",
                    "updateTime": "2024-01-02T00:00:00.000000Z"
                },
                "readTime": "2024-01-03T00:00:00.000000Z"
            }]"#,
        )
        .expect("deserialize");
        let doc = items[0].document.as_ref().expect("document present");
        assert!(doc.name.ends_with("test/doc1"));
        assert!(doc.fields.is_some());
    }
}
