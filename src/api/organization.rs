//! Organization API
//!
//! Department tree and personnel endpoints.

use crate::error::Result;
use crate::helpers::{Params, params};
use crate::http::HttpClient;
use crate::list::PageFetcher;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const TOP_NODES_PATH: &str = "personBySfzt/dept/topNodes";
const SUB_NODES_PATH: &str = "personBySfzt/dept/subNodes";
const PERSONNEL_LIST_PATH: &str = "personBySfzt/dept/user/list";

/// A department node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: i64,
    /// Department code used to query child nodes
    #[serde(default)]
    pub dwh: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_parent: bool,
    #[serde(default)]
    pub children: Vec<Organization>,
}

/// A person record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personnel {
    pub id: String,
    /// Staff number
    #[serde(default)]
    pub xgh: String,
    /// Display name
    #[serde(default)]
    pub xm: String,
    /// Department rows share the personnel list and are never selectable
    #[serde(default, rename = "isParent")]
    pub is_parent: bool,
    /// Fields the backend adds per endpoint
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An area node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaItem {
    pub id: String,
    pub name: String,
    /// "0" for root areas
    #[serde(default)]
    pub parent_id: String,
}

/// Organization endpoints
#[derive(Debug, Clone)]
pub struct OrganizationApi {
    http: HttpClient,
}

impl OrganizationApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Root departments
    pub async fn top_nodes(&self) -> Result<Vec<Organization>> {
        self.http.get(TOP_NODES_PATH, &Params::new()).await
    }

    /// Children of the department identified by `dwh`
    pub async fn sub_nodes(&self, dwh: &str) -> Result<Vec<Organization>> {
        self.http.get(SUB_NODES_PATH, &params([("dwh", dwh)])).await
    }

    /// One page of personnel; returns the raw body for the list engine
    pub async fn personnel_page(&self, query: &Params) -> Result<Value> {
        self.http.get_json(PERSONNEL_LIST_PATH, query).await
    }
}

#[async_trait]
impl PageFetcher for OrganizationApi {
    async fn fetch(&self, params: Params) -> Result<Value> {
        self.personnel_page(&params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_personnel_keeps_extra_fields() {
        let person: Personnel = serde_json::from_value(json!({
            "id": "u1",
            "xgh": "2024001",
            "xm": "Li Lei",
            "dwmc": "Field Team A"
        }))
        .expect("decode");

        assert_eq!(person.xm, "Li Lei");
        assert!(!person.is_parent);
        assert_eq!(person.extra.get("dwmc"), Some(&json!("Field Team A")));
    }

    #[test]
    fn test_personnel_department_row() {
        let row: Personnel =
            serde_json::from_value(json!({"id": "d1", "xm": "Ops", "isParent": true}))
                .expect("decode");

        assert!(row.is_parent);
        assert_eq!(row.xgh, "");
        assert!(!row.extra.contains_key("isParent"));
    }

    #[test]
    fn test_organization_tree_decodes() {
        let nodes: Vec<Organization> = serde_json::from_value(json!([
            {"id": 1, "name": "HQ", "dwh": "01", "isParent": true,
             "children": [{"id": 2, "name": "Ops"}]}
        ]))
        .expect("decode");

        assert!(nodes[0].is_parent);
        assert_eq!(nodes[0].children[0].name, "Ops");
        assert_eq!(nodes[0].children[0].dwh, None);
    }
}
