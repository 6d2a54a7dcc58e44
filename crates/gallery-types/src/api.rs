use serde::{Deserialize, Serialize};

use crate::models::{Asset, OwnerScope};

// -- JWT Claims --

/// JWT claims shared by the HTTP service (verification) and clients/tests
/// (issuing). `sub` is the caller's owner scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

impl Claims {
    pub fn scope(&self) -> OwnerScope {
        OwnerScope::new(self.sub.clone())
    }
}

// -- Objects --

#[derive(Debug, Serialize, Deserialize)]
pub struct ListObjectsResponse {
    pub objects: Vec<Asset>,
    pub total: usize,
}

/// Query string of `POST /containers/{container}/objects/{id}`.
///
/// `readers` is a comma-separated list of owner scopes.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateObjectQuery {
    pub name: String,
    pub readers: String,
}

impl CreateObjectQuery {
    pub fn new(name: &str, readers: &[OwnerScope]) -> Self {
        let readers = readers
            .iter()
            .map(OwnerScope::as_str)
            .collect::<Vec<_>>()
            .join(",");
        Self {
            name: name.to_string(),
            readers,
        }
    }

    pub fn reader_scopes(&self) -> Vec<OwnerScope> {
        self.readers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(OwnerScope::new)
            .collect()
    }
}

/// Query string of `GET /containers/{container}/objects/{id}/view`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ViewQuery {
    pub token: Option<String>,
}
