/// Database row types. Distinct from gallery-types models to keep the DB
/// layer independent.

#[derive(Debug, Clone)]
pub struct AssetRow {
    pub id: String,
    pub container: String,
    pub name: String,
    pub size: i64,
    pub sha256: String,
    pub created_at: String,
    /// Reader scopes, sorted.
    pub readers: Vec<String>,
}
