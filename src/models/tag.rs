use serde::Serialize;

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct Group {
    pub id: i64,
    pub group_name: String,
    pub created_at: String,
}
