//! Project persistence. The REST implementation targets a PostgREST-style
//! table endpoint with row-level scoping by `user_id`; the in-memory store
//! backs tests and the offline demo flow.

use crate::book::{BookProject, ProjectStatus};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Insert a project row, returning its id.
    async fn save(&self, project: &BookProject) -> Result<String>;
    async fn load(&self, id: &str) -> Result<BookProject>;
    /// Projects owned by the given user, most recently updated first.
    async fn list(&self, user_id: &str) -> Result<Vec<BookProject>>;
    async fn update_status(&self, id: &str, status: ProjectStatus) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<()>;
}

// --- REST implementation ---

pub struct RestProjectStore {
    table_url: Url,
    api_key: String,
    client: reqwest::Client,
}

impl RestProjectStore {
    pub fn new(table_url: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            table_url: Url::parse(table_url)?,
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn filtered(&self, column: &str, value: &str) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair(column, &format!("eq.{value}"));
        url
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("store backend returned {}: {}", status, body));
        }
        Ok(resp)
    }
}

#[async_trait]
impl ProjectStore for RestProjectStore {
    async fn save(&self, project: &BookProject) -> Result<String> {
        let resp = self
            .request(self.client.post(self.table_url.clone()))
            .header("Prefer", "return=representation")
            .json(project)
            .send()
            .await?;
        let rows: Vec<BookProject> = Self::check(resp).await?.json().await?;
        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| anyhow!("insert returned no rows"))
    }

    async fn load(&self, id: &str) -> Result<BookProject> {
        let resp = self
            .request(self.client.get(self.filtered("id", id)))
            .send()
            .await?;
        let rows: Vec<BookProject> = Self::check(resp).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("project {} not found", id))
    }

    async fn list(&self, user_id: &str) -> Result<Vec<BookProject>> {
        let mut url = self.filtered("user_id", user_id);
        url.query_pairs_mut().append_pair("order", "updated_at.desc");
        let resp = self.request(self.client.get(url)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn update_status(&self, id: &str, status: ProjectStatus) -> Result<()> {
        let body = json!({
            "status": status,
            "updated_at": Utc::now(),
        });
        let resp = self
            .request(self.client.patch(self.filtered("id", id)))
            .json(&body)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let resp = self
            .request(self.client.delete(self.filtered("id", id)))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

// --- In-memory implementation ---

#[derive(Default)]
pub struct MemoryProjectStore {
    rows: Mutex<HashMap<String, BookProject>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn save(&self, project: &BookProject) -> Result<String> {
        let mut rows = self.rows.lock().expect("store lock");
        rows.insert(project.id.clone(), project.clone());
        Ok(project.id.clone())
    }

    async fn load(&self, id: &str) -> Result<BookProject> {
        let rows = self.rows.lock().expect("store lock");
        rows.get(id)
            .cloned()
            .ok_or_else(|| anyhow!("project {} not found", id))
    }

    async fn list(&self, user_id: &str) -> Result<Vec<BookProject>> {
        let rows = self.rows.lock().expect("store lock");
        let mut projects: Vec<BookProject> = rows
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    async fn update_status(&self, id: &str, status: ProjectStatus) -> Result<()> {
        let mut rows = self.rows.lock().expect("store lock");
        let project = rows
            .get_mut(id)
            .ok_or_else(|| anyhow!("project {} not found", id))?;
        project.status = status;
        project.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut rows = self.rows.lock().expect("store lock");
        rows.remove(id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("project {} not found", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn project(id: &str, user: &str) -> BookProject {
        BookProject {
            id: id.to_string(),
            user_id: user.to_string(),
            title: "T".to_string(),
            author: "A".to_string(),
            book_idea: "idea".to_string(),
            topic: "topic".to_string(),
            outline: None,
            status: ProjectStatus::Draft,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_crud() {
        let store = MemoryProjectStore::new();
        let id = store.save(&project("p1", "u1")).await.unwrap();
        assert_eq!(id, "p1");

        let loaded = store.load("p1").await.unwrap();
        assert_eq!(loaded.status, ProjectStatus::Draft);

        store
            .update_status("p1", ProjectStatus::OutlineComplete)
            .await
            .unwrap();
        assert_eq!(
            store.load("p1").await.unwrap().status,
            ProjectStatus::OutlineComplete
        );

        store.delete("p1").await.unwrap();
        assert!(store.load("p1").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_list_scoped_and_ordered() {
        let store = MemoryProjectStore::new();
        let mut older = project("p1", "u1");
        older.updated_at = Utc::now() - Duration::hours(1);
        store.save(&older).await.unwrap();
        store.save(&project("p2", "u1")).await.unwrap();
        store.save(&project("p3", "u2")).await.unwrap();

        let list = store.list("u1").await.unwrap();
        assert_eq!(list.len(), 2);
        // Most recently updated first.
        assert_eq!(list[0].id, "p2");
        assert!(store.list("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_missing_rows_error() {
        let store = MemoryProjectStore::new();
        assert!(store.load("nope").await.is_err());
        assert!(store.delete("nope").await.is_err());
        assert!(store
            .update_status("nope", ProjectStatus::Complete)
            .await
            .is_err());
    }
}
