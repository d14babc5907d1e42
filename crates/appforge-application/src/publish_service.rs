//! Publish/fetch and image staging orchestration.
//!
//! Thin delegation over the repository contracts; the engine core never
//! talks to storage directly.

use appforge_core::error::{AppforgeError, Result};
use appforge_core::repository::{ImageRepository, PublishRepository, PublishedApp};
use appforge_core::session::{Artifact, Session};
use std::sync::Arc;

pub struct PublishService {
    publish_repository: Arc<dyn PublishRepository>,
    image_repository: Arc<dyn ImageRepository>,
}

impl PublishService {
    pub fn new(
        publish_repository: Arc<dyn PublishRepository>,
        image_repository: Arc<dyn ImageRepository>,
    ) -> Self {
        Self {
            publish_repository,
            image_repository,
        }
    }

    /// Publishes an artifact on behalf of a user.
    ///
    /// # Errors
    ///
    /// Refuses to publish the fallback error artifact.
    pub async fn publish(
        &self,
        artifact: &Artifact,
        user_id: &str,
        image_url: Option<String>,
    ) -> Result<PublishedApp> {
        if artifact.is_error() {
            return Err(AppforgeError::invalid_state(
                "cannot publish the error artifact",
            ));
        }
        let app = PublishedApp::new(
            &artifact.name,
            &artifact.code,
            &artifact.icon,
            user_id,
            image_url,
        );
        self.publish_repository.save(&app).await?;
        tracing::info!(app_id = %app.id, user_id, "published app");
        Ok(app)
    }

    /// Fetches one published app for read-only rendering.
    pub async fn get_app(&self, id: &str) -> Result<PublishedApp> {
        self.publish_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppforgeError::not_found("published app", id))
    }

    /// Lists a user's published apps, most recent first.
    pub async fn list_apps(&self, user_id: &str) -> Result<Vec<PublishedApp>> {
        self.publish_repository.list_by_user(user_id).await
    }

    /// Persists an uploaded image (data URL) and returns its opaque id.
    pub async fn stage_image(&self, data_url: &str) -> Result<String> {
        self.image_repository.stage(data_url).await
    }

    /// Resolves a staged image id and attaches the data URL to the
    /// session for its next turn.
    pub async fn attach_image(&self, session: &mut Session, image_id: &str) -> Result<()> {
        let data_url = self
            .image_repository
            .resolve(image_id)
            .await?
            .ok_or_else(|| AppforgeError::not_found("staged image", image_id))?;
        session.stage_image(data_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryPublishRepository {
        apps: Mutex<HashMap<String, PublishedApp>>,
    }

    #[async_trait]
    impl PublishRepository for InMemoryPublishRepository {
        async fn save(&self, app: &PublishedApp) -> Result<()> {
            self.apps.lock().unwrap().insert(app.id.clone(), app.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<PublishedApp>> {
            Ok(self.apps.lock().unwrap().get(id).cloned())
        }

        async fn list_by_user(&self, user_id: &str) -> Result<Vec<PublishedApp>> {
            Ok(self
                .apps
                .lock()
                .unwrap()
                .values()
                .filter(|app| app.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct InMemoryImageRepository {
        images: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl ImageRepository for InMemoryImageRepository {
        async fn stage(&self, data_url: &str) -> Result<String> {
            let id = uuid::Uuid::new_v4().to_string();
            self.images
                .lock()
                .unwrap()
                .insert(id.clone(), data_url.to_string());
            Ok(id)
        }

        async fn resolve(&self, id: &str) -> Result<Option<String>> {
            Ok(self.images.lock().unwrap().get(id).cloned())
        }
    }

    fn service() -> PublishService {
        PublishService::new(
            Arc::new(InMemoryPublishRepository::default()),
            Arc::new(InMemoryImageRepository::default()),
        )
    }

    #[tokio::test]
    async fn publish_then_fetch_round_trips() {
        let service = service();
        let artifact = Artifact::new("const a = 1", "Sudoku", "grid-3x3");

        let app = service.publish(&artifact, "user-1", None).await.unwrap();
        let fetched = service.get_app(&app.id).await.unwrap();
        assert_eq!(fetched.code, "const a = 1");
        assert_eq!(fetched.user_id, "user-1");

        let listed = service.list_apps("user-1").await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn error_artifact_is_never_published() {
        let service = service();
        let err = service
            .publish(&Artifact::error(), "user-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppforgeError::InvalidState(_)));
    }

    #[tokio::test]
    async fn staged_image_attaches_to_the_next_turn() {
        let service = service();
        let mut session = Session::new("t");

        let id = service.stage_image("data:image/png;base64,AA").await.unwrap();
        service.attach_image(&mut session, &id).await.unwrap();
        assert_eq!(
            session.staged_image.as_deref(),
            Some("data:image/png;base64,AA")
        );

        let err = service
            .attach_image(&mut session, "missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
