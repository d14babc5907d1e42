use anyhow::{Context, Result, bail};
use appforge_application::PublishService;
use appforge_core::session::SessionRepository;
use appforge_infrastructure::{
    JsonDirImageRepository, JsonDirPublishRepository, JsonDirSessionRepository,
};
use std::sync::Arc;

async fn service() -> Result<PublishService> {
    Ok(PublishService::new(
        Arc::new(JsonDirPublishRepository::default().await?),
        Arc::new(JsonDirImageRepository::default().await?),
    ))
}

pub async fn list(user: &str) -> Result<()> {
    let apps = service().await?.list_apps(user).await?;
    if apps.is_empty() {
        println!("No published apps for '{}'", user);
        return Ok(());
    }
    for app in apps {
        println!("{}  {:<30} {}", app.id, app.name, app.created_at);
    }
    Ok(())
}

pub async fn show(id: &str) -> Result<()> {
    let app = service().await?.get_app(id).await?;
    println!("Name: {}", app.name);
    println!("Icon: {}", app.icon);
    println!("Owner: {}", app.user_id);
    println!("Published: {}", app.created_at);
    println!("\n{}", app.code);
    Ok(())
}

pub async fn publish(session_id: &str, user: &str) -> Result<()> {
    let repo = JsonDirSessionRepository::default().await?;
    let session = repo
        .find_by_id(session_id)
        .await?
        .with_context(|| format!("session not found: {}", session_id))?;
    let Some(artifact) = &session.artifact else {
        bail!("session has no app to publish yet");
    };

    let app = service().await?.publish(artifact, user, None).await?;
    println!("✅ Published '{}' as {}", app.name, app.id);
    Ok(())
}
