use anyhow::{Context, Result, bail};
use appforge_application::{TurnOutcome, TurnUsecase, build_agent};
use appforge_core::session::{Session, SessionRepository};
use appforge_infrastructure::{ConfigService, JsonDirSessionRepository, SecretService};
use base64::Engine as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub struct GenerateArgs {
    pub prompt: String,
    pub model: Option<String>,
    pub session: Option<String>,
    pub image: Option<String>,
    pub out: Option<String>,
    pub api_key: Option<String>,
}

pub async fn run(args: GenerateArgs) -> Result<()> {
    let config_service = ConfigService::new();
    let secret_service = SecretService::new();
    let config = config_service.get_config();
    let agent = Arc::new(build_agent(&config_service, &secret_service));
    let usecase = TurnUsecase::new(agent);

    let repo = JsonDirSessionRepository::default().await?;
    let mut session = match &args.session {
        Some(id) => repo
            .find_by_id(id)
            .await?
            .with_context(|| format!("session not found: {}", id))?,
        None => Session::new(session_title(&args.prompt)),
    };

    if let Some(path) = &args.image {
        session.stage_image(read_image_as_data_url(path)?);
    }

    let model = args.model.unwrap_or(config.default_model);
    let outcome = usecase
        .submit(&mut session, &args.prompt, &model, args.api_key.clone())
        .await?;

    match outcome {
        TurnOutcome::Completed(artifact) => {
            println!("✅ {} (version {})", artifact.name, session.versions.len());
            match &args.out {
                Some(path) => {
                    fs::write(path, &artifact.code)
                        .with_context(|| format!("Failed to write {}", path))?;
                    println!("  ✓ Wrote {}", path);
                }
                None => println!("{}", artifact.code),
            }

            let suggestions = usecase
                .refresh_suggestions(&mut session, args.api_key)
                .await;
            if !suggestions.is_empty() {
                println!("\n💡 Next steps:");
                for suggestion in &suggestions {
                    println!("  - {}", suggestion);
                }
            }
            repo.save(&session).await?;
            println!("\nSession: {}", session.id);
        }
        TurnOutcome::Failed(err) => {
            repo.save(&session).await?;
            bail!("generation failed: {}", err);
        }
        TurnOutcome::CredentialRequired => {
            repo.save(&session).await?;
            bail!(
                "free request limit reached; run `appforge config set-key <API_KEY>` \
                 or pass --api-key and retry"
            );
        }
    }

    Ok(())
}

fn session_title(prompt: &str) -> String {
    let mut title: String = prompt.chars().take(40).collect();
    if prompt.chars().count() > 40 {
        title.push('…');
    }
    title
}

fn read_image_as_data_url(path: &str) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path))?;
    let mime = match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        other => bail!("unsupported image type: {:?}", other),
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, encoded))
}
