use std::path::Path;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::analysis::{IngredientExtractor, LabelSplitExtractor};
use crate::cli::{Command, DietAction, ProfileAction};
use crate::diet::{self, DietType};
use crate::error::UploadError;
use crate::pages::{self, loading::LoadingStatus, result::ResultView};
use crate::state::AppState;
use crate::upload::{self, ImageFile, UploadOutcome};

pub async fn run(st: AppState, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Onboard { diet } => {
            let push = diet::services::onboard(&st, diet).await?;
            settle(push).await;
            println!("Diet type set to {}", diet.display_name());
        }
        Command::Diet { action } => match action.unwrap_or(DietAction::Show) {
            DietAction::Show => {
                let view = pages::settings::open(&st).await?;
                println!("{}", view.diet_label);
                for icon in view.icons {
                    let mark = if icon.active { "x" } else { " " };
                    println!("  [{mark}] {}", icon.group.as_str());
                }
            }
            DietAction::Set { diet } => {
                let push = pages::settings::change_diet(&st, diet).await?;
                settle(push).await;
                println!("Diet type set to {}", diet.display_name());
            }
            DietAction::List => {
                for d in DietType::ALL {
                    println!("{}", d.as_str());
                }
            }
        },
        Command::Profile { action } => match action.unwrap_or(ProfileAction::Show) {
            ProfileAction::Show => {
                let view = pages::home::open(&st).await?;
                if view.needs_onboarding {
                    println!("No diet type chosen yet; run `greenscan onboard <diet>`");
                }
                println!("name:   {}", view.profile.name.as_deref().unwrap_or("-"));
                println!(
                    "avatar: {}",
                    if view.profile.avatar.is_some() { "set" } else { "-" }
                );
                if let Some(d) = view.diet {
                    println!("diet:   {}", d.display_name());
                }
            }
            ProfileAction::Rename { name } => {
                if pages::settings::rename(&st, &name).await? {
                    println!("Name saved");
                } else {
                    println!("Name unchanged");
                }
            }
            ProfileAction::Avatar { image } => {
                let image = load_image(&st, &image).await?;
                pages::settings::change_avatar(&st, &image).await?;
                println!("Profile image saved");
            }
        },
        Command::Scan { image } => {
            let image = load_image(&st, &image).await?;
            scan(&st, image).await?
        }
        Command::Status => match pages::loading::poll(&st).await? {
            LoadingStatus::Pending { .. } => println!("No result yet"),
            LoadingStatus::Ready => println!("Result ready; run `greenscan result`"),
            LoadingStatus::Failed { message } => println!("{message}"),
        },
        Command::Result => show_result(&st).await?,
        Command::Extract { source } => {
            let text = if source == "-" {
                let mut buf = String::new();
                tokio::io::stdin().read_to_string(&mut buf).await?;
                buf
            } else {
                tokio::fs::read_to_string(&source)
                    .await
                    .with_context(|| format!("read {source}"))?
            };
            for token in LabelSplitExtractor.extract(Some(text.as_str())) {
                println!("{token}");
            }
        }
    }
    Ok(())
}

async fn scan(st: &AppState, image: ImageFile) -> anyhow::Result<()> {
    println!("Analysing {} ...", image.file_name);

    let task = pages::home::scan(st, image);
    tokio::pin!(task);
    let started = loop {
        tokio::select! {
            res = &mut task => break res,
            _ = tokio::signal::ctrl_c() => {
                if upload::services::cancel(st) {
                    println!("Cancelling ...");
                }
            }
        }
    };

    let outcome = match started {
        Ok(outcome) => outcome,
        Err(e) => anyhow::bail!(e.user_message()),
    };
    st.session.acknowledge();

    match outcome {
        UploadOutcome::Completed(_) => show_result(st).await,
        UploadOutcome::Failed(e) => {
            // the loading page reports the failure and clears the record
            if let LoadingStatus::Failed { message } = pages::loading::poll(st).await? {
                anyhow::bail!(message);
            }
            anyhow::bail!(e.user_message())
        }
    }
}

async fn show_result(st: &AppState) -> anyhow::Result<()> {
    match pages::result::open(st).await? {
        ResultView::Show(report) => {
            println!("{}", report.verdict.message());
            for b in &report.boxes {
                let items = if b.enabled {
                    b.ingredients.join(", ")
                } else {
                    "-".to_string()
                };
                println!(
                    "  {:<8} ({}): {}",
                    b.kind.as_str(),
                    b.ingredients.len(),
                    items
                );
            }
        }
        ResultView::Redirect { to, after, message } => {
            println!("{message}");
            tokio::time::sleep(after).await;
            println!("Back to {to}");
        }
    }
    Ok(())
}

async fn load_image(st: &AppState, path: &Path) -> anyhow::Result<ImageFile> {
    ImageFile::from_path(path, st.config.max_image_bytes)
        .await
        .map_err(|e| {
            if let Some(rejected) = e.downcast_ref::<UploadError>() {
                return anyhow::anyhow!(rejected.user_message());
            }
            e
        })
}

/// Waits for a fire-and-forget request so the process does not exit first.
async fn settle(push: JoinHandle<()>) {
    if let Err(e) = push.await {
        warn!(error = %e, "diet type push task failed");
    }
}
