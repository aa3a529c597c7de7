use anyhow::{bail, Result};
use obra_core::ObraResource;
use obra_form::EntityForm;
use obra_media::MediaId;
use obra_rest::models::ProjectStatus;
use obra_rest::submit_session;

use super::{finish, form, print_page, print_record};
use crate::cli::{EditArgs, ProjectsCommand};
use crate::edit::{read_local_file, EditPlan};
use crate::App;

pub async fn run(app: &App, command: ProjectsCommand) -> Result<()> {
    let projects = app.api.projects();
    match command {
        ProjectsCommand::List {
            list,
            category,
            status,
            featured,
        } => {
            let status = status
                .map(|s| s.parse::<ProjectStatus>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let page = projects
                .find_filtered(list.to_query(), category, status, featured.then_some(true))
                .await?;
            print_page(app, &page)
        }
        ProjectsCommand::Show { slug } => {
            let project = projects.get(&slug).await?;
            print_record(&project, app.json)?;
            if !app.json {
                for image in &project.images {
                    println!("imagen {}: {}", image.id, image.image);
                }
                for video in &project.videos {
                    println!("video {}: {}", video.id, video.video);
                }
            }
            Ok(())
        }
        ProjectsCommand::Edit { slug, edits } => edit(app, slug, edits).await,
        ProjectsCommand::Create { edits } => create(app, edits).await,
        ProjectsCommand::Delete { slug } => {
            projects.remove(&slug).await?;
            println!("Proyecto {slug} eliminado");
            Ok(())
        }
        ProjectsCommand::ReplaceImage { id, path } => {
            let file = read_local_file(&path)?;
            let media = app.api.project_images().replace_now(&MediaId::from(id), file).await?;
            println!("imagen {}: {}", media.id, media.url);
            Ok(())
        }
        ProjectsCommand::DeleteImage { id } => {
            app.api.project_images().delete_now(&MediaId::from(id.as_str())).await?;
            println!("imagen {id} eliminada");
            Ok(())
        }
    }
}

async fn edit(app: &App, slug: String, edits: EditArgs) -> Result<()> {
    let plan = EditPlan::parse(&edits)?;
    if plan.is_empty() {
        bail!("nada que cambiar; usa --set, --clear, --add-image, ...");
    }

    let projects = app.api.projects();
    let record = projects.get(&slug).await?;
    let mut session = form(app, EntityForm::project())
        .open(&serde_json::to_value(&record)?)
        .with_key(slug);
    plan.apply(&mut session, &app.events)?;
    if !session.is_dirty() {
        session.cancel();
        bail!("ningún cambio aceptado");
    }

    finish(app, submit_session(&projects, session, &app.events).await)
}

async fn create(app: &App, edits: EditArgs) -> Result<()> {
    let plan = EditPlan::parse(&edits)?;
    let mut session = form(app, EntityForm::project()).create();
    plan.apply(&mut session, &app.events)?;
    finish(app, submit_session(&app.api.projects(), session, &app.events).await)
}
