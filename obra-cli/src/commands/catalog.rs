use anyhow::Result;
use obra_core::ObraResource;
use obra_form::EntityForm;
use obra_rest::submit_session;

use super::{finish, form, print_page, print_record};
use crate::cli::{CategoriesCommand, ListOnly};
use crate::App;

pub async fn categories(app: &App, command: CategoriesCommand) -> Result<()> {
    let categories = app.api.categories();
    match command {
        CategoriesCommand::List { list } => print_page(app, &categories.find(&list.to_query()).await?),
        CategoriesCommand::Create { name } => {
            let mut session = form(app, EntityForm::category()).create();
            session.set_input("name", &name)?;
            finish(app, submit_session(&categories, session, &app.events).await)
        }
        CategoriesCommand::Rename { id, name } => {
            let current = categories.get(&id.to_string()).await?;
            let mut session = form(app, EntityForm::category())
                .open(&serde_json::to_value(&current)?)
                .with_key(id.to_string());
            session.set_input("name", &name)?;
            finish(app, submit_session(&categories, session, &app.events).await)
        }
        CategoriesCommand::Delete { id } => {
            categories.remove(&id.to_string()).await?;
            println!("Categoría {id} eliminada");
            Ok(())
        }
    }
}

pub async fn services(app: &App, command: ListOnly) -> Result<()> {
    let ListOnly::List { list } = command;
    print_page(app, &app.api.services().find(&list.to_query()).await?)
}

pub async fn clients(app: &App, command: ListOnly) -> Result<()> {
    let ListOnly::List { list } = command;
    print_page(app, &app.api.clients().find(&list.to_query()).await?)
}

pub async fn about(app: &App) -> Result<()> {
    print_record(&app.api.about().load().await?, app.json)
}

pub async fn company_info(app: &App) -> Result<()> {
    let info = app.api.company_info().load().await?;
    print_record(&info, app.json)
}
