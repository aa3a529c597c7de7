use anyhow::Result;
use obra_core::ObraResource;

use super::print_page;
use crate::cli::MessagesCommand;
use crate::output::Summary;
use crate::App;

pub async fn run(app: &App, command: MessagesCommand) -> Result<()> {
    let messages = app.api.messages();
    match command {
        MessagesCommand::List { list } => print_page(app, &messages.find(&list.to_query()).await?),
        MessagesCommand::MarkRead { id, unread } => {
            let message = messages.mark_read(id, !unread).await?;
            println!("{}", message.summary());
            Ok(())
        }
    }
}
