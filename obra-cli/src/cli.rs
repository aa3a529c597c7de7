use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

#[derive(Parser, Debug)]
#[command(
    name = "obra",
    version,
    about = "Admin client for the Obra CMS API.",
    long_about = "Logs in against the CMS, lists content and stages project edits (fields, \
                  images and videos) that are sent as a single request."
)]
pub struct Cli {
    /// API root, e.g. https://api.example.com/api/
    #[arg(long, global = true, env = "OBRA__API__BASE_URL")]
    pub base_url: Option<String>,

    /// File that keeps the session between runs.
    #[arg(long, global = true, value_hint = ValueHint::FilePath, env = "OBRA__AUTH__STORAGE_PATH")]
    pub session_file: Option<PathBuf>,

    /// Print records as JSON instead of a summary.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exchange credentials for a session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "OBRA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    #[command(subcommand)]
    Projects(ProjectsCommand),
    #[command(subcommand)]
    Categories(CategoriesCommand),
    #[command(subcommand)]
    Services(ListOnly),
    #[command(subcommand)]
    Clients(ListOnly),
    #[command(subcommand)]
    Messages(MessagesCommand),
    #[command(subcommand)]
    About(ShowOnly),
    #[command(subcommand)]
    Info(ShowOnly),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = obra_core::query::DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
    #[arg(long)]
    pub search: Option<String>,
    /// Fetch everything in one unpaginated request.
    #[arg(long, action = ArgAction::SetTrue)]
    pub all: bool,
}

#[derive(Subcommand, Debug)]
pub enum ProjectsCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        category: Option<u64>,
        /// en_proceso or entregado
        #[arg(long)]
        status: Option<String>,
        #[arg(long, action = ArgAction::SetTrue)]
        featured: bool,
    },
    Show {
        slug: String,
    },
    /// Stage changes on a project and send them in one request.
    Edit {
        slug: String,
        #[command(flatten)]
        edits: EditArgs,
    },
    Create {
        #[command(flatten)]
        edits: EditArgs,
    },
    Delete {
        slug: String,
    },
    /// Replace one image right away, outside any edit.
    ReplaceImage {
        id: String,
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
    },
    /// Delete one image right away, outside any edit.
    DeleteImage {
        id: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    /// field=value
    #[arg(long = "set", value_name = "FIELD=VALUE", action = ArgAction::Append)]
    pub set: Vec<String>,
    /// Send the field as empty.
    #[arg(long = "clear", value_name = "FIELD", action = ArgAction::Append)]
    pub clear: Vec<String>,
    #[arg(long = "add-image", value_name = "PATH", value_hint = ValueHint::FilePath, action = ArgAction::Append)]
    pub add_image: Vec<PathBuf>,
    #[arg(long = "add-video", value_name = "PATH", value_hint = ValueHint::FilePath, action = ArgAction::Append)]
    pub add_video: Vec<PathBuf>,
    #[arg(long = "delete-image", value_name = "ID", action = ArgAction::Append)]
    pub delete_image: Vec<String>,
    #[arg(long = "delete-video", value_name = "ID", action = ArgAction::Append)]
    pub delete_video: Vec<String>,
    /// ID=PATH
    #[arg(long = "replace-image", value_name = "ID=PATH", action = ArgAction::Append)]
    pub replace_image: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum CategoriesCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    Create {
        name: String,
    },
    Rename {
        id: u64,
        name: String,
    },
    Delete {
        id: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum MessagesCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    MarkRead {
        id: u64,
        /// Mark as unread instead.
        #[arg(long, action = ArgAction::SetTrue)]
        unread: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListOnly {
    List {
        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum ShowOnly {
    Show,
}

impl ListArgs {
    pub fn to_query(&self) -> obra_core::ListQuery {
        let base = if self.all {
            obra_core::ListQuery::all()
        } else {
            obra_core::ListQuery::new().page(self.page).page_size(self.page_size)
        };
        match &self.search {
            Some(term) => base.search(term.clone()),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_flags_repeat() {
        let cli = Cli::try_parse_from([
            "obra",
            "projects",
            "edit",
            "casa-miraflores",
            "--set",
            "name=Casa Miraflores II",
            "--set",
            "levels=3",
            "--clear",
            "area",
            "--delete-image",
            "101",
            "--add-image",
            "fachada.jpg",
            "--replace-image",
            "102=patio.jpg",
        ])
        .unwrap();

        let Command::Projects(ProjectsCommand::Edit { slug, edits }) = cli.command else {
            panic!("expected projects edit");
        };
        assert_eq!(slug, "casa-miraflores");
        assert_eq!(edits.set, vec!["name=Casa Miraflores II", "levels=3"]);
        assert_eq!(edits.clear, vec!["area"]);
        assert_eq!(edits.delete_image, vec!["101"]);
        assert_eq!(edits.add_image, vec![PathBuf::from("fachada.jpg")]);
        assert_eq!(edits.replace_image, vec!["102=patio.jpg"]);
    }

    #[test]
    fn list_args_build_queries() {
        let cli = Cli::try_parse_from(["obra", "messages", "list", "--all", "--search", "cotización"]).unwrap();
        let Command::Messages(MessagesCommand::List { list }) = cli.command else {
            panic!("expected messages list");
        };
        let keys: Vec<String> = list.to_query().to_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["no_page", "search"]);
    }
}
