use anyhow::Context;
use helpdesk_api::{
    attachment_file_name, attachment_kind, AttachmentKind, AuthToken, CommentId, CommentsApi,
    FileUpload, NotificationsApi, TicketId, UserId, Uuid,
};
use helpdesk_client::{time_ago, CommentNode, HttpApi, ThreadSession};
use std::path::PathBuf;

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long)]
    host: String,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Print a ticket's comment thread
    Show {
        /// Ticket id
        ticket: String,
    },

    /// Print a ticket's comment thread and reprint it on every live update
    Watch {
        /// Ticket id
        ticket: String,
    },

    /// Post a top-level comment
    Comment {
        /// Ticket id
        ticket: String,

        /// Comment text
        text: String,

        /// Files to attach
        #[structopt(short, long)]
        file: Vec<PathBuf>,
    },

    /// Post a reply under an existing comment
    Reply {
        /// Ticket id
        ticket: String,

        /// Comment to reply to
        parent: String,

        /// Reply text
        text: String,

        /// Files to attach
        #[structopt(short, long)]
        file: Vec<PathBuf>,
    },

    /// Replace a comment's text
    Edit {
        /// Comment id
        comment: String,

        /// New text
        text: String,

        /// Files to attach
        #[structopt(short, long)]
        file: Vec<PathBuf>,
    },

    /// Delete a comment
    Delete {
        /// Comment id
        comment: String,
    },

    /// List this user's notifications
    Notifications,
}

fn auth_token() -> anyhow::Result<AuthToken> {
    let tok = std::env::var("HELPDESK_TOKEN")
        .context("retrieving HELPDESK_TOKEN environment variable")?;
    let tok = Uuid::try_parse(&tok).context("parsing HELPDESK_TOKEN as an auth token")?;
    Ok(AuthToken(tok))
}

fn user_id() -> anyhow::Result<UserId> {
    let user =
        std::env::var("HELPDESK_USER").context("retrieving HELPDESK_USER environment variable")?;
    let user = Uuid::try_parse(&user).context("parsing HELPDESK_USER as a user id")?;
    Ok(UserId(user))
}

fn ticket_id(s: &str) -> anyhow::Result<TicketId> {
    Ok(TicketId(
        Uuid::try_parse(s).context("parsing ticket id")?,
    ))
}

fn comment_id(s: &str) -> anyhow::Result<CommentId> {
    Ok(CommentId(
        Uuid::try_parse(s).context("parsing comment id")?,
    ))
}

fn read_files(paths: Vec<PathBuf>) -> anyhow::Result<Vec<FileUpload>> {
    paths
        .into_iter()
        .map(|p| {
            let file_name = p
                .file_name()
                .with_context(|| format!("no file name in path {}", p.display()))?
                .to_string_lossy()
                .into_owned();
            let bytes =
                std::fs::read(&p).with_context(|| format!("reading file {}", p.display()))?;
            Ok(FileUpload { file_name, bytes })
        })
        .collect()
}

fn forest_lines(forest: &[CommentNode]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack = forest.iter().rev().map(|n| (n, 0usize)).collect::<Vec<_>>();
    while let Some((node, depth)) = stack.pop() {
        let c = &node.comment;
        lines.push(format!(
            "{:indent$}[{}] {} ({}): {}",
            "",
            c.id.0,
            c.user.name,
            time_ago(c.created_at),
            c.text,
            indent = depth * 2,
        ));
        for a in &c.attachments {
            let kind = match attachment_kind(a) {
                AttachmentKind::Image => "image",
                AttachmentKind::Download => "download",
            };
            lines.push(format!(
                "{:indent$}  + {} ({kind})",
                "",
                attachment_file_name(a),
                indent = depth * 2,
            ));
        }
        for reply in node.replies.iter().rev() {
            stack.push((reply, depth + 1));
        }
    }
    lines
}

fn print_forest(forest: &[CommentNode]) {
    for line in forest_lines(forest) {
        println!("{line}");
    }
}

// Failed commands show the same message the web UI would alert with.
fn user_error(err: helpdesk_api::Error) -> anyhow::Error {
    anyhow::anyhow!("{}", err.user_message())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = <Opt as structopt::StructOpt>::from_args();

    let mut api = HttpApi::new(opt.host, auth_token()?, user_id()?);

    match opt.cmd {
        Command::Show { ticket } => {
            let comments = api
                .fetch_comments(ticket_id(&ticket)?)
                .await
                .map_err(user_error)?;
            print_forest(&helpdesk_client::build_forest(&comments));
        }
        Command::Watch { ticket } => {
            let mut session = ThreadSession::open(api, ticket_id(&ticket)?)
                .await
                .map_err(user_error)?;
            print_forest(session.thread().forest());
            while let Some(msg) = session.next_feed_message().await {
                if session.handle_feed(msg).await.map_err(user_error)? {
                    println!();
                    print_forest(session.thread().forest());
                }
            }
            session.close().await.map_err(user_error)?;
        }
        Command::Comment { ticket, text, file } => {
            let comment = helpdesk_api::NewComment::root(text, read_files(file)?);
            api.create_comment(ticket_id(&ticket)?, comment)
                .await
                .map_err(user_error)?;
        }
        Command::Reply {
            ticket,
            parent,
            text,
            file,
        } => {
            let comment =
                helpdesk_api::NewComment::reply(comment_id(&parent)?, text, read_files(file)?);
            api.create_comment(ticket_id(&ticket)?, comment)
                .await
                .map_err(user_error)?;
        }
        Command::Edit {
            comment,
            text,
            file,
        } => {
            let edit = helpdesk_api::CommentEdit::new(text, read_files(file)?);
            api.edit_comment(comment_id(&comment)?, edit)
                .await
                .map_err(user_error)?;
        }
        Command::Delete { comment } => {
            api.delete_comment(comment_id(&comment)?)
                .await
                .map_err(user_error)?;
        }
        Command::Notifications => {
            for n in api.fetch_notifications().await.map_err(user_error)? {
                let read = if n.is_read { " " } else { "*" };
                println!("{read} [{}] {} ({})", n.id.0, n.message, time_ago(n.created_at));
            }
        }
    }

    Ok(())
}
