use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use prepwise::client::{
    gateway::DEFAULT_API_URL, Access, ApiGateway, AuthForm, FileStore, GatewayError,
    RequestState, RoadmapFlow, Session, StorageError, View, FALLBACK_MESSAGE,
};
use prepwise::client::session::SessionError;
use prepwise::models::{
    CreateRoadmapItemRequest, Goal, LearningLevel, LearningSpeed, RoadmapForm,
};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "prepwise")]
#[command(about = "Command-line client for the PrepWise study planner", long_about = None)]
struct Cli {
    /// Base URL of the PrepWise API
    #[arg(long, env = "PREPWISE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Session file (defaults to <config dir>/prepwise/session.json)
    #[arg(long, env = "PREPWISE_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create an account
    Signup {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Must match --password
        #[arg(short, long)]
        confirm_password: String,
    },

    /// Print the URL that starts Google sign-in in a browser
    GoogleUrl,

    /// Finish Google sign-in from the URL the browser landed on
    OauthCallback {
        /// Full redirect URL including `token` and `user`
        url: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Ask the server whether the token is still valid
        #[arg(long)]
        remote: bool,
    },

    /// Progress stats and latest activities
    Dashboard,

    /// Most recent activities
    Activities {
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Stored roadmap and AI generation
    Roadmap {
        #[command(subcommand)]
        command: RoadmapCommands,
    },
}

#[derive(Subcommand)]
enum RoadmapCommands {
    /// List categories and items
    Show,

    /// Mark an item as completed
    Complete { id: String },

    /// Add an item (the category is created when new)
    Add {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        category: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long)]
        category_description: Option<String>,
        #[arg(long)]
        order: Option<i32>,
    },

    /// Generate a personalized roadmap
    Generate {
        /// UPSC, JEE, NEET, GATE or CA
        #[arg(long)]
        goal: Option<Goal>,
        /// "Fast learner", "Medium learner" or "Slow learner"
        #[arg(long)]
        speed: Option<LearningSpeed>,
        /// Beginner, Intermediate or Advanced
        #[arg(long)]
        level: Option<LearningLevel>,
        /// YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,
        /// YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Directory to write <goal>-roadmap.md into
        #[arg(long)]
        markdown_out: Option<PathBuf>,
        /// File to write a printable HTML document to
        #[arg(long)]
        html_out: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{}", .0.user_message())]
    Gateway(#[from] GatewayError),
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    Message(String),
}

type CliResult<T> = Result<T, CliError>;

struct Context {
    gateway: ApiGateway,
    session: Session<FileStore>,
}

impl Context {
    fn open(cli: &Cli) -> CliResult<Self> {
        let path = match &cli.session_file {
            Some(path) => path.clone(),
            None => FileStore::default_path()?,
        };
        let mut session = Session::load(FileStore::open(path)?)?;
        let token = if session.is_authenticated()? {
            session.token()?
        } else {
            None
        };

        Ok(Self {
            gateway: ApiGateway::new(&cli.api_url).with_token(token),
            session,
        })
    }

    fn require(&mut self, view: View) -> CliResult<()> {
        match self.session.guard(view)? {
            Access::Render(_) => Ok(()),
            Access::Redirect(_) => Err(CliError::Message(
                "Not signed in. Run `prepwise login` first.".to_string(),
            )),
        }
    }
}

async fn authenticate(ctx: &mut Context, mut form: AuthForm) -> CliResult<()> {
    if form.submit(&ctx.gateway, &mut ctx.session).await? {
        if let Some(user) = ctx.session.current_user()? {
            println!("✅ Signed in as {}", user.email);
        }
        Ok(())
    } else {
        Err(CliError::Message(
            form.error().unwrap_or("An error occurred").to_string(),
        ))
    }
}

fn write_file(path: PathBuf, content: &str) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CliError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&path, content).map_err(|source| CliError::Write {
        path: path.clone(),
        source,
    })?;
    println!("💾 Wrote {}", path.display());
    Ok(())
}

/// The generated roadmap text; a failed generation is an error so nothing is
/// exported and the process exits non-zero.
fn generated_roadmap(flow: &RoadmapFlow) -> CliResult<&str> {
    match flow.state() {
        RequestState::Succeeded(roadmap) => Ok(roadmap),
        RequestState::Failed => Err(CliError::Message(FALLBACK_MESSAGE.to_string())),
        RequestState::Idle | RequestState::InFlight => Err(CliError::Message(
            "Roadmap generation did not run".to_string(),
        )),
    }
}

async fn roadmap(ctx: &mut Context, command: RoadmapCommands) -> CliResult<()> {
    match command {
        RoadmapCommands::Show => {
            ctx.require(View::Roadmap)?;
            for category in ctx.gateway.roadmap().await? {
                println!("\n📚 {} - {}", category.name, category.description);
                for item in category.items {
                    let mark = if item.completed { "✔" } else { " " };
                    println!("  [{}] {} ({})", mark, item.title, item.id);
                }
            }
        }
        RoadmapCommands::Complete { id } => {
            ctx.require(View::Roadmap)?;
            let item = ctx.gateway.mark_item_completed(&id).await?;
            println!("✅ Completed: {}", item.title);
        }
        RoadmapCommands::Add {
            title,
            category,
            description,
            category_description,
            order,
        } => {
            ctx.require(View::Roadmap)?;
            let item = ctx
                .gateway
                .create_roadmap_item(&CreateRoadmapItemRequest {
                    title,
                    description,
                    category,
                    category_description,
                    order,
                })
                .await?;
            println!("✅ Added {} to {} ({})", item.title, item.category, item.id);
        }
        RoadmapCommands::Generate {
            goal,
            speed,
            level,
            start,
            end,
            markdown_out,
            html_out,
        } => {
            ctx.require(View::Generate)?;
            let mut flow = RoadmapFlow::new(RoadmapForm {
                end_goal: goal,
                learning_speed: speed,
                learning_level: level,
                start_date: start,
                end_date: end,
            });

            if !flow.submit(&ctx.gateway).await {
                for (field, message) in flow.field_errors().iter() {
                    eprintln!("  {}: {}", field, message);
                }
                return Err(CliError::Message("Roadmap form is incomplete".to_string()));
            }

            println!("{}", generated_roadmap(&flow)?);
            if let (Some(dir), Some(file)) = (markdown_out, flow.markdown_export()) {
                write_file(dir.join(&file.file_name), &file.content)?;
            }
            if let (Some(path), Some(html)) = (html_out, flow.print_export()) {
                write_file(path, &html)?;
            }
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> CliResult<()> {
    let mut ctx = Context::open(&cli)?;

    match cli.command {
        Commands::Login { email, password } => {
            authenticate(&mut ctx, AuthForm::login(email, password)).await?;
        }
        Commands::Signup {
            email,
            password,
            confirm_password,
        } => {
            authenticate(&mut ctx, AuthForm::register(email, password, confirm_password)).await?;
        }
        Commands::GoogleUrl => {
            println!("{}", ctx.gateway.google_login_url());
        }
        Commands::OauthCallback { url } => {
            let (_clean, established) = ctx.session.complete_oauth_redirect(&url)?;
            if !established {
                return Err(CliError::Message(
                    "Authentication failed. Please try again.".to_string(),
                ));
            }
            match ctx.session.current_user()? {
                Some(user) => println!("✅ Signed in as {}", user.email),
                None => println!("✅ Signed in"),
            }
        }
        Commands::Logout => {
            ctx.session.logout()?;
            println!("👋 Signed out");
        }
        Commands::Whoami { remote } => {
            ctx.require(View::Dashboard)?;
            let user = if remote {
                Some(ctx.gateway.verify().await?)
            } else {
                ctx.session.current_user()?
            };
            match user {
                Some(user) => println!(
                    "{} <{}> ({})",
                    user.name.as_deref().unwrap_or("-"),
                    user.email,
                    user.id
                ),
                None => println!("Signed in, but no user details are stored"),
            }
        }
        Commands::Dashboard => {
            ctx.require(View::Dashboard)?;
            let dashboard = ctx.gateway.dashboard().await?;
            let stats = dashboard.stats;
            println!(
                "📊 {}/{} items completed ({}%), streak: {} day(s)",
                stats.completed_items, stats.total_items, stats.progress, stats.streak
            );
            for activity in dashboard.recent_activities {
                println!("  • {} {}", activity.timestamp, activity.title);
            }
        }
        Commands::Activities { limit } => {
            ctx.require(View::Dashboard)?;
            for activity in ctx.gateway.recent_activities(limit).await? {
                match activity.details {
                    Some(details) => {
                        println!("  • {} {} ({})", activity.timestamp, activity.title, details)
                    }
                    None => println!("  • {} {}", activity.timestamp, activity.title),
                }
            }
        }
        Commands::Roadmap { command } => roadmap(&mut ctx, command).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prepwise::client::RoadmapGenerator;
    use prepwise::models::RoadmapParams;

    /// Answers with the given text, or fails like an upstream error.
    struct Fixed(Option<String>);

    #[async_trait]
    impl RoadmapGenerator for Fixed {
        async fn generate(&self, _params: &RoadmapParams) -> Result<String, GatewayError> {
            self.0.clone().ok_or(GatewayError::Status {
                status: 502,
                message: None,
            })
        }
    }

    fn complete_form() -> RoadmapForm {
        RoadmapForm {
            end_goal: Some(Goal::Gate),
            learning_speed: Some(LearningSpeed::Fast),
            learning_level: Some(LearningLevel::Advanced),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 1),
        }
    }

    #[tokio::test]
    async fn test_failed_generation_is_an_error() {
        let mut flow = RoadmapFlow::new(complete_form());
        let failing = Fixed(None);
        assert!(flow.submit(&failing).await);

        let err = generated_roadmap(&flow).unwrap_err();
        assert_eq!(err.to_string(), FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_successful_generation_yields_text() {
        let mut flow = RoadmapFlow::new(complete_form());
        assert!(flow.submit(&Fixed(Some("# GATE plan".to_string()))).await);

        assert_eq!(generated_roadmap(&flow).unwrap(), "# GATE plan");
    }

    #[test]
    fn test_unsubmitted_flow_is_an_error() {
        assert!(generated_roadmap(&RoadmapFlow::default()).is_err());
    }
}
