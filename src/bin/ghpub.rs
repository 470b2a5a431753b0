//! CLI for publishing documents to GitHub.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use github_publish::prelude::*;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "ghpub")]
#[command(author, version, about = "Publish documents to GitHub repositories", long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to GitHub
    Login {
        /// Print the authorization URL without launching a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Forget all stored profiles
    Logout,

    /// Show the signed-in user and organizations
    Whoami,

    /// List repositories
    Repos {
        /// Organization to list; your own repositories when omitted
        #[arg(short, long)]
        org: Option<String>,

        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// List branches of a repository
    Branches { owner: String, repo: String },

    /// List files in a repository directory
    Ls {
        owner: String,
        repo: String,

        /// Directory path; the repository root when omitted
        path: Option<String>,

        #[arg(short, long, default_value = "main")]
        branch: String,
    },

    /// Print the raw content of a file
    Cat {
        owner: String,
        repo: String,
        path: String,

        #[arg(short, long, default_value = "main")]
        branch: String,
    },

    /// Show the commit history of a file
    Log {
        owner: String,
        repo: String,
        path: String,

        #[arg(short, long, default_value = "main")]
        branch: String,
    },

    /// Create or update a file from a local file
    Push {
        owner: String,
        repo: String,

        /// Destination path in the repository
        path: String,

        /// Local file to upload
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "main")]
        branch: String,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Upload an image for use in published documents
    UploadImage {
        owner: String,
        repo: String,

        /// Destination file name in the repository
        name: String,

        /// Local image file
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "main")]
        branch: String,
    },

    /// Print a starter document
    Template {
        /// "Code sample readme", "API spec", "Conceptual article" or anything else for a simple file
        label: String,
    },
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match verbose {
        0 => "github_publish=warn,ghpub=warn",
        1 => "github_publish=debug,ghpub=debug",
        _ => "github_publish=trace,ghpub=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Template { label } = &cli.command {
        print!("{}", Template::from_label(label).content());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!(api = %config.api_base_url, "Loaded configuration");

    let host = match &cli.command {
        Commands::Login { no_browser: true } => ConsoleDialog::new().without_browser(),
        _ => ConsoleDialog::new(),
    };
    let mut service = GitHubService::new(config, host).context("Failed to open profile storage")?;

    match cli.command {
        Commands::Login { .. } => cmd_login(&mut service),
        Commands::Logout => {
            service.logout().context("Logout failed")?;
            println!("Signed out");
            Ok(())
        }
        Commands::Whoami => cmd_whoami(&mut service),
        Commands::Repos { org, page } => cmd_repos(&mut service, org, page),
        Commands::Branches { owner, repo } => {
            let branches = service.api()?.branches(&owner, &repo).send()?;
            for branch in branches {
                let marker = if branch.protected { " (protected)" } else { "" };
                println!("{}\t{}{}", branch.name, branch.commit.sha, marker);
            }
            Ok(())
        }
        Commands::Ls {
            owner,
            repo,
            path,
            branch,
        } => {
            let entries = service
                .api()?
                .files(&owner, &repo, &branch, path.as_deref())
                .send()
                .context("Failed to list files")?;
            for entry in entries {
                let suffix = if entry.is_dir() { "/" } else { "" };
                println!("{}{}", entry.path, suffix);
            }
            Ok(())
        }
        Commands::Cat {
            owner,
            repo,
            path,
            branch,
        } => {
            let content = service
                .api()?
                .file(&owner, &repo, &branch, &path)
                .send()
                .with_context(|| format!("Failed to read {}", path))?;
            print!("{}", content);
            Ok(())
        }
        Commands::Log {
            owner,
            repo,
            path,
            branch,
        } => cmd_log(&mut service, owner, repo, path, branch),
        Commands::Push {
            owner,
            repo,
            path,
            file,
            branch,
            message,
        } => cmd_push(&mut service, owner, repo, path, file, branch, message),
        Commands::UploadImage {
            owner,
            repo,
            name,
            file,
            branch,
        } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let body = FileCommit::new(format!("Upload {}", name), bytes).branch(&branch);
            let update = service
                .api()?
                .upload_image(&owner, &repo, &name, &body)
                .send()
                .context("Image upload failed")?;
            print_update(&update);
            Ok(())
        }
        Commands::Template { .. } => unreachable!("handled before loading configuration"),
    }
}

fn cmd_login(service: &mut GitHubService<ConsoleDialog>) -> Result<()> {
    let profile = service.login().context("Login failed")?;
    println!("Signed in as {}", profile.user.login);
    if !profile.orgs.is_empty() {
        let orgs: Vec<&str> = profile.orgs.iter().map(|o| o.login.as_str()).collect();
        println!("Organizations: {}", orgs.join(", "));
    }
    Ok(())
}

fn cmd_whoami(service: &mut GitHubService<ConsoleDialog>) -> Result<()> {
    let Some(profile) = service.profile()? else {
        bail!("Not signed in; run `ghpub login`");
    };
    match &profile.user.name {
        Some(name) => println!("{} ({})", profile.user.login, name),
        None => println!("{}", profile.user.login),
    }
    for org in &profile.orgs {
        println!("  {}", org.login);
    }
    Ok(())
}

fn cmd_repos(
    service: &mut GitHubService<ConsoleDialog>,
    org: Option<String>,
    page: u32,
) -> Result<()> {
    let repos = match &org {
        Some(org) => service.api()?.repos(page, org, false).send(),
        None => service.api()?.repos(page, "", true).send(),
    }
    .context("Failed to list repositories")?;

    for repo in repos {
        let visibility = if repo.is_private { "private" } else { "public" };
        println!("{}\t{}", repo.full_name, visibility);
    }
    Ok(())
}

fn cmd_log(
    service: &mut GitHubService<ConsoleDialog>,
    owner: String,
    repo: String,
    path: String,
    branch: String,
) -> Result<()> {
    let commits = service
        .api()?
        .commits(&owner, &repo, &branch, &path)
        .send()
        .context("Failed to load history")?;

    for commit in commits {
        let short = &commit.sha[..commit.sha.len().min(7)];
        let summary = commit.commit.message.lines().next().unwrap_or_default();
        match &commit.commit.author {
            Some(author) => println!(
                "{} {} {} {}",
                short,
                author.date.format("%Y-%m-%d"),
                author.name,
                summary
            ),
            None => println!("{} {}", short, summary),
        }
    }
    Ok(())
}

fn cmd_push(
    service: &mut GitHubService<ConsoleDialog>,
    owner: String,
    repo: String,
    path: String,
    file: PathBuf,
    branch: String,
    message: Option<String>,
) -> Result<()> {
    let content =
        std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let api = service.api()?;

    let existing = match api.get_sha(&owner, &repo, &branch, Some(&path)).send() {
        Ok(entry) => Some(entry),
        Err(PublishError::NotFound { .. }) => None,
        Err(e) => return Err(e).context("Failed to look up existing file"),
    };

    let update = match existing {
        Some(entry) => {
            let body = FileCommit::new(message.unwrap_or_else(|| format!("Update {}", path)), content)
                .branch(&branch)
                .sha(entry.sha);
            api.update_file(&owner, &repo, &path, &body).send()
        }
        None => {
            let body = FileCommit::new(message.unwrap_or_else(|| format!("Create {}", path)), content)
                .branch(&branch);
            api.create_file(&owner, &repo, &path, &body).send()
        }
    }
    .context("Publishing failed")?;

    print_update(&update);
    Ok(())
}

fn print_update(update: &ContentUpdate) {
    match &update.commit.html_url {
        Some(url) => println!("Committed {} ({})", update.commit.sha, url),
        None => println!("Committed {}", update.commit.sha),
    }
}
