//! Shell commands and their execution against the session layer.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::warn;

use animeshelf_core::auth::{AuthForm, Field};
use animeshelf_core::config::Config;
use animeshelf_core::guard::{GuardView, RouteGuard};
use animeshelf_core::oauth::{Navigator, OAuthProvider};
use animeshelf_core::routes;
use animeshelf_core::AuthContext;

/// Environment variable with a password for non-interactive logins
const PASSWORD_ENV: &str = "ANIMESHELF_PASSWORD";

/// Environment variable with a default username
const USERNAME_ENV: &str = "ANIMESHELF_USERNAME";

pub const HELP: &str = "\
Commands:
  login [username]     Log in with username and password
  register             Create a new account
  logout               End the session
  whoami               Show the signed-in account
  open <path>          Visit a view, e.g. open /dashboard
  oauth <provider>     Continue with google or github
  callback             Finish an OAuth login after the browser returns
  help                 Show this help
  quit                 Exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(Option<String>),
    Register,
    Logout,
    Whoami,
    Open(String),
    OAuth(OAuthProvider),
    Callback,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Ok(None);
        };
        let arg = parts.next().map(str::to_string);

        let command = match name.to_ascii_lowercase().as_str() {
            "login" => Command::Login(arg),
            "register" => Command::Register,
            "logout" => Command::Logout,
            "whoami" => Command::Whoami,
            "open" => Command::Open(arg.ok_or("Usage: open <path>")?),
            "oauth" => Command::OAuth(arg.ok_or("Usage: oauth <google|github>")?.parse()?),
            "callback" => Command::Callback,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("Unknown command: {} (try `help`)", other)),
        };
        Ok(Some(command))
    }
}

/// Prints provider URLs for the user to open in a browser.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate_external(&self, url: &url::Url) {
        println!("Open this URL in your browser to continue:\n  {}", url);
        println!("When the browser lands on {}, run `callback`.", routes::OAUTH_SUCCESS_ROUTE);
    }
}

pub struct Shell {
    context: AuthContext,
    config: Config,
}

impl Shell {
    pub fn new(context: AuthContext, config: Config) -> Self {
        Self { context, config }
    }

    pub fn prompt(&self) -> String {
        match self.context.store().snapshot().user {
            Some(user) => format!("{}@animeshelf> ", user.username),
            None => "animeshelf> ".to_string(),
        }
    }

    /// Run a command. Returns `true` when the shell should exit.
    pub async fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Login(username) => self.login(username).await?,
            Command::Register => self.register().await?,
            Command::Logout => {
                self.context.actions.logout().await;
                println!("Logged out.");
            }
            Command::Whoami => self.whoami(),
            Command::Open(path) => self.open(&path).await,
            Command::OAuth(provider) => {
                self.context
                    .oauth
                    .begin(provider, &TerminalNavigator)
                    .context("Failed to build provider URL")?;
            }
            Command::Callback => {
                let navigation = self.context.oauth.handle_callback(&self.context.actions).await;
                self.report_auth_result();
                println!("-> {}", navigation.path);
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(true),
        }
        Ok(false)
    }

    async fn login(&mut self, username: Option<String>) -> Result<()> {
        let store = self.context.store().clone();
        let mut form = AuthForm::login();
        if let Some(navigation) = form.mount(&store) {
            self.report_already_signed_in(&navigation);
            return Ok(());
        }

        let username = match username
            .or_else(|| std::env::var(USERNAME_ENV).ok())
            .or_else(|| self.config.last_username.clone())
        {
            Some(name) => name,
            None => prompt_line("Username: ")?,
        };
        let password = match std::env::var(PASSWORD_ENV) {
            Ok(password) => password,
            Err(_) => rpassword::prompt_password("Password: ")?,
        };

        form.edit(Field::Username, username.clone(), &store);
        form.edit(Field::Password, password, &store);

        match form.submit(&self.context.actions).await {
            Ok(_) => {
                self.report_auth_result();
                if self.config.last_username.as_deref() != Some(username.as_str()) {
                    self.config.last_username = Some(username);
                    if let Err(e) = self.config.save() {
                        warn!(error = %e, "Failed to save config");
                    }
                }
            }
            Err(_) => print_form_error(&form, &store),
        }
        form.unmount(&store);
        Ok(())
    }

    async fn register(&mut self) -> Result<()> {
        let store = self.context.store().clone();
        let mut form = AuthForm::register();
        if let Some(navigation) = form.mount(&store) {
            self.report_already_signed_in(&navigation);
            return Ok(());
        }
        form.edit(Field::Name, prompt_line("Name: ")?, &store);
        form.edit(Field::Username, prompt_line("Username: ")?, &store);
        form.edit(Field::Email, prompt_line("Email: ")?, &store);
        form.edit(Field::Password, rpassword::prompt_password("Password: ")?, &store);
        form.edit(
            Field::ConfirmPassword,
            rpassword::prompt_password("Confirm password: ")?,
            &store,
        );

        match form.submit(&self.context.actions).await {
            Ok(outcome) => {
                println!("Account created. Log in with `login {}`.", form.fields().username);
                println!("-> {}", outcome.navigation().path);
            }
            Err(_) => print_form_error(&form, &store),
        }
        form.unmount(&store);
        Ok(())
    }

    fn whoami(&self) {
        let state = self.context.store().snapshot();
        match state.user {
            Some(user) => {
                println!("{} ({})", user.display_name(), user.username);
                if let Some(ref email) = user.email {
                    println!("  email: {}", email);
                }
                if let Some(at) = state.authenticated_at {
                    println!("  signed in: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
                }
            }
            None => println!("Not logged in."),
        }
    }

    async fn open(&self, path: &str) {
        if !routes::is_protected(path) {
            println!("{} is public.", path);
            return;
        }
        let mut guard = RouteGuard::new();
        match guard.resolve(&self.context.actions).await {
            GuardView::Protected => {
                let user = self.context.store().snapshot().user;
                let name = user.as_ref().map(|u| u.display_name()).unwrap_or_default();
                println!("{} (signed in as {})", path, name);
            }
            GuardView::Redirect(navigation) => {
                println!("Login required. -> {}", navigation.path);
            }
        }
    }

    fn report_already_signed_in(&self, navigation: &routes::Navigation) {
        if let Some(user) = self.context.store().snapshot().user {
            println!("Already logged in as {}. Use `logout` first.", user.username);
        }
        println!("-> {}", navigation.path);
    }

    fn report_auth_result(&self) {
        let state = self.context.store().snapshot();
        match (state.user, state.error) {
            (Some(user), _) => println!("Welcome, {}!", user.display_name()),
            (None, Some(error)) => println!("Error: {}", error),
            (None, None) => println!("Not logged in."),
        }
    }
}

fn print_form_error(form: &AuthForm, store: &animeshelf_core::auth::AuthStore) {
    if let Some(message) = form.displayed_error(&store.snapshot()) {
        println!("Error: {}", message);
    }
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
