use std::io::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use stocklog_client::cli::{self, Command};
use stocklog_client::listing;
use stocklog_client::{
    ClientConfig, FileTokenStore, HttpInventoryService, InventoryListing, MovementForm,
    RefreshSignal, Session, SubmissionOutcome,
};
use stocklog_core::ProductReference;
use stocklog_observability::LogFormat;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

#[derive(Parser)]
#[command(name = "stocklog", about = "Record warehouse stock movements", version)]
struct Args {
    #[arg(long, env = "STOCKLOG_API_URL", help = "Base URL of the inventory service")]
    api_url: Option<String>,
    #[arg(long, help = "Log output format (json or pretty)")]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ClientConfig::from_env().context("invalid configuration")?;
    if let Some(url) = args.api_url.as_deref() {
        config = config.with_api_url(url).context("invalid --api-url")?;
    }
    if let Some(format) = args.log_format {
        config.log_format = format;
    }
    stocklog_observability::init(config.log_format);

    tracing::info!(api_url = %config.api_url, "stocklog starting");

    let service = Arc::new(
        HttpInventoryService::from_config(&config).context("failed to build the HTTP client")?,
    );

    let mut session = Session::new(FileTokenStore::new(&config.session_file));
    session.initialize();
    service.set_token(session.token().map(str::to_string));

    let refresh = RefreshSignal::new();
    let form = MovementForm::new(service.clone(), refresh.clone(), config.notices);
    let inventory = Arc::new(Mutex::new(InventoryListing::new()));
    tokio::spawn(listing::follow(
        inventory.clone(),
        service.clone(),
        refresh.subscribe(),
    ));

    let mut app = App {
        service,
        session,
        form,
        inventory,
        choices: Vec::new(),
    };

    if app.session.is_authenticated() {
        println!("Signed in. Type 'help' for commands.");
        app.open().await;
    } else {
        println!("Sign in with: login <username> <password>");
    }

    let result = app.run().await;
    app.form.dispose();
    result
}

struct App {
    service: Arc<HttpInventoryService>,
    session: Session,
    form: MovementForm,
    inventory: Arc<Mutex<InventoryListing>>,
    choices: Vec<ProductReference>,
}

impl App {
    async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            prompt();
            let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
                return Ok(());
            };
            if line.trim().is_empty() {
                continue;
            }
            match cli::parse(&line) {
                Ok(Command::Quit) => return Ok(()),
                Ok(command) => self.handle(command).await,
                Err(e) => println!("{e}"),
            }
        }
    }

    /// Load what the signed-in screen needs.
    async fn open(&mut self) {
        self.form.load_catalog().await;
        // Failures are logged and recorded on the listing.
        let _ = listing::reload_shared(&self.inventory, self.service.as_ref()).await;
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Help => println!("{}", cli::HELP),
            Command::Login { username, password } => self.login(&username, &password).await,
            Command::Logout => self.logout(),
            _ if !self.session.is_authenticated() => {
                println!("Sign in first: login <username> <password>");
            }
            Command::Search(query) => {
                self.choices = self.form.search(&query);
                if self.form.is_loading_catalog() {
                    println!("{}", self.form.placeholder());
                }
                print!("{}", cli::render_choices(&self.choices));
            }
            Command::Select(n) => match self.choices.get(n - 1) {
                Some(choice) => {
                    self.form.select(choice.clone());
                    println!("Selected {}", choice.label());
                }
                None => println!("No result {n}; run 'search' first"),
            },
            Command::Quantity(raw) => {
                self.form.set_quantity_raw(raw);
                println!("Quantity: {}", self.form.quantity_raw());
            }
            Command::Adjust(delta) => {
                println!("Quantity: {}", self.form.adjust_quantity(delta));
            }
            Command::Preset(preset) => {
                self.form.set_preset(preset);
                println!("Quantity: {}", self.form.quantity_raw());
            }
            Command::Submit(direction) => {
                if self.form.is_submitting() {
                    println!("Still recording the previous movement...");
                    return;
                }
                let form = self.form.clone();
                tokio::spawn(async move {
                    if let Some(outcome) = form.submit(direction).await {
                        report(&form, &outcome);
                    }
                });
            }
            Command::List(filter) => {
                let inventory = self.inventory.lock().await;
                if inventory.is_loading() {
                    println!("Retrieving records...");
                }
                print!("{}", cli::render_rows(&inventory.rows(filter.as_deref().unwrap_or(""))));
                if let Some(e) = inventory.last_error() {
                    println!("(showing last known levels; refresh failed: {e})");
                }
            }
            Command::Reload => {
                self.open().await;
                println!("{} products in catalog", self.form.search("").len());
            }
            Command::Status => self.status(),
            Command::Quit => {}
        }
    }

    async fn login(&mut self, username: &str, password: &str) {
        if self.session.is_authenticated() {
            println!("Already signed in.");
            return;
        }
        match self.session.login(self.service.as_ref(), username, password).await {
            Ok(()) => {
                self.service.set_token(self.session.token().map(str::to_string));
                println!("Signed in.");
                self.open().await;
            }
            Err(e) => println!("{e}"),
        }
    }

    fn logout(&mut self) {
        if let Err(e) = self.session.logout() {
            tracing::warn!(error = %e, "failed to clear saved session");
        }
        self.service.set_token(None);
        self.form.clear_selection();
        self.choices.clear();
        println!("Signed out.");
    }

    fn status(&self) {
        match self.form.selection() {
            Some(product) => println!("Product:  {}", product.label()),
            None => println!("Product:  (none)"),
        }
        println!("Quantity: {}", self.form.quantity_raw());
        println!("State:    {:?}", self.form.state());
        for notice in [self.form.success_notice(), self.form.error_notice()] {
            if let Some(current) = notice.current() {
                println!("{}", cli::render_notice(&current));
            }
        }
    }
}

fn report(form: &MovementForm, outcome: &SubmissionOutcome) {
    let notice = if outcome.is_success() {
        form.success_notice().current()
    } else {
        form.error_notice().current()
    };
    match notice {
        Some(notice) => println!("\n{}", cli::render_notice(&notice)),
        None => println!("\n{outcome:?}"),
    }
    prompt();
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
