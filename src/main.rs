use std::{process, sync::Arc, time::Duration};

use alexpetro::{
    application::{
        cache::ContentCache,
        content::{
            chairmen::ChairmenService, contacts::ContactsService, news::NewsService,
            projects::ProjectsService, rates::RatesService, ticker::TickerService,
        },
        error::AppError,
        mail::MailNotifier,
        repos::{ChairmenRepo, ContactsRepo, NewsRepo, ProjectsRepo, RatesRepo, TickerRepo},
        stream::ChangeHub,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        rate_limit::SubmitRateLimiter,
        recaptcha::RecaptchaVerifier,
        telemetry,
        uploads::UploadStorage,
    },
};
use tokio::task::JoinHandle;
use tracing::{Dispatch, Level, debug, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings)?;

    // Periodic reclamation of expired cache entries. Correctness does not
    // depend on this; the age check at read time does the real work.
    let sweeper = spawn_cache_sweeper(app.state.cache.clone(), settings.cache.sweep_interval);

    let result = serve_http(&settings, app.state).await;

    sweeper.abort();
    let _ = sweeper.await;

    if let Some(mail_worker) = app.mail_worker {
        mail_worker.abort();
        let _ = mail_worker.await;
    }

    result
}

struct ApplicationContext {
    state: ApiState,
    mail_worker: Option<JoinHandle<()>>,
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_application_context(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let rates_repo: Arc<dyn RatesRepo> = repositories.clone();
    let chairmen_repo: Arc<dyn ChairmenRepo> = repositories.clone();
    let news_repo: Arc<dyn NewsRepo> = repositories.clone();
    let ticker_repo: Arc<dyn TickerRepo> = repositories.clone();
    let projects_repo: Arc<dyn ProjectsRepo> = repositories.clone();
    let contacts_repo: Arc<dyn ContactsRepo> = repositories.clone();

    let hub = Arc::new(ChangeHub::with_capacity(
        settings.stream.client_buffer.get() as usize,
    ));
    let cache = Arc::new(ContentCache::new(settings.cache.ttl));
    let storage = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );

    let (mail, mail_worker) = MailNotifier::spawn(&settings.mail);

    let submit_limiter = Arc::new(SubmitRateLimiter::new(
        Duration::from_secs(settings.contact_rate_limit.window_seconds.get() as u64),
        settings.contact_rate_limit.max_requests.get(),
    ));

    let state = ApiState {
        rates: Arc::new(RatesService::new(rates_repo, hub.clone())),
        chairmen: Arc::new(ChairmenService::new(
            chairmen_repo,
            hub.clone(),
            storage.clone(),
        )),
        news: Arc::new(NewsService::new(
            news_repo,
            hub.clone(),
            cache.clone(),
            storage.clone(),
        )),
        ticker: Arc::new(TickerService::new(ticker_repo)),
        projects: Arc::new(ProjectsService::new(
            projects_repo,
            hub.clone(),
            cache.clone(),
            storage.clone(),
        )),
        contacts: Arc::new(ContactsService::new(contacts_repo, mail)),
        hub,
        cache,
        storage,
        submit_limiter,
        recaptcha: Arc::new(RecaptchaVerifier::new(&settings.recaptcha)),
    };

    Ok(ApplicationContext { state, mail_worker })
}

fn spawn_cache_sweeper(cache: Arc<ContentCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // Skip the first immediate tick
        loop {
            ticker.tick().await;
            let swept = cache.sweep_expired();
            if swept > 0 {
                debug!(
                    target = "alexpetro::cache",
                    swept, "reclaimed expired cache entries"
                );
            }
        }
    })
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state, settings.uploads.max_request_bytes.get() as usize);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "alexpetro::http",
        addr = %settings.server.addr,
        "API listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
