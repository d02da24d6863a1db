use actix_web::middleware::{DefaultHeaders, TrailingSlash};
use actix_web::web::Data;
use actix_web::{guard, App, HttpServer};
use anyhow::Context as AnyhowContext;
use parts_storefront::cms::{CatalogApi, CmsClient};
use parts_storefront::notify::{
    MailChannel, MailConfig, Notifier, NotifyChannel, TelegramChannel,
};
use parts_storefront::{control, env_trimmed, env_u64};
use std::env;
use std::sync::Arc;
use std::time::Duration;

fn notification_channels(http: &reqwest::Client) -> Vec<Box<dyn NotifyChannel>> {
    let mut channels: Vec<Box<dyn NotifyChannel>> = vec![];

    match (env_trimmed("TELEGRAM_BOT_TOKEN"), env_trimmed("TELEGRAM_CHAT_ID")) {
        (Some(token), Some(chat_id)) => {
            let api_base = env_trimmed("TELEGRAM_API_BASE")
                .unwrap_or_else(|| "https://api.telegram.org".to_string());
            channels.push(Box::new(TelegramChannel::new(
                http.clone(),
                &api_base,
                &token,
                &chat_id,
            )));
        }
        _ => log::warn!("TELEGRAM is not configured, leads will not reach the chat"),
    }

    let mail = (
        env_trimmed("SMTP_HOST"),
        env_trimmed("SMTP_USER"),
        env_trimmed("SMTP_PASSWORD"),
        env_trimmed("MAIL_FROM"),
        env_trimmed("MAIL_TO"),
    );
    match mail {
        (Some(host), Some(user), Some(password), Some(from), Some(to)) => {
            let config = MailConfig {
                host,
                port: env_trimmed("SMTP_PORT").and_then(|p| p.parse().ok()),
                user,
                password,
                from,
                to,
            };
            match MailChannel::new(config) {
                Ok(channel) => channels.push(Box::new(channel)),
                Err(err) => log::error!("Unable to set up the mail channel: {err:#}"),
            }
        }
        _ => log::warn!("SMTP is not configured, leads will not reach the mailbox"),
    }

    channels
}

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", "INFO");
    }
    pretty_env_logger::formatted_timed_builder()
        .parse_default_env()
        .init();

    match std::fs::File::open(".env") {
        Ok(_) => envmnt::load_file(".env")?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            std::fs::File::create(".env")?;
            envmnt::load_file(".env")?;
        }
        Err(err) => {
            return Err(anyhow::anyhow!("Unable to open .env file: {err}"));
        }
    }

    let http = reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(env_u64("CMS_TIMEOUT_SECS", 30)))
        .use_rustls_tls()
        .build()?;

    let cms_base = env_trimmed("CMS_BASE_URL")
        .unwrap_or_else(|| "http://localhost:3000/api".to_string());
    let api: Arc<dyn CatalogApi> = Arc::new(
        CmsClient::new(http.clone(), &cms_base)
            .with_context(|| format!("Invalid CMS_BASE_URL {cms_base}"))?,
    );

    let notifier = Arc::new(Notifier::new(notification_channels(&http)));
    if notifier.is_empty() {
        log::warn!("No notification channel is configured, lead forms will always fail");
    }

    let port = env_u64("HTTP_PORT", 8080) as u16;
    HttpServer::new(move || {
        App::new()
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
                    .add(("Access-Control-Allow-Headers", "*")),
            )
            .wrap(actix_web::middleware::Compress::default())
            .wrap(actix_web::middleware::NormalizePath::new(
                TrailingSlash::Trim,
            ))
            .app_data(Data::new(api.clone()))
            .app_data(Data::new(notifier.clone()))
            .service(actix_files::Files::new("/static", "static"))
            .service(control::landing::index)
            .service(control::catalog::browse)
            .service(control::product::view)
            .service(control::pages::news_index)
            .service(control::pages::news_article)
            .service(control::pages::custom_page)
            .service(control::leads::contact)
            .service(control::leads::vin_request)
            .default_service(
                actix_web::web::route()
                    .guard(guard::Not(guard::Post()))
                    .to(control::not_found),
            )
    })
    .bind(("0.0.0.0", port))
    .with_context(|| format!("Failed to bind server to 0.0.0.0:{port}. Is the port already in use?"))?
    .run()
    .await?;
    Ok(())
}
