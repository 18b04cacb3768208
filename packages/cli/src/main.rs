use std::{fs::File, path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, layer::SubscriberExt as _, util::SubscriberInitExt};
use vtop::{ClientConfig, Credentials, VtopClient, config};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Semesters,
    Attendance,
    Timetable,
    Marks,
    Exams,
}

#[derive(Parser, Debug)]
#[command(
    name = "vtop",
    about = "Fetch academic records from the VTOP student portal as JSON.",
    version
)]
struct VtopOptions {
    /// The record view to fetch.
    #[arg(value_enum)]
    view: View,

    /// Portal login id (registration number).
    #[arg(short = 'u', long, env = "VTOP_USERNAME")]
    username: String,

    /// Portal password.
    #[arg(short = 'p', long, env = "VTOP_PASSWORD", hide_env_values = true)]
    password: String,

    /// Semester id, e.g. `AP2024254`. Defaults to the first listed semester.
    #[arg(short = 's', long)]
    semester: Option<String>,

    /// Write JSON to this file instead of stdout.
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,

    #[arg(long, default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, default_value = config::DEFAULT_CAPTCHA_URL)]
    captcha_url: String,

    /// The number of login attempts before giving up.
    #[arg(short = 'r', long = "retry", default_value_t = ClientConfig::LOGIN_ATTEMPTS)]
    login_attempts: u32,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    setup_tracing()?;

    color_eyre::install()?;
    let options = VtopOptions::parse();

    let config = ClientConfig::new(&options.base_url, &options.captcha_url)?
        .with_login_attempts(options.login_attempts)
        .with_timeout(Duration::from_secs(options.timeout));
    let credentials = Credentials::new(&options.username, &options.password);

    let mut client = VtopClient::new(config, credentials)?;
    client.login().await?;

    let json = match options.view {
        View::Semesters => to_json(&client.semesters().await?)?,
        View::Attendance => {
            let semester = semester_id(&mut client, &options.semester).await?;
            to_json(&client.attendance(&semester).await?)?
        }
        View::Timetable => {
            let semester = semester_id(&mut client, &options.semester).await?;
            to_json(&client.timetable(&semester).await?)?
        }
        View::Marks => {
            let semester = semester_id(&mut client, &options.semester).await?;
            to_json(&client.marks(&semester).await?)?
        }
        View::Exams => {
            let semester = semester_id(&mut client, &options.semester).await?;
            match client.exam_schedule(&semester).await? {
                Some(data) => to_json(&data)?,
                None => {
                    tracing::warn!("no exam schedule published for {semester}");
                    to_json(&serde_json::Value::Null)?
                }
            }
        }
    };

    client.logout();

    match options.out {
        Some(path) => {
            let mut file = tokio::fs::File::create(&path).await?;
            file.write_all(json.as_bytes()).await?;
            tracing::info!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// The requested semester, or the first one the portal lists.
async fn semester_id(client: &mut VtopClient, requested: &Option<String>) -> eyre::Result<String> {
    if let Some(semester) = requested {
        tracing::info!("using semester {semester}");
        return Ok(semester.clone());
    }
    let data = client.semesters().await?;
    let first = data
        .semesters
        .into_iter()
        .next()
        .ok_or_else(|| eyre::eyre!("The portal lists no semesters, pass --semester"))?;
    tracing::info!("using semester {} ({})", first.name, first.id);
    Ok(first.id)
}

fn to_json<T: Serialize>(value: &T) -> eyre::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn setup_tracing() -> eyre::Result<()> {
    std::fs::create_dir_all("reports").or_else(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            Ok(())
        } else {
            Err(e)
        }
    })?;
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_level(true)
        .with_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    let error_report_file = File::create("reports/error_report.json")
        .map_err(|e| eyre::eyre!("Failed to create error log file: {e}"))?;
    let error_report_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(Arc::new(error_report_file))
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(stderr_log)
        .with(error_report_layer)
        .init();
    Ok(())
}
