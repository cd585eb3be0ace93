use crate::infra::{parse_date, parse_timestamp, DraftFile};
use amotekun_registration::config::AppConfig;
use amotekun_registration::error::AppError;
use amotekun_registration::telemetry;
use amotekun_registration::workflows::registration::{
    AgeWindow, DirectorySlipSink, HttpRegistrationApi, JpegPhotoCompressor, Lga,
    PortalSchedule, RegistrationPolicy, RegistrationWorkflow, ReviewSummary, ValidationErrors,
    WorkflowError,
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct StatusArgs {
    /// Evaluate the portal window at this instant (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// JSON draft keyed by form field name (fullName, phoneNumber, ...)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Date used for the age check (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct ApplyArgs {
    /// JSON draft keyed by form field name (fullName, phoneNumber, ...)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Passport photograph to compress and attach
    #[arg(long)]
    pub(crate) photo: Option<PathBuf>,
    /// Directory the registration slip is saved into
    #[arg(long, default_value = ".")]
    pub(crate) out: PathBuf,
    /// Submit without asking for confirmation
    #[arg(long)]
    pub(crate) yes: bool,
    /// Override the current time (RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
}

pub(crate) fn run_status(args: StatusArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let now = args.now.unwrap_or_else(Utc::now);
    let schedule = PortalSchedule::from(config.portal);
    let (earliest, latest) = AgeWindow::from(config.eligibility).bounds(now.date_naive());

    println!("Amotekun Corps registration portal");
    println!("- Opened: {}", schedule.launch_date.format("%d %B %Y"));
    println!("- Closes: {}", schedule.deadline().format("%d %B %Y %H:%M UTC"));
    match schedule.time_remaining(now) {
        Some(left) => println!(
            "- Status: open | {}d {:02}h {:02}m {:02}s remaining",
            left.days, left.hours, left.minutes, left.seconds
        ),
        None => println!("- Status: closed"),
    }
    println!(
        "- Eligible dates of birth: {} to {}",
        earliest.format("%Y-%m-%d"),
        latest.format("%Y-%m-%d")
    );

    Ok(())
}

pub(crate) fn run_lgas() {
    for lga in Lga::ALL {
        println!("{lga}");
    }
}

pub(crate) async fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let draft = DraftFile::load(&args.input)?;
    let mut workflow = RegistrationWorkflow::mount(RegistrationPolicy::from(&config), today, false);
    draft.fill(&mut workflow)?;
    if let Some(bytes) = draft.embedded_photo().map_err(WorkflowError::from)? {
        attach_photo(&mut workflow, bytes).await?;
    }

    let errors = workflow.validate();
    if let Some(first_field) = errors.first_field() {
        print_errors(errors);
        return Err(WorkflowError::Invalid {
            first_field,
            count: errors.len(),
        }
        .into());
    }

    println!("Draft is complete and ready for review.\n");
    print!("{}", ReviewSummary::from_draft(workflow.draft()));
    Ok(())
}

pub(crate) async fn run_apply(args: ApplyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let now = args.now.unwrap_or_else(Utc::now);
    let schedule = PortalSchedule::from(config.portal);
    let mut workflow =
        RegistrationWorkflow::mount_at(RegistrationPolicy::from(&config), &schedule, now);
    if workflow.is_portal_closed() {
        println!(
            "Registration closed on {}.",
            schedule.deadline().format("%d %B %Y")
        );
        return Err(WorkflowError::PortalClosed.into());
    }

    let draft = DraftFile::load(&args.input)?;
    draft.fill(&mut workflow)?;

    let photo = match &args.photo {
        Some(path) => Some(tokio::fs::read(path).await?),
        None => draft.embedded_photo().map_err(WorkflowError::from)?,
    };
    if let Some(bytes) = photo {
        attach_photo(&mut workflow, bytes).await?;
    }

    let summary = match workflow.request_review() {
        Ok(summary) => summary,
        Err(err) => {
            print_errors(workflow.errors());
            return Err(err.into());
        }
    };
    println!("Please review your application:\n");
    print!("{summary}");

    if !args.yes && !confirm("\nSubmit this application? [y/N] ").await? {
        workflow.cancel_review()?;
        println!("Submission cancelled. Nothing was sent.");
        return Ok(());
    }

    let api = HttpRegistrationApi::new(&config.api)?;
    let sink = DirectorySlipSink::new(args.out);
    info!(
        environment = ?config.environment,
        url = api.register_url(),
        "submitting application"
    );
    workflow.confirm_submit(&api, &sink).await?;

    if let Some(notice) = workflow.success_notice() {
        println!("\n{notice}");
    }
    match (workflow.saved_slip_path(), workflow.download_error()) {
        (Some(path), _) => println!("Slip saved to {}", path.display()),
        (None, Some(err)) => eprintln!("The slip could not be saved: {err}"),
        (None, None) => {}
    }

    Ok(())
}

async fn attach_photo(
    workflow: &mut RegistrationWorkflow,
    bytes: Vec<u8>,
) -> Result<(), AppError> {
    if let Err(err) = workflow.attach_photo(bytes, &JpegPhotoCompressor).await {
        if let Some(message) = workflow.photo_error() {
            eprintln!("{message}");
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_errors(errors: &ValidationErrors) {
    println!("{} field(s) need attention:", errors.len());
    for (field, message) in errors.iter() {
        println!("- {}: {}", field.label(), message);
    }
}

async fn confirm(prompt: &str) -> Result<bool, AppError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
