use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use triage_core::{
    CoreConfig, Session, ShellAction, ShellState, TriageAssessment, TriageForm, TriageResult,
    TriageService, VitalSigns,
};

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "OpenHealth triage CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Vital signs, exactly as a patient would type them.
#[derive(Args)]
struct VitalArgs {
    /// Heart rate (bpm)
    #[arg(long)]
    heart_rate: Option<String>,
    /// Blood pressure, e.g. 120/80
    #[arg(long)]
    blood_pressure: Option<String>,
    /// Temperature
    #[arg(long)]
    temperature: Option<String>,
    /// Oxygen saturation (%)
    #[arg(long)]
    spo2: Option<String>,
}

impl From<VitalArgs> for VitalSigns {
    fn from(v: VitalArgs) -> Self {
        VitalSigns::from_fields(v.heart_rate, v.blood_pressure, v.temperature, v.spo2)
    }
}

#[derive(Args)]
struct SessionArgs {
    /// Session to resume
    #[arg(long)]
    user_id: Option<String>,
    /// Sign-in token; the same token always gives the same user
    #[arg(long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score symptoms without saving anything
    Score {
        /// Symptom description
        symptoms: String,
        #[command(flatten)]
        vitals: VitalArgs,
    },
    /// Establish a session and print its user id
    SignIn {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Score and save an assessment
    Submit {
        /// Symptom description
        symptoms: String,
        #[command(flatten)]
        vitals: VitalArgs,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Show past assessments, newest first
    History {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Follow past assessments as new ones are saved (Ctrl-C to stop)
    Watch {
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("triage_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let service = TriageService::from_config(Arc::new(CoreConfig::from_env()?));
    let mut state = ShellState::new();

    match cli.command {
        Commands::Score { symptoms, vitals } => {
            let result = service.score(&TriageForm::new(symptoms, vitals.into()));
            print_result(&result, None);
        }
        Commands::SignIn { session } => {
            let session = sign_in(&service, &mut state, &session)?;
            println!("{}", session.identity);
        }
        Commands::Submit {
            symptoms,
            vitals,
            session,
        } => {
            let session = sign_in(&service, &mut state, &session)?;
            if !state.apply(ShellAction::SubmissionStarted) {
                return Err("cannot submit right now".into());
            }

            let user_id = session.identity.to_string();
            let form = TriageForm::new(symptoms, vitals.into());
            match service.submit(Some(&user_id), form).await {
                Ok(outcome) => {
                    state.apply(ShellAction::SubmissionFinished(outcome));
                }
                Err(e) => {
                    state.apply(ShellAction::SubmissionFailed(e.to_string()));
                }
            }

            if let Some(error) = &state.error {
                return Err(error.clone().into());
            }
            if let Some(result) = &state.last_result {
                print_result(result, Some(state.persisted));
            }
        }
        Commands::History { session } => {
            let session = sign_in(&service, &mut state, &session)?;
            let history = service.history(&session.identity.to_string()).await?;
            state.apply(ShellAction::HistoryUpdated(history));
            print_history(&state.history);
        }
        Commands::Watch { session } => {
            let session = sign_in(&service, &mut state, &session)?;
            let mut feed = service.watch_history(&session.identity.to_string()).await?;
            loop {
                tokio::select! {
                    next = feed.next() => {
                        let Some(history) = next else { break };
                        state.apply(ShellAction::HistoryUpdated(history));
                        print_history(&state.history);
                        println!();
                    }
                    _ = tokio::signal::ctrl_c() => {
                        feed.cancel();
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

fn sign_in(
    service: &TriageService,
    state: &mut ShellState,
    args: &SessionArgs,
) -> Result<Session, Box<dyn std::error::Error>> {
    let session = service.sign_in(args.user_id.as_deref(), args.token.as_deref())?;
    if let Some(requested) = args.user_id.as_deref() {
        if requested.trim() != session.identity.to_string() {
            eprintln!("Session {requested} not found, signed in as a new user.");
        }
    }
    eprintln!("Signed in as {} ({})", session.identity, session.method);
    state.apply(ShellAction::SignedIn(session));
    Ok(session)
}

fn print_result(result: &TriageResult, persisted: Option<bool>) {
    println!("Severity: {}/10", result.severity_score);
    println!("{}", result.explanation);
    println!("Recommended: {}", result.recommended_hospital);
    println!("  {}", result.hospital_info);
    if persisted == Some(false) {
        println!("(not saved)");
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

fn print_history(history: &[TriageAssessment]) {
    if history.is_empty() {
        println!("No assessments found.");
        return;
    }
    for a in history {
        println!(
            "{} | Score {}/10 | {} | HR: {} SpO2: {} | {}",
            a.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            a.severity_score,
            a.symptom_preview(),
            or_na(&a.vitals.heart_rate),
            or_na(&a.vitals.spo2),
            a.recommended_hospital,
        );
    }
}
