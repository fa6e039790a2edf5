use crate::engine::ScoringClient;
use crate::model::{ResubmitPolicy, RunConfig};
use crate::orchestrator::{Orchestrator, Session};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "claim-risk-cli",
    version,
    about = "Insurance claim-risk prediction simulator with optional TUI"
)]
pub struct Cli {
    /// Base URL of the scoring service; `/predict` is appended
    #[arg(long, env = "PREDICTION_API_URL")]
    pub base_url: Option<String>,

    /// Submit once and print a JSON report (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Submit once and print a text summary (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Set a form field before submitting, e.g. `--set airbags=6` (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub set: Vec<String>,

    /// Minimum time a submission is shown as in progress
    #[arg(long, default_value = "5s")]
    pub min_duration: humantime::Duration,

    /// Give up on the scoring service after this long; `0s` waits forever
    #[arg(long, default_value = "30s")]
    pub request_timeout: humantime::Duration,

    /// What to do when submitting while a request is in flight
    #[arg(long, value_enum, default_value_t = ResubmitPolicy::Ignore)]
    pub resubmit: ResubmitPolicy,

    /// Write logs to this file (the TUI does not log otherwise)
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,

    /// Submit the form as soon as the TUI opens
    #[arg(long)]
    pub submit_on_launch: bool,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        !self.json && !self.text
    }
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<RunConfig> {
    let base_url = args
        .base_url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .context("no scoring service configured; pass --base-url or set PREDICTION_API_URL")?;
    let timeout = Duration::from(args.request_timeout);
    Ok(RunConfig {
        base_url,
        min_duration: Duration::from(args.min_duration),
        request_timeout: (!timeout.is_zero()).then_some(timeout),
        resubmit: args.resubmit,
        user_agent: format!("claim-risk-cli/{}", env!("CARGO_PKG_VERSION")),
    })
}

/// Create a session with the `--set` edits applied on top of the defaults.
pub fn build_session(args: &Cli, policy: ResubmitPolicy) -> Result<Session> {
    let mut session = Session::new(policy);
    for assignment in &args.set {
        session
            .form_mut()
            .set_field_str(assignment)
            .with_context(|| format!("invalid --set {assignment:?}"))?;
    }
    Ok(session)
}

/// Run the selected mode. Returns `false` when a one-shot submission failed.
pub async fn run(args: Cli) -> Result<bool> {
    let cfg = build_config(&args)?;
    let session = build_session(&args, cfg.resubmit)?;
    tracing::debug!(?cfg, "configuration");

    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            crate::tui::run(cfg, session, args.submit_on_launch).await?;
            return Ok(true);
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_once(cfg, session, false).await;
        }
    }

    run_once(cfg, session, args.json).await
}

/// Submit the session's form once and print the outcome.
async fn run_once(cfg: RunConfig, mut session: Session, json: bool) -> Result<bool> {
    let client = ScoringClient::new(&cfg)?;
    if !json {
        eprintln!("Submitting to {} …", client.predict_url());
    }
    let orchestrator = Orchestrator::new(Arc::new(client), &cfg);
    orchestrator.submit(&mut session).await;

    if json {
        let report = crate::text_summary::build_report(&cfg, &session);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in crate::text_summary::build_text_summary(&session).lines {
            println!("{line}");
        }
    }

    Ok(session.error().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Airbags;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["claim-risk-cli"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_follow_documented_timing() {
        let cli = parse(&["--base-url", "http://scoring.local"]);
        let cfg = build_config(&cli).unwrap();
        assert_eq!(cfg.min_duration, Duration::from_secs(5));
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.resubmit, ResubmitPolicy::Ignore);
        assert!(cli.is_interactive());
    }

    #[test]
    fn zero_timeout_disables_it() {
        let cli = parse(&[
            "--base-url",
            "http://scoring.local",
            "--request-timeout",
            "0s",
            "--min-duration",
            "250ms",
            "--resubmit",
            "supersede",
        ]);
        let cfg = build_config(&cli).unwrap();
        assert_eq!(cfg.request_timeout, None);
        assert_eq!(cfg.min_duration, Duration::from_millis(250));
        assert_eq!(cfg.resubmit, ResubmitPolicy::Supersede);
    }

    #[test]
    fn missing_base_url_is_an_error() {
        let mut cli = parse(&["--text"]);
        cli.base_url = None;
        assert!(build_config(&cli).is_err());
        cli.base_url = Some("   ".into());
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn json_and_text_conflict() {
        assert!(Cli::try_parse_from(["claim-risk-cli", "--json", "--text"]).is_err());
    }

    #[test]
    fn set_edits_are_applied_and_validated() {
        let cli = parse(&["--set", "airbags=6", "--set", "fuel_type=Diesel"]);
        let session = build_session(&cli, ResubmitPolicy::Ignore).unwrap();
        assert_eq!(session.form().state().airbags, Airbags::Six);

        let cli = parse(&["--set", "airbags=3"]);
        assert!(build_session(&cli, ResubmitPolicy::Ignore).is_err());
    }

    fn run_config(base_url: String) -> RunConfig {
        RunConfig {
            base_url,
            min_duration: Duration::from_millis(20),
            request_timeout: Some(Duration::from_secs(5)),
            resubmit: ResubmitPolicy::Ignore,
            user_agent: "claim-risk-cli/test".into(),
        }
    }

    #[tokio::test]
    async fn one_shot_run_reports_failure_for_exit_status() {
        use crate::orchestrator::testing::{predict_route, serve};

        let base = serve(predict_route(500, serde_json::json!({}))).await;
        let session = Session::new(ResubmitPolicy::Ignore);
        assert!(!run_once(run_config(base.clone()), session, true).await.unwrap());

        let session = Session::new(ResubmitPolicy::Ignore);
        assert!(!run_once(run_config(base), session, false).await.unwrap());
    }

    #[tokio::test]
    async fn one_shot_run_succeeds_on_a_prediction() {
        use crate::orchestrator::testing::{high_risk_body, predict_route, serve};

        let base = serve(predict_route(200, high_risk_body())).await;
        let cli = parse(&["--json", "--set", "ncap_rating=2"]);
        let session = build_session(&cli, ResubmitPolicy::Ignore).unwrap();
        assert!(run_once(run_config(base), session, true).await.unwrap());
    }
}
